//! Auth-state hook.

use std::sync::Arc;

use dioxus::prelude::*;

use crate::{
    async_state::AsyncResultState,
    auth::{AuthClient, watch_auth_state},
    errors::BackendError,
    state::AsyncResult,
};

use super::mirror::use_mirror;

/// Current user, `None` when signed out. Loading until the first report.
pub fn use_auth_state<C: AuthClient>(
    client: Arc<C>,
) -> Signal<AsyncResult<Option<C::User>, BackendError>> {
    let state = use_hook(|| {
        let state = AsyncResultState::new();
        watch_auth_state(&client, &state);
        state
    });
    use_mirror(&state)
}
