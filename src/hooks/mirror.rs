//! Mirrors an [`AsyncResultState`] into a component-owned signal.

use dioxus::prelude::*;

use crate::{
    async_state::AsyncResultState,
    state::AsyncResult,
    types::{ErrorBounds, ValueBounds},
};

/// Signal that follows every visible change of `state`.
///
/// Only the watch receiver is held, so the mirror never keeps the state (and
/// its subscription) alive on its own. The watcher task ends with the component.
pub(crate) fn use_mirror<T, E>(state: &AsyncResultState<T, E>) -> Signal<AsyncResult<T, E>>
where
    T: ValueBounds,
    E: ErrorBounds,
{
    use_hook(|| {
        let mut receiver = state.subscribe();
        let initial = receiver.borrow_and_update().clone();
        let mut mirror = Signal::new(initial);
        spawn(async move {
            while receiver.changed().await.is_ok() {
                let snapshot = receiver.borrow_and_update().clone();
                mirror.set(snapshot);
            }
            crate::debug_log!("🪞 [MIRROR] state dropped, watcher finished");
        });
        mirror
    })
}
