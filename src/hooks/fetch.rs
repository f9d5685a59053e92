//! # Fetch hook
//!
//! [`use_fetch`] keeps one [`Fetcher`] per component. Changing the reference
//! or the policy re-dispatches; an unchanged reference (by
//! [`Backend::references_equal`]) keeps the running subscription.
//!
//! ```rust,ignore
//! #[component]
//! fn Profile(id: String) -> Element {
//!     let backend = use_backend::<MyStore>();
//!     let profile = use_fetch(backend, Path::parse(&format!("users/{id}")).ok(), FetchPolicy::LiveDefault);
//!     match profile.value() {
//!         Some(doc) => rsx! { "{doc:?}" },
//!         None if profile.is_loading() => rsx! { "Loading..." },
//!         None => rsx! { "Not found" },
//!     }
//! }
//! ```

use std::sync::Arc;

use dioxus::prelude::*;

use crate::{
    backend::Backend,
    errors::BackendError,
    policy::FetchPolicy,
    runtime::{Dispatch, Fetcher},
    state::AsyncResult,
};

use super::mirror::use_mirror;

/// Handle returned by [`use_fetch`]
pub struct UseFetch<B: Backend> {
    fetcher: Fetcher<B>,
    state: Signal<AsyncResult<B::Snapshot, BackendError>>,
}

impl<B: Backend> Clone for UseFetch<B> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            state: self.state,
        }
    }
}

impl<B: Backend> PartialEq for UseFetch<B> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl<B: Backend> UseFetch<B> {
    /// Reactive view of `{value, error, is_loading}`
    pub fn state(&self) -> Signal<AsyncResult<B::Snapshot, BackendError>> {
        self.state
    }

    pub fn value(&self) -> Option<Arc<B::Snapshot>> {
        self.state.read().value.clone()
    }

    pub fn error(&self) -> Option<BackendError> {
        self.state.read().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    pub fn fetcher(&self) -> &Fetcher<B> {
        &self.fetcher
    }

    /// Re-issue the current reference and policy. Ignored while loading.
    pub fn retry(&self) {
        if let Some(dispatch) = self.fetcher.retry() {
            drive(dispatch);
        }
    }
}

pub(super) fn drive<S: Send + Sync + 'static>(dispatch: Dispatch<S>) {
    if dispatch.is_fetching() {
        spawn(dispatch.drive());
    }
}

/// Read or listen to `reference` according to `policy`.
///
/// A `None` reference leaves the state idle. Subscriptions and in-flight
/// reads are released when the component unmounts.
///
/// `backend` is captured on the first render only. Passing a different client
/// later has no effect; key the component on the client to switch it.
pub fn use_fetch<B: Backend>(
    backend: Arc<B>,
    reference: Option<B::Reference>,
    policy: FetchPolicy,
) -> UseFetch<B> {
    let fetcher = use_hook(|| Fetcher::new(backend));
    let state = use_mirror(fetcher.state());

    let driver = fetcher.clone();
    let _dispatch_memo = use_memo(use_reactive!(|(reference, policy)| {
        drive(driver.update(reference, policy));
    }));

    UseFetch { fetcher, state }
}
