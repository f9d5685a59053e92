//! Fetch policy dispatch.
//!
//! [`dispatch`] turns a reference and a [`FetchPolicy`] into backend calls that
//! report into an [`AsyncResultState`]. [`Fetcher`] keeps the backend, the
//! memoized reference and the policy together so that reference changes and
//! retries re-dispatch without the caller tracking anything.
//!
//! [`Aggregator`] does the same for aggregate reads and [`ChildWatcher`] for
//! child-event listeners.

pub mod aggregate;
pub mod children;
pub mod listen;
pub mod request;

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;

use crate::{
    async_state::{AsyncResultState, AsyncStateConfig, Settlement},
    backend::Backend,
    errors::{BackendError, BackendResult},
    memo::Distinct,
    policy::{FetchPlan, FetchPolicy},
    state::AsyncResult,
};
pub use aggregate::Aggregator;
pub use children::{ChildWatcher, listen_children};
use listen::open_subscription;
use request::read_with_fallback;

/// Settlement of a one-shot read
pub type ReadSettlement<S> = Settlement<S, BackendError, BoxFuture<'static, BackendResult<S>>>;

/// What a dispatch did
#[must_use = "a fetching dispatch only reads once it is driven"]
pub enum Dispatch<S> {
    /// Reference and policy unchanged; nothing was restarted
    Unchanged,
    /// Reference was absent; the state was stopped
    Stopped,
    /// A live subscription now feeds the state
    Subscribed,
    /// A one-shot read that must be polled to completion
    Fetching(ReadSettlement<S>),
}

impl<S: Send + Sync + 'static> Dispatch<S> {
    /// Run the dispatch to completion. Returns immediately unless fetching.
    pub async fn drive(self) {
        if let Dispatch::Fetching(settlement) = self {
            settlement.await;
        }
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self, Dispatch::Fetching(_))
    }
}

impl<S> std::fmt::Debug for Dispatch<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatch::Unchanged => f.write_str("Unchanged"),
            Dispatch::Stopped => f.write_str("Stopped"),
            Dispatch::Subscribed => f.write_str("Subscribed"),
            Dispatch::Fetching(settlement) => f.debug_tuple("Fetching").field(settlement).finish(),
        }
    }
}

/// Start the operations `policy` calls for on `state`.
///
/// An absent reference stops the state without touching the backend.
pub fn dispatch<B: Backend>(
    backend: &Arc<B>,
    reference: Option<&B::Reference>,
    policy: FetchPolicy,
    state: &AsyncResultState<B::Snapshot, BackendError>,
) -> Dispatch<B::Snapshot> {
    let Some(reference) = reference else {
        crate::debug_log!("⏹️ [DISPATCH] no reference, stopping");
        state.stop();
        return Dispatch::Stopped;
    };

    crate::debug_log!("🚦 [DISPATCH] {:?} with policy {}", reference, policy);
    match policy.plan() {
        FetchPlan::Subscribe {
            options,
            until_server,
        } => {
            open_subscription(backend, reference, options, until_server, state);
            Dispatch::Subscribed
        }
        FetchPlan::Read { primary, fallback } => {
            let read = read_with_fallback(backend, reference, primary, fallback);
            Dispatch::Fetching(state.start_future(read))
        }
    }
}

struct Target<R> {
    reference: Distinct<R>,
    policy: Option<FetchPolicy>,
}

/// A backend, a reference, a policy and the state they feed
///
/// Cloning yields another handle to the same fetcher.
pub struct Fetcher<B: Backend> {
    backend: Arc<B>,
    state: AsyncResultState<B::Snapshot, BackendError>,
    target: Arc<Mutex<Target<B::Reference>>>,
}

impl<B: Backend> Clone for Fetcher<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            state: self.state.clone(),
            target: self.target.clone(),
        }
    }
}

impl<B: Backend> Fetcher<B> {
    /// Create a fetcher whose state suppresses snapshots the backend reports as equal
    pub fn new(backend: Arc<B>) -> Self {
        let comparator_backend = backend.clone();
        let config = AsyncStateConfig::new()
            .with_comparator(move |a, b| comparator_backend.snapshots_equal(a, b));
        Self::with_config(backend, config)
    }

    pub fn with_config(backend: Arc<B>, config: AsyncStateConfig<B::Snapshot>) -> Self {
        Self {
            backend,
            state: AsyncResultState::with_config(config),
            target: Arc::new(Mutex::new(Target {
                reference: Distinct::new(),
                policy: None,
            })),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn state(&self) -> &AsyncResultState<B::Snapshot, BackendError> {
        &self.state
    }

    pub fn snapshot(&self) -> AsyncResult<B::Snapshot, BackendError> {
        self.state.snapshot()
    }

    pub fn reference(&self) -> Option<B::Reference> {
        self.target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reference
            .get()
            .cloned()
    }

    pub fn policy(&self) -> Option<FetchPolicy> {
        self.target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .policy
    }

    /// Point the fetcher at `reference` with `policy`.
    ///
    /// Re-dispatches only when the reference (per
    /// [`Backend::references_equal`]) or the policy changed.
    pub fn update(&self, reference: Option<B::Reference>, policy: FetchPolicy) -> Dispatch<B::Snapshot> {
        let changed = {
            let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
            let backend = &self.backend;
            let reference_changed = target
                .reference
                .update(reference, |a, b| backend.references_equal(a, b));
            let policy_changed = target.policy.replace(policy) != Some(policy);
            reference_changed || policy_changed
        };
        if !changed {
            return Dispatch::Unchanged;
        }
        self.issue()
    }

    /// Retry after a failure or to refresh a one-shot read.
    ///
    /// Returns `None` while loading, when retrying has no effect.
    pub fn retry(&self) -> Option<Dispatch<B::Snapshot>> {
        if self.policy().is_none() || !self.state.retry() {
            return None;
        }
        Some(self.issue())
    }

    /// Detach from the current reference
    pub fn stop(&self) {
        self.target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reference
            .update(None, |_, _| true);
        self.state.stop();
    }

    fn issue(&self) -> Dispatch<B::Snapshot> {
        let (reference, policy) = {
            let target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
            (target.reference.get().cloned(), target.policy.unwrap_or_default())
        };
        dispatch(&self.backend, reference.as_ref(), policy, &self.state)
    }
}
