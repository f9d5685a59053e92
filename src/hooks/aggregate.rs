//! Aggregate read hooks.

use std::sync::Arc;

use dioxus::prelude::*;

use crate::{
    aggregate::{AggregateData, AggregateSpec},
    backend::Backend,
    errors::BackendError,
    runtime::Aggregator,
    state::AsyncResult,
};

use super::{fetch::drive, mirror::use_mirror};

/// Handle returned by [`use_aggregate`] and [`use_count`]
pub struct UseAggregate<B: Backend> {
    aggregator: Aggregator<B>,
    state: Signal<AsyncResult<AggregateData, BackendError>>,
}

impl<B: Backend> Clone for UseAggregate<B> {
    fn clone(&self) -> Self {
        Self {
            aggregator: self.aggregator.clone(),
            state: self.state,
        }
    }
}

impl<B: Backend> PartialEq for UseAggregate<B> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl<B: Backend> UseAggregate<B> {
    pub fn state(&self) -> Signal<AsyncResult<AggregateData, BackendError>> {
        self.state
    }

    pub fn value(&self) -> Option<Arc<AggregateData>> {
        self.state.read().value.clone()
    }

    /// Shorthand for the count of a [`use_count`] read
    pub fn count(&self) -> Option<u64> {
        self.state.read().value.as_ref().and_then(|data| data.count())
    }

    pub fn error(&self) -> Option<BackendError> {
        self.state.read().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    pub fn aggregator(&self) -> &Aggregator<B> {
        &self.aggregator
    }

    /// Read again. Ignored while loading.
    pub fn retry(&self) {
        if let Some(dispatch) = self.aggregator.retry() {
            drive(dispatch);
        }
    }
}

/// Run `spec` over `reference` on the server.
///
/// Re-reads when the reference or the spec changes. Like [`use_fetch`](super::use_fetch),
/// `backend` is captured on the first render only.
pub fn use_aggregate<B: Backend>(
    backend: Arc<B>,
    reference: Option<B::Reference>,
    spec: AggregateSpec,
) -> UseAggregate<B> {
    let aggregator = use_hook(|| Aggregator::new(backend));
    let state = use_mirror(aggregator.state());

    let driver = aggregator.clone();
    let _dispatch_memo = use_memo(use_reactive!(|(reference, spec)| {
        drive(driver.update(reference, spec));
    }));

    UseAggregate { aggregator, state }
}

/// Count the entries under `reference`
pub fn use_count<B: Backend>(backend: Arc<B>, reference: Option<B::Reference>) -> UseAggregate<B> {
    use_aggregate(backend, reference, AggregateSpec::count())
}
