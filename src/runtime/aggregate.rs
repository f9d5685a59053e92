//! Aggregate reads driven like one-shot fetches.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    aggregate::{AggregateData, AggregateSpec},
    async_state::{AsyncResultState, AsyncStateConfig},
    backend::Backend,
    errors::BackendError,
    memo::Distinct,
    state::AsyncResult,
};

use super::Dispatch;

struct AggregateTarget<R> {
    reference: Distinct<R>,
    spec: Option<AggregateSpec>,
}

/// A backend, a reference, the aggregations to run and the state they feed
///
/// Cloning yields another handle to the same aggregator.
pub struct Aggregator<B: Backend> {
    backend: Arc<B>,
    state: AsyncResultState<AggregateData, BackendError>,
    target: Arc<Mutex<AggregateTarget<B::Reference>>>,
}

impl<B: Backend> Clone for Aggregator<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            state: self.state.clone(),
            target: self.target.clone(),
        }
    }
}

impl<B: Backend> Aggregator<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: AsyncResultState::with_config(AsyncStateConfig::new().with_comparator(|a, b| a == b)),
            target: Arc::new(Mutex::new(AggregateTarget {
                reference: Distinct::new(),
                spec: None,
            })),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn state(&self) -> &AsyncResultState<AggregateData, BackendError> {
        &self.state
    }

    pub fn snapshot(&self) -> AsyncResult<AggregateData, BackendError> {
        self.state.snapshot()
    }

    /// Aggregate `spec` over `reference`.
    ///
    /// Re-reads only when the reference or the spec changed. An absent
    /// reference stops the state.
    pub fn update(&self, reference: Option<B::Reference>, spec: AggregateSpec) -> Dispatch<AggregateData> {
        let changed = {
            let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
            let backend = &self.backend;
            let reference_changed = target
                .reference
                .update(reference, |a, b| backend.references_equal(a, b));
            let spec_changed = target.spec.as_ref() != Some(&spec);
            target.spec = Some(spec);
            reference_changed || spec_changed
        };
        if !changed {
            return Dispatch::Unchanged;
        }
        self.issue()
    }

    /// Read again. Returns `None` while loading or before the first update.
    pub fn retry(&self) -> Option<Dispatch<AggregateData>> {
        let has_spec = self
            .target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .spec
            .is_some();
        if !has_spec || !self.state.retry() {
            return None;
        }
        Some(self.issue())
    }

    fn issue(&self) -> Dispatch<AggregateData> {
        let (reference, spec) = {
            let target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
            (target.reference.get().cloned(), target.spec.clone().unwrap_or_default())
        };
        let Some(reference) = reference else {
            crate::debug_log!("⏹️ [AGGREGATE] no reference, stopping");
            self.state.stop();
            return Dispatch::Stopped;
        };
        crate::debug_log!("🧮 [AGGREGATE] {:?} over {} fields", reference, spec.len());
        Dispatch::Fetching(self.state.start_future(self.backend.aggregate(&reference, &spec)))
    }
}
