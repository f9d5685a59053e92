//! Context-provided backend handles.
//!
//! Provide a client once near the root with [`use_backend_provider`] and pick
//! it up anywhere below with [`use_backend`].

use std::sync::Arc;

use dioxus::prelude::*;

/// Context entry wrapping a shared backend client
pub struct BackendContext<B>(pub Arc<B>);

impl<B> Clone for BackendContext<B> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Provide `B` to every descendant. `init` runs once.
pub fn use_backend_provider<B: Send + Sync + 'static>(init: impl FnOnce() -> B) -> Arc<B> {
    use_context_provider(|| {
        crate::debug_log!("🔌 [CONTEXT] providing {}", std::any::type_name::<B>());
        BackendContext(Arc::new(init()))
    })
    .0
}

/// The nearest `B` provided by an ancestor.
///
/// # Panics
///
/// Panics if no ancestor provided a `B`; see [`try_use_backend`].
pub fn use_backend<B: Send + Sync + 'static>() -> Arc<B> {
    use_context::<BackendContext<B>>().0
}

pub fn try_use_backend<B: Send + Sync + 'static>() -> Option<Arc<B>> {
    try_use_context::<BackendContext<B>>().map(|context| context.0)
}
