//! Common types and aliases used throughout dioxus-backend-hooks

use std::sync::Arc;

/// Common trait bounds for values held by an async result state
pub trait ValueBounds: Send + Sync + 'static {}
impl<T> ValueBounds for T where T: Send + Sync + 'static {}

/// Common trait bounds for errors held by an async result state
pub trait ErrorBounds: Clone + Send + Sync + 'static {}
impl<T> ErrorBounds for T where T: Clone + Send + Sync + 'static {}

/// Common trait bounds for logical references
pub trait ReferenceBounds: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {}
impl<T> ReferenceBounds for T where T: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {}

/// Value-equality predicate used to suppress redundant updates
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;
