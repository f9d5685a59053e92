//! State: the visible snapshot of an async result
//!
//! This module provides the [`AsyncResult`] snapshot, its derived [`Phase`],
//! and the [`AsyncState`] trait for code generic over result snapshots.

use std::sync::Arc;

/// Common trait for async state types that represent loading, success, and error states
pub trait AsyncState {
    /// The type of successful data
    type Data;
    /// The type of error
    type Error;

    /// Returns true if the state is currently loading
    fn is_loading(&self) -> bool;

    /// Returns true if the state holds data and no error
    fn is_success(&self) -> bool;

    /// Returns true if the state contains an error
    fn is_error(&self) -> bool;

    /// Returns the data if any, including stale data kept across a refresh
    fn data(&self) -> Option<&Self::Data>;

    /// Returns the error if failed, None otherwise
    fn error(&self) -> Option<&Self::Error>;
}

/// Where an async result currently sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing started, or stopped
    Idle,
    /// The current generation has not settled
    Loading,
    /// The current generation produced a value
    Resolved,
    /// The current generation produced an error
    Rejected,
}

/// Point-in-time view of `{value, error, is_loading}`
///
/// `value` is shared behind an [`Arc`] so an update suppressed by a comparator
/// keeps the identity of the previous value.
#[derive(Debug)]
pub struct AsyncResult<T, E> {
    pub value: Option<Arc<T>>,
    pub error: Option<E>,
    pub is_loading: bool,
}

impl<T, E> AsyncResult<T, E> {
    /// The empty, not-loading state
    pub fn idle() -> Self {
        Self {
            value: None,
            error: None,
            is_loading: false,
        }
    }

    /// Derive the lifecycle phase from the visible fields
    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Rejected
        } else if self.value.is_some() {
            Phase::Resolved
        } else {
            Phase::Idle
        }
    }

    /// Returns the shared value handle, if any
    pub fn value(&self) -> Option<&Arc<T>> {
        self.value.as_ref()
    }

    /// Maps the value, keeping error and loading flag
    pub fn map<U, F>(&self, op: F) -> AsyncResult<U, E>
    where
        F: FnOnce(&T) -> U,
        E: Clone,
    {
        AsyncResult {
            value: self.value.as_deref().map(op).map(Arc::new),
            error: self.error.clone(),
            is_loading: self.is_loading,
        }
    }
}

impl<T, E: Clone> Clone for AsyncResult<T, E> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            error: self.error.clone(),
            is_loading: self.is_loading,
        }
    }
}

impl<T, E> Default for AsyncResult<T, E> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T: PartialEq, E: PartialEq> PartialEq for AsyncResult<T, E> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.error == other.error && self.is_loading == other.is_loading
    }
}

impl<T, E> AsyncState for AsyncResult<T, E> {
    type Data = T;
    type Error = E;

    fn is_loading(&self) -> bool {
        self.is_loading
    }

    fn is_success(&self) -> bool {
        !self.is_loading && self.error.is_none() && self.value.is_some()
    }

    fn is_error(&self) -> bool {
        self.error.is_some()
    }

    fn data(&self) -> Option<&T> {
        self.value.as_deref()
    }

    fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }
}
