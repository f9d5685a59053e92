//! Command hook.

use std::sync::Arc;

use dioxus::prelude::*;

use crate::{
    callable::{Callable, Invocation},
    errors::BackendError,
    state::AsyncResult,
    types::ValueBounds,
};

use super::mirror::use_mirror;

/// Handle returned by [`use_callable`]
pub struct UseCallable<A, R> {
    callable: Callable<A, R>,
    state: Signal<AsyncResult<R, BackendError>>,
}

impl<A, R> Clone for UseCallable<A, R> {
    fn clone(&self) -> Self {
        Self {
            callable: self.callable.clone(),
            state: self.state,
        }
    }
}

impl<A, R> UseCallable<A, R>
where
    A: Send + 'static,
    R: ValueBounds,
{
    /// Run the command on the component's task scope
    pub fn invoke(&self, args: A) {
        spawn(self.callable.invoke(args));
    }

    /// Start the command and hand back its settlement instead of spawning it
    pub fn invoke_async(&self, args: A) -> Invocation<R> {
        self.callable.invoke(args)
    }

    pub fn state(&self) -> Signal<AsyncResult<R, BackendError>> {
        self.state
    }

    pub fn result(&self) -> Option<Arc<R>> {
        self.state.read().value.clone()
    }

    pub fn error(&self) -> Option<BackendError> {
        self.state.read().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    pub fn reset(&self) {
        self.callable.reset();
    }
}

/// Keep a [`Callable`] for the lifetime of the component.
///
/// `init` runs once, on first render.
pub fn use_callable<A, R>(init: impl FnOnce() -> Callable<A, R>) -> UseCallable<A, R>
where
    A: Send + 'static,
    R: ValueBounds,
{
    let callable = use_hook(init);
    let state = use_mirror(callable.state());
    UseCallable { callable, state }
}
