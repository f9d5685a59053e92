//! Command-style operations over an async result state.
//!
//! A [`Callable`] exposes `{invoke(args), result, is_loading, error}`. Every
//! invocation starts a new generation, so the last invocation wins and the
//! previous result stays visible while a new one is in flight.

use std::{fmt, future::Future, sync::Arc};

use futures::{FutureExt, future::BoxFuture};

use crate::{
    async_state::{AsyncResultState, Settlement},
    errors::{BackendError, BackendResult},
    state::AsyncResult,
    types::ValueBounds,
};

type Invoker<A, R> = Arc<dyn Fn(A) -> BoxFuture<'static, BackendResult<R>> + Send + Sync>;
type ResultObserver<R> = Arc<dyn Fn(Result<&R, &BackendError>) + Send + Sync>;

/// Settlement of one invocation
pub type Invocation<R> = Settlement<R, BackendError, BoxFuture<'static, BackendResult<R>>>;

/// Wraps an async command with `{result, is_loading, error}` state
pub struct Callable<A, R> {
    state: AsyncResultState<R, BackendError>,
    invoker: Invoker<A, R>,
    on_result: Option<ResultObserver<R>>,
}

impl<A, R> Clone for Callable<A, R> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            invoker: self.invoker.clone(),
            on_result: self.on_result.clone(),
        }
    }
}

impl<A, R> fmt::Debug for Callable<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("state", &self.state)
            .field("on_result", &self.on_result.is_some())
            .finish()
    }
}

impl<A, R> Callable<A, R>
where
    A: Send + 'static,
    R: ValueBounds,
{
    pub fn new<F, Fut>(command: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BackendResult<R>> + Send + 'static,
    {
        Self {
            state: AsyncResultState::new(),
            invoker: Arc::new(move |args| command(args).boxed()),
            on_result: None,
        }
    }

    /// Observe the outcome of every invocation that completes before it is superseded
    pub fn on_result(mut self, observer: impl Fn(Result<&R, &BackendError>) + Send + Sync + 'static) -> Self {
        self.on_result = Some(Arc::new(observer));
        self
    }

    /// Start the command. The returned settlement must be polled for it to run.
    pub fn invoke(&self, args: A) -> Invocation<R> {
        let call = (self.invoker)(args);
        let call = match self.on_result.clone() {
            Some(observer) => async move {
                let outcome = call.await;
                observer(outcome.as_ref());
                outcome
            }
            .boxed(),
            None => call,
        };
        crate::debug_log!("📞 [CALLABLE] invoking");
        self.state.start_future(call)
    }

    pub fn result(&self) -> Option<Arc<R>> {
        self.state.value()
    }

    pub fn error(&self) -> Option<BackendError> {
        self.state.error()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn snapshot(&self) -> AsyncResult<R, BackendError> {
        self.state.snapshot()
    }

    pub fn state(&self) -> &AsyncResultState<R, BackendError> {
        &self.state
    }

    /// Forget the last result and ignore any invocation still in flight
    pub fn reset(&self) {
        self.state.stop();
    }
}
