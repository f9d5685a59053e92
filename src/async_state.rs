//! # Generation-tagged async result state
//!
//! [`AsyncResultState`] owns the `{value, error, is_loading}` triple behind a
//! hidden generation counter. Every operation started on it receives a
//! [`Resolver`] tagged with the generation it belongs to; once a newer
//! generation starts (or the state is stopped, retried, or dropped) that
//! resolver can no longer touch the visible state. The last operation started
//! wins, whatever order the results arrive in.
//!
//! The container performs no I/O. Callback-based operations are started with
//! [`AsyncResultState::start`]; future-based ones with
//! [`AsyncResultState::start_future`], which hands back a [`Settlement`] the
//! caller spawns on whatever executor it uses.
//!
//! ## Example
//!
//! ```rust
//! use dioxus_backend_hooks::async_state::AsyncResultState;
//!
//! let state: AsyncResultState<u32, String> = AsyncResultState::new();
//! state.start(|resolver| {
//!     resolver.resolve(42);
//!     None
//! });
//! assert_eq!(state.value().as_deref(), Some(&42));
//! assert!(!state.is_loading());
//! ```

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    task::{Context, Poll},
};

use futures::future::{AbortHandle, Abortable};
use tokio::sync::watch;

use crate::{
    state::{AsyncResult, Phase},
    subscription::Unsubscribe,
    types::{Comparator, ErrorBounds, ValueBounds},
};

/// Configuration for an [`AsyncResultState`]
pub struct AsyncStateConfig<T> {
    comparator: Option<Comparator<T>>,
    retain_value_on_error: bool,
    initial_value: Option<Arc<T>>,
}

impl<T> AsyncStateConfig<T> {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self {
            comparator: None,
            retain_value_on_error: true,
            initial_value: None,
        }
    }

    /// Suppress updates whose value equals the current one.
    ///
    /// The comparator runs while the state is locked and must not call back
    /// into the state.
    pub fn with_comparator(mut self, comparator: impl Fn(&T, &T) -> bool + Send + Sync + 'static) -> Self {
        self.comparator = Some(Arc::new(comparator));
        self
    }

    /// Use a shared comparator
    pub fn with_shared_comparator(mut self, comparator: Comparator<T>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    /// Clear the held value when an operation fails instead of keeping it visible
    pub fn clear_value_on_error(mut self) -> Self {
        self.retain_value_on_error = false;
        self
    }

    /// Start with a value already visible
    pub fn with_initial_value(mut self, value: T) -> Self {
        self.initial_value = Some(Arc::new(value));
        self
    }
}

impl<T> Default for AsyncStateConfig<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AsyncStateConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncStateConfig")
            .field("comparator", &self.comparator.is_some())
            .field("retain_value_on_error", &self.retain_value_on_error)
            .field("initial_value", &self.initial_value.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct Control {
    /// Generation allowed to mutate visible state; `None` after `stop`
    current: Option<u64>,
    /// Highest generation handed out so far
    issued: u64,
    retries: u64,
    cancel: Option<Unsubscribe>,
}

struct Shared<T, E> {
    control: Mutex<Control>,
    visible: watch::Sender<AsyncResult<T, E>>,
    comparator: Option<Comparator<T>>,
    retain_value_on_error: bool,
}

impl<T, E> Shared<T, E> {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, generation: u64, outcome: Result<T, E>) -> bool {
        let control = self.lock();
        if control.current != Some(generation) {
            crate::log_stale_dropped!(
                "generation {} settled after being superseded (current: {:?})",
                generation,
                control.current
            );
            return false;
        }

        match outcome {
            Ok(value) => {
                let comparator = self.comparator.as_ref();
                self.visible.send_if_modified(|state| {
                    let unchanged = match (&state.value, comparator) {
                        (Some(current), Some(equal)) => equal(&**current, &value),
                        _ => false,
                    };
                    let mut modified = state.is_loading || state.error.is_some();
                    if !unchanged {
                        state.value = Some(Arc::new(value));
                        modified = true;
                    }
                    state.is_loading = false;
                    state.error = None;
                    modified
                });
                crate::log_settled!("generation {} resolved", generation);
            }
            Err(error) => {
                let retain = self.retain_value_on_error;
                self.visible.send_modify(|state| {
                    state.error = Some(error);
                    state.is_loading = false;
                    if !retain {
                        state.value = None;
                    }
                });
                crate::log_settled!("generation {} rejected", generation);
            }
        }
        true
    }
}

impl<T, E> Drop for Shared<T, E> {
    fn drop(&mut self) {
        let cancel = self
            .control
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel
            .take();
        if let Some(cancel) = cancel {
            crate::log_unsubscribe!("state dropped, releasing outstanding operation");
            cancel.unsubscribe();
        }
    }
}

/// Holder of `{value, error, is_loading}` where exactly one operation is authoritative
///
/// Cloning yields another handle to the same state. The operation in flight is
/// released when the last handle is dropped.
pub struct AsyncResultState<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for AsyncResultState<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> fmt::Debug for AsyncResultState<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control = self.shared.lock();
        let visible = self.shared.visible.borrow();
        f.debug_struct("AsyncResultState")
            .field("current", &control.current)
            .field("retries", &control.retries)
            .field("is_loading", &visible.is_loading)
            .field("has_value", &visible.value.is_some())
            .field("has_error", &visible.error.is_some())
            .finish()
    }
}

impl<T, E> Default for AsyncResultState<T, E>
where
    T: ValueBounds,
    E: ErrorBounds,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> AsyncResultState<T, E>
where
    T: ValueBounds,
    E: ErrorBounds,
{
    /// Create an idle state with default configuration
    pub fn new() -> Self {
        Self::with_config(AsyncStateConfig::default())
    }

    pub fn with_config(config: AsyncStateConfig<T>) -> Self {
        let initial = AsyncResult {
            value: config.initial_value,
            error: None,
            is_loading: false,
        };
        let (visible, _) = watch::channel(initial);
        Self {
            shared: Arc::new(Shared {
                control: Mutex::new(Control::default()),
                visible,
                comparator: config.comparator,
                retain_value_on_error: config.retain_value_on_error,
            }),
        }
    }

    /// Copy of the visible state
    pub fn snapshot(&self) -> AsyncResult<T, E> {
        self.shared.visible.borrow().clone()
    }

    pub fn value(&self) -> Option<Arc<T>> {
        self.shared.visible.borrow().value.clone()
    }

    pub fn error(&self) -> Option<E> {
        self.shared.visible.borrow().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.visible.borrow().is_loading
    }

    pub fn phase(&self) -> Phase {
        self.shared.visible.borrow().phase()
    }

    /// Number of retries that took effect
    pub fn retries(&self) -> u64 {
        self.shared.lock().retries
    }

    /// Watch the visible state. The receiver is notified on every visible change.
    pub fn subscribe(&self) -> watch::Receiver<AsyncResult<T, E>> {
        self.shared.visible.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> Option<u64> {
        self.shared.lock().current
    }

    /// Start a callback-driven operation.
    ///
    /// `operation` receives the resolver of the new generation and may return a
    /// cancellation handle, which is released when the generation is
    /// superseded, stopped or dropped. It may settle synchronously.
    pub fn start<F>(&self, operation: F)
    where
        F: FnOnce(Resolver<T, E>) -> Option<Unsubscribe>,
    {
        let resolver = self.begin();
        let generation = resolver.generation;
        if let Some(cancel) = operation(resolver) {
            self.attach(generation, cancel);
        }
    }

    /// Start a future-driven operation.
    ///
    /// The output of `future` is applied as an implicit resolve or reject. The
    /// returned [`Settlement`] does nothing until polled; superseding the
    /// generation aborts it.
    pub fn start_future<Fut>(&self, future: Fut) -> Settlement<T, E, Fut>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let resolver = self.begin();
        let (handle, registration) = AbortHandle::new_pair();
        self.attach(resolver.generation, Unsubscribe::new(move || handle.abort()));
        Settlement {
            future: Box::pin(Abortable::new(future, registration)),
            resolver: Some(resolver),
        }
    }

    /// Detach from any source: clear value and error, stop loading, and fence
    /// off every outstanding resolver.
    pub fn stop(&self) {
        let cancel = {
            let mut control = self.shared.lock();
            control.current = None;
            self.shared.visible.send_if_modified(|state| {
                let modified = state.is_loading || state.value.is_some() || state.error.is_some();
                *state = AsyncResult::idle();
                modified
            });
            control.cancel.take()
        };
        crate::debug_log!("⏹️ [STOP] async state stopped");
        if let Some(cancel) = cancel {
            cancel.unsubscribe();
        }
    }

    /// Invalidate the current generation and clear the error so the owner can
    /// re-issue the operation.
    ///
    /// Does nothing and returns `false` while loading.
    pub fn retry(&self) -> bool {
        let cancel = {
            let mut control = self.shared.lock();
            if self.shared.visible.borrow().is_loading {
                crate::debug_log!("🔁 [RETRY] ignored while loading");
                return false;
            }
            control.issued += 1;
            control.current = Some(control.issued);
            control.retries += 1;
            self.shared.visible.send_modify(|state| state.error = None);
            crate::debug_log!("🔁 [RETRY] retry #{} requested", control.retries);
            control.cancel.take()
        };
        if let Some(cancel) = cancel {
            cancel.unsubscribe();
        }
        true
    }

    fn begin(&self) -> Resolver<T, E> {
        let (generation, previous) = {
            let mut control = self.shared.lock();
            control.issued += 1;
            let generation = control.issued;
            control.current = Some(generation);
            self.shared.visible.send_if_modified(|state| {
                let modified = !state.is_loading;
                state.is_loading = true;
                modified
            });
            (generation, control.cancel.take())
        };
        crate::log_generation_start!("generation {} started", generation);
        if let Some(previous) = previous {
            crate::log_unsubscribe!("generation {} supersedes an outstanding operation", generation);
            previous.unsubscribe();
        }
        Resolver {
            shared: Arc::downgrade(&self.shared),
            generation,
        }
    }

    fn attach(&self, generation: u64, cancel: Unsubscribe) {
        let stale = {
            let mut control = self.shared.lock();
            if control.current == Some(generation) {
                control.cancel.replace(cancel)
            } else {
                Some(cancel)
            }
        };
        if let Some(stale) = stale {
            stale.unsubscribe();
        }
    }
}

/// Generation-tagged settle callbacks handed to an operation
///
/// Calls made after the generation was superseded, or after the state was
/// dropped, are ignored.
pub struct Resolver<T, E> {
    shared: Weak<Shared<T, E>>,
    generation: u64,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            generation: self.generation,
        }
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T, E> Resolver<T, E> {
    /// Apply a value. Returns true if it reached the visible state.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Apply an error. Returns true if it reached the visible state.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    pub fn settle(&self, outcome: Result<T, E>) -> bool {
        match self.shared.upgrade() {
            Some(shared) => shared.settle(self.generation, outcome),
            None => {
                crate::log_stale_dropped!(
                    "generation {} settled after its state was dropped",
                    self.generation
                );
                false
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true while this resolver's generation is still authoritative
    pub fn is_current(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.lock().current == Some(self.generation))
    }
}

/// Future driving an operation started with [`AsyncResultState::start_future`]
#[must_use = "the operation only runs while its settlement is polled"]
pub struct Settlement<T, E, Fut> {
    future: Pin<Box<Abortable<Fut>>>,
    resolver: Option<Resolver<T, E>>,
}

impl<T, E, Fut> Settlement<T, E, Fut> {
    pub fn generation(&self) -> Option<u64> {
        self.resolver.as_ref().map(Resolver::generation)
    }
}

impl<T, E, Fut> Future for Settlement<T, E, Fut>
where
    Fut: Future<Output = Result<T, E>>,
{
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let outcome = match self.future.as_mut().poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(outcome) => outcome,
        };
        if let Some(resolver) = self.resolver.take() {
            match outcome {
                Ok(result) => {
                    resolver.settle(result);
                }
                Err(_aborted) => {
                    crate::log_stale_dropped!(
                        "generation {} aborted before settling",
                        resolver.generation
                    );
                }
            }
        }
        Poll::Ready(())
    }
}

impl<T, E, Fut> fmt::Debug for Settlement<T, E, Fut> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settlement")
            .field("generation", &self.generation())
            .finish()
    }
}
