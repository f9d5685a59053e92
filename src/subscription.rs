//! Subscription plumbing shared by the backend traits and the state container.
//!
//! [`Unsubscribe`] is an idempotent, cloneable teardown handle. It can be created
//! empty and armed later, which lets a listener tear down its own subscription
//! even when the backend delivers events before `subscribe` has returned.

use std::{
    fmt,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::errors::BackendError;

type Teardown = Box<dyn FnOnce() + Send>;

enum Slot {
    Waiting,
    Armed(Teardown),
    Released,
}

/// Cancellation handle for a subscription or an in-flight operation
#[derive(Clone)]
pub struct Unsubscribe {
    slot: Arc<Mutex<Slot>>,
}

impl Unsubscribe {
    /// Wrap a teardown closure
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Armed(Box::new(teardown)))),
        }
    }

    /// A handle with no teardown yet; see [`Unsubscribe::arm`]
    pub fn deferred() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Waiting)),
        }
    }

    /// Install the teardown of a deferred handle.
    ///
    /// If the handle was already released the teardown runs immediately.
    pub fn arm(&self, teardown: impl FnOnce() + Send + 'static) {
        let teardown: Teardown = Box::new(teardown);
        let run_now = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match std::mem::replace(&mut *slot, Slot::Waiting) {
                Slot::Released => {
                    *slot = Slot::Released;
                    Some(teardown)
                }
                Slot::Waiting => {
                    *slot = Slot::Armed(teardown);
                    None
                }
                Slot::Armed(previous) => {
                    *slot = Slot::Armed(teardown);
                    Some(previous)
                }
            }
        };
        if let Some(teardown) = run_now {
            teardown();
        }
    }

    /// Run the teardown at most once. Later calls do nothing.
    pub fn unsubscribe(&self) {
        let teardown = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match std::mem::replace(&mut *slot, Slot::Released) {
                Slot::Armed(teardown) => Some(teardown),
                Slot::Waiting | Slot::Released => None,
            }
        };
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    /// Returns true once [`Unsubscribe::unsubscribe`] has been called
    pub fn is_released(&self) -> bool {
        matches!(
            &*self.slot.lock().unwrap_or_else(PoisonError::into_inner),
            Slot::Released
        )
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.slot.lock().unwrap_or_else(PoisonError::into_inner) {
            Slot::Waiting => "waiting",
            Slot::Armed(_) => "armed",
            Slot::Released => "released",
        };
        f.debug_struct("Unsubscribe").field("state", &state).finish()
    }
}

/// Event sink handed to a backend subscription
///
/// The backend calls [`Listener::next`] for every update and [`Listener::error`]
/// at most once. An error closes the listener; anything delivered afterwards is
/// ignored.
pub struct Listener<T> {
    on_next: Arc<dyn Fn(T) + Send + Sync>,
    on_error: Arc<dyn Fn(BackendError) + Send + Sync>,
    closed: Arc<AtomicBool>,
}

impl<T> Listener<T> {
    pub fn new(
        on_next: impl Fn(T) + Send + Sync + 'static,
        on_error: impl Fn(BackendError) + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_next: Arc::new(on_next),
            on_error: Arc::new(on_error),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Deliver an update
    pub fn next(&self, value: T) {
        if !self.is_closed() {
            (self.on_next)(value);
        }
    }

    /// Deliver the terminal error
    pub fn error(&self, error: BackendError) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            (self.on_error)(error);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            on_next: self.on_next.clone(),
            on_error: self.on_error.clone(),
            closed: self.closed.clone(),
        }
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("closed", &self.is_closed())
            .finish()
    }
}
