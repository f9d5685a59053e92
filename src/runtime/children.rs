//! Child-event subscriptions.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    backend::Backend,
    children::{ChildEvent, ChildHandlers},
    errors::BackendError,
    memo::Distinct,
    subscription::{Listener, Unsubscribe},
};

/// Subscribe every kind in `handlers` under `reference`.
///
/// The returned handle releases all of them.
pub fn listen_children<B: Backend>(
    backend: &B,
    reference: &B::Reference,
    handlers: &ChildHandlers<B::Snapshot>,
) -> Unsubscribe {
    let handles: Vec<Unsubscribe> = handlers
        .kinds()
        .filter_map(|kind| {
            let handler = handlers.handler(kind)?.clone();
            let on_error = handlers.error_handler().cloned();
            crate::log_subscribe!("{:?} ({})", reference, kind);
            let listener = Listener::new(
                move |event: ChildEvent<B::Snapshot>| handler(event),
                move |error: BackendError| match &on_error {
                    Some(on_error) => on_error(error),
                    None => {
                        crate::debug_log!("⚠️ [CHILDREN] {} listener failed: {}", kind, error);
                    }
                },
            );
            Some(backend.on_child_event(reference, kind, listener))
        })
        .collect();
    Unsubscribe::new(move || {
        crate::log_unsubscribe!("releasing {} child listeners", handles.len());
        handles.iter().for_each(Unsubscribe::unsubscribe);
    })
}

struct ChildWatch<R> {
    reference: Distinct<R>,
    active: Option<Unsubscribe>,
}

impl<R> Drop for ChildWatch<R> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.unsubscribe();
        }
    }
}

/// Keeps child listeners on the current reference
///
/// Handlers are fixed at construction. The listeners are released when the
/// reference changes, on [`ChildWatcher::stop`], and when the last clone is
/// dropped.
pub struct ChildWatcher<B: Backend> {
    backend: Arc<B>,
    handlers: ChildHandlers<B::Snapshot>,
    watch: Arc<Mutex<ChildWatch<B::Reference>>>,
}

impl<B: Backend> Clone for ChildWatcher<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            handlers: self.handlers.clone(),
            watch: self.watch.clone(),
        }
    }
}

impl<B: Backend> ChildWatcher<B> {
    pub fn new(backend: Arc<B>, handlers: ChildHandlers<B::Snapshot>) -> Self {
        Self {
            backend,
            handlers,
            watch: Arc::new(Mutex::new(ChildWatch {
                reference: Distinct::new(),
                active: None,
            })),
        }
    }

    /// Move the listeners to `reference`. Returns true if they were restarted.
    ///
    /// `None` releases them without opening new ones.
    pub fn update(&self, reference: Option<B::Reference>) -> bool {
        let (previous, next) = {
            let mut watch = self.watch.lock().unwrap_or_else(PoisonError::into_inner);
            let backend = &self.backend;
            if !watch
                .reference
                .update(reference, |a, b| backend.references_equal(a, b))
            {
                return false;
            }
            (watch.active.take(), watch.reference.get().cloned())
        };
        if let Some(previous) = previous {
            previous.unsubscribe();
        }
        if let Some(reference) = next {
            let opened = listen_children(&*self.backend, &reference, &self.handlers);
            let replaced = self
                .watch
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .active
                .replace(opened);
            if let Some(replaced) = replaced {
                replaced.unsubscribe();
            }
        }
        true
    }

    /// Release the listeners and forget the reference
    pub fn stop(&self) {
        let active = {
            let mut watch = self.watch.lock().unwrap_or_else(PoisonError::into_inner);
            watch.reference.update(None, |_, _| true);
            watch.active.take()
        };
        if let Some(active) = active {
            active.unsubscribe();
        }
    }

    pub fn is_listening(&self) -> bool {
        self.watch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .is_some()
    }
}
