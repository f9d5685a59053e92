//! Subscription wiring between a backend and an async result state.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    async_state::AsyncResultState,
    backend::{Backend, SnapshotMetadata},
    errors::BackendError,
    policy::ListenOptions,
    subscription::{Listener, Unsubscribe},
};

/// Start a generation backed by a live subscription.
///
/// Every snapshot resolves and an error rejects. With `until_server` the
/// subscription releases itself after the first snapshot that did not come
/// from the cache, and nothing delivered afterwards reaches the state, errors
/// included.
pub fn open_subscription<B: Backend>(
    backend: &Arc<B>,
    reference: &B::Reference,
    options: ListenOptions,
    until_server: bool,
    state: &AsyncResultState<B::Snapshot, BackendError>,
) {
    state.start(|resolver| {
        crate::log_subscribe!(
            "{:?} (metadata: {}, source: {:?}, until server: {})",
            reference,
            options.include_metadata_changes,
            options.source,
            until_server
        );

        let handle = Unsubscribe::deferred();
        let finished = Arc::new(AtomicBool::new(false));

        let on_next = {
            let resolver = resolver.clone();
            let handle = handle.clone();
            let finished = finished.clone();
            move |snapshot: B::Snapshot| {
                if finished.load(Ordering::SeqCst) {
                    return;
                }
                let from_server = !snapshot.from_cache();
                resolver.resolve(snapshot);
                if until_server && from_server && !finished.swap(true, Ordering::SeqCst) {
                    crate::log_unsubscribe!("server snapshot arrived, closing cache-and-server subscription");
                    handle.unsubscribe();
                }
            }
        };
        let on_error = move |error: BackendError| {
            if finished.load(Ordering::SeqCst) {
                return;
            }
            resolver.reject(error);
        };

        let unsubscribe = backend.subscribe(reference, options, Listener::new(on_next, on_error));
        handle.arm(move || unsubscribe.unsubscribe());
        Some(handle)
    });
}
