//! Child-event hook.

use std::sync::Arc;

use dioxus::prelude::*;

use crate::{backend::Backend, children::ChildHandlers, runtime::ChildWatcher};

/// Call `handlers` for child events under `reference`.
///
/// The listeners move when the reference changes and are released on unmount.
/// `backend` and `handlers` are captured on the first render; handlers that
/// need fresh data should read it through signals.
pub fn use_child_events<B: Backend>(
    backend: Arc<B>,
    reference: Option<B::Reference>,
    handlers: ChildHandlers<B::Snapshot>,
) -> ChildWatcher<B> {
    let watcher = use_hook(|| ChildWatcher::new(backend, handlers));

    let driver = watcher.clone();
    let _listen_memo = use_memo(use_reactive!(|reference| {
        driver.update(reference);
    }));

    watcher
}
