//! Child events of a realtime-database location.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::errors::BackendError;

/// Which change to a child an event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChildEventKind {
    Added,
    Changed,
    Moved,
    Removed,
}

impl ChildEventKind {
    pub const ALL: [ChildEventKind; 4] = [
        ChildEventKind::Added,
        ChildEventKind::Changed,
        ChildEventKind::Moved,
        ChildEventKind::Removed,
    ];
}

impl fmt::Display for ChildEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChildEventKind::Added => "child_added",
            ChildEventKind::Changed => "child_changed",
            ChildEventKind::Moved => "child_moved",
            ChildEventKind::Removed => "child_removed",
        })
    }
}

/// One child event
#[derive(Debug, Clone, PartialEq)]
pub struct ChildEvent<S> {
    pub kind: ChildEventKind,
    pub snapshot: S,
    /// Key of the sibling now ordered before this child. Always `None` for removals.
    pub previous_child: Option<String>,
}

/// Callback for one kind of child event
pub type ChildHandler<S> = Arc<dyn Fn(ChildEvent<S>) + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(BackendError) + Send + Sync>;

/// Callbacks for the child events of interest
///
/// Only kinds with a handler are subscribed.
pub struct ChildHandlers<S> {
    added: Option<ChildHandler<S>>,
    changed: Option<ChildHandler<S>>,
    moved: Option<ChildHandler<S>>,
    removed: Option<ChildHandler<S>>,
    error: Option<ErrorHandler>,
}

impl<S> Default for ChildHandlers<S> {
    fn default() -> Self {
        Self {
            added: None,
            changed: None,
            moved: None,
            removed: None,
            error: None,
        }
    }
}

impl<S> Clone for ChildHandlers<S> {
    fn clone(&self) -> Self {
        Self {
            added: self.added.clone(),
            changed: self.changed.clone(),
            moved: self.moved.clone(),
            removed: self.removed.clone(),
            error: self.error.clone(),
        }
    }
}

impl<S> fmt::Debug for ChildHandlers<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildHandlers")
            .field("kinds", &self.kinds().collect::<Vec<_>>())
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl<S> ChildHandlers<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_added(self, handler: impl Fn(ChildEvent<S>) + Send + Sync + 'static) -> Self {
        self.on(ChildEventKind::Added, handler)
    }

    pub fn on_changed(self, handler: impl Fn(ChildEvent<S>) + Send + Sync + 'static) -> Self {
        self.on(ChildEventKind::Changed, handler)
    }

    pub fn on_moved(self, handler: impl Fn(ChildEvent<S>) + Send + Sync + 'static) -> Self {
        self.on(ChildEventKind::Moved, handler)
    }

    pub fn on_removed(self, handler: impl Fn(ChildEvent<S>) + Send + Sync + 'static) -> Self {
        self.on(ChildEventKind::Removed, handler)
    }

    /// Set the handler for `kind`, replacing any previous one
    pub fn on(mut self, kind: ChildEventKind, handler: impl Fn(ChildEvent<S>) + Send + Sync + 'static) -> Self {
        let handler: ChildHandler<S> = Arc::new(handler);
        match kind {
            ChildEventKind::Added => self.added = Some(handler),
            ChildEventKind::Changed => self.changed = Some(handler),
            ChildEventKind::Moved => self.moved = Some(handler),
            ChildEventKind::Removed => self.removed = Some(handler),
        }
        self
    }

    /// Receives subscription failures; without one they are only logged
    pub fn on_error(mut self, handler: impl Fn(BackendError) + Send + Sync + 'static) -> Self {
        self.error = Some(Arc::new(handler));
        self
    }

    pub fn handler(&self, kind: ChildEventKind) -> Option<&ChildHandler<S>> {
        match kind {
            ChildEventKind::Added => self.added.as_ref(),
            ChildEventKind::Changed => self.changed.as_ref(),
            ChildEventKind::Moved => self.moved.as_ref(),
            ChildEventKind::Removed => self.removed.as_ref(),
        }
    }

    pub(crate) fn error_handler(&self) -> Option<&ErrorHandler> {
        self.error.as_ref()
    }

    /// Kinds that have a handler, in [`ChildEventKind::ALL`] order
    pub fn kinds(&self) -> impl Iterator<Item = ChildEventKind> + '_ {
        ChildEventKind::ALL
            .into_iter()
            .filter(|kind| self.handler(*kind).is_some())
    }
}
