//! The contract this crate needs from a wrapped backend client.
//!
//! Implement [`Backend`] for a document store or realtime database client to
//! drive it through the fetch policies in [`crate::policy`].

use futures::{FutureExt, future::BoxFuture};

use crate::{
    aggregate::{AggregateData, AggregateSpec},
    children::{ChildEvent, ChildEventKind},
    errors::{BackendError, BackendResult},
    policy::{ListenOptions, Source},
    subscription::{Listener, Unsubscribe},
    types::ReferenceBounds,
};

/// Metadata every snapshot must expose
pub trait SnapshotMetadata: Send + Sync + 'static {
    /// True if the snapshot was served from the local cache
    fn from_cache(&self) -> bool;
}

/// Read and subscribe operations of a backend client
///
/// The client is shared as `Arc<Self>` and must be safe to call re-entrantly;
/// this crate never locks around it.
pub trait Backend: Send + Sync + 'static {
    /// Logical locator of data (path, query)
    type Reference: ReferenceBounds;
    /// Immutable point-in-time read of a reference
    type Snapshot: SnapshotMetadata;

    /// Read once from `source`.
    ///
    /// Fails with [`BackendError::SourceUnavailable`](crate::errors::BackendError::SourceUnavailable)
    /// when the source cannot satisfy the read.
    fn read_once(&self, reference: &Self::Reference, source: Source) -> BoxFuture<'static, BackendResult<Self::Snapshot>>;

    /// Open a live subscription.
    ///
    /// `listener.next` fires at least once when data is available and again on
    /// every change; `listener.error` fires at most once and ends the
    /// subscription.
    fn subscribe(
        &self,
        reference: &Self::Reference,
        options: ListenOptions,
        listener: Listener<Self::Snapshot>,
    ) -> Unsubscribe;

    /// Value equality of references, used to avoid restarting subscriptions
    fn references_equal(&self, a: &Self::Reference, b: &Self::Reference) -> bool {
        a == b
    }

    /// Value equality of snapshots, used to avoid redundant updates
    fn snapshots_equal(&self, a: &Self::Snapshot, b: &Self::Snapshot) -> bool;

    /// Run `spec` over the entries under `reference`, on the server.
    ///
    /// Backends without aggregate support keep this default, which fails with
    /// [`BackendError::Operation`].
    fn aggregate(
        &self,
        reference: &Self::Reference,
        spec: &AggregateSpec,
    ) -> BoxFuture<'static, BackendResult<AggregateData>> {
        let message = format!("aggregate queries are not supported for {reference:?} ({} fields)", spec.len());
        async move { Err(BackendError::Operation(message)) }.boxed()
    }

    /// Listen to one kind of child event under `reference`.
    ///
    /// Same contract as [`Backend::subscribe`]. The default reports
    /// [`BackendError::Subscription`] through the listener and returns a no-op
    /// handle.
    fn on_child_event(
        &self,
        reference: &Self::Reference,
        kind: ChildEventKind,
        listener: Listener<ChildEvent<Self::Snapshot>>,
    ) -> Unsubscribe {
        listener.error(BackendError::Subscription(format!(
            "{kind} events are not supported for {reference:?}"
        )));
        Unsubscribe::new(|| {})
    }
}
