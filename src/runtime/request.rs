//! One-shot read orchestration.

use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};

use crate::{backend::Backend, errors::BackendResult, policy::Source};

/// Build the read for a one-shot plan.
///
/// With a `fallback`, any failure of the primary read (miss or error alike)
/// is swallowed and the fallback source is read instead.
pub fn read_with_fallback<B: Backend>(
    backend: &Arc<B>,
    reference: &B::Reference,
    primary: Source,
    fallback: Option<Source>,
) -> BoxFuture<'static, BackendResult<B::Snapshot>> {
    let first = backend.read_once(reference, primary);
    let Some(fallback) = fallback else {
        crate::debug_log!("📥 [READ] {:?} from {}", reference, primary);
        return first;
    };

    let backend = backend.clone();
    let reference = reference.clone();
    async move {
        match first.await {
            Ok(snapshot) => Ok(snapshot),
            Err(error) => {
                crate::log_fallback!(
                    "{} read of {:?} failed ({}), reading from {}",
                    primary,
                    reference,
                    error,
                    fallback
                );
                backend.read_once(&reference, fallback).await
            }
        }
    }
    .boxed()
}
