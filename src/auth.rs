//! Authentication state and auth-aware commands.

use std::{future::Future, sync::Arc};

use futures::future::BoxFuture;

use crate::{
    async_state::AsyncResultState,
    callable::Callable,
    errors::{BackendError, BackendResult},
    subscription::{Listener, Unsubscribe},
};

/// The auth surface of a backend client
pub trait AuthClient: Send + Sync + 'static {
    type User: Clone + Send + Sync + 'static;

    /// Completes once the client has restored any persisted session
    fn auth_state_ready(&self) -> BoxFuture<'static, ()>;

    fn current_user(&self) -> Option<Self::User>;

    /// Report the current user now and on every sign-in or sign-out
    fn on_auth_state_changed(&self, listener: Listener<Option<Self::User>>) -> Unsubscribe;
}

/// Feed auth-state changes into `state` until it is stopped, restarted or dropped
pub fn watch_auth_state<C: AuthClient>(
    client: &Arc<C>,
    state: &AsyncResultState<Option<C::User>, BackendError>,
) {
    state.start(|resolver| {
        crate::log_subscribe!("auth state");
        let on_error = {
            let resolver = resolver.clone();
            move |error: BackendError| {
                resolver.reject(error);
            }
        };
        let on_next = move |user: Option<C::User>| {
            resolver.resolve(user);
        };
        Some(client.on_auth_state_changed(Listener::new(on_next, on_error)))
    });
}

/// A command that runs once the auth state is known
pub fn auth_callable<C, A, R, F, Fut>(client: Arc<C>, command: F) -> Callable<A, R>
where
    C: AuthClient,
    A: Send + 'static,
    R: Send + Sync + 'static,
    F: Fn(Arc<C>, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BackendResult<R>> + Send + 'static,
{
    let command = Arc::new(command);
    Callable::new(move |args: A| {
        let client = client.clone();
        let command = command.clone();
        async move {
            client.auth_state_ready().await;
            command(client, args).await
        }
    })
}

/// A command that runs as the signed-in user.
///
/// Rejects with [`BackendError::NotAuthenticated`] when nobody is signed in
/// once the auth state is known.
pub fn user_callable<C, A, R, F, Fut>(client: Arc<C>, command: F) -> Callable<A, R>
where
    C: AuthClient,
    A: Send + 'static,
    R: Send + Sync + 'static,
    F: Fn(C::User, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BackendResult<R>> + Send + 'static,
{
    let command = Arc::new(command);
    Callable::new(move |args: A| {
        let client = client.clone();
        let command = command.clone();
        async move {
            client.auth_state_ready().await;
            let user = client.current_user().ok_or(BackendError::NotAuthenticated)?;
            command(user, args).await
        }
    })
}
