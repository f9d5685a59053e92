#![doc = include_str!("../README.md")]

// Core modules
pub mod async_state;
pub mod backend;
pub mod errors;
mod log_utils;
pub mod memo;
pub mod policy;
pub mod reference;
pub mod runtime;
pub mod state;
pub mod subscription;
pub mod types;

// Operations built on the core
pub mod aggregate;
pub mod auth;
pub mod callable;
pub mod children;
pub mod functions;

// Dioxus integration
pub mod hooks;

pub mod prelude {
    //! The prelude exports the most common types and functions for using dioxus-backend-hooks.

    // State container and its snapshot
    pub use crate::async_state::{AsyncResultState, AsyncStateConfig, Resolver};
    pub use crate::state::{AsyncResult, AsyncState, Phase};

    // Backend contract and dispatch
    pub use crate::backend::{Backend, SnapshotMetadata};
    pub use crate::policy::{FetchPolicy, ListenOptions, ListenSource, Source};
    pub use crate::runtime::{Aggregator, ChildWatcher, Dispatch, Fetcher, dispatch, listen_children};
    pub use crate::subscription::{Listener, Unsubscribe};

    // Aggregates and child events
    pub use crate::aggregate::{Aggregate, AggregateData, AggregateSpec};
    pub use crate::children::{ChildEvent, ChildEventKind, ChildHandlers};

    // Commands
    pub use crate::auth::{AuthClient, auth_callable, user_callable, watch_auth_state};
    pub use crate::callable::Callable;
    pub use crate::functions::{
        CallOptions, FunctionTarget, FunctionsClient, StreamingResponse, function_callable,
        function_streamer,
    };
    pub use crate::reference::Path;

    // Hooks
    pub use crate::hooks::{
        UseAggregate, UseCallable, UseFetch, try_use_backend, use_aggregate, use_auth_state,
        use_backend, use_backend_provider, use_callable, use_child_events, use_count, use_fetch,
    };

    // Error types
    pub use crate::errors::{BackendError, BackendResult};
}
