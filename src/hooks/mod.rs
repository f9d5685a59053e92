//! Dioxus hooks over the fetch, aggregate, child-event, callable and auth layers

mod aggregate;
mod auth;
mod callable;
mod children;
mod context;
mod fetch;
mod mirror;

pub use aggregate::{UseAggregate, use_aggregate, use_count};
pub use auth::use_auth_state;
pub use callable::{UseCallable, use_callable};
pub use children::use_child_events;
pub use context::{BackendContext, try_use_backend, use_backend, use_backend_provider};
pub use fetch::{UseFetch, use_fetch};
