//! HTTP surface for the wikihop service.
//!
//! A thin axum adapter over [`wikihop::Services`]: handlers only submit
//! tasks, read task state, or call the explore/cache-admin facades; no
//! search ever runs inline in a request handler.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::app;
