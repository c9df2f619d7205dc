#![recursion_limit = "256"]

pub mod api;
pub mod auth;
pub mod datastore;
pub mod documents;
pub mod http;
pub mod library;
pub mod logging;
pub mod recommendations;
pub mod traits;
pub mod util;

mod status;
pub use status::Status;

mod tracing;
pub use crate::tracing::Tracing;
