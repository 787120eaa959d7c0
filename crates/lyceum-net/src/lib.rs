//! REST client for the classroom server's messaging and notification
//! endpoints.

pub mod api;
pub mod endpoints;
pub mod error;
pub mod http;

pub use api::SchoolApi;
pub use error::{ApiError, Result};
pub use http::HttpApi;
