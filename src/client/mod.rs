//! Client Module
//!
//! Outbound calls to the platform API.

mod api;

pub use api::ApiClient;
