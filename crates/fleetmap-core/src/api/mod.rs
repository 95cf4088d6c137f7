//! REST API connector module for the fleet-tracking gateway.
//!
//! This module provides the `Connector` trait that stores use to reach
//! the backend, and `ApiClient`, its reqwest-backed implementation.
//!
//! The gateway authenticates with a `FlespiToken` authorization header.

pub mod client;
pub mod connector;
pub mod error;

pub use client::ApiClient;
pub use connector::{Connector, HttpResponse};
pub use error::ApiError;
