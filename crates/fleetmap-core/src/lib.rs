//! fleetmap core - geofence cache and marker icons for a fleet-tracking map.
//!
//! - `api`: the `Connector` seam and its reqwest-backed `ApiClient`
//! - `tracker`: request-lifecycle tracking and embedded-error checks
//! - `store`: the load-once `GeofenceStore`
//! - `icon`: vehicle marker HTML fragments
//! - `config`: on-disk and environment configuration

pub mod api;
pub mod config;
pub mod icon;
pub mod models;
pub mod store;
pub mod tracker;
pub mod utils;

pub use api::{ApiClient, ApiError, Connector, HttpResponse};
pub use config::Config;
pub use icon::{icon_html, MarkerIcon};
pub use models::Geofence;
pub use store::GeofenceStore;
pub use tracker::{RequestLog, RequestTracker};
