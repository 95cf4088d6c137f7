//! Client-side stores backed by the gateway API.
//!
//! This module provides the `GeofenceStore`, an in-memory, load-once
//! cache of the account's geofences with lookup by id.

pub mod geofences;

pub use geofences::{GeofenceStore, GEOFENCES_PATH};
