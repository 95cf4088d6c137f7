//! Data models for gateway entities.
//!
//! - `Geofence`: an opaque geofence record as returned by the API
//! - `Envelope`, `EnvelopeError`: the response wrapper around `result`

pub mod envelope;
pub mod geofence;

pub use envelope::{Envelope, EnvelopeError};
pub use geofence::Geofence;
