//! Request-lifecycle tracking shared between stores.
//!
//! Stores report when a request starts, ends, or fails, and run response
//! bodies through `errors_check` to surface errors the gateway embeds in
//! otherwise successful responses. `RequestLog` is the in-process
//! implementation a UI polls for its loading indicator and error banner.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;
use tracing::{debug, error};

use crate::api::ApiError;
use crate::models::Envelope;

/// Collaborator notified about every store request.
pub trait RequestTracker: Send + Sync {
    fn request_start(&self, label: &str);

    fn request_end(&self, label: &str);

    fn request_failed(&self, error: &ApiError);

    /// Inspect a response body for embedded API errors.
    fn errors_check(&self, payload: &Value) -> Result<(), ApiError> {
        check_envelope_errors(payload)
    }
}

/// Flag the first entry of a non-empty `errors` value.
pub fn check_envelope_errors(payload: &Value) -> Result<(), ApiError> {
    let Some(envelope) = Envelope::from_body(payload) else {
        return Ok(());
    };
    let mut errors = envelope.errors.into_iter();
    match errors.next() {
        None => Ok(()),
        Some(first) => {
            let rest = errors.count();
            let reason = if rest > 0 {
                format!("{} (and {} more)", first.reason, rest)
            } else {
                first.reason
            };
            Err(ApiError::Api { code: first.code, reason })
        }
    }
}

/// Number of failure messages `RequestLog` keeps; older ones are dropped.
const MAX_FAILURE_HISTORY: usize = 50;

#[derive(Debug, Default)]
struct LogState {
    pending: usize,
    failures: VecDeque<String>,
}

/// Thread-safe `RequestTracker` counting in-flight requests and keeping
/// the most recent failure messages.
#[derive(Debug, Default)]
pub struct RequestLog {
    state: Mutex<LogState>,
}

impl RequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut LogState) -> R) -> R {
        // Poisoning is ignored; counters stay consistent under the lock.
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// True while any request is in flight.
    pub fn is_loading(&self) -> bool {
        self.with_state(|s| s.pending > 0)
    }

    pub fn pending_count(&self) -> usize {
        self.with_state(|s| s.pending)
    }

    /// Failures currently held, at most `MAX_FAILURE_HISTORY`.
    pub fn failure_count(&self) -> usize {
        self.with_state(|s| s.failures.len())
    }

    /// Most recent error message, for a user-facing banner.
    pub fn last_error(&self) -> Option<String> {
        self.with_state(|s| s.failures.back().cloned())
    }

    pub fn clear_errors(&self) {
        self.with_state(|s| s.failures.clear());
    }
}

impl RequestTracker for RequestLog {
    fn request_start(&self, label: &str) {
        debug!(label = label, "Request started");
        self.with_state(|s| s.pending += 1);
    }

    fn request_end(&self, label: &str) {
        debug!(label = label, "Request finished");
        self.with_state(|s| s.pending = s.pending.saturating_sub(1));
    }

    fn request_failed(&self, err: &ApiError) {
        error!(error = %err, "Request failed");
        self.with_state(|s| {
            s.pending = s.pending.saturating_sub(1);
            if s.failures.len() == MAX_FAILURE_HISTORY {
                s.failures.pop_front();
            }
            s.failures.push_back(err.to_string());
        });
    }
}
