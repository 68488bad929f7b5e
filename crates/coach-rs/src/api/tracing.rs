//! Correlation ids for gateway requests.
//!
//! Every gateway operation runs inside a span tagged with a request id so the
//! upstream call, any fallback warnings, and the HTTP access log line can be
//! tied together.

use std::sync::atomic::{AtomicU64, Ordering};

/// Timestamp plus a process-local counter, hex encoded.
///
/// The counter keeps ids distinct when two calls land in the same
/// millisecond.
pub(crate) fn unique_suffix() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let ts = chrono::Utc::now().timestamp_millis();
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{ts:x}-{count:04x}")
}

/// Generate a unique id for one incoming request.
pub fn generate_request_id() -> String {
    format!("req-{}", unique_suffix())
}
