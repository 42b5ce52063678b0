//! Optional observability helpers for API calls and the token cache.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to emit structured spans named `wechat_offiaccount.call` with the
//!   `operation` and `stage` fields, `warn` events when a retry is scheduled, and `debug` events
//!   for token cache hits, misses, and evictions. URLs are logged with credentials redacted.
//! - Enable `metrics` to increment the `wechat_offiaccount_call_total` counter for every
//!   attempt/retry/success/failure labeled by `operation` + `outcome`, and
//!   `wechat_offiaccount_token_cache_total` labeled by `event`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each API call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// A request is about to be sent.
	Attempt,
	/// A failed attempt will be retried after a backoff delay.
	Retry,
	/// The call returned a successful envelope.
	Success,
	/// The call failed and the error propagated to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Retry => "retry",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Token cache events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheEvent {
	/// A cached token was served.
	Hit,
	/// No usable token was cached; a fetch follows.
	Miss,
	/// A fetched token was stored.
	Store,
	/// An entry was evicted explicitly.
	Evict,
}
impl CacheEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheEvent::Hit => "hit",
			CacheEvent::Miss => "miss",
			CacheEvent::Store => "store",
			CacheEvent::Evict => "evict",
		}
	}
}
impl Display for CacheEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
