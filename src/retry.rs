//! Stateless retry policy: error classification and capped exponential backoff.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	error::{NetworkFailure, TransportError},
};

/// `errcode` values retried by [`RetryPolicy::default`].
pub const DEFAULT_RETRYABLE_CODES: [i64; 4] = [
	// access_token invalid
	40014,
	// access_token expired
	42001,
	// AppSecret mismatch, occasionally transient
	40001,
	// upstream service unavailable
	9001002,
];

/// Fixed retry policy applied by the call wrapper.
///
/// The delay before attempt `n + 1` is `min(base_delay * 2^(n - 1), max_delay)`; there is no
/// jitter and no shared budget across calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Total attempts per call, including the first one.
	pub max_attempts: u32,
	/// Delay after the first failed attempt.
	pub base_delay: StdDuration,
	/// Upper bound for any single delay.
	pub max_delay: StdDuration,
	/// API error codes treated as transient.
	pub retryable_codes: Vec<i64>,
}
impl RetryPolicy {
	/// Default number of attempts per call.
	pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

	/// Profile that treats 40001 (AppSecret mismatch) as terminal.
	pub fn strict() -> Self {
		Self::default().with_retryable_codes([40014, 42001, 9001002])
	}

	/// Overrides the total attempts per call (clamped to at least one).
	pub fn with_max_attempts(mut self, attempts: u32) -> Self {
		self.max_attempts = attempts.max(1);

		self
	}

	/// Overrides the base delay.
	pub fn with_base_delay(mut self, delay: StdDuration) -> Self {
		self.base_delay = delay;

		self
	}

	/// Overrides the delay cap.
	pub fn with_max_delay(mut self, delay: StdDuration) -> Self {
		self.max_delay = delay;

		self
	}

	/// Replaces the retryable `errcode` allow-list.
	pub fn with_retryable_codes(mut self, codes: impl IntoIterator<Item = i64>) -> Self {
		self.retryable_codes = codes.into_iter().collect();

		self
	}

	/// Delay to wait after failed attempt number `attempt` (1-based).
	pub fn backoff_delay(&self, attempt: u32) -> StdDuration {
		let exponent = attempt.saturating_sub(1).min(31);
		let delay = self.base_delay.saturating_mul(1_u32 << exponent);

		delay.min(self.max_delay)
	}

	/// Returns `true` when `code` is in the retryable allow-list.
	pub fn is_retryable_code(&self, code: i64) -> bool {
		self.retryable_codes.contains(&code)
	}

	/// Classifies an error as retryable under this policy.
	pub fn is_retryable(&self, error: &Error) -> bool {
		match error {
			Error::Api(api) => self.is_retryable_code(api.code),
			Error::Transport(transport) => is_retryable_transport(transport),
			_ => false,
		}
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
			base_delay: StdDuration::from_millis(1_000),
			max_delay: StdDuration::from_millis(10_000),
			retryable_codes: DEFAULT_RETRYABLE_CODES.to_vec(),
		}
	}
}

fn is_retryable_transport(error: &TransportError) -> bool {
	matches!(error.kind(), NetworkFailure::Reset | NetworkFailure::Timeout)
}
