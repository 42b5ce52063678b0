// std
use std::time::Duration as StdDuration;
// self
#[cfg(feature = "tracing")] use crate::sanitize;
use crate::{_prelude::*, obs::CacheEvent};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by the call wrapper.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the operation label and call stage.
	pub fn new(operation: &'static str, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("wechat_offiaccount.call", operation, stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (operation, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a scheduled retry with the credential-free URL.
pub fn log_retry(url: &Url, attempt: u32, delay: StdDuration, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			url = %sanitize::redact_url(url),
			attempt,
			delay_ms = delay.as_millis() as u64,
			error = %error,
			"WeChat API call failed; retrying."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (url, attempt, delay, error);
	}
}

/// Logs a call that gave up, either because the error is terminal or attempts ran out.
pub fn log_failure(url: &Url, attempt: u32, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			url = %sanitize::redact_url(url),
			attempt,
			error = %error,
			"WeChat API call failed."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (url, attempt, error);
	}
}

/// Logs a token cache event for the given AppID.
pub fn log_cache_event(event: CacheEvent, app_id: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(event = event.as_str(), app_id, "Access token cache event.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (event, app_id);
	}
}

/// Logs a dispatcher item whose error was turned into an error record.
pub fn log_item_failure(index: usize, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(index, error = %error, "Item failed; continuing with the next one.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (index, error);
	}
}
