//! Resilient call wrapper: one request per attempt, envelope inspection, bounded retries.
//!
//! [`ApiCaller`] sends an [`ApiRequest`] through an [`ApiTransport`], decodes the JSON envelope,
//! and turns a non-zero `errcode` into an [`ApiError`] whose message comes from the static
//! [`codes`] table. Errors the [`RetryPolicy`] classifies as transient are retried after a capped
//! exponential backoff; everything else propagates immediately.

pub mod codes;
pub mod endpoint;

pub use endpoint::Endpoint;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::ApiError,
	http::{ApiRequest, ApiResponse, ApiTransport},
	obs::{self, CallOutcome, CallSpan},
	retry::RetryPolicy,
};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Executes WeChat API requests with error-code aware retries.
pub struct ApiCaller<T>
where
	T: ?Sized + ApiTransport,
{
	transport: Arc<T>,
	policy: RetryPolicy,
}
impl<T> ApiCaller<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a caller for the given transport and retry policy.
	pub fn new(transport: impl Into<Arc<T>>, policy: RetryPolicy) -> Self {
		Self { transport: transport.into(), policy }
	}

	/// Shared transport handle.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Active retry policy.
	pub fn policy(&self) -> &RetryPolicy {
		&self.policy
	}

	/// Sends `request` using the policy's attempt budget.
	pub async fn call(&self, request: ApiRequest) -> Result<Value> {
		self.call_with_max_retries(request, self.policy.max_attempts).await
	}

	/// Sends `request`, allowing at most `max_attempts` attempts in total.
	pub async fn call_with_max_retries(
		&self,
		request: ApiRequest,
		max_attempts: u32,
	) -> Result<Value> {
		let max_attempts = max_attempts.max(1);
		let operation = request.operation;
		let span = CallSpan::new(operation, "call");

		span.instrument(async move {
			let mut attempt = 1;

			loop {
				obs::record_call_outcome(operation, CallOutcome::Attempt);

				match self.attempt(request.clone()).await {
					Ok(payload) => {
						obs::record_call_outcome(operation, CallOutcome::Success);

						return Ok(payload);
					},
					Err(err) if attempt < max_attempts && self.policy.is_retryable(&err) => {
						let delay = self.policy.backoff_delay(attempt);

						obs::record_call_outcome(operation, CallOutcome::Retry);
						obs::log_retry(&request.url, attempt, delay, &err);
						tokio::time::sleep(delay).await;

						attempt += 1;
					},
					Err(err) => {
						obs::record_call_outcome(operation, CallOutcome::Failure);
						obs::log_failure(&request.url, attempt, &err);

						return Err(err);
					},
				}
			}
		})
		.await
	}

	/// Sends `request` once and returns the raw response without envelope inspection.
	///
	/// Used for binary downloads, where the body is not a JSON envelope.
	pub async fn fetch_raw(&self, request: ApiRequest) -> Result<ApiResponse> {
		let operation = request.operation;
		let span = CallSpan::new(operation, "fetch_raw");

		obs::record_call_outcome(operation, CallOutcome::Attempt);

		let result: Result<ApiResponse> = span
			.instrument(async move {
				let response = self.transport.send(request).await?;

				if response.is_success() { Ok(response) } else { Err(status_error(&response)) }
			})
			.await;

		match result {
			Ok(_) => obs::record_call_outcome(operation, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(operation, CallOutcome::Failure),
		}

		result
	}

	async fn attempt(&self, request: ApiRequest) -> Result<Value> {
		let response = self.transport.send(request).await?;

		decode_envelope(&response)
	}
}
impl<T> Clone for ApiCaller<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self { transport: self.transport.clone(), policy: self.policy.clone() }
	}
}
impl<T> Debug for ApiCaller<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiCaller").field("policy", &self.policy).finish()
	}
}

/// Parses a response body as a WeChat envelope.
///
/// A non-zero `errcode` yields [`Error::Api`]. A non-2xx status without an envelope yields
/// [`Error::HttpStatus`]; an unparsable 2xx body yields [`Error::Decode`].
pub fn decode_envelope(response: &ApiResponse) -> Result<Value> {
	let deserializer = &mut serde_json::Deserializer::from_slice(&response.body);
	let payload: Value = match serde_path_to_error::deserialize(deserializer) {
		Ok(payload) => payload,
		Err(_) if !response.is_success() => return Err(status_error(response)),
		Err(e) => return Err(e.into()),
	};

	if let Some(api) = envelope_error(&payload) {
		return Err(api.into());
	}
	if !response.is_success() {
		return Err(status_error(response));
	}

	Ok(payload)
}

/// Extracts the [`ApiError`] carried by an envelope, if `errcode` is present and non-zero.
pub fn envelope_error(payload: &Value) -> Option<ApiError> {
	let code = payload.get("errcode").and_then(Value::as_i64).filter(|code| *code != 0)?;
	let server_message = payload.get("errmsg").and_then(Value::as_str).map(ToOwned::to_owned);

	let message = codes::resolve(code, server_message.as_deref());

	Some(ApiError { code, message, server_message })
}

/// Deserializes a successful payload into a typed response with path-aware errors.
pub fn decode<R>(payload: Value) -> Result<R>
where
	R: DeserializeOwned,
{
	serde_path_to_error::deserialize(payload).map_err(Error::from)
}

fn status_error(response: &ApiResponse) -> Error {
	let preview = String::from_utf8_lossy(&response.body);
	let body_preview = preview.chars().take(BODY_PREVIEW_LIMIT).collect();

	Error::HttpStatus { status: response.status, body_preview }
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{
		error::NetworkFailure,
		http::scripted::{Outcome, ScriptedTransport},
	};

	fn caller(transport: &Arc<ScriptedTransport>) -> ApiCaller<ScriptedTransport> {
		let policy = RetryPolicy::default()
			.with_base_delay(std::time::Duration::from_millis(1))
			.with_max_delay(std::time::Duration::from_millis(2));

		ApiCaller::new(transport.clone(), policy)
	}

	fn request() -> ApiRequest {
		ApiRequest::get(
			Url::parse("https://api.weixin.qq.com/cgi-bin/draft/count?access_token=T")
				.expect("Test URL should parse."),
		)
	}

	fn response(status: u16, body: &str) -> ApiResponse {
		ApiResponse { status, content_type: None, body: body.as_bytes().to_vec() }
	}

	#[test]
	fn zero_or_missing_errcode_is_success() {
		let ok = decode_envelope(&response(200, r#"{"errcode":0,"errmsg":"ok","a":1}"#))
			.expect("Zero errcode should decode as success.");

		assert_eq!(ok["a"], json!(1));
		assert!(decode_envelope(&response(200, r#"{"media_id":"m"}"#)).is_ok());
	}

	#[test]
	fn non_zero_errcode_resolves_table_message() {
		let body = r#"{"errcode":40001,"errmsg":"invalid credential"}"#;
		let err = decode_envelope(&response(200, body)).expect_err("Non-zero errcode must fail.");

		match err {
			Error::Api(api) => {
				assert_eq!(api.code, 40001);
				assert_eq!(api.message, "AppSecret错误或者AppSecret不属于这个公众号");
				assert_eq!(api.server_message.as_deref(), Some("invalid credential"));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn unknown_code_falls_back_to_server_message() {
		let api = envelope_error(&json!({ "errcode": 123456, "errmsg": "brand new failure" }))
			.expect("Envelope error should be extracted.");

		assert_eq!(api.message, "brand new failure");
	}

	#[test]
	fn non_json_bodies_map_by_status() {
		assert!(matches!(
			decode_envelope(&response(502, "<html>bad gateway</html>")),
			Err(Error::HttpStatus { status: 502, .. })
		));
		assert!(matches!(decode_envelope(&response(200, "not json")), Err(Error::Decode(_))));
	}

	#[test]
	fn typed_decode_reports_field_path() {
		#[derive(Debug, Deserialize)]
		struct Typed {
			#[allow(dead_code)]
			media_id: String,
		}

		let err = decode::<Typed>(json!({ "media_id": 7 })).expect_err("Wrong type must fail.");

		match err {
			Error::Decode(inner) => assert_eq!(inner.path().to_string(), "media_id"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[tokio::test]
	async fn retryable_code_is_retried_until_success() {
		let transport = ScriptedTransport::json(&[
			r#"{"errcode":40014,"errmsg":"invalid access_token"}"#,
			r#"{"errcode":0,"total_count":3}"#,
		]);
		let payload =
			caller(&transport).call(request()).await.expect("Second attempt should succeed.");

		assert_eq!(payload["total_count"], json!(3));
		assert_eq!(transport.calls(), 2);
	}

	#[tokio::test]
	async fn terminal_code_is_not_retried() {
		let transport = ScriptedTransport::json(&[r#"{"errcode":40013,"errmsg":"invalid appid"}"#]);
		let err = caller(&transport).call(request()).await.expect_err("40013 must fail.");

		assert_eq!(err.api_code(), Some(40013));
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn attempts_are_bounded() {
		let transport = ScriptedTransport::json(&[
			r#"{"errcode":9001002,"errmsg":"busy"}"#,
			r#"{"errcode":9001002,"errmsg":"busy"}"#,
			r#"{"errcode":9001002,"errmsg":"busy"}"#,
			r#"{"errcode":0}"#,
		]);
		let err = caller(&transport).call(request()).await.expect_err("Budget must run out.");

		assert_eq!(err.api_code(), Some(9001002));
		assert_eq!(transport.calls(), 3);

		let transport = ScriptedTransport::json(&[r#"{"errcode":42001,"errmsg":"expired"}"#]);
		let err = caller(&transport)
			.call_with_max_retries(request(), 1)
			.await
			.expect_err("Single attempt must not retry.");

		assert_eq!(err.api_code(), Some(42001));
		assert_eq!(transport.calls(), 1);
	}

	#[tokio::test]
	async fn transport_resets_retry_but_http_errors_do_not() {
		let transport = ScriptedTransport::new([
			Outcome::Network(NetworkFailure::Reset),
			Outcome::Network(NetworkFailure::Timeout),
			Outcome::Json(r#"{"media_id":"m"}"#),
		]);
		let payload = caller(&transport).call(request()).await.expect("Third attempt succeeds.");

		assert_eq!(payload["media_id"], json!("m"));
		assert_eq!(transport.calls(), 3);

		let transport = ScriptedTransport::new([
			Outcome::Status(503, "unavailable"),
			Outcome::Json(r#"{"media_id":"m"}"#),
		]);
		let err = caller(&transport).call(request()).await.expect_err("HTTP 503 is terminal.");

		assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
		assert_eq!(transport.calls(), 1);

		let transport = ScriptedTransport::new([Outcome::Network(NetworkFailure::Other)]);

		assert!(matches!(caller(&transport).call(request()).await, Err(Error::Transport(_))));
		assert_eq!(transport.calls(), 1);
	}
}
