//! Log-safe copies of payloads and URLs, plus light scrubbing of user-supplied text.

// std
use std::sync::LazyLock;
// crates.io
use regex::Regex;
// self
use crate::_prelude::*;

/// Placeholder written in place of sensitive values.
pub const MASK: &str = "***";

/// Object keys whose values never reach logs.
pub const SENSITIVE_FIELDS: [&str; 6] =
	["access_token", "appSecret", "app_secret", "secret", "appId", "app_id"];

/// Query parameters masked by [`redact_url`].
const SENSITIVE_QUERY: [&str; 3] = ["access_token", "secret", "appid"];

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("Script pattern must compile.")
});
static JAVASCRIPT_SCHEME: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("Scheme pattern must compile."));
static INLINE_HANDLER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)on\w+\s*=").expect("Handler pattern must compile."));

/// Returns a copy of `data` with top-level sensitive fields masked.
///
/// Only fields holding a truthy value (non-empty string, non-zero number, `true`, array, or
/// object) are masked. Non-object values are returned unchanged. `data` itself is never
/// mutated.
pub fn sanitize_for_logging(data: &Value) -> Value {
	let Value::Object(map) = data else {
		return data.clone();
	};
	let mut sanitized = map.clone();

	for field in SENSITIVE_FIELDS {
		if let Some(value) = sanitized.get_mut(field).filter(|value| is_truthy(value)) {
			*value = Value::String(MASK.into());
		}
	}

	Value::Object(sanitized)
}

/// Renders `url` with credential-bearing query values masked.
pub fn redact_url(url: &Url) -> String {
	if url.query().is_none() {
		return url.to_string();
	}

	let mut redacted = url.clone();
	let pairs = url
		.query_pairs()
		.map(|(key, value)| {
			let value = if SENSITIVE_QUERY.contains(&key.as_ref()) {
				MASK.to_owned()
			} else {
				value.into_owned()
			};

			(key.into_owned(), value)
		})
		.collect::<Vec<_>>();

	redacted.query_pairs_mut().clear().extend_pairs(pairs);

	redacted.to_string()
}

/// Strips `<script>` blocks, `javascript:` schemes, and inline `on*=` handlers, then trims.
pub fn sanitize_input(input: &str) -> String {
	let stripped = SCRIPT_BLOCK.replace_all(input, "");
	let stripped = JAVASCRIPT_SCHEME.replace_all(&stripped, "");
	let stripped = INLINE_HANDLER.replace_all(&stripped, "");

	stripped.trim().to_owned()
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(flag) => *flag,
		Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
		Value::String(text) => !text.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}
