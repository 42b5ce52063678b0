//! In-process access-token cache keyed by credential pair.
//!
//! [`TokenCache`] memoizes one token per [`CacheKey`]. A fetched token is stored with
//! `expires_at = fetched_at + expires_in - safety_margin` and served while the injected clock
//! reads strictly before `expires_at`. Entries are replaced only after a fully successful fetch,
//! so a failed fetch never clobbers or corrupts an existing entry. Concurrent callers are not
//! coordinated; each may fetch, and the last successful fetch wins.

// self
use crate::{
	_prelude::*,
	api::{self, ApiCaller, Endpoint},
	auth::{CacheKey, Credentials, Secret},
	clock::Clock,
	http::{ApiRequest, ApiTransport},
	obs::{self, CacheEvent},
};
#[cfg(feature = "reqwest")]
use crate::{clock::SystemClock, http::ReqwestTransport, retry::RetryPolicy};

/// Default margin subtracted from the server TTL before a token is considered stale.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(300);

/// Cached token plus its absolute expiry.
#[derive(Clone, Debug)]
pub struct CacheEntry {
	/// Access token issued by the API.
	pub token: Secret,
	/// Instant after which the token is no longer served.
	pub expires_at: OffsetDateTime,
	/// AppID the token belongs to.
	pub app_id: String,
}
impl CacheEntry {
	/// Returns `true` when the entry may be served at `now`.
	pub fn is_fresh_at(&self, now: OffsetDateTime) -> bool {
		now < self.expires_at
	}
}

/// Diagnostic view of a cache entry; never exposes the token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
	/// AppID the entry belongs to.
	pub app_id: String,
	/// Entry expiry.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
	/// Whether the entry would be served right now.
	pub is_valid: bool,
}

#[derive(Deserialize)]
struct TokenResponse {
	access_token: Option<String>,
	expires_in: Option<i64>,
}

/// Single-process access-token memoizer.
pub struct TokenCache<T>
where
	T: ?Sized + ApiTransport,
{
	caller: ApiCaller<T>,
	clock: Arc<dyn Clock>,
	safety_margin: Duration,
	entries: Mutex<BTreeMap<CacheKey, CacheEntry>>,
}
impl<T> TokenCache<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates an empty cache that fetches through `caller` and reads time from `clock`.
	pub fn new(caller: ApiCaller<T>, clock: Arc<dyn Clock>) -> Self {
		Self {
			caller,
			clock,
			safety_margin: DEFAULT_SAFETY_MARGIN,
			entries: Default::default(),
		}
	}

	/// Overrides the safety margin (defaults to 300 seconds).
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = margin.max(Duration::ZERO);

		self
	}

	/// Call wrapper used for token fetches and probes.
	pub fn caller(&self) -> &ApiCaller<T> {
		&self.caller
	}

	/// Current instant according to the injected clock.
	pub fn now(&self) -> OffsetDateTime {
		self.clock.now()
	}

	/// Returns a cached token while it is fresh, otherwise fetches and stores a new one.
	pub async fn get_token(&self, credentials: &Credentials) -> Result<Secret> {
		credentials.validate()?;

		let key = CacheKey::for_credentials(credentials);

		if let Some(token) = self.cached(&key) {
			obs::record_cache_event(CacheEvent::Hit);
			obs::log_cache_event(CacheEvent::Hit, credentials.app_id());

			return Ok(token);
		}

		obs::record_cache_event(CacheEvent::Miss);
		obs::log_cache_event(CacheEvent::Miss, credentials.app_id());

		let (token, expires_in) = self.fetch(credentials).await?;
		let expires_at = self
			.clock
			.now()
			.checked_add(expires_in)
			.and_then(|at| at.checked_sub(self.safety_margin))
			.ok_or_else(|| {
				Error::token_fetch(Error::UnexpectedResponse {
					reason: format!("expires_in {} is out of range", expires_in.whole_seconds()),
				})
			})?;
		let app_id = credentials.app_id().to_owned();
		let entry = CacheEntry { token: token.clone(), expires_at, app_id };

		self.entries.lock().insert(key, entry);
		obs::record_cache_event(CacheEvent::Store);
		obs::log_cache_event(CacheEvent::Store, credentials.app_id());

		Ok(token)
	}

	/// Evicts the entry for `credentials` and fetches a new token.
	pub async fn refresh(&self, credentials: &Credentials) -> Result<Secret> {
		self.clear(credentials);
		self.get_token(credentials).await
	}

	/// Probes `token` against the callback-IP endpoint.
	///
	/// Returns `true` only when the response carries `ip_list` and no error code. Any failure,
	/// including transport errors, yields `false`. The probe is sent once, without retries.
	pub async fn validate(&self, credentials: &Credentials, token: &str) -> bool {
		let mut url = credentials.endpoint_url(Endpoint::CallbackIp.path());

		url.query_pairs_mut().append_pair("access_token", token);

		let request = ApiRequest::get(url).with_operation(Endpoint::CallbackIp.operation());

		match self.caller.call_with_max_retries(request, 1).await {
			Ok(payload) => payload.get("ip_list").is_some_and(|list| !list.is_null()),
			Err(_) => false,
		}
	}

	/// Evicts the entry for `credentials`, if any.
	pub fn clear(&self, credentials: &Credentials) {
		let key = CacheKey::for_credentials(credentials);

		if self.entries.lock().remove(&key).is_some() {
			obs::record_cache_event(CacheEvent::Evict);
			obs::log_cache_event(CacheEvent::Evict, credentials.app_id());
		}
	}

	/// Evicts every entry.
	pub fn clear_all(&self) {
		self.entries.lock().clear();
	}

	/// Number of cached entries, fresh or stale.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Returns `true` when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	/// Snapshot of every entry for diagnostics, ordered by cache key.
	pub fn status(&self) -> Vec<CacheStatus> {
		let now = self.clock.now();

		self.entries
			.lock()
			.values()
			.map(|entry| CacheStatus {
				app_id: entry.app_id.clone(),
				expires_at: entry.expires_at,
				is_valid: entry.is_fresh_at(now),
			})
			.collect()
	}

	/// Resolves `endpoint` on the credential's base URL and appends a valid `access_token` plus
	/// `extra` query pairs.
	pub async fn url_with_token(
		&self,
		credentials: &Credentials,
		endpoint: Endpoint,
		extra: &[(&str, &str)],
	) -> Result<Url> {
		let token = self.get_token(credentials).await?;
		let mut url = credentials.endpoint_url(endpoint.path());

		{
			let mut query = url.query_pairs_mut();

			query.append_pair("access_token", token.expose());

			for (key, value) in extra {
				query.append_pair(key, value);
			}
		}

		Ok(url)
	}

	fn cached(&self, key: &CacheKey) -> Option<Secret> {
		let now = self.clock.now();

		self.entries
			.lock()
			.get(key)
			.filter(|entry| entry.is_fresh_at(now))
			.map(|entry| entry.token.clone())
	}

	async fn fetch(&self, credentials: &Credentials) -> Result<(Secret, Duration)> {
		let mut url = credentials.endpoint_url(Endpoint::Token.path());

		url.query_pairs_mut()
			.append_pair("grant_type", "client_credential")
			.append_pair("appid", credentials.app_id())
			.append_pair("secret", credentials.app_secret().expose());

		let request = ApiRequest::get(url).with_operation(Endpoint::Token.operation());
		let payload = self.caller.call(request).await.map_err(Error::token_fetch)?;
		let response: TokenResponse = api::decode(payload).map_err(Error::token_fetch)?;
		let token = response.access_token.filter(|token| !token.is_empty()).ok_or_else(|| {
			Error::token_fetch(Error::UnexpectedResponse {
				reason: "token response is missing access_token".into(),
			})
		})?;
		let expires_in = response.expires_in.ok_or_else(|| {
			Error::token_fetch(Error::UnexpectedResponse {
				reason: "token response is missing expires_in".into(),
			})
		})?;

		Ok((Secret::new(token), Duration::seconds(expires_in)))
	}
}
#[cfg(feature = "reqwest")]
impl TokenCache<ReqwestTransport> {
	/// Creates a cache backed by the default reqwest transport, retry policy, and system clock.
	pub fn with_defaults() -> Self {
		Self::new(
			ApiCaller::new(ReqwestTransport::default(), RetryPolicy::default()),
			Arc::new(SystemClock),
		)
	}
}
impl<T> Debug for TokenCache<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("safety_margin", &self.safety_margin)
			.field("entries", &self.entries.lock().len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;
	use crate::{clock::ManualClock, http::scripted::ScriptedTransport, retry::RetryPolicy};

	fn cache(transport: &Arc<ScriptedTransport>) -> (TokenCache<ScriptedTransport>, ManualClock) {
		let clock = ManualClock::new(datetime!(2025-01-01 00:00 UTC));
		let policy = RetryPolicy::default()
			.with_base_delay(std::time::Duration::from_millis(1))
			.with_max_delay(std::time::Duration::from_millis(1));
		let caller = ApiCaller::new(transport.clone(), policy);
		let cache = TokenCache::new(caller, Arc::new(clock.clone()));

		(cache, clock)
	}

	#[tokio::test]
	async fn token_is_reused_until_margin_then_refetched() {
		let transport = ScriptedTransport::json(&[
			r#"{"access_token":"T1","expires_in":7200}"#,
			r#"{"access_token":"T2","expires_in":7200}"#,
		]);
		let (cache, clock) = cache(&transport);
		let credentials = Credentials::new("A", "B");
		let first = cache.get_token(&credentials).await.expect("First fetch should succeed.");

		assert_eq!(first.expose(), "T1");

		clock.advance(Duration::seconds(6600));

		let reused = cache.get_token(&credentials).await.expect("Cached token should be served.");

		assert_eq!(reused.expose(), "T1");
		assert_eq!(transport.calls(), 1);

		clock.advance(Duration::seconds(301));

		let renewed = cache.get_token(&credentials).await.expect("Stale token should refetch.");

		assert_eq!(renewed.expose(), "T2");
		assert_eq!(transport.calls(), 2);
	}

	#[tokio::test]
	async fn token_at_exact_expiry_is_stale() {
		let transport = ScriptedTransport::json(&[
			r#"{"access_token":"T1","expires_in":600}"#,
			r#"{"access_token":"T2","expires_in":600}"#,
		]);
		let (cache, clock) = cache(&transport);
		let credentials = Credentials::new("A", "B");

		cache.get_token(&credentials).await.expect("First fetch should succeed.");
		clock.advance(Duration::seconds(300));

		let token = cache.get_token(&credentials).await.expect("Refetch should succeed.");

		assert_eq!(token.expose(), "T2");
	}

	#[tokio::test]
	async fn missing_access_token_is_not_cached() {
		let transport = ScriptedTransport::json(&[r#"{"expires_in":7200}"#]);
		let (cache, _) = cache(&transport);
		let err = cache
			.get_token(&Credentials::new("A", "B"))
			.await
			.expect_err("Response without access_token must fail.");

		assert!(matches!(
			err,
			Error::TokenFetch { ref source } if matches!(**source, Error::UnexpectedResponse { .. })
		));
		assert!(cache.is_empty());
	}

	#[tokio::test]
	async fn out_of_range_lifetime_is_rejected_without_caching() {
		let transport = ScriptedTransport::json(&[
			r#"{"access_token":"T1","expires_in":9223372036854775807}"#,
		]);
		let (cache, _) = cache(&transport);
		let err = cache
			.get_token(&Credentials::new("A", "B"))
			.await
			.expect_err("Overflowing expires_in must fail.");

		assert!(matches!(
			err,
			Error::TokenFetch { ref source } if matches!(**source, Error::UnexpectedResponse { .. })
		));
		assert!(cache.is_empty());
	}

	#[tokio::test]
	async fn blank_credentials_fail_before_any_request() {
		let transport = ScriptedTransport::json(&[]);
		let (cache, _) = cache(&transport);
		let err = cache
			.get_token(&Credentials::new("", "B"))
			.await
			.expect_err("Blank app id must be rejected.");

		assert!(matches!(err, Error::Config(_)));
		assert_eq!(transport.calls(), 0);
	}

	#[tokio::test]
	async fn status_reports_validity_without_tokens() {
		let transport = ScriptedTransport::json(&[r#"{"access_token":"T1","expires_in":7200}"#]);
		let (cache, clock) = cache(&transport);
		let credentials = Credentials::new("A", "B");

		cache.get_token(&credentials).await.expect("Fetch should succeed.");

		let status = cache.status();

		assert_eq!(status.len(), 1);
		assert_eq!(status[0].app_id, "A");
		assert_eq!(status[0].expires_at, datetime!(2025-01-01 01:55 UTC));
		assert!(status[0].is_valid);

		clock.advance(Duration::hours(2));

		assert!(!cache.status()[0].is_valid);
		assert!(!format!("{:?}", cache.status()).contains("T1"));

		cache.clear(&credentials);

		assert!(cache.is_empty());
	}

	#[tokio::test]
	async fn entries_are_keyed_per_credential_pair() {
		let transport = ScriptedTransport::json(&[
			r#"{"access_token":"T1","expires_in":7200}"#,
			r#"{"access_token":"T2","expires_in":7200}"#,
		]);
		let (cache, _) = cache(&transport);
		let second = Credentials::new("B", "secret");
		let first = Credentials::new("A", "secret");

		cache.get_token(&second).await.expect("Fetch for B should succeed.");
		cache.get_token(&first).await.expect("Fetch for A should succeed.");

		let apps = cache.status().into_iter().map(|s| s.app_id).collect::<Vec<_>>();

		assert_eq!(apps, ["A", "B"]);

		cache.clear_all();

		assert!(cache.is_empty());
	}

	#[tokio::test]
	async fn url_with_token_appends_extra_query() {
		let transport = ScriptedTransport::json(&[r#"{"access_token":"T1","expires_in":7200}"#]);
		let (cache, _) = cache(&transport);
		let credentials = Credentials::new("A", "B");
		let url = cache
			.url_with_token(&credentials, Endpoint::UploadMedia, &[("type", "image")])
			.await
			.expect("URL should be built.");

		assert_eq!(url.path(), "/cgi-bin/media/upload");
		assert_eq!(url.query(), Some("access_token=T1&type=image"));
	}

	#[tokio::test]
	async fn refresh_always_fetches_once() {
		let transport = ScriptedTransport::json(&[
			r#"{"access_token":"T1","expires_in":7200}"#,
			r#"{"access_token":"T2","expires_in":7200}"#,
		]);
		let (cache, _) = cache(&transport);
		let credentials = Credentials::new("A", "B");

		cache.get_token(&credentials).await.expect("First fetch should succeed.");

		let refreshed = cache.refresh(&credentials).await.expect("Refresh should succeed.");

		assert_eq!(refreshed.expose(), "T2");
		assert_eq!(transport.calls(), 2);
		assert_eq!(cache.len(), 1);
	}

	#[tokio::test]
	async fn validate_probes_once_and_requires_ip_list() {
		let transport = ScriptedTransport::json(&[
			r#"{"ip_list":["101.226.62.77"]}"#,
			r#"{"errcode":40014,"errmsg":"invalid access_token"}"#,
			r#"{"errcode":0}"#,
		]);
		let (cache, _) = cache(&transport);
		let credentials = Credentials::new("A", "B");

		assert!(cache.validate(&credentials, "T1").await);
		assert!(!cache.validate(&credentials, "stale").await);
		assert_eq!(transport.calls(), 2);
		assert!(!cache.validate(&credentials, "T1").await);
		assert!(!cache.validate(&credentials, "T1").await);

		let probe = &transport.requests()[0];

		assert_eq!(probe.url.path(), "/cgi-bin/getcallbackip");
		assert_eq!(probe.url.query(), Some("access_token=T1"));
	}
}
