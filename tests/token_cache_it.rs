#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use wechat_offiaccount::{_preludet::*, api::Endpoint, clock::Clock};

async fn token_mock<'a>(
	server: &'a MockServer,
	token: &str,
	expires_in: i64,
) -> httpmock::Mock<'a> {
	let body = format!("{{\"access_token\":\"{token}\",\"expires_in\":{expires_in}}}");

	server
		.mock_async(move |when, then| {
			when.method(GET)
				.path("/cgi-bin/token")
				.query_param("grant_type", "client_credential")
				.query_param("appid", "A")
				.query_param("secret", "B");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

#[tokio::test]
async fn token_is_cached_for_ttl_minus_margin() {
	let server = MockServer::start_async().await;
	let (cache, clock) = build_test_cache();
	let credentials = test_credentials(&server.base_url(), "A", "B");
	let mut mock = token_mock(&server, "T1", 7200).await;
	let token = cache.get_token(&credentials).await.expect("Initial fetch should succeed.");

	assert_eq!(token.expose(), "T1");

	let status = cache.status();

	assert_eq!(status.len(), 1);
	assert_eq!(status[0].expires_at - clock.now(), Duration::seconds(6900));

	clock.advance(Duration::seconds(6600));

	let reused = cache.get_token(&credentials).await.expect("Cached token should be reused.");

	assert_eq!(reused.expose(), "T1");

	mock.assert_calls_async(1).await;
	mock.delete_async().await;
	mock = token_mock(&server, "T2", 7200).await;
	clock.advance(Duration::seconds(301));

	let renewed = cache.get_token(&credentials).await.expect("Expired token should refetch.");

	assert_eq!(renewed.expose(), "T2");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn refresh_fetches_exactly_once() {
	let server = MockServer::start_async().await;
	let (cache, _) = build_test_cache();
	let credentials = test_credentials(&server.base_url(), "A", "B");
	let mock = token_mock(&server, "T1", 7200).await;

	cache.get_token(&credentials).await.expect("Initial fetch should succeed.");
	cache.refresh(&credentials).await.expect("Refresh should succeed.");
	cache.get_token(&credentials).await.expect("Refreshed token should be cached.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn failed_fetch_is_wrapped_and_not_cached() {
	let server = MockServer::start_async().await;
	let (cache, _) = build_test_cache();
	let credentials = test_credentials(&server.base_url(), "A", "B");
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":40013,\"errmsg\":\"invalid appid\"}");
		})
		.await;
	let err = cache.get_token(&credentials).await.expect_err("Invalid AppID must fail.");

	assert!(matches!(err, Error::TokenFetch { .. }));
	assert_eq!(err.api_code(), Some(40013));
	assert!(err.to_string().contains("不合法的AppID"));
	assert!(cache.is_empty());

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn retryable_fetch_failures_use_the_full_budget() {
	let server = MockServer::start_async().await;
	let (cache, _) = build_test_cache();
	let credentials = test_credentials(&server.base_url(), "A", "B");
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":40001,\"errmsg\":\"invalid credential\"}");
		})
		.await;
	let err = cache.get_token(&credentials).await.expect_err("Secret mismatch must fail.");

	assert_eq!(err.api_code(), Some(40001));
	assert!(cache.is_empty());

	mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn validate_checks_callback_ip_list() {
	let server = MockServer::start_async().await;
	let (cache, _) = build_test_cache();
	let credentials = test_credentials(&server.base_url(), "A", "B");
	let valid = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/getcallbackip").query_param("access_token", "good");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"ip_list\":[\"127.0.0.1\"]}");
		})
		.await;
	let invalid = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/getcallbackip").query_param("access_token", "bad");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":40014,\"errmsg\":\"invalid access_token\"}");
		})
		.await;

	assert!(cache.validate(&credentials, "good").await);
	assert!(!cache.validate(&credentials, "bad").await);

	valid.assert_async().await;
	invalid.assert_async().await;
}

#[tokio::test]
async fn url_with_token_keeps_base_path_prefix() {
	let server = MockServer::start_async().await;
	let (cache, _) = build_test_cache();
	let credentials = test_credentials(&server.url("/sandbox"), "A", "B");
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/sandbox/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"T1\",\"expires_in\":7200}");
		})
		.await;
	let url = cache
		.url_with_token(&credentials, Endpoint::AddMaterial, &[("type", "voice")])
		.await
		.expect("URL should be built.");

	assert_eq!(url.path(), "/sandbox/cgi-bin/material/add_material");

	let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

	assert_eq!(pairs.get("access_token"), Some(&"T1".into()));
	assert_eq!(pairs.get("type"), Some(&"voice".into()));

	mock.assert_async().await;
}
