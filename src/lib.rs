//! WeChat Official Account client with an in-process access-token cache, error-code aware
//! retries, and the material, draft, and publish operations built on top of them.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod client;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod media;
pub mod obs;
pub mod retry;
pub mod sanitize;
pub mod token;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		api::ApiCaller,
		auth::Credentials,
		client::WechatClient,
		clock::{Clock, ManualClock},
		http::ReqwestTransport,
		retry::RetryPolicy,
		token::TokenCache,
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = WechatClient<ReqwestTransport>;

	/// Retry policy with millisecond delays so retry paths stay fast under test.
	pub fn fast_retry_policy() -> RetryPolicy {
		RetryPolicy::default()
			.with_base_delay(std::time::Duration::from_millis(1))
			.with_max_delay(std::time::Duration::from_millis(5))
	}

	/// Builds credentials that point at a mock server base URL.
	pub fn test_credentials(base_url: &str, app_id: &str, app_secret: &str) -> Credentials {
		Credentials::new(app_id, app_secret)
			.with_base_url(base_url)
			.expect("Mock server base URL should parse.")
	}

	/// Constructs a token cache backed by reqwest, a fast retry policy, and a manual clock.
	pub fn build_test_cache() -> (Arc<TokenCache<ReqwestTransport>>, ManualClock) {
		let clock = ManualClock::default();
		let shared: Arc<dyn Clock> = Arc::new(clock.clone());
		let caller = ApiCaller::new(ReqwestTransport::default(), fast_retry_policy());
		let cache = Arc::new(TokenCache::new(caller, shared));

		(cache, clock)
	}

	/// Constructs a [`WechatClient`] for the provided mock server, sharing a fresh token cache.
	pub fn build_test_client(base_url: &str) -> (ReqwestTestClient, ManualClock) {
		let (cache, clock) = build_test_cache();
		let client =
			WechatClient::with_cache(test_credentials(base_url, "test-app", "test-secret"), cache);

		(client, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
