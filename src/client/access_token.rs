//! Access-token operations exposed on [`WechatClient`].

// self
use crate::{
	_prelude::*,
	auth::Secret,
	client::WechatClient,
	http::ApiTransport,
	token::CacheStatus,
};

/// Token plus the outcome of probing it against the API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenValidation {
	/// Token that was probed.
	pub access_token: Secret,
	/// Whether the API accepted the token.
	pub is_valid: bool,
}

impl<T> WechatClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Returns a cached access token, fetching one when none is fresh.
	pub async fn access_token(&self) -> Result<Secret> {
		self.tokens.get_token(&self.credentials).await
	}

	/// Discards the cached token and fetches a new one.
	pub async fn refresh_access_token(&self) -> Result<Secret> {
		self.tokens.refresh(&self.credentials).await
	}

	/// Obtains a token and probes it against the callback-IP endpoint.
	pub async fn validate_access_token(&self) -> Result<TokenValidation> {
		let access_token = self.access_token().await?;
		let is_valid = self.tokens.validate(&self.credentials, access_token.expose()).await;

		Ok(TokenValidation { access_token, is_valid })
	}

	/// Diagnostic snapshot of the shared token cache.
	pub fn cache_status(&self) -> Vec<CacheStatus> {
		self.tokens.status()
	}
}
