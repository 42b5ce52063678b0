//! High-level WeChat Official Account client bound to one credential pair.

pub mod access_token;
pub mod draft;
pub mod material;

pub use draft::DraftArticle;

// self
use crate::{
	_prelude::*,
	api::{ApiCaller, Endpoint, codes},
	auth::Credentials,
	error::ValidationError,
	http::{ApiRequest, ApiTransport, MultipartForm, RequestBody},
	token::TokenCache,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestWechatClient = WechatClient<ReqwestTransport>;

/// Executes material, draft, publish, and token operations for one account.
///
/// The client owns its credentials and shares a [`TokenCache`] with any other client built from
/// the same handle, so several accounts (or several clients for one account) can reuse tokens
/// inside the process. Every request resolves its endpoint against the credential's base URL and
/// carries an `access_token` query parameter obtained from the cache. When the API rejects that
/// token (`40014`/`42001`), the cached entry is evicted so the next call fetches a new one.
pub struct WechatClient<T>
where
	T: ?Sized + ApiTransport,
{
	credentials: Credentials,
	tokens: Arc<TokenCache<T>>,
}
impl<T> WechatClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client that shares the provided token cache.
	pub fn with_cache(credentials: Credentials, tokens: Arc<TokenCache<T>>) -> Self {
		Self { credentials, tokens }
	}

	/// Credentials bound to this client.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Shared token cache.
	pub fn tokens(&self) -> &Arc<TokenCache<T>> {
		&self.tokens
	}

	/// Call wrapper used for every request.
	pub fn caller(&self) -> &ApiCaller<T> {
		self.tokens.caller()
	}

	async fn get(&self, endpoint: Endpoint) -> Result<Value> {
		self.send(endpoint, &[], RequestBody::Empty).await
	}

	async fn post_json(&self, endpoint: Endpoint, body: Value) -> Result<Value> {
		self.send(endpoint, &[], RequestBody::Json(body)).await
	}

	async fn post_form(
		&self,
		endpoint: Endpoint,
		query: &[(&str, &str)],
		form: MultipartForm,
	) -> Result<Value> {
		self.send(endpoint, query, RequestBody::Multipart(form)).await
	}

	async fn send(
		&self,
		endpoint: Endpoint,
		query: &[(&str, &str)],
		body: RequestBody,
	) -> Result<Value> {
		let url = self.tokens.url_with_token(&self.credentials, endpoint, query).await?;
		let request =
			ApiRequest::new(endpoint.method(), url, body).with_operation(endpoint.operation());

		match self.caller().call(request).await {
			Err(err) if err.api_code().is_some_and(codes::is_token_rejection) => {
				self.tokens.clear(&self.credentials);

				Err(err)
			},
			result => result,
		}
	}
}
#[cfg(feature = "reqwest")]
impl WechatClient<ReqwestTransport> {
	/// Creates a client with its own reqwest-backed token cache, default retry policy, and the
	/// system clock.
	pub fn new(credentials: Credentials) -> Self {
		Self::with_cache(credentials, Arc::new(TokenCache::with_defaults()))
	}
}
impl<T> Clone for WechatClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self { credentials: self.credentials.clone(), tokens: self.tokens.clone() }
	}
}
impl<T> Debug for WechatClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WechatClient")
			.field("credentials", &self.credentials)
			.field("tokens", &self.tokens)
			.finish()
	}
}

pub(crate) fn require_non_empty(name: &str, value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		Err(ValidationError::EmptyParameter { name: name.to_owned() })
	} else {
		Ok(())
	}
}
