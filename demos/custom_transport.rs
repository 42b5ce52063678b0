//! Plugs an in-memory [`ApiTransport`] into the token cache and client.
//!
//! 1. Implement [`ApiTransport::send`] so every request yields an [`ApiResponse`] or a
//!    [`TransportError`].
//! 2. Wrap the transport in an [`ApiCaller`] together with a [`RetryPolicy`].
//! 3. Build a [`TokenCache`] with a clock and share it with a [`WechatClient`].

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use color_eyre::Result;
// self
use wechat_offiaccount::{
	api::ApiCaller,
	auth::Credentials,
	client::WechatClient,
	clock::SystemClock,
	error::TransportError,
	http::{ApiRequest, ApiResponse, ApiTransport, TransportFuture},
	retry::RetryPolicy,
	token::TokenCache,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let transport = Arc::new(CannedTransport::default());
	let policy = RetryPolicy::strict().with_base_delay(std::time::Duration::from_millis(10));
	let caller: ApiCaller<CannedTransport> = ApiCaller::new(transport.clone(), policy);
	let cache = Arc::new(TokenCache::new(caller, Arc::new(SystemClock)));
	let client = WechatClient::with_cache(Credentials::new("wx-demo-app", "demo-secret"), cache);
	let token = client.access_token().await?;
	let count = client.draft_count().await?;

	println!("Token from the canned transport: {}.", token.expose());
	println!("Draft count: {}.", count["total_count"]);

	client.access_token().await?;

	// One token fetch plus one draft call; the second token lookup is served from the cache.
	println!("Requests sent: {}.", transport.sent.load(Ordering::SeqCst));

	Ok(())
}

#[derive(Default)]
struct CannedTransport {
	sent: AtomicUsize,
}
impl ApiTransport for CannedTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		self.sent.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			let body = match request.url.path() {
				"/cgi-bin/token" => "{\"access_token\":\"canned-token\",\"expires_in\":7200}",
				"/cgi-bin/draft/count" => "{\"total_count\":3}",
				path =>
					return Err(TransportError::Io(std::io::Error::other(format!(
						"no canned response for {path}"
					)))),
			};

			Ok(ApiResponse {
				status: 200,
				content_type: Some("application/json".into()),
				body: body.as_bytes().to_vec(),
			})
		})
	}
}
