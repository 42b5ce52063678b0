//! Transport primitives for WeChat API calls.
//!
//! The module exposes [`ApiTransport`] alongside the owned [`ApiRequest`] and [`ApiResponse`]
//! values so downstream crates can plug in custom HTTP stacks (or fakes) without touching the
//! call wrapper. Requests own their bodies, including multipart forms, so the call wrapper can
//! resend the same request on every retry attempt.

// self
use crate::{_prelude::*, error::TransportError};

/// `User-Agent` attached to every outbound request.
pub const USER_AGENT: &str = concat!("wechat-offiaccount/", env!("CARGO_PKG_VERSION"));
/// Operation label used when a request is not tied to a known endpoint.
pub const UNLABELED_OPERATION: &str = "request";

/// Boxed future returned by [`ApiTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing a single WeChat API request.
///
/// Implementations perform exactly one network exchange per call and must not retry on their
/// own; retry decisions belong to [`ApiCaller`](crate::api::ApiCaller). Non-2xx statuses are
/// returned as ordinary [`ApiResponse`] values, only network failures become errors.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and returns the raw response.
	fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// HTTP methods used by the WeChat API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
}
impl HttpMethod {
	/// Returns the method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Request payload; JSON and multipart bodies are mutually exclusive by construction.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// JSON document.
	Json(Value),
	/// `multipart/form-data` body.
	Multipart(MultipartForm),
}

/// Owned, cloneable multipart form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartForm {
	/// Parts in insertion order.
	pub parts: Vec<FormPart>,
}
impl MultipartForm {
	/// Appends a text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.parts.push(FormPart { name: name.into(), value: PartValue::Text(value.into()) });

		self
	}

	/// Appends a file field.
	pub fn file(
		mut self,
		name: impl Into<String>,
		bytes: Vec<u8>,
		filename: impl Into<String>,
		content_type: impl Into<String>,
	) -> Self {
		self.parts.push(FormPart {
			name: name.into(),
			value: PartValue::File {
				bytes,
				filename: filename.into(),
				content_type: content_type.into(),
			},
		});

		self
	}

	/// Returns the first part with the given name.
	pub fn part(&self, name: &str) -> Option<&FormPart> {
		self.parts.iter().find(|part| part.name == name)
	}
}

/// Named multipart field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormPart {
	/// Field name.
	pub name: String,
	/// Field content.
	pub value: PartValue,
}

/// Multipart field content.
#[derive(Clone, PartialEq, Eq)]
pub enum PartValue {
	/// Plain text value.
	Text(String),
	/// Binary file upload.
	File {
		/// File content.
		bytes: Vec<u8>,
		/// File name reported to the server.
		filename: String,
		/// MIME type reported to the server.
		content_type: String,
	},
}
impl Debug for PartValue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Text(value) => f.debug_tuple("PartValue::Text").field(value).finish(),
			Self::File { bytes, filename, content_type } => f
				.debug_struct("PartValue::File")
				.field("len", &bytes.len())
				.field("filename", filename)
				.field("content_type", content_type)
				.finish(),
		}
	}
}

/// Single outbound request.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: HttpMethod,
	/// Absolute URL including query parameters.
	pub url: Url,
	/// Request payload.
	pub body: RequestBody,
	/// Per-request timeout; `None` keeps the transport default.
	pub timeout: Option<std::time::Duration>,
	/// Operation label attached to spans and metrics.
	pub operation: &'static str,
	/// Largest response body the transport should buffer; `None` reads the body in full.
	pub max_body_size: Option<usize>,
}
impl ApiRequest {
	/// Builds a request with an explicit method and body.
	pub fn new(method: HttpMethod, url: Url, body: RequestBody) -> Self {
		Self {
			method,
			url,
			body,
			timeout: None,
			operation: UNLABELED_OPERATION,
			max_body_size: None,
		}
	}

	/// Builds a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(HttpMethod::Get, url, RequestBody::Empty)
	}

	/// Builds a `POST` request with a JSON body.
	pub fn post_json(url: Url, body: Value) -> Self {
		Self::new(HttpMethod::Post, url, RequestBody::Json(body))
	}

	/// Builds a `POST` request with a multipart body.
	pub fn post_form(url: Url, form: MultipartForm) -> Self {
		Self::new(HttpMethod::Post, url, RequestBody::Multipart(form))
	}

	/// Sets the operation label reported by spans and metrics.
	pub fn with_operation(mut self, operation: &'static str) -> Self {
		self.operation = operation;

		self
	}

	/// Caps the response body; larger bodies fail with [`TransportError::BodyTooLarge`].
	pub fn with_max_body_size(mut self, max: usize) -> Self {
		self.max_body_size = Some(max);

		self
	}

	/// Sets a per-request timeout.
	pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}
}

/// Raw response captured by a transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// `Content-Type` header, if present.
	pub content_type: Option<String>,
	/// Response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Reqwest-backed [`ApiTransport`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
		use reqwest::{
			Method,
			header::{CONTENT_TYPE, USER_AGENT as USER_AGENT_HEADER},
			multipart::{Form, Part},
		};

		let max_body_size = request.max_body_size;
		let method = match request.method {
			HttpMethod::Get => Method::GET,
			HttpMethod::Post => Method::POST,
		};
		let mut builder =
			self.0.request(method, request.url).header(USER_AGENT_HEADER, USER_AGENT);

		match request.body {
			RequestBody::Empty => {},
			RequestBody::Json(value) => {
				builder = builder.header(CONTENT_TYPE, "application/json").body(value.to_string());
			},
			RequestBody::Multipart(form) => {
				let mut multipart = Form::new();

				for FormPart { name, value } in form.parts {
					multipart = match value {
						PartValue::Text(text) => multipart.text(name, text),
						PartValue::File { bytes, filename, content_type } => {
							let part =
								Part::bytes(bytes).file_name(filename).mime_str(&content_type)?;

							multipart.part(name, part)
						},
					};
				}

				builder = builder.multipart(multipart);
			},
		}

		if let Some(timeout) = request.timeout {
			builder = builder.timeout(timeout);
		}

		let response = builder.send().await?;
		let status = response.status().as_u16();
		let content_type = response
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(ToOwned::to_owned);
		let body = match max_body_size {
			Some(max) => read_capped(response, max).await?,
			None => response.bytes().await?.to_vec(),
		};

		Ok(ApiResponse { status, content_type, body })
	}
}
#[cfg(feature = "reqwest")]
async fn read_capped(
	mut response: reqwest::Response,
	max: usize,
) -> Result<Vec<u8>, TransportError> {
	if let Some(declared) = response.content_length() {
		let size = usize::try_from(declared).unwrap_or(usize::MAX);

		if size > max {
			return Err(TransportError::BodyTooLarge { size, max });
		}
	}

	let mut body = Vec::new();

	while let Some(chunk) = response.chunk().await? {
		let size = body.len() + chunk.len();

		if size > max {
			return Err(TransportError::BodyTooLarge { size, max });
		}

		body.extend_from_slice(&chunk);
	}

	Ok(body)
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(self.execute(request))
	}
}
