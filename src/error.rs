//! Client-level error types shared across the token cache, call wrapper, and operations.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The WeChat API answered with a non-zero `errcode`.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Caller-supplied input was rejected before any request was sent.
	#[error(transparent)]
	Validation(#[from] ValidationError),

	/// Non-2xx HTTP status without a WeChat error envelope.
	#[error("WeChat API responded with HTTP {status}: {body_preview}.")]
	HttpStatus {
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		body_preview: String,
	},
	/// Response body was not the JSON shape the operation expects.
	#[error("WeChat API returned malformed JSON.")]
	Decode(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Response was well-formed JSON but lacked a required field.
	#[error("WeChat API returned an unexpected response: {reason}.")]
	UnexpectedResponse {
		/// Description of what was missing or wrong.
		reason: String,
	},
	/// Fetching an access token failed; nothing was cached.
	#[error("获取Access Token失败: {source}")]
	TokenFetch {
		/// Underlying failure raised by the call wrapper.
		#[source]
		source: Box<Error>,
	},
}
impl Error {
	/// Returns the WeChat `errcode` when the error originated from an API envelope.
	pub fn api_code(&self) -> Option<i64> {
		match self {
			Self::Api(api) => Some(api.code),
			Self::TokenFetch { source } => source.api_code(),
			_ => None,
		}
	}

	pub(crate) fn token_fetch(source: Error) -> Self {
		Self::TokenFetch { source: Box::new(source) }
	}
}

/// Configuration failures raised before any request is sent.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP客户端创建失败")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A required credential field is empty.
	#[error("凭证字段 {field} 不能为空")]
	MissingCredential {
		/// Field name as exposed by the credential store.
		field: &'static str,
	},
	/// The configured base URL cannot be parsed.
	#[error("API地址无效: {value}")]
	InvalidBaseUrl {
		/// Raw configured value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failure reported by the WeChat API through a non-zero `errcode`.
#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("WeChat API error ({code}): {message}.")]
pub struct ApiError {
	/// `errcode` returned by the API.
	pub code: i64,
	/// Message resolved from the static code table, falling back to `errmsg`.
	pub message: String,
	/// Raw `errmsg` supplied by the server, if any.
	pub server_message: Option<String>,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the WeChat API ({kind}).")]
	Network {
		/// Coarse classification used by the retry policy.
		kind: NetworkFailure,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the WeChat API.")]
	Io(#[from] std::io::Error),
	/// Response body exceeded the cap set on the request.
	#[error("Response body of at least {size} bytes exceeds the {max}-byte limit.")]
	BodyTooLarge {
		/// Bytes declared or read when the cap was hit.
		size: usize,
		/// Configured cap.
		max: usize,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		kind: NetworkFailure,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { kind, source: Box::new(src) }
	}

	/// Returns the network failure classification, if any.
	pub fn kind(&self) -> NetworkFailure {
		match self {
			Self::Network { kind, .. } => *kind,
			Self::Io(e) => NetworkFailure::from_io_kind(e.kind()),
			Self::BodyTooLarge { .. } => NetworkFailure::Other,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		let kind = NetworkFailure::from_reqwest(&e);

		Self::network(kind, e)
	}
}

/// Coarse network failure classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NetworkFailure {
	/// The peer reset or aborted the connection.
	Reset,
	/// The request or connection timed out.
	Timeout,
	/// Any other network failure.
	Other,
}
impl NetworkFailure {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Reset => "reset",
			Self::Timeout => "timeout",
			Self::Other => "other",
		}
	}

	fn from_io_kind(kind: std::io::ErrorKind) -> Self {
		use std::io::ErrorKind;

		match kind {
			ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe =>
				Self::Reset,
			ErrorKind::TimedOut => Self::Timeout,
			_ => Self::Other,
		}
	}

	#[cfg(feature = "reqwest")]
	fn from_reqwest(e: &ReqwestError) -> Self {
		if e.is_timeout() {
			return Self::Timeout;
		}

		let mut source = StdError::source(e);

		while let Some(inner) = source {
			if let Some(io) = inner.downcast_ref::<std::io::Error>() {
				return Self::from_io_kind(io.kind());
			}

			source = inner.source();
		}

		Self::Other
	}
}
impl Display for NetworkFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Input rejected locally; never retried.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// A required parameter was missing or blank.
	#[error("参数 \"{name}\" 不能为空")]
	EmptyParameter {
		/// Parameter name.
		name: String,
	},
	/// A parameter had the wrong JSON type.
	#[error("参数 \"{name}\" 必须是{expected}")]
	ParameterType {
		/// Parameter name.
		name: String,
		/// Expected type description.
		expected: &'static str,
	},
	/// Material type string is not one of image/voice/video/thumb.
	#[error("不支持的素材类型: {value}")]
	UnsupportedMaterialType {
		/// Raw value.
		value: String,
	},
	/// File input was not a base64 data URI.
	#[error("不支持的文件格式，请使用base64编码的文件（格式：data:mime/type;base64,data）")]
	NotDataUri,
	/// Data URI payload failed to decode.
	#[error("不支持的文件格式，请使用base64编码的文件")]
	InvalidBase64,
	/// MIME type is not allowed for the target material kind.
	#[error("不支持的文件类型: {mime}。支持的类型: {allowed}")]
	UnsupportedMimeType {
		/// Detected MIME type.
		mime: String,
		/// Comma-separated allow-list.
		allowed: String,
	},
	/// File exceeded the size limit for the target material kind.
	#[error(
		"文件大小超过限制。当前大小: {:.2}MB，最大允许: {:.1}MB",
		mebibytes(.size),
		mebibytes(.max)
	)]
	FileTooLarge {
		/// Actual size in bytes.
		size: usize,
		/// Allowed maximum in bytes.
		max: usize,
	},
	/// Image URL does not reference a jpg/jpeg/png resource.
	#[error("不支持的图片格式，仅支持 jpg/jpeg/png 格式: {url}")]
	UnsupportedImageUrl {
		/// Offending URL.
		url: String,
	},
	/// Media URL cannot be parsed.
	#[error("媒体文件地址无效: {url}")]
	InvalidMediaUrl {
		/// Offending URL.
		url: String,
	},
	/// Video description is required for permanent video uploads.
	#[error("上传视频素材需要提供视频标题和介绍")]
	MissingVideoDescription,
	/// Video title is blank.
	#[error("视频标题不能为空")]
	EmptyVideoTitle,
	/// Video introduction is blank.
	#[error("视频介绍不能为空")]
	EmptyVideoIntroduction,
	/// Video title exceeds the character limit.
	#[error("视频标题长度不能超过{max}个字符")]
	VideoTitleTooLong {
		/// Character limit.
		max: usize,
	},
	/// Video introduction exceeds the character limit.
	#[error("视频介绍长度不能超过{max}个字符")]
	VideoIntroductionTooLong {
		/// Character limit.
		max: usize,
	},
	/// Article list is not a valid JSON array.
	#[error("文章内容格式错误，请提供有效的JSON数组: {reason}")]
	MalformedArticles {
		/// Parser message.
		reason: String,
	},
	/// Article list is empty.
	#[error("文章内容必须是非空数组")]
	EmptyArticles,
	/// Article index is outside the supplied list.
	#[error("文章索引 {index} 超出范围，文章总数: {len}")]
	IndexOutOfRange {
		/// Requested index.
		index: usize,
		/// Number of supplied articles.
		len: usize,
	},
	/// Resource name is not recognized.
	#[error("不支持的资源类型: {value}")]
	UnsupportedResource {
		/// Raw value.
		value: String,
	},
	/// Operation name is not recognized for the resource.
	#[error("不支持的{resource}操作: {value}")]
	UnsupportedOperation {
		/// Resource label.
		resource: &'static str,
		/// Raw value.
		value: String,
	},
}

fn mebibytes(bytes: &usize) -> f64 {
	*bytes as f64 / (1024.0 * 1024.0)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_fetch_exposes_inner_api_code() {
		let api = ApiError { code: 40013, message: "invalid appid".into(), server_message: None };
		let err = Error::token_fetch(api.into());

		assert_eq!(err.api_code(), Some(40013));
		assert!(err.to_string().starts_with("获取Access Token失败: WeChat API error (40013)"));

		let source = StdError::source(&err).expect("Token fetch error should expose its source.");

		assert!(source.to_string().contains("40013"));
	}

	#[test]
	fn io_errors_map_to_network_failure_kinds() {
		let reset = TransportError::Io(std::io::ErrorKind::ConnectionReset.into());
		let timeout = TransportError::Io(std::io::ErrorKind::TimedOut.into());
		let other = TransportError::Io(std::io::ErrorKind::NotFound.into());

		assert_eq!(reset.kind(), NetworkFailure::Reset);
		assert_eq!(timeout.kind(), NetworkFailure::Timeout);
		assert_eq!(other.kind(), NetworkFailure::Other);
	}

	#[test]
	fn validation_messages_use_chinese_wording() {
		let mib = 1024 * 1024;
		let too_large = ValidationError::FileTooLarge { size: 3 * mib, max: 2 * mib };

		assert_eq!(
			too_large.to_string(),
			"文件大小超过限制。当前大小: 3.00MB，最大允许: 2.0MB"
		);
		assert_eq!(
			ValidationError::EmptyParameter { name: "mediaId".into() }.to_string(),
			"参数 \"mediaId\" 不能为空"
		);
		assert_eq!(
			ConfigError::MissingCredential { field: "appId" }.to_string(),
			"凭证字段 appId 不能为空"
		);
	}
}
