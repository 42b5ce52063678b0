//! Credential pair supplied by the host's credential store.

// self
use crate::{_prelude::*, auth::secret::Secret, error::ConfigError};

/// Production API host used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.weixin.qq.com";

/// Immutable WeChat credential pair plus the API base URL it authenticates against.
///
/// Deserializes from the host credential JSON (`appId`/`appSecret`/`baseUrl`, with `appid`,
/// `appsecret`, and snake-case aliases). Bare hosts such as `api.weixin.qq.com` are upgraded to
/// `https://`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCredentials")]
pub struct Credentials {
	app_id: String,
	app_secret: Secret,
	base_url: Url,
}
impl Credentials {
	/// Creates credentials for the production API host.
	///
	/// Field contents are checked by [`Credentials::validate`], which the token cache runs before
	/// every fetch.
	pub fn new(app_id: impl Into<String>, app_secret: impl Into<Secret>) -> Self {
		Self {
			app_id: app_id.into(),
			app_secret: app_secret.into(),
			base_url: Url::parse(DEFAULT_BASE_URL).expect("Default base URL must parse."),
		}
	}

	/// Overrides the API base URL (for sandboxes, proxies, or mock servers).
	pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ConfigError> {
		self.base_url = parse_base_url(base_url)?;

		Ok(self)
	}

	/// WeChat AppID.
	pub fn app_id(&self) -> &str {
		&self.app_id
	}

	/// WeChat AppSecret.
	pub fn app_secret(&self) -> &Secret {
		&self.app_secret
	}

	/// API base URL.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Ensures both credential fields are present.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.app_id.trim().is_empty() {
			return Err(ConfigError::MissingCredential { field: "appId" });
		}
		if self.app_secret.is_blank() {
			return Err(ConfigError::MissingCredential { field: "appSecret" });
		}

		Ok(())
	}

	/// Resolves an API path (e.g. `/cgi-bin/token`) against the base URL, keeping any base path
	/// prefix such as `/sandbox`.
	pub fn endpoint_url(&self, path: &str) -> Url {
		let mut url = self.base_url.clone();
		let prefix = url.path().trim_end_matches('/').to_owned();

		url.set_path(&format!("{prefix}/{}", path.trim_start_matches('/')));
		url.set_query(None);

		url
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("app_id", &self.app_id)
			.field("app_secret", &self.app_secret)
			.field("base_url", &self.base_url.as_str())
			.finish()
	}
}
impl TryFrom<RawCredentials> for Credentials {
	type Error = ConfigError;

	fn try_from(raw: RawCredentials) -> Result<Self, Self::Error> {
		let mut credentials = Self::new(raw.app_id, raw.app_secret);

		if let Some(base_url) = raw.base_url.filter(|value| !value.trim().is_empty()) {
			credentials = credentials.with_base_url(&base_url)?;
		}

		credentials.validate()?;

		Ok(credentials)
	}
}

#[derive(Deserialize)]
struct RawCredentials {
	#[serde(rename = "appId", alias = "appid", alias = "app_id", default)]
	app_id: String,
	#[serde(rename = "appSecret", alias = "appsecret", alias = "app_secret", default)]
	app_secret: String,
	#[serde(rename = "baseUrl", alias = "base_url", default)]
	base_url: Option<String>,
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
	let trimmed = value.trim();
	let candidate = if trimmed.contains("://") {
		trimmed.to_owned()
	} else {
		format!("https://{trimmed}")
	};

	Url::parse(&candidate)
		.map_err(|source| ConfigError::InvalidBaseUrl { value: value.to_owned(), source })
}
