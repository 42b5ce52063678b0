//! Media payloads: data-URI decoding, per-kind limits, multipart form construction, and URL
//! downloads for material uploads.

// std
use std::time::Duration as StdDuration;
// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	api::ApiCaller,
	error::{TransportError, ValidationError},
	http::{ApiRequest, ApiTransport, MultipartForm},
	sanitize,
};

/// Size limit for article inline images sent to `media/uploadimg`.
pub const ARTICLE_IMAGE_MAX_SIZE: usize = 1024 * 1024;
/// Timeout applied to binary media downloads.
pub const DOWNLOAD_TIMEOUT: StdDuration = StdDuration::from_secs(30);
/// Maximum video title length, in characters.
pub const VIDEO_TITLE_MAX_CHARS: usize = 20;
/// Maximum video introduction length, in characters.
pub const VIDEO_INTRODUCTION_MAX_CHARS: usize = 120;

const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/png"];
const VOICE_MIME_TYPES: &[&str] = &["audio/mpeg", "audio/amr"];
const VIDEO_MIME_TYPES: &[&str] = &["video/mp4"];
const IMAGE_URL_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];
const FALLBACK_MIME: &str = "application/octet-stream";

/// Material category accepted by the upload endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
	/// JPEG/PNG image up to 10 MiB.
	Image,
	/// MP3/AMR audio up to 2 MiB.
	Voice,
	/// MP4 video up to 10 MiB.
	Video,
	/// JPEG/PNG thumbnail up to 64 KiB.
	Thumb,
}
impl MaterialKind {
	/// Every material kind in declaration order.
	pub const ALL: [Self; 4] = [Self::Image, Self::Voice, Self::Video, Self::Thumb];

	/// Wire name used in forms and query strings.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Image => "image",
			Self::Voice => "voice",
			Self::Video => "video",
			Self::Thumb => "thumb",
		}
	}

	/// MIME types accepted for this kind.
	pub const fn allowed_mime_types(self) -> &'static [&'static str] {
		match self {
			Self::Image | Self::Thumb => IMAGE_MIME_TYPES,
			Self::Voice => VOICE_MIME_TYPES,
			Self::Video => VIDEO_MIME_TYPES,
		}
	}

	/// Maximum payload size in bytes.
	pub const fn max_size(self) -> usize {
		match self {
			Self::Image | Self::Video => 10 * 1024 * 1024,
			Self::Voice => 2 * 1024 * 1024,
			Self::Thumb => 64 * 1024,
		}
	}

	/// Image-like kinds only accept jpg/jpeg/png URLs for downloads.
	pub const fn is_image(self) -> bool {
		matches!(self, Self::Image | Self::Thumb)
	}
}
impl FromStr for MaterialKind {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s)
			.ok_or_else(|| ValidationError::UnsupportedMaterialType { value: s.to_owned() })
	}
}
impl Display for MaterialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Decoded binary payload plus its MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaFile {
	mime: String,
	bytes: Vec<u8>,
}
impl MediaFile {
	/// Wraps raw bytes with an explicit MIME type.
	pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
		Self { mime: mime.into(), bytes }
	}

	/// Decodes a `data:<mime>;base64,<data>` URI.
	pub fn from_data_uri(uri: &str) -> Result<Self, ValidationError> {
		let rest = uri.trim().strip_prefix("data:").ok_or(ValidationError::NotDataUri)?;
		let (header, data) = rest.split_once(',').ok_or(ValidationError::NotDataUri)?;
		let mime = header.split_once(';').map_or(header, |(mime, _)| mime).trim();

		if mime.is_empty() {
			return Err(ValidationError::NotDataUri);
		}

		let data = data.chars().filter(|c| !c.is_ascii_whitespace()).collect::<String>();
		let bytes = STANDARD.decode(data).map_err(|_| ValidationError::InvalidBase64)?;

		Ok(Self::new(mime.to_ascii_lowercase(), bytes))
	}

	/// MIME type.
	pub fn mime(&self) -> &str {
		&self.mime
	}

	/// Raw bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Payload size in bytes.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Returns `true` for an empty payload.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// File extension derived from the MIME type.
	pub fn extension(&self) -> &'static str {
		extension_for_mime(&self.mime)
	}

	/// Checks the MIME type and size against the limits of `kind`.
	pub fn validate_for(&self, kind: MaterialKind) -> Result<(), ValidationError> {
		self.check(kind.allowed_mime_types(), kind.max_size())
	}

	/// Checks the payload against the article inline image limits (jpeg/png, 1 MiB).
	pub fn validate_article_image(&self) -> Result<(), ValidationError> {
		self.check(IMAGE_MIME_TYPES, ARTICLE_IMAGE_MAX_SIZE)
	}

	fn check(&self, allowed: &[&str], max: usize) -> Result<(), ValidationError> {
		if !allowed.contains(&self.mime.as_str()) {
			return Err(ValidationError::UnsupportedMimeType {
				mime: self.mime.clone(),
				allowed: allowed.join(", "),
			});
		}
		if self.bytes.len() > max {
			return Err(ValidationError::FileTooLarge { size: self.bytes.len(), max });
		}

		Ok(())
	}
}
impl Debug for MediaFile {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MediaFile")
			.field("mime", &self.mime)
			.field("len", &self.bytes.len())
			.finish()
	}
}

/// Title and introduction attached to permanent video uploads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDescription {
	/// Video title.
	pub title: String,
	/// Video introduction.
	pub introduction: String,
}
impl VideoDescription {
	/// Builds a description from user input, stripping script content from both fields.
	pub fn new(title: &str, introduction: &str) -> Self {
		Self {
			title: sanitize::sanitize_input(title),
			introduction: sanitize::sanitize_input(introduction),
		}
	}

	/// Rejects blank fields and fields over the character limits.
	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.title.trim().is_empty() {
			return Err(ValidationError::EmptyVideoTitle);
		}
		if self.introduction.trim().is_empty() {
			return Err(ValidationError::EmptyVideoIntroduction);
		}
		if self.title.chars().count() > VIDEO_TITLE_MAX_CHARS {
			return Err(ValidationError::VideoTitleTooLong { max: VIDEO_TITLE_MAX_CHARS });
		}
		if self.introduction.chars().count() > VIDEO_INTRODUCTION_MAX_CHARS {
			return Err(ValidationError::VideoIntroductionTooLong {
				max: VIDEO_INTRODUCTION_MAX_CHARS,
			});
		}

		Ok(())
	}

	/// JSON text sent as the `description` form field.
	pub fn to_json(&self) -> String {
		serde_json::json!({ "title": self.title, "introduction": self.introduction }).to_string()
	}
}

/// Maps a MIME type to the extension used in upload file names.
pub fn extension_for_mime(mime: &str) -> &'static str {
	match mime {
		"image/jpeg" => "jpg",
		"image/png" => "png",
		"audio/mpeg" => "mp3",
		"audio/amr" => "amr",
		"video/mp4" => "mp4",
		_ => "bin",
	}
}

/// Builds the `type` + `media` (+ `description` for videos) form for material uploads.
pub fn material_form(
	kind: MaterialKind,
	file: MediaFile,
	description: Option<&VideoDescription>,
) -> MultipartForm {
	let filename = format!("upload.{}", file.extension());
	let form = MultipartForm::default()
		.text("type", kind.as_str())
		.file("media", file.bytes, filename, file.mime);

	match description {
		Some(description) if kind == MaterialKind::Video =>
			form.text("description", description.to_json()),
		_ => form,
	}
}

/// Builds the single `media` form for article inline images.
pub fn article_image_form(file: MediaFile) -> MultipartForm {
	let filename = format!("image.{}", file.extension());

	MultipartForm::default().file("media", file.bytes, filename, file.mime)
}

/// Downloads `url` and validates the payload against the limits of `kind`.
///
/// Image and thumbnail URLs must reference a jpg/jpeg/png resource. The MIME type comes from
/// `Content-Type` when it is acceptable for `kind`, otherwise from the URL extension. The request
/// is sent once with a 30 second timeout.
pub async fn download_media<T>(
	caller: &ApiCaller<T>,
	url: &str,
	kind: MaterialKind,
) -> Result<MediaFile>
where
	T: ?Sized + ApiTransport,
{
	let parsed = Url::parse(url)
		.map_err(|_| ValidationError::InvalidMediaUrl { url: url.to_owned() })?;

	if kind.is_image() && !has_image_extension(url) {
		return Err(ValidationError::UnsupportedImageUrl { url: url.to_owned() }.into());
	}

	let guessed = mime_for_path(parsed.path());
	let request = ApiRequest::get(parsed)
		.with_operation("download_media")
		.with_timeout(DOWNLOAD_TIMEOUT)
		.with_max_body_size(kind.max_size());
	let response = caller.fetch_raw(request).await.map_err(|err| match err {
		Error::Transport(TransportError::BodyTooLarge { size, max }) =>
			ValidationError::FileTooLarge { size, max }.into(),
		err => err,
	})?;
	let declared = response.content_type.as_deref().map(mime_essence);
	let mime = declared
		.as_deref()
		.filter(|mime| kind.allowed_mime_types().contains(mime))
		.or(guessed)
		.or(declared.as_deref())
		.unwrap_or(FALLBACK_MIME)
		.to_owned();
	let file = MediaFile::new(mime, response.body);

	file.validate_for(kind)?;

	Ok(file)
}

fn has_image_extension(url: &str) -> bool {
	let url = url.to_ascii_lowercase();

	IMAGE_URL_EXTENSIONS.iter().any(|ext| url.contains(ext))
}

fn mime_for_path(path: &str) -> Option<&'static str> {
	let (_, ext) = path.rsplit_once('.')?;

	match ext.to_ascii_lowercase().as_str() {
		"jpg" | "jpeg" => Some("image/jpeg"),
		"png" => Some("image/png"),
		"mp3" => Some("audio/mpeg"),
		"amr" => Some("audio/amr"),
		"mp4" => Some("video/mp4"),
		_ => None,
	}
}

fn mime_essence(content_type: &str) -> String {
	content_type.split_once(';').map_or(content_type, |(mime, _)| mime).trim().to_ascii_lowercase()
}
