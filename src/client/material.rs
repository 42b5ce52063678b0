//! Temporary and permanent material operations.

// crates.io
use serde_json::json;
// self
use crate::{
	_prelude::*,
	api::Endpoint,
	client::{self, WechatClient},
	error::ValidationError,
	http::ApiTransport,
	media::{self, MaterialKind, MediaFile, VideoDescription},
};

impl<T> WechatClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Uploads a temporary material (`media/upload`), valid server-side for three days.
	pub async fn upload_temporary(&self, kind: MaterialKind, file: MediaFile) -> Result<Value> {
		file.validate_for(kind)?;

		let form = media::material_form(kind, file, None);

		self.post_form(Endpoint::UploadMedia, &[("type", kind.as_str())], form).await
	}

	/// Uploads a permanent material (`material/add_material`).
	///
	/// Videos require a [`VideoDescription`]; it is ignored for other kinds.
	pub async fn upload_permanent(
		&self,
		kind: MaterialKind,
		file: MediaFile,
		description: Option<&VideoDescription>,
	) -> Result<Value> {
		file.validate_for(kind)?;

		if kind == MaterialKind::Video {
			description.ok_or(ValidationError::MissingVideoDescription)?.validate()?;
		}

		let form = media::material_form(kind, file, description);

		self.post_form(Endpoint::AddMaterial, &[("type", kind.as_str())], form).await
	}

	/// Uploads an image for use inside article bodies (`media/uploadimg`) and returns its URL.
	pub async fn upload_article_image(&self, file: MediaFile) -> Result<Value> {
		file.validate_article_image()?;

		self.post_form(Endpoint::UploadImage, &[], media::article_image_form(file)).await
	}

	/// Downloads a remote file and validates it for `kind`, ready for one of the upload calls.
	pub async fn download_media(&self, url: &str, kind: MaterialKind) -> Result<MediaFile> {
		media::download_media(self.caller(), url, kind).await
	}

	/// Fetches a permanent material's metadata or article content.
	pub async fn get_permanent(&self, media_id: &str) -> Result<Value> {
		client::require_non_empty("mediaId", media_id)?;

		self.post_json(Endpoint::GetMaterial, json!({ "media_id": media_id })).await
	}

	/// Deletes a permanent material.
	pub async fn delete_permanent(&self, media_id: &str) -> Result<Value> {
		client::require_non_empty("mediaId", media_id)?;

		self.post_json(Endpoint::DeleteMaterial, json!({ "media_id": media_id })).await
	}

	/// Returns per-kind permanent material totals.
	pub async fn material_count(&self) -> Result<Value> {
		self.get(Endpoint::MaterialCount).await
	}

	/// Lists permanent materials of `kind`, starting at `offset`.
	pub async fn list_materials(
		&self,
		kind: MaterialKind,
		offset: u32,
		count: u32,
	) -> Result<Value> {
		let body = json!({ "type": kind.as_str(), "offset": offset, "count": count });

		self.post_json(Endpoint::BatchGetMaterial, body).await
	}
}
