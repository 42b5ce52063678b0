//! Draft box and publish operations.

// crates.io
use serde::Deserializer;
use serde_json::json;
// self
use crate::{
	_prelude::*,
	api::Endpoint,
	client::{self, WechatClient},
	error::ValidationError,
	http::ApiTransport,
	sanitize,
};

/// Single article inside a draft.
///
/// Unknown fields are kept in [`DraftArticle::extra`] and sent back unchanged, so newer API
/// fields pass through without a crate update. Null text fields read as empty strings, and the
/// comment and cover flags accept either booleans or `0`/`1`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftArticle {
	/// Article title.
	#[serde(default, deserialize_with = "text")]
	pub title: String,
	/// Author name.
	#[serde(default, deserialize_with = "text")]
	pub author: String,
	/// Summary shown in share cards.
	#[serde(default, deserialize_with = "text")]
	pub digest: String,
	/// HTML body; sent without scrubbing.
	#[serde(default, deserialize_with = "text")]
	pub content: String,
	/// "Read more" link.
	#[serde(default, deserialize_with = "text")]
	pub content_source_url: String,
	/// Permanent material id of the cover image.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub thumb_media_id: Option<String>,
	/// Whether the cover is shown inside the body.
	#[serde(default, deserialize_with = "flag", skip_serializing_if = "Option::is_none")]
	pub show_cover_pic: Option<u8>,
	/// Whether comments are enabled.
	#[serde(default, deserialize_with = "flag", skip_serializing_if = "Option::is_none")]
	pub need_open_comment: Option<u8>,
	/// Whether only followers may comment.
	#[serde(default, deserialize_with = "flag", skip_serializing_if = "Option::is_none")]
	pub only_fans_can_comment: Option<u8>,
	/// Fields not modeled above.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl DraftArticle {
	/// Parses a JSON array of articles.
	///
	/// Malformed JSON, non-array documents, and non-object elements are rejected as
	/// [`ValidationError::MalformedArticles`]; an empty array as
	/// [`ValidationError::EmptyArticles`].
	pub fn parse_list(json: &str) -> Result<Vec<Self>, ValidationError> {
		let value = serde_json::from_str::<Value>(json)
			.map_err(|e| ValidationError::MalformedArticles { reason: e.to_string() })?;

		Self::from_value_list(value)
	}

	/// Same as [`DraftArticle::parse_list`] for an already decoded document.
	pub fn from_value_list(value: Value) -> Result<Vec<Self>, ValidationError> {
		let Value::Array(items) = value else {
			return Err(ValidationError::MalformedArticles {
				reason: "expected a JSON array".into(),
			});
		};

		if items.is_empty() {
			return Err(ValidationError::EmptyArticles);
		}

		serde_json::from_value(Value::Array(items))
			.map_err(|e| ValidationError::MalformedArticles { reason: e.to_string() })
	}

	/// Returns a copy with script content stripped from the title, author, digest, and source
	/// URL.
	pub fn sanitized(&self) -> Self {
		Self {
			title: sanitize::sanitize_input(&self.title),
			author: sanitize::sanitize_input(&self.author),
			digest: sanitize::sanitize_input(&self.digest),
			content_source_url: sanitize::sanitize_input(&self.content_source_url),
			..self.clone()
		}
	}
}

impl<T> WechatClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a draft (`draft/add`) and returns its `media_id`.
	pub async fn create_draft(&self, articles: &[DraftArticle]) -> Result<Value> {
		if articles.is_empty() {
			return Err(ValidationError::EmptyArticles.into());
		}

		let articles = articles.iter().map(DraftArticle::sanitized).collect::<Vec<_>>();

		self.post_json(Endpoint::AddDraft, json!({ "articles": articles })).await
	}

	/// Fetches a draft.
	pub async fn get_draft(&self, media_id: &str) -> Result<Value> {
		client::require_non_empty("mediaId", media_id)?;

		self.post_json(Endpoint::GetDraft, json!({ "media_id": media_id })).await
	}

	/// Deletes a draft.
	pub async fn delete_draft(&self, media_id: &str) -> Result<Value> {
		client::require_non_empty("mediaId", media_id)?;

		self.post_json(Endpoint::DeleteDraft, json!({ "media_id": media_id })).await
	}

	/// Replaces the article at `index` of a draft with `articles[index]`.
	///
	/// Only the selected article is sent; `index` must be within `articles`.
	pub async fn update_draft(
		&self,
		media_id: &str,
		index: usize,
		articles: &[DraftArticle],
	) -> Result<Value> {
		client::require_non_empty("mediaId", media_id)?;

		if articles.is_empty() {
			return Err(ValidationError::EmptyArticles.into());
		}

		let article = articles
			.get(index)
			.ok_or(ValidationError::IndexOutOfRange { index, len: articles.len() })?
			.sanitized();
		let body = json!({ "media_id": media_id, "index": index, "articles": article });

		self.post_json(Endpoint::UpdateDraft, body).await
	}

	/// Returns the number of drafts.
	pub async fn draft_count(&self) -> Result<Value> {
		self.get(Endpoint::DraftCount).await
	}

	/// Lists drafts starting at `offset`.
	pub async fn list_drafts(&self, offset: u32, count: u32) -> Result<Value> {
		self.post_json(Endpoint::BatchGetDraft, json!({ "offset": offset, "count": count })).await
	}

	/// Submits a draft for publishing (`freepublish/submit`) and returns the `publish_id`.
	pub async fn publish_draft(&self, media_id: &str) -> Result<Value> {
		client::require_non_empty("mediaId", media_id)?;

		self.post_json(Endpoint::PublishSubmit, json!({ "media_id": media_id })).await
	}
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn flag<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawFlag {
		Bool(bool),
		Number(u8),
	}

	Ok(Option::<RawFlag>::deserialize(deserializer)?.map(|raw| match raw {
		RawFlag::Bool(value) => u8::from(value),
		RawFlag::Number(value) => value,
	}))
}
