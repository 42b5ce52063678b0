//! Item dispatcher mapping host-supplied parameter maps onto client operations.
//!
//! Each item names a `resource` (`accessToken`, `material`, `draft`) and an `operation`, plus the
//! parameters that operation reads (`materialType`, `file`, `videoTitle`, `videoIntroduction`,
//! `mediaId`, `offset`, `count`, `articles`, `index`). Items run sequentially. A successful item
//! yields the API payload merged with `success: true`, an RFC 3339 `timestamp`, and
//! operation-specific fields. A failed item either aborts the run or, with `continue_on_fail`,
//! yields `{ error, success: false, timestamp }` and the run moves on.

// crates.io
use serde_json::json;
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	client::{DraftArticle, WechatClient},
	error::ValidationError,
	http::ApiTransport,
	media::{MaterialKind, MediaFile, VideoDescription},
	obs,
};

/// Read access to one item's parameters.
pub trait ParameterSource {
	/// Returns the raw value of `name`, if present.
	fn parameter(&self, name: &str) -> Option<&Value>;
}
impl ParameterSource for Map<String, Value> {
	fn parameter(&self, name: &str) -> Option<&Value> {
		self.get(name)
	}
}
impl ParameterSource for Value {
	fn parameter(&self, name: &str) -> Option<&Value> {
		self.get(name)
	}
}
impl ParameterSource for BTreeMap<String, Value> {
	fn parameter(&self, name: &str) -> Option<&Value> {
		self.get(name)
	}
}
impl ParameterSource for HashMap<String, Value> {
	fn parameter(&self, name: &str) -> Option<&Value> {
		self.get(name)
	}
}

/// API area an item targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
	/// Access-token operations.
	AccessToken,
	/// Temporary and permanent materials.
	Material,
	/// Drafts and publishing.
	Draft,
}
impl Resource {
	/// Every resource in declaration order.
	pub const ALL: [Self; 3] = [Self::AccessToken, Self::Material, Self::Draft];

	/// Parameter value naming this resource.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AccessToken => "accessToken",
			Self::Material => "material",
			Self::Draft => "draft",
		}
	}

	/// Display name used in user-facing messages.
	pub const fn label(self) -> &'static str {
		match self {
			Self::AccessToken => "Access Token",
			Self::Material => "素材",
			Self::Draft => "草稿",
		}
	}
}
impl FromStr for Resource {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|resource| resource.as_str() == s)
			.ok_or_else(|| ValidationError::UnsupportedResource { value: s.to_owned() })
	}
}
impl Display for Resource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Operation within a [`Resource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// `accessToken/get`
	GetToken,
	/// `accessToken/refresh`
	RefreshToken,
	/// `accessToken/validate`
	ValidateToken,
	/// `material/uploadTemp`
	UploadTemporary,
	/// `material/uploadPermanent`
	UploadPermanent,
	/// `material/uploadImage`
	UploadImage,
	/// `material/getPermanent`
	GetPermanent,
	/// `material/deletePermanent`
	DeletePermanent,
	/// `material/getCount`
	MaterialCount,
	/// `material/getList`
	ListMaterials,
	/// `draft/create`
	CreateDraft,
	/// `draft/get`
	GetDraft,
	/// `draft/delete`
	DeleteDraft,
	/// `draft/update`
	UpdateDraft,
	/// `draft/getCount`
	DraftCount,
	/// `draft/getList`
	ListDrafts,
	/// `draft/publish`
	PublishDraft,
}
impl Operation {
	/// Every operation in declaration order.
	pub const ALL: [Self; 17] = [
		Self::GetToken,
		Self::RefreshToken,
		Self::ValidateToken,
		Self::UploadTemporary,
		Self::UploadPermanent,
		Self::UploadImage,
		Self::GetPermanent,
		Self::DeletePermanent,
		Self::MaterialCount,
		Self::ListMaterials,
		Self::CreateDraft,
		Self::GetDraft,
		Self::DeleteDraft,
		Self::UpdateDraft,
		Self::DraftCount,
		Self::ListDrafts,
		Self::PublishDraft,
	];

	/// Resolves `value` within `resource`.
	pub fn parse(resource: Resource, value: &str) -> Result<Self, ValidationError> {
		Self::ALL
			.into_iter()
			.find(|operation| operation.resource() == resource && operation.as_str() == value)
			.ok_or_else(|| ValidationError::UnsupportedOperation {
				resource: resource.label(),
				value: value.to_owned(),
			})
	}

	/// Resource this operation belongs to.
	pub const fn resource(self) -> Resource {
		match self {
			Self::GetToken | Self::RefreshToken | Self::ValidateToken => Resource::AccessToken,
			Self::UploadTemporary
			| Self::UploadPermanent
			| Self::UploadImage
			| Self::GetPermanent
			| Self::DeletePermanent
			| Self::MaterialCount
			| Self::ListMaterials => Resource::Material,
			Self::CreateDraft
			| Self::GetDraft
			| Self::DeleteDraft
			| Self::UpdateDraft
			| Self::DraftCount
			| Self::ListDrafts
			| Self::PublishDraft => Resource::Draft,
		}
	}

	/// Parameter value naming this operation.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::GetToken | Self::GetDraft => "get",
			Self::RefreshToken => "refresh",
			Self::ValidateToken => "validate",
			Self::UploadTemporary => "uploadTemp",
			Self::UploadPermanent => "uploadPermanent",
			Self::UploadImage => "uploadImage",
			Self::GetPermanent => "getPermanent",
			Self::DeletePermanent => "deletePermanent",
			Self::MaterialCount | Self::DraftCount => "getCount",
			Self::ListMaterials | Self::ListDrafts => "getList",
			Self::CreateDraft => "create",
			Self::DeleteDraft => "delete",
			Self::UpdateDraft => "update",
			Self::PublishDraft => "publish",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/{}", self.resource(), self.as_str())
	}
}

/// Runs parameter items against a [`WechatClient`].
pub struct Dispatcher<T>
where
	T: ?Sized + ApiTransport,
{
	client: WechatClient<T>,
}
impl<T> Dispatcher<T>
where
	T: ?Sized + ApiTransport,
{
	/// Wraps a client.
	pub fn new(client: WechatClient<T>) -> Self {
		Self { client }
	}

	/// Underlying client.
	pub fn client(&self) -> &WechatClient<T> {
		&self.client
	}

	/// Runs `items` in order and returns one record per item.
	///
	/// Without `continue_on_fail` the first error is returned and later items are not run.
	pub async fn execute<P>(&self, items: &[P], continue_on_fail: bool) -> Result<Vec<Value>>
	where
		P: ParameterSource,
	{
		let mut records = Vec::with_capacity(items.len());

		for (index, item) in items.iter().enumerate() {
			match self.execute_item(item).await {
				Ok(record) => records.push(record),
				Err(err) if continue_on_fail => {
					obs::log_item_failure(index, &err);
					records.push(self.error_record(&err));
				},
				Err(err) => return Err(err),
			}
		}

		Ok(records)
	}

	/// Runs a single item and returns its success record.
	pub async fn execute_item<P>(&self, item: &P) -> Result<Value>
	where
		P: ?Sized + ParameterSource,
	{
		let resource = required_str(item, "resource")?.parse::<Resource>()?;
		let operation = Operation::parse(resource, required_str(item, "operation")?)?;
		let client = &self.client;

		match operation {
			Operation::GetToken => {
				let token = client.access_token().await?;
				let status = client.cache_status();
				let payload = json!({ "access_token": token.expose(), "cache_status": status });

				Ok(self.success_record(payload, &[]))
			},
			Operation::RefreshToken => {
				let token = client.refresh_access_token().await?;
				let payload = json!({ "access_token": token.expose(), "refreshed": true });

				Ok(self.success_record(payload, &[]))
			},
			Operation::ValidateToken => {
				let validation = client.validate_access_token().await?;
				let payload = json!({
					"access_token": validation.access_token.expose(),
					"is_valid": validation.is_valid,
				});

				Ok(self.success_record(payload, &[]))
			},
			Operation::UploadTemporary => {
				let kind = material_kind(item)?;
				let file = MediaFile::from_data_uri(required_str(item, "file")?)?;
				let payload = client.upload_temporary(kind, file).await?;

				Ok(self.success_record(payload, &[
					("material_type", json!(kind)),
					("operation", json!(operation.as_str())),
				]))
			},
			Operation::UploadPermanent => {
				let kind = material_kind(item)?;
				let file = MediaFile::from_data_uri(required_str(item, "file")?)?;
				let description = if kind == MaterialKind::Video {
					Some(VideoDescription::new(
						required_str(item, "videoTitle")?,
						required_str(item, "videoIntroduction")?,
					))
				} else {
					None
				};
				let payload = client.upload_permanent(kind, file, description.as_ref()).await?;

				Ok(self.success_record(payload, &[
					("material_type", json!(kind)),
					("operation", json!(operation.as_str())),
				]))
			},
			Operation::UploadImage => {
				let file = MediaFile::from_data_uri(required_str(item, "file")?)?;
				let payload = client.upload_article_image(file).await?;

				Ok(self.success_record(payload, &[("operation", json!(operation.as_str()))]))
			},
			Operation::GetPermanent | Operation::DeletePermanent => {
				let media_id = required_str(item, "mediaId")?;
				let payload = if operation == Operation::GetPermanent {
					client.get_permanent(media_id).await?
				} else {
					client.delete_permanent(media_id).await?
				};

				Ok(self.success_record(payload, &[
					("media_id", json!(media_id)),
					("operation", json!(operation.as_str())),
				]))
			},
			Operation::MaterialCount => {
				let payload = client.material_count().await?;

				Ok(self.success_record(payload, &[("operation", json!(operation.as_str()))]))
			},
			Operation::ListMaterials => {
				let kind = material_kind(item)?;
				let offset = u32_param(item, "offset", 0)?;
				let count = u32_param(item, "count", 20)?;
				let payload = client.list_materials(kind, offset, count).await?;

				Ok(self.success_record(payload, &[
					("material_type", json!(kind)),
					("offset", json!(offset)),
					("count", json!(count)),
					("operation", json!(operation.as_str())),
				]))
			},
			Operation::CreateDraft => {
				let articles = articles(item)?;
				let payload = client.create_draft(&articles).await?;

				Ok(self.success_record(payload, &[
					("article_count", json!(articles.len())),
					("operation", json!(operation.as_str())),
				]))
			},
			Operation::GetDraft | Operation::DeleteDraft | Operation::PublishDraft => {
				let media_id = required_str(item, "mediaId")?;
				let payload = match operation {
					Operation::GetDraft => client.get_draft(media_id).await?,
					Operation::DeleteDraft => client.delete_draft(media_id).await?,
					_ => client.publish_draft(media_id).await?,
				};

				Ok(self.success_record(payload, &[
					("media_id", json!(media_id)),
					("operation", json!(operation.as_str())),
				]))
			},
			Operation::UpdateDraft => {
				let media_id = required_str(item, "mediaId")?;
				let index = u32_param(item, "index", 0)?;
				let articles = articles(item)?;
				let payload = client.update_draft(media_id, index as usize, &articles).await?;

				Ok(self.success_record(payload, &[
					("media_id", json!(media_id)),
					("index", json!(index)),
					("operation", json!(operation.as_str())),
				]))
			},
			Operation::DraftCount => {
				let payload = client.draft_count().await?;

				Ok(self.success_record(payload, &[("operation", json!(operation.as_str()))]))
			},
			Operation::ListDrafts => {
				let offset = u32_param(item, "offset", 0)?;
				let count = u32_param(item, "count", 20)?;
				let payload = client.list_drafts(offset, count).await?;

				Ok(self.success_record(payload, &[
					("offset", json!(offset)),
					("count", json!(count)),
					("operation", json!(operation.as_str())),
				]))
			},
		}
	}

	fn success_record(&self, payload: Value, extras: &[(&str, Value)]) -> Value {
		let mut record = match payload {
			Value::Object(map) => map,
			Value::Null => Map::new(),
			other => Map::from_iter([("data".to_owned(), other)]),
		};

		record.insert("success".into(), Value::Bool(true));
		record.insert("timestamp".into(), Value::String(self.timestamp()));

		for (key, value) in extras {
			record.insert((*key).to_owned(), value.clone());
		}

		Value::Object(record)
	}

	fn error_record(&self, error: &Error) -> Value {
		json!({ "error": error.to_string(), "success": false, "timestamp": self.timestamp() })
	}

	fn timestamp(&self) -> String {
		let now = self.client.tokens().now();

		now.format(&Rfc3339).unwrap_or_else(|_| now.unix_timestamp().to_string())
	}
}
impl<T> Debug for Dispatcher<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Dispatcher").field("client", &self.client).finish()
	}
}

fn required_str<'a, P>(item: &'a P, name: &str) -> Result<&'a str, ValidationError>
where
	P: ?Sized + ParameterSource,
{
	match item.parameter(name) {
		None | Some(Value::Null) => Err(ValidationError::EmptyParameter { name: name.to_owned() }),
		Some(Value::String(value)) if value.trim().is_empty() =>
			Err(ValidationError::EmptyParameter { name: name.to_owned() }),
		Some(Value::String(value)) => Ok(value.as_str()),
		Some(_) =>
			Err(ValidationError::ParameterType { name: name.to_owned(), expected: "字符串" }),
	}
}

fn material_kind<P>(item: &P) -> Result<MaterialKind, ValidationError>
where
	P: ?Sized + ParameterSource,
{
	match item.parameter("materialType") {
		None | Some(Value::Null) => Ok(MaterialKind::Image),
		Some(_) => required_str(item, "materialType")?.parse(),
	}
}

fn u32_param<P>(item: &P, name: &str, default: u32) -> Result<u32, ValidationError>
where
	P: ?Sized + ParameterSource,
{
	let invalid = || ValidationError::ParameterType {
		name: name.to_owned(),
		expected: "非负整数",
	};

	match item.parameter(name) {
		None | Some(Value::Null) => Ok(default),
		Some(Value::Number(number)) => {
			let value = match number.as_u64() {
				Some(value) => value,
				None => number
					.as_f64()
					.filter(|value| *value >= 0.0 && value.fract() == 0.0)
					.map(|value| value as u64)
					.ok_or_else(invalid)?,
			};

			u32::try_from(value).map_err(|_| invalid())
		},
		Some(Value::String(value)) => value.trim().parse().map_err(|_| invalid()),
		Some(_) => Err(invalid()),
	}
}

fn articles<P>(item: &P) -> Result<Vec<DraftArticle>, ValidationError>
where
	P: ?Sized + ParameterSource,
{
	match item.parameter("articles") {
		Some(Value::Array(items)) => DraftArticle::from_value_list(Value::Array(items.clone())),
		Some(Value::String(_)) | None | Some(Value::Null) =>
			DraftArticle::parse_list(required_str(item, "articles")?),
		Some(_) => Err(ValidationError::ParameterType {
			name: "articles".into(),
			expected: "JSON数组或JSON文本",
		}),
	}
}
