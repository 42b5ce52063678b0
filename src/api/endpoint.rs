//! WeChat Official Account REST endpoints used by this crate.

// self
use crate::{_prelude::*, http::HttpMethod};

/// Known API endpoints, resolved against a credential's base URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
	/// `GET /cgi-bin/token`
	Token,
	/// `GET /cgi-bin/getcallbackip`
	CallbackIp,
	/// `POST /cgi-bin/media/upload`
	UploadMedia,
	/// `POST /cgi-bin/media/uploadimg`
	UploadImage,
	/// `POST /cgi-bin/material/add_material`
	AddMaterial,
	/// `POST /cgi-bin/material/get_material`
	GetMaterial,
	/// `POST /cgi-bin/material/del_material`
	DeleteMaterial,
	/// `GET /cgi-bin/material/get_materialcount`
	MaterialCount,
	/// `POST /cgi-bin/material/batchget_material`
	BatchGetMaterial,
	/// `POST /cgi-bin/draft/add`
	AddDraft,
	/// `POST /cgi-bin/draft/get`
	GetDraft,
	/// `POST /cgi-bin/draft/delete`
	DeleteDraft,
	/// `POST /cgi-bin/draft/update`
	UpdateDraft,
	/// `GET /cgi-bin/draft/count`
	DraftCount,
	/// `POST /cgi-bin/draft/batchget`
	BatchGetDraft,
	/// `POST /cgi-bin/freepublish/submit`
	PublishSubmit,
}
impl Endpoint {
	/// Path relative to the API base URL.
	pub const fn path(self) -> &'static str {
		match self {
			Self::Token => "/cgi-bin/token",
			Self::CallbackIp => "/cgi-bin/getcallbackip",
			Self::UploadMedia => "/cgi-bin/media/upload",
			Self::UploadImage => "/cgi-bin/media/uploadimg",
			Self::AddMaterial => "/cgi-bin/material/add_material",
			Self::GetMaterial => "/cgi-bin/material/get_material",
			Self::DeleteMaterial => "/cgi-bin/material/del_material",
			Self::MaterialCount => "/cgi-bin/material/get_materialcount",
			Self::BatchGetMaterial => "/cgi-bin/material/batchget_material",
			Self::AddDraft => "/cgi-bin/draft/add",
			Self::GetDraft => "/cgi-bin/draft/get",
			Self::DeleteDraft => "/cgi-bin/draft/delete",
			Self::UpdateDraft => "/cgi-bin/draft/update",
			Self::DraftCount => "/cgi-bin/draft/count",
			Self::BatchGetDraft => "/cgi-bin/draft/batchget",
			Self::PublishSubmit => "/cgi-bin/freepublish/submit",
		}
	}

	/// HTTP method the endpoint expects.
	pub const fn method(self) -> HttpMethod {
		match self {
			Self::Token | Self::CallbackIp | Self::MaterialCount | Self::DraftCount =>
				HttpMethod::Get,
			_ => HttpMethod::Post,
		}
	}

	/// Stable label used for span and metric fields.
	pub const fn operation(self) -> &'static str {
		match self {
			Self::Token => "token",
			Self::CallbackIp => "callback_ip",
			Self::UploadMedia => "upload_media",
			Self::UploadImage => "upload_image",
			Self::AddMaterial => "add_material",
			Self::GetMaterial => "get_material",
			Self::DeleteMaterial => "delete_material",
			Self::MaterialCount => "material_count",
			Self::BatchGetMaterial => "batchget_material",
			Self::AddDraft => "add_draft",
			Self::GetDraft => "get_draft",
			Self::DeleteDraft => "delete_draft",
			Self::UpdateDraft => "update_draft",
			Self::DraftCount => "draft_count",
			Self::BatchGetDraft => "batchget_draft",
			Self::PublishSubmit => "publish_submit",
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.path())
	}
}
