#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use wechat_offiaccount::{
	_preludet::*,
	error::ValidationError,
	media::{MaterialKind, MediaFile, VideoDescription},
};

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token").query_param("appid", "test-app");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"TOKEN\",\"expires_in\":7200}");
		})
		.await
}

#[tokio::test]
async fn upload_temporary_sends_type_and_media_parts() {
	let server = MockServer::start_async().await;
	let (client, _) = build_test_client(&server.base_url());
	let token = mock_token(&server).await;
	let upload = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/cgi-bin/media/upload")
				.query_param("access_token", "TOKEN")
				.query_param("type", "image")
				.body_includes("name=\"type\"")
				.body_includes("filename=\"upload.png\"");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"type\":\"image\",\"media_id\":\"MEDIA\",\"created_at\":1700000000}");
		})
		.await;
	let file = MediaFile::from_data_uri("data:image/png;base64,iVBORw0KGgo=")
		.expect("Data URI should decode.");
	let payload = client
		.upload_temporary(MaterialKind::Image, file)
		.await
		.expect("Temporary upload should succeed.");

	assert_eq!(payload["media_id"], json!("MEDIA"));

	token.assert_async().await;
	upload.assert_async().await;
}

#[tokio::test]
async fn oversized_and_mistyped_files_fail_before_any_request() {
	let server = MockServer::start_async().await;
	let (client, _) = build_test_client(&server.base_url());
	let token = mock_token(&server).await;
	let err = client
		.upload_temporary(MaterialKind::Thumb, MediaFile::new("image/jpeg", vec![0; 65 * 1024]))
		.await
		.expect_err("Oversized thumbnail must be rejected.");

	assert!(matches!(err, Error::Validation(ValidationError::FileTooLarge { .. })));

	let err = client
		.upload_permanent(MaterialKind::Voice, MediaFile::new("audio/wav", vec![0; 4]), None)
		.await
		.expect_err("WAV voice must be rejected.");

	assert!(matches!(err, Error::Validation(ValidationError::UnsupportedMimeType { .. })));

	let err = client
		.upload_permanent(MaterialKind::Video, MediaFile::new("video/mp4", vec![0; 4]), None)
		.await
		.expect_err("Video without description must be rejected.");

	assert!(matches!(err, Error::Validation(ValidationError::MissingVideoDescription)));

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn permanent_video_carries_description() {
	let server = MockServer::start_async().await;
	let (client, _) = build_test_client(&server.base_url());
	let _token = mock_token(&server).await;
	let upload = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/cgi-bin/material/add_material")
				.query_param("type", "video")
				.body_includes("name=\"description\"")
				.body_includes("\"title\":\"Launch\"")
				.body_includes("filename=\"upload.mp4\"");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"media_id\":\"VIDEO\"}");
		})
		.await;
	let description = VideoDescription::new("Launch", "<script>x</script>Walkthrough");
	let payload = client
		.upload_permanent(
			MaterialKind::Video,
			MediaFile::new("video/mp4", vec![0; 16]),
			Some(&description),
		)
		.await
		.expect("Permanent video upload should succeed.");

	assert_eq!(payload["media_id"], json!("VIDEO"));
	assert_eq!(description.introduction, "Walkthrough");

	upload.assert_async().await;
}

#[tokio::test]
async fn article_image_uses_uploadimg() {
	let server = MockServer::start_async().await;
	let (client, _) = build_test_client(&server.base_url());
	let _token = mock_token(&server).await;
	let upload = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/cgi-bin/media/uploadimg")
				.body_includes("filename=\"image.jpg\"");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"url\":\"http://mmbiz.qpic.cn/a.jpg\"}");
		})
		.await;
	let payload = client
		.upload_article_image(MediaFile::new("image/jpeg", vec![0xFF, 0xD8]))
		.await
		.expect("Article image upload should succeed.");

	assert_eq!(payload["url"], json!("http://mmbiz.qpic.cn/a.jpg"));

	upload.assert_async().await;
}

#[tokio::test]
async fn material_queries_send_expected_bodies() {
	let server = MockServer::start_async().await;
	let (client, _) = build_test_client(&server.base_url());
	let token = mock_token(&server).await;
	let get = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/cgi-bin/material/get_material")
				.json_body(json!({ "media_id": "M1" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"title\":\"T\",\"down_url\":\"http://x\"}");
		})
		.await;
	let delete = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/cgi-bin/material/del_material")
				.json_body(json!({ "media_id": "M1" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":0,\"errmsg\":\"ok\"}");
		})
		.await;
	let count = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/material/get_materialcount");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"voice_count\":1,\"video_count\":2,\"image_count\":3,\"news_count\":4}");
		})
		.await;
	let list = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/cgi-bin/material/batchget_material")
				.json_body(json!({ "type": "voice", "offset": 5, "count": 10 }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"total_count\":1,\"item_count\":1,\"item\":[]}");
		})
		.await;

	assert_eq!(client.get_permanent("M1").await.expect("Get should succeed.")["title"], "T");
	assert_eq!(client.delete_permanent("M1").await.expect("Delete should succeed.")["errcode"], 0);
	assert_eq!(client.material_count().await.expect("Count should succeed.")["image_count"], 3);
	assert_eq!(
		client
			.list_materials(MaterialKind::Voice, 5, 10)
			.await
			.expect("List should succeed.")["total_count"],
		1
	);
	assert!(matches!(
		client.get_permanent(" ").await,
		Err(Error::Validation(ValidationError::EmptyParameter { .. }))
	));

	token.assert_calls_async(1).await;
	get.assert_async().await;
	delete.assert_async().await;
	count.assert_async().await;
	list.assert_async().await;
}

#[tokio::test]
async fn download_media_validates_remote_files() {
	let server = MockServer::start_async().await;
	let (client, _) = build_test_client(&server.base_url());
	let image = server
		.mock_async(|when, then| {
			when.method(GET).path("/assets/cover.png");
			then.status(200).header("content-type", "image/png").body(b"\x89PNG");
		})
		.await;
	let voice = server
		.mock_async(|when, then| {
			when.method(GET).path("/assets/voice.amr");
			then.status(200)
				.header("content-type", "application/octet-stream")
				.body(b"\x01\x02\x03");
		})
		.await;
	let file = client
		.download_media(&server.url("/assets/cover.png"), MaterialKind::Thumb)
		.await
		.expect("PNG download should succeed.");

	assert_eq!(file.mime(), "image/png");
	assert_eq!(file.len(), 4);

	let file = client
		.download_media(&server.url("/assets/voice.amr"), MaterialKind::Voice)
		.await
		.expect("AMR download should succeed.");

	assert_eq!(file.mime(), "audio/amr");

	let err = client
		.download_media(&server.url("/assets/anim.gif"), MaterialKind::Image)
		.await
		.expect_err("GIF URLs must be rejected.");

	assert!(matches!(err, Error::Validation(ValidationError::UnsupportedImageUrl { .. })));

	image.assert_async().await;
	voice.assert_async().await;
}

#[tokio::test]
async fn download_media_rejects_bodies_over_the_kind_limit() {
	let server = MockServer::start_async().await;
	let (client, _) = build_test_client(&server.base_url());
	let oversized = vec![0_u8; MaterialKind::Thumb.max_size() + 1];
	let thumb = server
		.mock_async(move |when, then| {
			when.method(GET).path("/assets/huge.jpg");
			then.status(200).header("content-type", "image/jpeg").body(oversized);
		})
		.await;
	let err = client
		.download_media(&server.url("/assets/huge.jpg"), MaterialKind::Thumb)
		.await
		.expect_err("Bodies above the thumb limit must be rejected.");

	assert!(matches!(
		err,
		Error::Validation(ValidationError::FileTooLarge { max, .. })
			if max == MaterialKind::Thumb.max_size()
	));

	thumb.assert_async().await;
}
