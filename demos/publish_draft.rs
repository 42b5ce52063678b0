//! Uploads a cover thumbnail, creates a draft around it, and publishes the draft against a local
//! mock of the WeChat API using the default reqwest transport.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use wechat_offiaccount::{
	auth::Credentials,
	client::{DraftArticle, WechatClient},
	media::{MaterialKind, MediaFile},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cgi-bin/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-token\",\"expires_in\":7200}");
		})
		.await;
	let thumb_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/cgi-bin/material/add_material");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"media_id\":\"thumb-1\",\"url\":\"http://mmbiz.qpic.cn/thumb.jpg\"}");
		})
		.await;
	let draft_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/cgi-bin/draft/add");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"media_id\":\"draft-1\"}");
		})
		.await;
	let publish_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/cgi-bin/freepublish/submit");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errcode\":0,\"errmsg\":\"ok\",\"publish_id\":\"2247483650\"}");
		})
		.await;
	let credentials =
		Credentials::new("wx-demo-app", "demo-secret").with_base_url(&server.base_url())?;
	let client = WechatClient::new(credentials);
	let thumb = MediaFile::from_data_uri("data:image/jpeg;base64,/9j/4AAQSkZJRgABAQ==")?;
	let uploaded = client.upload_permanent(MaterialKind::Thumb, thumb, None).await?;
	let thumb_media_id = uploaded["media_id"].as_str().unwrap_or_default().to_owned();
	let article = DraftArticle {
		title: "Release notes".into(),
		author: "Platform team".into(),
		content: "<p>Everything that shipped this week.</p>".into(),
		thumb_media_id: Some(thumb_media_id),
		..Default::default()
	};
	let draft = client.create_draft(&[article]).await?;
	let draft_id = draft["media_id"].as_str().unwrap_or_default();
	let published = client.publish_draft(draft_id).await?;

	println!("Draft {draft_id} submitted for publishing as {}.", published["publish_id"]);
	println!("Token cache: {:?}.", client.cache_status());

	token_mock.assert_async().await;
	thumb_mock.assert_async().await;
	draft_mock.assert_async().await;
	publish_mock.assert_async().await;

	Ok(())
}
