use regex::Regex;
use serde::Deserialize;
use spin_sdk::http::{Request, Response};
use std::sync::OnceLock;
use tracing::warn;

use crate::config::AppConfig;
use crate::core::errors::ApiError;
use crate::core::helpers::{parse_body, respond};
use crate::external::MediaHost;

#[derive(Deserialize, Default)]
#[serde(default)]
struct UploadRequest {
    image: String,
}

fn data_uri_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^data:image/[a-zA-Z0-9.+-]+;base64,[A-Za-z0-9+/]+={0,2}$").expect("Regex should compile")
    })
}

/// Checks that `image` is a base64 image data URI whose decoded size stays
/// within `max_bytes`.
pub fn validate_image(image: &str, max_bytes: usize) -> Result<(), ApiError> {
    if !data_uri_regex().is_match(image) {
        return Err(ApiError::BadRequest("Invalid image".to_string()));
    }
    let payload = image.split_once(',').map(|(_, p)| p).unwrap_or_default();
    let padding = payload.chars().rev().take_while(|c| *c == '=').count();
    let decoded_len = (payload.len() / 4 * 3).saturating_sub(padding);
    if decoded_len > max_bytes {
        return Err(ApiError::BadRequest("Image too large".to_string()));
    }
    Ok(())
}

pub async fn upload_image<M: MediaHost>(media: &M, config: &AppConfig, image: &str) -> Result<String, ApiError> {
    validate_image(image, config.max_upload_bytes)?;
    media.upload(image).await.map_err(|e| {
        warn!("Image upload failed: {}", e);
        ApiError::InternalError("Upload failed".to_string())
    })
}

// === HTTP Handlers ===

pub async fn handle_upload<M: MediaHost>(media: &M, config: &AppConfig, req: &Request) -> anyhow::Result<Response> {
    let input = match parse_body::<UploadRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(
        upload_image(media, config, &input.image)
            .await
            .map(|url| serde_json::json!({ "url": url })),
    )
}
