use std::collections::HashSet;

use ammonia::Builder;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::SecondsFormat;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use spin_sdk::http::{Request, Response};
use uuid::Uuid;

use crate::core::errors::ApiError;

pub const CORS_ORIGIN: &str = "*";

const AVATAR_COLLECTIONS: [&str; 3] = ["notionists-neutral", "adventurer-neutral", "fun-emoji"];
const AVATAR_SEEDS: [&str; 8] = [
    "Garfield", "Tinkerbell", "Annie", "Loki", "Cleo", "Angel", "Bob", "Mia",
];

pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn default_profile_img() -> String {
    let mut rng = rand::thread_rng();
    let collection = AVATAR_COLLECTIONS.choose(&mut rng).unwrap_or(&AVATAR_COLLECTIONS[0]);
    let seed = AVATAR_SEEDS.choose(&mut rng).unwrap_or(&AVATAR_SEEDS[0]);
    format!("https://api.dicebear.com/6.x/{}/svg?seed={}", collection, seed)
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::PasswordHash;

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Strips every tag, leaving plain text.
pub fn sanitize_text(text: &str) -> String {
    Builder::default()
        .tags(HashSet::new())
        .clean(text)
        .to_string()
}

/// Keeps inline formatting produced by the editor and drops scripts and
/// event handlers.
pub fn sanitize_html(text: &str) -> String {
    Builder::default()
        .link_rel(Some("noopener noreferrer"))
        .clean(text)
        .to_string()
}

pub fn bearer_token(req: &Request) -> Option<&str> {
    req.header("Authorization")?
        .as_str()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Parses a JSON request body. An empty body reads as `{}`.
pub fn parse_body<T: DeserializeOwned>(req: &Request) -> Result<T, ApiError> {
    let body = req.body();
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) { b"{}" } else { body };
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

pub fn json_response<T: Serialize>(status: u16, body: &T) -> anyhow::Result<Response> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", CORS_ORIGIN)
        .body(serde_json::to_vec(body)?)
        .build())
}

/// Renders a domain result: 200 with the value, or the error's status.
pub fn respond<T: Serialize>(result: Result<T, ApiError>) -> anyhow::Result<Response> {
    match result {
        Ok(value) => json_response(200, &value),
        Err(err) => Ok(err.into()),
    }
}

pub fn preflight() -> Response {
    Response::builder()
        .status(204)
        .header("Access-Control-Allow-Origin", CORS_ORIGIN)
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .build()
}

/// Page window for a 1-based page number, shifted back by documents the
/// client already removed from earlier pages.
pub fn page_window(page: usize, per_page: usize, deleted: usize) -> (usize, usize) {
    let skip = page.max(1).saturating_sub(1) * per_page;
    (skip.saturating_sub(deleted), per_page)
}
