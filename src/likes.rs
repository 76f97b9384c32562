use serde::Deserialize;
use spin_sdk::http::{Request, Response};

use crate::auth::authenticate;
use crate::config::AppConfig;
use crate::core::db::{delete_notification, insert_notification, notifications_for, require_blog, save_blog};
use crate::core::errors::ApiError;
use crate::core::helpers::{new_id, now_iso, parse_body, respond};
use crate::core::store::DocStore;
use crate::models::models::{Notification, NotificationKind};

#[derive(Deserialize, Default)]
#[serde(default)]
struct LikeRequest {
    #[serde(rename = "_id")]
    blog: String,
    #[serde(rename = "islikedByUser")]
    liked_by_user: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct IsLikedRequest {
    #[serde(rename = "_id")]
    blog: String,
}

/// The like notification `user_id` left on `blog_id`, if any. Likes exist
/// only as these notifications.
pub fn find_like<S: DocStore>(store: &S, user_id: &str, blog_id: &str) -> Result<Option<Notification>, ApiError> {
    let blog = require_blog(store, blog_id)?;
    Ok(notifications_for(store, &blog.author)?
        .into_iter()
        .find(|n| n.kind == NotificationKind::Like && n.user == user_id && n.blog == blog.id))
}

/// Applies a like or an unlike as the client reports it. `liked_by_user`
/// is the client's view before the click; it is not checked against the
/// store, so repeated clicks move the counter every time.
///
/// Returns whether the blog is now liked by the caller.
pub fn toggle_like<S: DocStore>(store: &S, user_id: &str, blog_id: &str, liked_by_user: bool) -> Result<bool, ApiError> {
    let mut blog = require_blog(store, blog_id)?;
    blog.activity.total_likes += if liked_by_user { -1 } else { 1 };
    save_blog(store, &blog)?;

    if !liked_by_user {
        let like = Notification {
            id: new_id(),
            kind: NotificationKind::Like,
            blog: blog.id.clone(),
            notification_for: blog.author.clone(),
            user: user_id.to_string(),
            comment: None,
            reply: None,
            replied_on_comment: None,
            seen: false,
            created_at: now_iso(),
        };
        insert_notification(store, &like)?;
        Ok(true)
    } else {
        if let Some(like) = find_like(store, user_id, &blog.id)? {
            delete_notification(store, &like)?;
        }
        Ok(false)
    }
}

// === HTTP Handlers ===

pub fn handle_like_blog<S: DocStore>(store: &S, config: &AppConfig, req: &Request) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<LikeRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(
        toggle_like(store, &user_id, &input.blog, input.liked_by_user)
            .map(|liked| serde_json::json!({ "liked_by_user": liked })),
    )
}

pub fn handle_is_liked<S: DocStore>(store: &S, config: &AppConfig, req: &Request) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<IsLikedRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(find_like(store, &user_id, &input.blog).map(|like| serde_json::json!({ "result": like.is_some() })))
}
