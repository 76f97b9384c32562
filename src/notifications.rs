use serde::{Deserialize, Serialize};
use spin_sdk::http::{Request, Response};

use crate::auth::authenticate;
use crate::config::*;
use crate::core::db::{load_blog, load_comment, load_user, notifications_for, save_notification};
use crate::core::errors::ApiError;
use crate::core::helpers::{page_window, parse_body, respond};
use crate::core::store::DocStore;
use crate::models::models::{AuthorCard, Notification, NotificationKind};

#[derive(Deserialize)]
#[serde(default)]
pub struct NotificationsRequest {
    pub page: usize,
    pub filter: String,
    #[serde(rename = "deletedDocCount")]
    pub deleted_doc_count: usize,
}

impl Default for NotificationsRequest {
    fn default() -> Self {
        Self {
            page: 1,
            filter: "all".to_string(),
            deleted_doc_count: 0,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct BlogRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub blog_id: String,
    pub title: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct CommentRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub comment: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct NotificationView {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub seen: bool,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub blog: Option<BlogRef>,
    pub user: Option<AuthorCard>,
    pub comment: Option<CommentRef>,
    pub reply: Option<CommentRef>,
    pub replied_on_comment: Option<CommentRef>,
}

fn comment_ref<S: DocStore>(store: &S, id: Option<&str>) -> anyhow::Result<Option<CommentRef>> {
    let Some(id) = id else {
        return Ok(None);
    };
    Ok(load_comment(store, id)?.map(|c| CommentRef { id: c.id, comment: c.comment }))
}

fn expand<S: DocStore>(store: &S, n: &Notification) -> anyhow::Result<NotificationView> {
    Ok(NotificationView {
        id: n.id.clone(),
        kind: n.kind,
        seen: n.seen,
        created_at: n.created_at.clone(),
        blog: load_blog(store, &n.blog)?.map(|b| BlogRef { id: b.id, blog_id: b.blog_id, title: b.title }),
        user: load_user(store, &n.user)?.as_ref().map(AuthorCard::from),
        comment: comment_ref(store, n.comment.as_deref())?,
        reply: comment_ref(store, n.reply.as_deref())?,
        replied_on_comment: comment_ref(store, n.replied_on_comment.as_deref())?,
    })
}

/// Notifications for `user_id` caused by someone else, matching `filter`
/// (`"all"` or a notification type).
fn inbox<S: DocStore>(store: &S, user_id: &str, filter: &str) -> anyhow::Result<Vec<Notification>> {
    Ok(notifications_for(store, user_id)?
        .into_iter()
        .filter(|n| n.user != user_id)
        .filter(|n| filter.is_empty() || filter == "all" || n.kind.as_str() == filter)
        .collect())
}

// === Operations ===

pub fn has_new_notification<S: DocStore>(store: &S, user_id: &str) -> Result<bool, ApiError> {
    Ok(inbox(store, user_id, "all")?.iter().any(|n| !n.seen))
}

/// One page of the inbox, newest first. The returned notifications are
/// marked seen after they are read.
pub fn list_notifications<S: DocStore>(
    store: &S,
    user_id: &str,
    input: &NotificationsRequest,
) -> Result<Vec<NotificationView>, ApiError> {
    let (skip, take) = page_window(input.page, NOTIFICATIONS_PER_PAGE, input.deleted_doc_count);
    let page: Vec<Notification> = inbox(store, user_id, &input.filter)?.into_iter().skip(skip).take(take).collect();

    let mut views = Vec::with_capacity(page.len());
    for n in &page {
        views.push(expand(store, n)?);
    }
    for mut n in page.into_iter().filter(|n| !n.seen) {
        n.seen = true;
        save_notification(store, &n)?;
    }
    Ok(views)
}

pub fn count_notifications<S: DocStore>(store: &S, user_id: &str, filter: &str) -> Result<usize, ApiError> {
    Ok(inbox(store, user_id, filter)?.len())
}

// === HTTP Handlers ===

pub fn handle_new_notification<S: DocStore>(
    store: &S,
    config: &AppConfig,
    req: &Request,
) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    respond(
        has_new_notification(store, &user_id)
            .map(|available| serde_json::json!({ "new_notification_available": available })),
    )
}

pub fn handle_notifications<S: DocStore>(store: &S, config: &AppConfig, req: &Request) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<NotificationsRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(
        list_notifications(store, &user_id, &input)
            .map(|notifications| serde_json::json!({ "notifications": notifications })),
    )
}

pub fn handle_notifications_count<S: DocStore>(
    store: &S,
    config: &AppConfig,
    req: &Request,
) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<NotificationsRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(count_notifications(store, &user_id, &input.filter).map(|n| serde_json::json!({ "totalDocs": n })))
}
