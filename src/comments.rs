use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use spin_sdk::http::{Request, Response};
use tracing::{info, warn};

use crate::auth::authenticate;
use crate::config::*;
use crate::core::db::{
    all_notifications, delete_notification, insert_notification, load_blog, load_comment, load_notification,
    load_user, require_blog, save_blog, save_comment, save_notification,
};
use crate::core::errors::ApiError;
use crate::core::helpers::{new_id, now_iso, parse_body, respond, sanitize_text};
use crate::core::store::DocStore;
use crate::models::models::{AuthorCard, Comment, Notification, NotificationKind};

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct AddCommentRequest {
    #[serde(rename = "_id")]
    pub blog: String,
    pub comment: String,
    pub replying_to: Option<String>,
    pub notification_id: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct BlogCommentsRequest {
    blog_id: String,
    skip: usize,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RepliesRequest {
    #[serde(rename = "_id")]
    id: String,
    skip: usize,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct DeleteCommentRequest {
    #[serde(rename = "_id")]
    id: String,
}

/// Echo of a freshly stored comment.
#[derive(Serialize, Debug, Clone)]
pub struct CommentEcho {
    pub comment: String,
    #[serde(rename = "commentedAt")]
    pub commented_at: String,
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub children: Vec<String>,
}

/// Comment with its author expanded, as shown in a thread.
#[derive(Serialize, Debug, Clone)]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: String,
    pub blog_id: String,
    pub blog_author: String,
    pub comment: String,
    pub children: Vec<String>,
    #[serde(rename = "isReply")]
    pub is_reply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(rename = "commentedAt")]
    pub commented_at: String,
    pub commented_by: Option<AuthorCard>,
}

fn view<S: DocStore>(store: &S, comment: Comment) -> anyhow::Result<CommentView> {
    let commented_by = load_user(store, &comment.commented_by)?.as_ref().map(AuthorCard::from);
    Ok(CommentView {
        id: comment.id,
        blog_id: comment.blog_id,
        blog_author: comment.blog_author,
        comment: comment.comment,
        children: comment.children,
        is_reply: comment.is_reply,
        parent: comment.parent,
        commented_at: comment.commented_at,
        commented_by,
    })
}

// === Operations ===

/// Stores a comment and fans it out to the blog, the parent comment and a
/// notification.
///
/// Only the comment write can fail the call. The later writes are
/// independent: a failure in one is logged and the others still run, and
/// nothing already written is undone.
pub fn add_comment<S: DocStore>(store: &S, user_id: &str, input: AddCommentRequest) -> Result<CommentEcho, ApiError> {
    let text = sanitize_text(input.comment.trim());
    if text.is_empty() {
        return Err(ApiError::Forbidden("Write something to leave a comment".to_string()));
    }
    let blog = require_blog(store, &input.blog)?;
    // clients also send `blog_author`; the stored blog is authoritative
    let blog_author = blog.author.clone();
    let replying_to = input.replying_to.filter(|id| !id.is_empty());

    let comment = Comment {
        id: new_id(),
        blog_id: blog.id.clone(),
        blog_author: blog_author.clone(),
        comment: text,
        commented_by: user_id.to_string(),
        children: Vec::new(),
        is_reply: replying_to.is_some(),
        parent: replying_to.clone(),
        commented_at: now_iso(),
    };

    // 1. the comment itself
    save_comment(store, &comment)?;

    // 2. blog back-reference and counters
    let blog_update = load_blog(store, &blog.id).and_then(|current| {
        let mut current = current.ok_or_else(|| anyhow::anyhow!("blog {} vanished", blog.id))?;
        current.comments.push(comment.id.clone());
        current.activity.total_comments += 1;
        if replying_to.is_none() {
            current.activity.total_parent_comments += 1;
        }
        save_blog(store, &current)
    });
    if let Err(e) = blog_update {
        warn!("Comment {} stored but blog {} not updated: {}", comment.id, blog.id, e);
    }

    let mut notification = Notification {
        id: new_id(),
        kind: if replying_to.is_some() { NotificationKind::Reply } else { NotificationKind::Comment },
        blog: blog.id.clone(),
        notification_for: blog_author,
        user: user_id.to_string(),
        comment: Some(comment.id.clone()),
        reply: None,
        replied_on_comment: None,
        seen: false,
        created_at: now_iso(),
    };

    // 3. parent back-reference; the reply notifies the parent's author
    if let Some(parent_id) = &replying_to {
        notification.replied_on_comment = Some(parent_id.clone());
        let parent_update = load_comment(store, parent_id).and_then(|parent| {
            let mut parent = parent.ok_or_else(|| anyhow::anyhow!("parent comment {} not found", parent_id))?;
            parent.children.push(comment.id.clone());
            save_comment(store, &parent)?;
            Ok(parent.commented_by)
        });
        match parent_update {
            Ok(parent_author) => notification.notification_for = parent_author,
            Err(e) => warn!("Reply {} stored but parent {} not updated: {}", comment.id, parent_id, e),
        }

        if let Some(notification_id) = input.notification_id.as_deref().filter(|id| !id.is_empty()) {
            let marked = load_notification(store, notification_id).and_then(|n| match n {
                Some(mut n) => {
                    n.reply = Some(comment.id.clone());
                    save_notification(store, &n)
                }
                None => Ok(()),
            });
            if let Err(e) = marked {
                warn!("Could not link reply {} to notification {}: {}", comment.id, notification_id, e);
            }
        }
    }

    // 4. the notification
    if let Err(e) = insert_notification(store, &notification) {
        warn!("Comment {} stored but its notification was not: {}", comment.id, e);
    }

    info!("Comment {} added to blog {} by {}", comment.id, blog.blog_id, user_id);
    Ok(CommentEcho {
        comment: comment.comment,
        commented_at: comment.commented_at,
        id: comment.id,
        user_id: user_id.to_string(),
        children: comment.children,
    })
}

/// Top-level comments of a blog, newest first.
pub fn blog_comments<S: DocStore>(store: &S, blog_id: &str, skip: usize) -> Result<Vec<CommentView>, ApiError> {
    let blog = require_blog(store, blog_id)?;
    let mut top_level = Vec::new();
    for id in blog.comments.iter().rev() {
        if let Some(c) = load_comment(store, id)? {
            if !c.is_reply {
                top_level.push(c);
            }
        }
    }
    top_level.sort_by_key(|c| Reverse(c.commented_at.clone()));

    let mut out = Vec::new();
    for c in top_level.into_iter().skip(skip).take(COMMENTS_PER_PAGE) {
        out.push(view(store, c)?);
    }
    Ok(out)
}

/// Replies to a comment, newest first.
pub fn replies<S: DocStore>(store: &S, comment_id: &str, skip: usize) -> Result<Vec<CommentView>, ApiError> {
    let parent =
        load_comment(store, comment_id)?.ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;
    let mut children = Vec::new();
    for id in parent.children.iter().rev() {
        if let Some(c) = load_comment(store, id)? {
            children.push(c);
        }
    }
    children.sort_by_key(|c| Reverse(c.commented_at.clone()));

    let mut out = Vec::new();
    for c in children.into_iter().skip(skip).take(COMMENTS_PER_PAGE) {
        out.push(view(store, c)?);
    }
    Ok(out)
}

/// Deletes a comment and every reply below it. Allowed for the commenter
/// and for the blog's author.
pub fn delete_comment<S: DocStore>(store: &S, user_id: &str, comment_id: &str) -> Result<(), ApiError> {
    let comment =
        load_comment(store, comment_id)?.ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;
    if comment.commented_by != user_id && comment.blog_author != user_id {
        return Err(ApiError::Forbidden("You can not delete this comment".to_string()));
    }

    let mut pending = vec![comment_id.to_string()];
    while let Some(id) = pending.pop() {
        let Some(comment) = load_comment(store, &id)? else {
            continue;
        };
        store.delete(&comment_key(&id))?;

        if let Some(parent_id) = &comment.parent {
            if let Some(mut parent) = load_comment(store, parent_id)? {
                parent.children.retain(|c| c != &id);
                save_comment(store, &parent)?;
            }
        }

        for mut n in all_notifications(store)? {
            if n.comment.as_deref() == Some(id.as_str()) {
                delete_notification(store, &n)?;
            } else if n.reply.as_deref() == Some(id.as_str()) {
                n.reply = None;
                save_notification(store, &n)?;
            }
        }

        if let Some(mut blog) = load_blog(store, &comment.blog_id)? {
            blog.comments.retain(|c| c != &id);
            blog.activity.total_comments -= 1;
            if comment.parent.is_none() {
                blog.activity.total_parent_comments -= 1;
            }
            save_blog(store, &blog)?;
        }

        pending.extend(comment.children);
    }

    Ok(())
}

// === HTTP Handlers ===

pub fn handle_add_comment<S: DocStore>(store: &S, config: &AppConfig, req: &Request) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<AddCommentRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(add_comment(store, &user_id, input))
}

pub fn handle_blog_comments<S: DocStore>(store: &S, req: &Request) -> anyhow::Result<Response> {
    let input = match parse_body::<BlogCommentsRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(blog_comments(store, &input.blog_id, input.skip))
}

pub fn handle_replies<S: DocStore>(store: &S, req: &Request) -> anyhow::Result<Response> {
    let input = match parse_body::<RepliesRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(replies(store, &input.id, input.skip).map(|replies| serde_json::json!({ "replies": replies })))
}

pub fn handle_delete_comment<S: DocStore>(store: &S, config: &AppConfig, req: &Request) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<DeleteCommentRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(delete_comment(store, &user_id, &input.id).map(|_| serde_json::json!({ "status": "done" })))
}
