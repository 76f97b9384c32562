use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use spin_sdk::http::{Request, Response};
use tracing::{info, warn};

use crate::auth::authenticate;
use crate::config::*;
use crate::core::db::{
    all_blogs, all_comments, all_notifications, delete_notification, find_blog_by_slug, load_user, push_front, remove_from_list,
    require_user, save_blog, save_user,
};
use crate::core::errors::ApiError;
use crate::core::helpers::{new_id, now_iso, page_window, parse_body, random_suffix, respond, sanitize_html};
use crate::core::store::DocStore;
use crate::core::validation::{contains_matcher, slugify};
use crate::models::models::{Activity, AuthorCard, Blog, BlogContent};

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CreateBlogRequest {
    pub title: String,
    pub des: String,
    pub banner: String,
    pub tags: Vec<String>,
    pub content: BlogContent,
    pub draft: bool,
    pub id: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PageRequest {
    page: usize,
}

#[derive(Deserialize, Default, Clone)]
#[serde(default)]
pub struct SearchBlogsRequest {
    pub tag: Option<String>,
    pub query: Option<String>,
    pub author: Option<String>,
    pub page: usize,
    pub limit: Option<usize>,
    pub eliminate_blog: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct GetBlogRequest {
    pub blog_id: String,
    pub draft: bool,
    pub mode: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct UserBlogsRequest {
    pub page: usize,
    pub draft: bool,
    pub query: String,
    #[serde(rename = "deletedDocCount")]
    pub deleted_doc_count: usize,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct DeleteBlogRequest {
    blog_id: String,
}

/// Listing projection.
#[derive(Serialize, Debug, Clone)]
pub struct BlogSummary {
    pub blog_id: String,
    pub title: String,
    pub des: String,
    pub banner: String,
    pub activity: Activity,
    pub tags: Vec<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    pub author: Option<AuthorCard>,
}

#[derive(Serialize, Debug, Clone)]
pub struct TrendingBlog {
    pub blog_id: String,
    pub title: String,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    pub author: Option<AuthorCard>,
}

/// Full post as the reader sees it.
#[derive(Serialize, Debug, Clone)]
pub struct BlogDetail {
    #[serde(rename = "_id")]
    pub id: String,
    pub blog_id: String,
    pub title: String,
    pub des: String,
    pub banner: String,
    pub content: BlogContent,
    pub tags: Vec<String>,
    pub activity: Activity,
    pub draft: bool,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    pub author: Option<AuthorCard>,
}

/// Dashboard projection of the caller's own posts.
#[derive(Serialize, Debug, Clone)]
pub struct OwnBlog {
    pub blog_id: String,
    pub title: String,
    pub banner: String,
    pub des: String,
    pub activity: Activity,
    pub draft: bool,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
}

fn author_card<S: DocStore>(store: &S, user_id: &str) -> anyhow::Result<Option<AuthorCard>> {
    Ok(load_user(store, user_id)?.as_ref().map(AuthorCard::from))
}

fn summarize<S: DocStore>(store: &S, blog: Blog) -> anyhow::Result<BlogSummary> {
    Ok(BlogSummary {
        author: author_card(store, &blog.author)?,
        blog_id: blog.blog_id,
        title: blog.title,
        des: blog.des,
        banner: blog.banner,
        activity: blog.activity,
        tags: blog.tags,
        published_at: blog.published_at,
    })
}

fn published<S: DocStore>(store: &S) -> anyhow::Result<Vec<Blog>> {
    Ok(all_blogs(store)?.into_iter().filter(|b| !b.draft).collect())
}

/// Sanitizes every text-bearing field the editor emits.
fn sanitize_content(mut content: BlogContent) -> BlogContent {
    for block in content.blocks.iter_mut() {
        for field in ["text", "caption"] {
            if let Some(text) = block.data.get(field).and_then(|v| v.as_str()) {
                let clean = sanitize_html(text);
                block.data[field] = serde_json::Value::String(clean);
            }
        }
        if let Some(items) = block.data.get_mut("items").and_then(|v| v.as_array_mut()) {
            for item in items.iter_mut() {
                if let Some(text) = item.as_str() {
                    *item = serde_json::Value::String(sanitize_html(text));
                }
            }
        }
    }
    content
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

// === Operations ===

/// Creates a blog, or updates the author's blog named by `input.id`.
/// Returns the blog slug.
pub fn create_blog<S: DocStore>(store: &S, author_id: &str, input: CreateBlogRequest) -> Result<String, ApiError> {
    let title = input.title.trim().to_string();
    let des = input.des.trim().to_string();
    let tags = normalize_tags(input.tags);

    if title.is_empty() {
        return Err(ApiError::Forbidden("You must provide a title".to_string()));
    }
    if !input.draft {
        if des.is_empty() || des.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(ApiError::Forbidden(format!(
                "You must provide blog description under {} characters",
                MAX_DESCRIPTION_LENGTH
            )));
        }
        if input.banner.trim().is_empty() {
            return Err(ApiError::Forbidden("You must provide blog banner to publish it".to_string()));
        }
        if input.content.blocks.is_empty() {
            return Err(ApiError::Forbidden("There must be some blog content to publish it".to_string()));
        }
        if tags.is_empty() || tags.len() > MAX_TAGS {
            return Err(ApiError::Forbidden(format!(
                "Provide tags in order to publish the blog, Maximum {}",
                MAX_TAGS
            )));
        }
    }

    let content = sanitize_content(input.content);

    if let Some(slug) = input.id.filter(|s| !s.is_empty()) {
        let mut blog =
            find_blog_by_slug(store, &slug)?.ok_or_else(|| ApiError::NotFound("Blog not found".to_string()))?;
        if blog.author != author_id {
            return Err(ApiError::Forbidden("You can not edit this blog".to_string()));
        }
        let was_draft = blog.draft;
        blog.title = title;
        blog.des = des;
        blog.banner = input.banner;
        blog.content = content;
        blog.tags = tags;
        blog.draft = input.draft;
        blog.updated_at = Some(now_iso());
        save_blog(store, &blog)?;

        if was_draft != blog.draft {
            let mut author = require_user(store, author_id)?;
            author.account_info.total_posts += if blog.draft { -1 } else { 1 };
            save_user(store, &author)?;
        }
        return Ok(blog.blog_id);
    }

    let blog = Blog {
        id: new_id(),
        blog_id: format!("{}{}", slugify(&title), random_suffix(12)),
        title,
        banner: input.banner,
        des,
        content,
        tags,
        author: author_id.to_string(),
        activity: Activity::default(),
        comments: Vec::new(),
        draft: input.draft,
        published_at: now_iso(),
        updated_at: None,
    };

    save_blog(store, &blog)?;
    store.set_json(&blog_slug_key(&blog.blog_id), &blog.id)?;
    push_front(store, BLOGS_LIST_KEY, &blog.id)?;

    let mut author = require_user(store, author_id)?;
    if !blog.draft {
        author.account_info.total_posts += 1;
    }
    author.blogs.push(blog.id.clone());
    save_user(store, &author)?;

    info!("Blog {} created by {} (draft: {})", blog.blog_id, author_id, blog.draft);
    Ok(blog.blog_id)
}

pub fn latest_blogs<S: DocStore>(store: &S, page: usize) -> Result<Vec<BlogSummary>, ApiError> {
    let (skip, take) = page_window(page, LATEST_BLOGS_PER_PAGE, 0);
    let mut out = Vec::new();
    for blog in published(store)?.into_iter().skip(skip).take(take) {
        out.push(summarize(store, blog)?);
    }
    Ok(out)
}

pub fn count_latest_blogs<S: DocStore>(store: &S) -> Result<usize, ApiError> {
    Ok(published(store)?.len())
}

/// Most-read published posts, then most-liked, then newest.
pub fn trending_blogs<S: DocStore>(store: &S) -> Result<Vec<TrendingBlog>, ApiError> {
    let mut blogs = published(store)?;
    blogs.sort_by_key(|b| {
        (
            Reverse(b.activity.total_reads),
            Reverse(b.activity.total_likes),
            Reverse(b.published_at.clone()),
        )
    });

    let mut out = Vec::new();
    for blog in blogs.into_iter().take(TRENDING_BLOGS_LIMIT) {
        out.push(TrendingBlog {
            author: author_card(store, &blog.author)?,
            blog_id: blog.blog_id,
            title: blog.title,
            published_at: blog.published_at,
        });
    }
    Ok(out)
}

enum SearchFilter {
    Tag { tag: String, eliminate: Option<String> },
    Title(regex::Regex),
    Author(String),
    Everything,
}

impl SearchFilter {
    fn from_request(input: &SearchBlogsRequest) -> Result<Self, ApiError> {
        if let Some(tag) = input.tag.as_ref().filter(|t| !t.is_empty()) {
            return Ok(SearchFilter::Tag {
                tag: tag.to_lowercase(),
                eliminate: input.eliminate_blog.clone(),
            });
        }
        if let Some(query) = input.query.as_ref().filter(|q| !q.is_empty()) {
            let matcher = contains_matcher(query).ok_or_else(|| ApiError::BadRequest("Invalid query".to_string()))?;
            return Ok(SearchFilter::Title(matcher));
        }
        if let Some(author) = input.author.as_ref().filter(|a| !a.is_empty()) {
            return Ok(SearchFilter::Author(author.clone()));
        }
        Ok(SearchFilter::Everything)
    }

    fn matches(&self, blog: &Blog) -> bool {
        match self {
            SearchFilter::Tag { tag, eliminate } => {
                blog.tags.iter().any(|t| t == tag) && eliminate.as_deref() != Some(blog.blog_id.as_str())
            }
            SearchFilter::Title(matcher) => matcher.is_match(&blog.title),
            SearchFilter::Author(author) => &blog.author == author,
            SearchFilter::Everything => true,
        }
    }
}

fn search<S: DocStore>(store: &S, input: &SearchBlogsRequest) -> Result<Vec<Blog>, ApiError> {
    let filter = SearchFilter::from_request(input)?;
    Ok(published(store)?.into_iter().filter(|b| filter.matches(b)).collect())
}

pub fn search_blogs<S: DocStore>(store: &S, input: &SearchBlogsRequest) -> Result<Vec<BlogSummary>, ApiError> {
    let limit = input.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_SEARCH_LIMIT);
    let (skip, take) = page_window(input.page, limit, 0);
    let mut out = Vec::new();
    for blog in search(store, input)?.into_iter().skip(skip).take(take) {
        out.push(summarize(store, blog)?);
    }
    Ok(out)
}

pub fn count_search_blogs<S: DocStore>(store: &S, input: &SearchBlogsRequest) -> Result<usize, ApiError> {
    Ok(search(store, input)?.len())
}

/// Loads a post for reading or editing. Reading counts towards the blog's
/// and the author's read totals; `mode == "edit"` does not.
pub fn get_blog<S: DocStore>(store: &S, input: &GetBlogRequest) -> Result<BlogDetail, ApiError> {
    let mut blog =
        find_blog_by_slug(store, &input.blog_id)?.ok_or_else(|| ApiError::NotFound("Blog not found".to_string()))?;
    if blog.draft && !input.draft {
        return Err(ApiError::Forbidden("You can not access draft blogs".to_string()));
    }

    let increment = if input.mode == "edit" { 0 } else { 1 };
    if increment != 0 {
        blog.activity.total_reads += increment;
        save_blog(store, &blog)?;
        if let Some(mut author) = load_user(store, &blog.author)? {
            author.account_info.total_reads += increment;
            save_user(store, &author)?;
        }
    }

    Ok(BlogDetail {
        author: author_card(store, &blog.author)?,
        id: blog.id,
        blog_id: blog.blog_id,
        title: blog.title,
        des: blog.des,
        banner: blog.banner,
        content: blog.content,
        tags: blog.tags,
        activity: blog.activity,
        draft: blog.draft,
        published_at: blog.published_at,
    })
}

fn own_blogs<S: DocStore>(store: &S, user_id: &str, draft: bool, query: &str) -> Result<Vec<Blog>, ApiError> {
    let matcher = contains_matcher(query).ok_or_else(|| ApiError::BadRequest("Invalid query".to_string()))?;
    Ok(all_blogs(store)?
        .into_iter()
        .filter(|b| b.author == user_id && b.draft == draft && matcher.is_match(&b.title))
        .collect())
}

pub fn user_written_blogs<S: DocStore>(
    store: &S,
    user_id: &str,
    input: &UserBlogsRequest,
) -> Result<Vec<OwnBlog>, ApiError> {
    let (skip, take) = page_window(input.page, USER_BLOGS_PER_PAGE, input.deleted_doc_count);
    Ok(own_blogs(store, user_id, input.draft, &input.query)?
        .into_iter()
        .skip(skip)
        .take(take)
        .map(|b| OwnBlog {
            blog_id: b.blog_id,
            title: b.title,
            banner: b.banner,
            des: b.des,
            activity: b.activity,
            draft: b.draft,
            published_at: b.published_at,
        })
        .collect())
}

pub fn count_user_written_blogs<S: DocStore>(
    store: &S,
    user_id: &str,
    input: &UserBlogsRequest,
) -> Result<usize, ApiError> {
    Ok(own_blogs(store, user_id, input.draft, &input.query)?.len())
}

/// Removes a blog with its comments and notifications, then detaches it
/// from the author.
pub fn delete_blog<S: DocStore>(store: &S, user_id: &str, slug: &str) -> Result<(), ApiError> {
    let blog = find_blog_by_slug(store, slug)?.ok_or_else(|| ApiError::NotFound("Blog not found".to_string()))?;
    if blog.author != user_id {
        return Err(ApiError::Forbidden("You can not delete this blog".to_string()));
    }

    store.delete(&blog_key(&blog.id))?;
    store.delete(&blog_slug_key(&blog.blog_id))?;
    remove_from_list(store, BLOGS_LIST_KEY, &blog.id)?;

    // comments whose blog update failed are missing from `blog.comments`
    for comment in all_comments(store)?.into_iter().filter(|c| c.blog_id == blog.id) {
        store.delete(&comment_key(&comment.id))?;
    }
    for notification in all_notifications(store)?.into_iter().filter(|n| n.blog == blog.id) {
        delete_notification(store, &notification)?;
    }

    match load_user(store, user_id)? {
        Some(mut author) => {
            author.blogs.retain(|id| id != &blog.id);
            if !blog.draft {
                author.account_info.total_posts -= 1;
            }
            save_user(store, &author)?;
        }
        None => warn!("Deleted blog {} whose author {} no longer exists", blog.blog_id, user_id),
    }

    info!("Blog {} deleted", blog.blog_id);
    Ok(())
}

// === HTTP Handlers ===

pub fn handle_create_blog<S: DocStore>(store: &S, config: &AppConfig, req: &Request) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<CreateBlogRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(create_blog(store, &user_id, input).map(|id| serde_json::json!({ "id": id })))
}

pub fn handle_latest_blogs<S: DocStore>(store: &S, req: &Request) -> anyhow::Result<Response> {
    let input = match parse_body::<PageRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(latest_blogs(store, input.page).map(|blogs| serde_json::json!({ "blogs": blogs })))
}

pub fn handle_latest_blogs_count<S: DocStore>(store: &S) -> anyhow::Result<Response> {
    respond(count_latest_blogs(store).map(|n| serde_json::json!({ "totalDocs": n })))
}

pub fn handle_trending_blogs<S: DocStore>(store: &S) -> anyhow::Result<Response> {
    respond(trending_blogs(store).map(|blogs| serde_json::json!({ "blogs": blogs })))
}

pub fn handle_search_blogs<S: DocStore>(store: &S, req: &Request) -> anyhow::Result<Response> {
    let input = match parse_body::<SearchBlogsRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(search_blogs(store, &input).map(|blogs| serde_json::json!({ "blogs": blogs })))
}

pub fn handle_search_blogs_count<S: DocStore>(store: &S, req: &Request) -> anyhow::Result<Response> {
    let input = match parse_body::<SearchBlogsRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(count_search_blogs(store, &input).map(|n| serde_json::json!({ "totalDocs": n })))
}

pub fn handle_get_blog<S: DocStore>(store: &S, req: &Request) -> anyhow::Result<Response> {
    let input = match parse_body::<GetBlogRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(get_blog(store, &input).map(|blog| serde_json::json!({ "blog": blog })))
}

pub fn handle_user_written_blogs<S: DocStore>(
    store: &S,
    config: &AppConfig,
    req: &Request,
) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<UserBlogsRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(user_written_blogs(store, &user_id, &input).map(|blogs| serde_json::json!({ "blogs": blogs })))
}

pub fn handle_user_written_blogs_count<S: DocStore>(
    store: &S,
    config: &AppConfig,
    req: &Request,
) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<UserBlogsRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(count_user_written_blogs(store, &user_id, &input).map(|n| serde_json::json!({ "totalDocs": n })))
}

pub fn handle_delete_blog<S: DocStore>(store: &S, config: &AppConfig, req: &Request) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<DeleteBlogRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(delete_blog(store, &user_id, &input.blog_id).map(|_| serde_json::json!({ "status": "done" })))
}
