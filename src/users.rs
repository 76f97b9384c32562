use serde::{Deserialize, Serialize};
use spin_sdk::http::{Request, Response};

use crate::auth::authenticate;
use crate::config::*;
use crate::core::db::{find_user_by_username, load_user, read_list, require_user, save_user};
use crate::core::errors::ApiError;
use crate::core::helpers::{parse_body, respond, sanitize_text};
use crate::core::store::DocStore;
use crate::core::validation::{contains_matcher, is_valid_social_link};
use crate::models::models::{AccountInfo, AuthorCard, SocialLinks, User};

/// Public profile: the user document without credentials or blog list.
#[derive(Serialize, Debug)]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: String,
    pub personal_info: PublicPersonalInfo,
    pub social_links: SocialLinks,
    pub account_info: AccountInfo,
    #[serde(rename = "joinedAt")]
    pub joined_at: String,
}

#[derive(Serialize, Debug)]
pub struct PublicPersonalInfo {
    pub fullname: String,
    pub email: String,
    pub username: String,
    pub bio: String,
    pub profile_img: String,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Profile {
            id: user.id,
            personal_info: PublicPersonalInfo {
                fullname: user.personal_info.fullname,
                email: user.personal_info.email,
                username: user.personal_info.username,
                bio: user.personal_info.bio,
                profile_img: user.personal_info.profile_img,
            },
            social_links: user.social_links,
            account_info: user.account_info,
            joined_at: user.joined_at,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SearchUsersRequest {
    query: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ProfileRequest {
    username: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ProfileImageRequest {
    url: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub username: String,
    pub bio: String,
    pub social_links: SocialLinks,
}

// === Operations ===

pub fn search_users<S: DocStore>(store: &S, query: &str) -> Result<Vec<AuthorCard>, ApiError> {
    let matcher = contains_matcher(query).ok_or_else(|| ApiError::BadRequest("Invalid query".to_string()))?;
    let mut users = Vec::new();
    for id in read_list(store, USERS_LIST_KEY)? {
        if users.len() >= SEARCH_USERS_LIMIT {
            break;
        }
        if let Some(u) = load_user(store, &id)? {
            if matcher.is_match(&u.personal_info.username) {
                users.push(AuthorCard::from(&u));
            }
        }
    }
    Ok(users)
}

pub fn get_profile<S: DocStore>(store: &S, username: &str) -> Result<Profile, ApiError> {
    find_user_by_username(store, username)?
        .map(Profile::from)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub fn update_profile_img<S: DocStore>(store: &S, user_id: &str, url: &str) -> Result<String, ApiError> {
    if url.trim().is_empty() {
        return Err(ApiError::Forbidden("Provide an image url".to_string()));
    }
    let mut user = require_user(store, user_id)?;
    user.personal_info.profile_img = url.trim().to_string();
    save_user(store, &user)?;
    Ok(user.personal_info.profile_img)
}

pub fn update_profile<S: DocStore>(
    store: &S,
    user_id: &str,
    input: UpdateProfileRequest,
) -> Result<String, ApiError> {
    let username = input.username.trim().to_string();
    if username.chars().count() < MIN_USERNAME_LENGTH {
        return Err(ApiError::Forbidden("Username should be at least 3 letters long".to_string()));
    }
    if input.bio.chars().count() > MAX_BIO_LENGTH {
        return Err(ApiError::Forbidden(format!(
            "Bio should not be more than {} characters",
            MAX_BIO_LENGTH
        )));
    }
    for (platform, link) in input.social_links.entries() {
        if !link.is_empty() && !is_valid_social_link(platform, link) {
            return Err(ApiError::Forbidden(format!(
                "{} link is invalid. You must enter a full link",
                platform
            )));
        }
    }

    let mut user = require_user(store, user_id)?;
    let old_username = user.personal_info.username.clone();
    if username != old_username {
        if store.exists(&user_name_key(&username))? {
            return Err(ApiError::Conflict("Username is already taken".to_string()));
        }
        store.set_json(&user_name_key(&username), &user.id)?;
        store.delete(&user_name_key(&old_username))?;
    }

    user.personal_info.username = username;
    user.personal_info.bio = sanitize_text(&input.bio);
    user.social_links = input.social_links;
    save_user(store, &user)?;

    Ok(user.personal_info.username)
}

// === HTTP Handlers ===

pub fn handle_search_users<S: DocStore>(store: &S, req: &Request) -> anyhow::Result<Response> {
    let input = match parse_body::<SearchUsersRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(search_users(store, &input.query).map(|users| serde_json::json!({ "users": users })))
}

pub fn handle_get_profile<S: DocStore>(store: &S, req: &Request) -> anyhow::Result<Response> {
    let input = match parse_body::<ProfileRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(get_profile(store, &input.username))
}

pub fn handle_update_profile_img<S: DocStore>(
    store: &S,
    config: &AppConfig,
    req: &Request,
) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<ProfileImageRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(update_profile_img(store, &user_id, &input.url).map(|url| serde_json::json!({ "profile_img": url })))
}

pub fn handle_update_profile<S: DocStore>(
    store: &S,
    config: &AppConfig,
    req: &Request,
) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<UpdateProfileRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(update_profile(store, &user_id, input).map(|username| serde_json::json!({ "username": username })))
}
