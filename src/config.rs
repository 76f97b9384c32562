use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub const USERS_LIST_KEY: &str = "users_list";
pub const BLOGS_LIST_KEY: &str = "blogs_list";

pub const MIN_FULLNAME_LENGTH: usize = 3;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_BIO_LENGTH: usize = 150;
pub const MAX_DESCRIPTION_LENGTH: usize = 200;
pub const MAX_TAGS: usize = 10;

pub const LATEST_BLOGS_PER_PAGE: usize = 5;
pub const TRENDING_BLOGS_LIMIT: usize = 5;
pub const DEFAULT_SEARCH_LIMIT: usize = 2;
pub const USER_BLOGS_PER_PAGE: usize = 5;
pub const SEARCH_USERS_LIMIT: usize = 50;
pub const COMMENTS_PER_PAGE: usize = 5;
pub const NOTIFICATIONS_PER_PAGE: usize = 10;

pub fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

pub fn user_email_key(email: &str) -> String {
    format!("user_email:{}", email)
}

pub fn user_name_key(username: &str) -> String {
    format!("user_name:{}", username)
}

pub fn blog_key(id: &str) -> String {
    format!("blog:{}", id)
}

pub fn blog_slug_key(slug: &str) -> String {
    format!("blog_slug:{}", slug)
}

pub fn comment_key(id: &str) -> String {
    format!("comment:{}", id)
}

pub fn notification_key(id: &str) -> String {
    format!("notification:{}", id)
}

pub fn notifications_list_key(user_id: &str) -> String {
    format!("notifications:{}", user_id)
}

/// Runtime settings read from the environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub secret_access_key: String,
    pub token_expiration_hours: i64,
    pub firebase_api_key: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub seed_demo: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            secret_access_key: "development-secret".to_string(),
            token_expiration_hours: 24 * 7,
            firebase_api_key: String::new(),
            cloudinary_cloud_name: String::new(),
            cloudinary_upload_preset: String::new(),
            max_upload_bytes: 10 * 1024 * 1024,
            port: 3000,
            seed_demo: false,
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        let defaults = Self::default();
        Self {
            secret_access_key: try_load_string("BLOG_SECRET_ACCESS_KEY", defaults.secret_access_key),
            token_expiration_hours: try_load("BLOG_TOKEN_EXPIRATION_HOURS", defaults.token_expiration_hours),
            firebase_api_key: try_load_string("BLOG_FIREBASE_API_KEY", defaults.firebase_api_key),
            cloudinary_cloud_name: try_load_string("BLOG_CLOUDINARY_CLOUD_NAME", defaults.cloudinary_cloud_name),
            cloudinary_upload_preset: try_load_string(
                "BLOG_CLOUDINARY_UPLOAD_PRESET",
                defaults.cloudinary_upload_preset,
            ),
            max_upload_bytes: try_load("BLOG_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            port: try_load("BLOG_PORT", defaults.port),
            seed_demo: try_load("BLOG_SEED_DEMO", defaults.seed_demo),
        }
    }
}

fn try_load_string(key: &str, default: String) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("Environment variable {key} not found, using default");
        default
    })
}

fn try_load<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value: {e}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
