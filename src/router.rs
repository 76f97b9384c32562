use spin_sdk::http::{Method, Request, Response};

use crate::config::AppConfig;
use crate::core::errors::ApiError;
use crate::core::helpers::preflight;
use crate::core::store::DocStore;
use crate::external::{CloudinaryHost, FirebaseIdentity, IdentityProvider, MediaHost};
use crate::{auth, blogs, comments, likes, notifications, static_server, upload, users};

/// Everything a request handler may touch.
pub struct AppContext<S, I, M> {
    pub store: S,
    pub identity: I,
    pub media: M,
    pub config: AppConfig,
}

impl<S: DocStore> AppContext<S, FirebaseIdentity, CloudinaryHost> {
    /// Wires the production identity provider and media host from `config`.
    pub fn from_config(store: S, config: AppConfig) -> Self {
        Self {
            identity: FirebaseIdentity::new(config.firebase_api_key.clone()),
            media: CloudinaryHost::new(
                config.cloudinary_cloud_name.clone(),
                config.cloudinary_upload_preset.clone(),
            ),
            store,
            config,
        }
    }
}

pub async fn route<S, I, M>(ctx: &AppContext<S, I, M>, req: Request) -> Response
where
    S: DocStore,
    I: IdentityProvider,
    M: MediaHost,
{
    let store = &ctx.store;
    let config = &ctx.config;

    let result = match (req.method(), req.path()) {
        (Method::Options, _) => Ok(preflight()),

        (Method::Post, "/signup") => auth::handle_signup(store, config, &req),
        (Method::Post, "/signin") => auth::handle_signin(store, config, &req),
        (Method::Post, "/google-auth") => auth::handle_google_auth(store, config, &ctx.identity, &req).await,
        (Method::Post, "/change-password") => auth::handle_change_password(store, config, &req),

        (Method::Post, "/search-users") => users::handle_search_users(store, &req),
        (Method::Post, "/get-profile") => users::handle_get_profile(store, &req),
        (Method::Post, "/update-profile-img") => users::handle_update_profile_img(store, config, &req),
        (Method::Post, "/update-profile") => users::handle_update_profile(store, config, &req),

        (Method::Post, "/upload") => upload::handle_upload(&ctx.media, config, &req).await,

        (Method::Post, "/create-blog") => blogs::handle_create_blog(store, config, &req),
        (Method::Post, "/latest-blogs") => blogs::handle_latest_blogs(store, &req),
        (Method::Post, "/all-latest-blogs-count") => blogs::handle_latest_blogs_count(store),
        (Method::Get, "/trending-blogs") => blogs::handle_trending_blogs(store),
        (Method::Post, "/search-blogs") => blogs::handle_search_blogs(store, &req),
        (Method::Post, "/search-blogs-count") => blogs::handle_search_blogs_count(store, &req),
        (Method::Post, "/get-blog") => blogs::handle_get_blog(store, &req),
        (Method::Post, "/user-written-blogs") => blogs::handle_user_written_blogs(store, config, &req),
        (Method::Post, "/user-written-blogs-count") => blogs::handle_user_written_blogs_count(store, config, &req),
        (Method::Post, "/delete-blog") => blogs::handle_delete_blog(store, config, &req),

        (Method::Post, "/like-blog") => likes::handle_like_blog(store, config, &req),
        (Method::Post, "/isliked-by-user") => likes::handle_is_liked(store, config, &req),

        (Method::Post, "/add-comment") => comments::handle_add_comment(store, config, &req),
        (Method::Post, "/get-blog-comments") => comments::handle_blog_comments(store, &req),
        (Method::Post, "/get-replies") => comments::handle_replies(store, &req),
        (Method::Post, "/delete-comment") => comments::handle_delete_comment(store, config, &req),

        (Method::Post, "/new-notification") => notifications::handle_new_notification(store, config, &req),
        (Method::Post, "/notifications") => notifications::handle_notifications(store, config, &req),
        (Method::Post, "/all-notifications-count") => notifications::handle_notifications_count(store, config, &req),

        (Method::Get, path) => static_server::serve_static(path),
        _ => Ok(ApiError::NotFound("No route found".to_string()).into()),
    };

    result.unwrap_or_else(|e| ApiError::from(e).into())
}
