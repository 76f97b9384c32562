use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use spin_sdk::http::{Request, Response};
use tracing::{info, warn};

use crate::config::*;
use crate::core::db::{find_user_by_email, insert_user, load_user, require_user, save_user};
use crate::core::errors::ApiError;
use crate::core::helpers::{
    bearer_token, default_profile_img, hash_password, new_id, now_iso, parse_body, random_suffix, respond,
    verify_password,
};
use crate::core::store::DocStore;
use crate::core::validation::{is_valid_email, is_valid_password, PASSWORD_RULE};
use crate::external::IdentityProvider;
use crate::models::models::{PersonalInfo, TokenClaims, User};

/// What the client keeps after signing in.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub profile_img: String,
    pub username: String,
    pub fullname: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SignupRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GoogleAuthRequest {
    access_token: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ChangePasswordRequest {
    #[serde(rename = "currentPassword")]
    pub current_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

// === Tokens ===

pub fn issue_token(config: &AppConfig, user_id: &str) -> anyhow::Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = TokenClaims {
        id: user_id.to_string(),
        iat: now,
        exp: now.saturating_add(config.token_expiration_hours.saturating_mul(3600)),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret_access_key.as_bytes()),
    )?)
}

/// Returns the caller's user id when the bearer token is valid, unexpired,
/// and still names an existing user. Store failures are errors, not a
/// missing session.
pub fn validate_token<S: DocStore>(store: &S, config: &AppConfig, req: &Request) -> anyhow::Result<Option<String>> {
    let Some(token) = bearer_token(req) else {
        return Ok(None);
    };
    let Ok(data) = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret_access_key.as_bytes()),
        &Validation::default(),
    ) else {
        return Ok(None);
    };

    Ok(load_user(store, &data.claims.id)?.map(|user| user.id))
}

pub fn authenticate<S: DocStore>(store: &S, config: &AppConfig, req: &Request) -> Result<String, ApiError> {
    validate_token(store, config, req)?.ok_or(ApiError::Unauthorized)
}

fn session_for(config: &AppConfig, user: &User) -> Result<Session, ApiError> {
    Ok(Session {
        access_token: issue_token(config, &user.id)?,
        profile_img: user.personal_info.profile_img.clone(),
        username: user.personal_info.username.clone(),
        fullname: user.personal_info.fullname.clone(),
    })
}

/// Username derived from the email's local part, with a random suffix when
/// that name is already taken.
pub fn generate_username<S: DocStore>(store: &S, email: &str) -> anyhow::Result<String> {
    let base = email.split('@').next().unwrap_or_default().to_string();
    if store.exists(&user_name_key(&base))? {
        return Ok(format!("{}{}", base, random_suffix(5)));
    }
    Ok(base)
}

// === Operations ===

pub fn signup<S: DocStore>(store: &S, config: &AppConfig, input: SignupRequest) -> Result<Session, ApiError> {
    let fullname = input.fullname.trim().to_lowercase();
    let email = input.email.trim().to_lowercase();

    if fullname.chars().count() < MIN_FULLNAME_LENGTH {
        return Err(ApiError::Forbidden("Your Full Name must be at least 3 letters long".to_string()));
    }
    if email.is_empty() {
        return Err(ApiError::Forbidden("Enter Email".to_string()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Forbidden("Email is invalid".to_string()));
    }
    if !is_valid_password(&input.password) {
        return Err(ApiError::Forbidden(PASSWORD_RULE.to_string()));
    }

    let user = User {
        id: new_id(),
        personal_info: PersonalInfo {
            fullname,
            username: generate_username(store, &email)?,
            email,
            password: Some(hash_password(&input.password)?),
            bio: String::new(),
            profile_img: default_profile_img(),
        },
        social_links: Default::default(),
        account_info: Default::default(),
        google_auth: false,
        blogs: Vec::new(),
        joined_at: now_iso(),
    };
    insert_user(store, &user)?;

    info!("New account {} ({})", user.personal_info.username, user.id);
    session_for(config, &user)
}

pub fn signin<S: DocStore>(store: &S, config: &AppConfig, input: SigninRequest) -> Result<Session, ApiError> {
    let email = input.email.trim().to_lowercase();
    let user = find_user_by_email(store, &email)?
        .ok_or_else(|| ApiError::Forbidden("Email not found".to_string()))?;

    if user.google_auth {
        return Err(ApiError::Forbidden(
            "Account was created using google. Try logging in with google.".to_string(),
        ));
    }

    let hash = user.personal_info.password.as_deref().unwrap_or_default();
    if !verify_password(&input.password, hash) {
        return Err(ApiError::Forbidden("Incorrect password".to_string()));
    }

    session_for(config, &user)
}

pub async fn google_sign_in<S: DocStore, I: IdentityProvider>(
    store: &S,
    config: &AppConfig,
    identity: &I,
    access_token: &str,
) -> Result<Session, ApiError> {
    let profile = identity.verify(access_token).await.map_err(|e| {
        warn!("Federated token rejected: {}", e);
        ApiError::InternalError(
            "Failed to authenticate you with google. Try with some other google account".to_string(),
        )
    })?;

    let email = profile.email.trim().to_lowercase();
    if let Some(user) = find_user_by_email(store, &email)? {
        if !user.google_auth {
            return Err(ApiError::Forbidden(
                "This email was signed up without google. Please log in with password to access the account"
                    .to_string(),
            ));
        }
        return session_for(config, &user);
    }

    let profile_img = profile
        .picture
        .map(|p| p.replace("s96-c", "s384-c"))
        .unwrap_or_else(default_profile_img);

    let user = User {
        id: new_id(),
        personal_info: PersonalInfo {
            fullname: profile.name.to_lowercase(),
            username: generate_username(store, &email)?,
            email,
            password: None,
            bio: String::new(),
            profile_img,
        },
        social_links: Default::default(),
        account_info: Default::default(),
        google_auth: true,
        blogs: Vec::new(),
        joined_at: now_iso(),
    };
    insert_user(store, &user)?;

    info!("New federated account {} ({})", user.personal_info.username, user.id);
    session_for(config, &user)
}

pub fn change_password<S: DocStore>(
    store: &S,
    user_id: &str,
    input: ChangePasswordRequest,
) -> Result<serde_json::Value, ApiError> {
    if !is_valid_password(&input.current_password) || !is_valid_password(&input.new_password) {
        return Err(ApiError::Forbidden(PASSWORD_RULE.to_string()));
    }

    let mut user = require_user(store, user_id)?;
    if user.google_auth {
        return Err(ApiError::Forbidden(
            "You can't change account's password because you logged in through google".to_string(),
        ));
    }

    let hash = user.personal_info.password.as_deref().unwrap_or_default();
    if !verify_password(&input.current_password, hash) {
        return Err(ApiError::Forbidden("Incorrect current password".to_string()));
    }

    user.personal_info.password = Some(hash_password(&input.new_password)?);
    save_user(store, &user)?;

    Ok(serde_json::json!({ "status": "password changed" }))
}

// === HTTP Handlers ===

pub fn handle_signup<S: DocStore>(store: &S, config: &AppConfig, req: &Request) -> anyhow::Result<Response> {
    let input = match parse_body::<SignupRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(signup(store, config, input))
}

pub fn handle_signin<S: DocStore>(store: &S, config: &AppConfig, req: &Request) -> anyhow::Result<Response> {
    let input = match parse_body::<SigninRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(signin(store, config, input))
}

pub async fn handle_google_auth<S: DocStore, I: IdentityProvider>(
    store: &S,
    config: &AppConfig,
    identity: &I,
    req: &Request,
) -> anyhow::Result<Response> {
    let input = match parse_body::<GoogleAuthRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(google_sign_in(store, config, identity, &input.access_token).await)
}

pub fn handle_change_password<S: DocStore>(
    store: &S,
    config: &AppConfig,
    req: &Request,
) -> anyhow::Result<Response> {
    let user_id = match authenticate(store, config, req) {
        Ok(uid) => uid,
        Err(e) => return Ok(e.into()),
    };
    let input = match parse_body::<ChangePasswordRequest>(req) {
        Ok(input) => input,
        Err(e) => return Ok(e.into()),
    };
    respond(change_password(store, &user_id, input))
}
