use tracing::info;

use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::{default_profile_img, hash_password, new_id, now_iso};
use crate::core::store::DocStore;
use crate::models::models::{
    Activity, Blog, BlogContent, Block, Comment, Notification, PersonalInfo, User,
};

// === List indexes ===

pub fn read_list<S: DocStore>(store: &S, key: &str) -> anyhow::Result<Vec<String>> {
    Ok(store.get_json(key)?.unwrap_or_default())
}

pub fn push_front<S: DocStore>(store: &S, key: &str, id: &str) -> anyhow::Result<()> {
    let mut list = read_list(store, key)?;
    list.insert(0, id.to_string());
    store.set_json(key, &list)
}

pub fn push_back<S: DocStore>(store: &S, key: &str, id: &str) -> anyhow::Result<()> {
    let mut list = read_list(store, key)?;
    list.push(id.to_string());
    store.set_json(key, &list)
}

pub fn remove_from_list<S: DocStore>(store: &S, key: &str, id: &str) -> anyhow::Result<()> {
    let mut list = read_list(store, key)?;
    list.retain(|x| x != id);
    store.set_json(key, &list)
}

// === Users ===

pub fn load_user<S: DocStore>(store: &S, id: &str) -> anyhow::Result<Option<User>> {
    store.get_json(&user_key(id))
}

pub fn require_user<S: DocStore>(store: &S, id: &str) -> Result<User, ApiError> {
    load_user(store, id)?.ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub fn save_user<S: DocStore>(store: &S, user: &User) -> anyhow::Result<()> {
    store.set_json(&user_key(&user.id), user)
}

pub fn find_user_by_email<S: DocStore>(store: &S, email: &str) -> anyhow::Result<Option<User>> {
    match store.get_json::<String>(&user_email_key(email))? {
        Some(id) => load_user(store, &id),
        None => Ok(None),
    }
}

pub fn find_user_by_username<S: DocStore>(store: &S, username: &str) -> anyhow::Result<Option<User>> {
    match store.get_json::<String>(&user_name_key(username))? {
        Some(id) => load_user(store, &id),
        None => Ok(None),
    }
}

/// Persists a new user and its unique indexes. Fails with a conflict when
/// the email or username is already claimed.
pub fn insert_user<S: DocStore>(store: &S, user: &User) -> Result<(), ApiError> {
    let email_key = user_email_key(&user.personal_info.email);
    if store.exists(&email_key)? {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }
    let name_key = user_name_key(&user.personal_info.username);
    if store.exists(&name_key)? {
        return Err(ApiError::Conflict("Username is already taken".to_string()));
    }

    save_user(store, user)?;
    store.set_json(&email_key, &user.id)?;
    store.set_json(&name_key, &user.id)?;
    push_back(store, USERS_LIST_KEY, &user.id)?;
    Ok(())
}

// === Blogs ===

pub fn load_blog<S: DocStore>(store: &S, id: &str) -> anyhow::Result<Option<Blog>> {
    store.get_json(&blog_key(id))
}

pub fn require_blog<S: DocStore>(store: &S, id: &str) -> Result<Blog, ApiError> {
    load_blog(store, id)?.ok_or_else(|| ApiError::NotFound("Blog not found".to_string()))
}

pub fn find_blog_by_slug<S: DocStore>(store: &S, slug: &str) -> anyhow::Result<Option<Blog>> {
    match store.get_json::<String>(&blog_slug_key(slug))? {
        Some(id) => load_blog(store, &id),
        None => Ok(None),
    }
}

pub fn save_blog<S: DocStore>(store: &S, blog: &Blog) -> anyhow::Result<()> {
    store.set_json(&blog_key(&blog.id), blog)
}

/// Every blog, newest first, skipping ids whose document is gone.
pub fn all_blogs<S: DocStore>(store: &S) -> anyhow::Result<Vec<Blog>> {
    let mut blogs = Vec::new();
    for id in read_list(store, BLOGS_LIST_KEY)? {
        if let Some(blog) = load_blog(store, &id)? {
            blogs.push(blog);
        }
    }
    Ok(blogs)
}

// === Comments and notifications ===

pub fn load_comment<S: DocStore>(store: &S, id: &str) -> anyhow::Result<Option<Comment>> {
    store.get_json(&comment_key(id))
}

pub fn save_comment<S: DocStore>(store: &S, comment: &Comment) -> anyhow::Result<()> {
    store.set_json(&comment_key(&comment.id), comment)
}

pub fn load_notification<S: DocStore>(store: &S, id: &str) -> anyhow::Result<Option<Notification>> {
    store.get_json(&notification_key(id))
}

pub fn save_notification<S: DocStore>(store: &S, notification: &Notification) -> anyhow::Result<()> {
    store.set_json(&notification_key(&notification.id), notification)
}

/// Stores a new notification and indexes it for its recipient.
pub fn insert_notification<S: DocStore>(store: &S, notification: &Notification) -> anyhow::Result<()> {
    save_notification(store, notification)?;
    push_front(store, &notifications_list_key(&notification.notification_for), &notification.id)
}

pub fn delete_notification<S: DocStore>(store: &S, notification: &Notification) -> anyhow::Result<()> {
    store.delete(&notification_key(&notification.id))?;
    remove_from_list(store, &notifications_list_key(&notification.notification_for), &notification.id)
}

/// Notifications addressed to `user_id`, newest first.
pub fn notifications_for<S: DocStore>(store: &S, user_id: &str) -> anyhow::Result<Vec<Notification>> {
    let mut out = Vec::new();
    for id in read_list(store, &notifications_list_key(user_id))? {
        if let Some(n) = load_notification(store, &id)? {
            out.push(n);
        }
    }
    Ok(out)
}

/// Scans every comment document.
pub fn all_comments<S: DocStore>(store: &S) -> anyhow::Result<Vec<Comment>> {
    let mut out = Vec::new();
    for key in store.keys_with_prefix("comment:")? {
        if let Some(c) = store.get_json::<Comment>(&key)? {
            out.push(c);
        }
    }
    Ok(out)
}

/// Scans every notification document.
pub fn all_notifications<S: DocStore>(store: &S) -> anyhow::Result<Vec<Notification>> {
    let mut out = Vec::new();
    for key in store.keys_with_prefix("notification:")? {
        if let Some(n) = store.get_json::<Notification>(&key)? {
            out.push(n);
        }
    }
    Ok(out)
}

// === Demo data ===

const DEMO_EMAIL: &str = "demo@blogpad.dev";

pub fn seed_demo_data<S: DocStore>(store: &S) -> anyhow::Result<()> {
    if store.exists(&user_email_key(DEMO_EMAIL))? {
        return Ok(());
    }

    let user_id = new_id();
    let blog_id = new_id();
    let mut user = User {
        id: user_id.clone(),
        personal_info: PersonalInfo {
            fullname: "demo writer".to_string(),
            email: DEMO_EMAIL.to_string(),
            password: Some(hash_password("Demo123")?),
            username: "demo".to_string(),
            bio: "Writing about Rust and the web.".to_string(),
            profile_img: default_profile_img(),
        },
        social_links: Default::default(),
        account_info: Default::default(),
        google_auth: false,
        blogs: vec![blog_id.clone()],
        joined_at: now_iso(),
    };
    user.account_info.total_posts = 1;

    insert_user(store, &user)?;

    let blog = Blog {
        id: blog_id.clone(),
        blog_id: "Welcome-to-blogpad-demo".to_string(),
        title: "Welcome to blogpad".to_string(),
        banner: String::new(),
        des: "A first post so the front page is not empty.".to_string(),
        content: BlogContent {
            time: None,
            blocks: vec![Block {
                id: None,
                kind: "paragraph".to_string(),
                data: serde_json::json!({ "text": "Sign up, write a post, and leave a comment." }),
            }],
            version: None,
        },
        tags: vec!["welcome".to_string()],
        author: user_id,
        activity: Activity::default(),
        comments: Vec::new(),
        draft: false,
        published_at: now_iso(),
        updated_at: None,
    };
    save_blog(store, &blog)?;
    store.set_json(&blog_slug_key(&blog.blog_id), &blog.id)?;
    push_front(store, BLOGS_LIST_KEY, &blog.id)?;

    info!("Seeded demo user {} with blog {}", DEMO_EMAIL, blog.blog_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    #[test]
    fn list_helpers_keep_order() {
        let store = MemoryStore::new();
        push_back(&store, "l", "a").unwrap();
        push_back(&store, "l", "b").unwrap();
        push_front(&store, "l", "c").unwrap();
        assert_eq!(read_list(&store, "l").unwrap(), vec!["c", "a", "b"]);
        remove_from_list(&store, "l", "a").unwrap();
        assert_eq!(read_list(&store, "l").unwrap(), vec!["c", "b"]);
        assert!(read_list(&store, "missing").unwrap().is_empty());
    }

    #[test]
    fn seeding_is_idempotent() {
        let store = MemoryStore::new();
        seed_demo_data(&store).unwrap();
        seed_demo_data(&store).unwrap();

        assert_eq!(read_list(&store, USERS_LIST_KEY).unwrap().len(), 1);
        assert_eq!(read_list(&store, BLOGS_LIST_KEY).unwrap().len(), 1);
        let user = find_user_by_username(&store, "demo").unwrap().unwrap();
        assert_eq!(user.account_info.total_posts, 1);
        let blog = find_blog_by_slug(&store, "Welcome-to-blogpad-demo").unwrap().unwrap();
        assert_eq!(blog.author, user.id);
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        seed_demo_data(&store).unwrap();
        let existing = find_user_by_username(&store, "demo").unwrap().unwrap();
        let mut copy = existing.clone();
        copy.id = new_id();
        copy.personal_info.username = "someone-else".to_string();

        let err = insert_user(&store, &copy).unwrap_err();
        assert_eq!(err, ApiError::Conflict("Email already exists".to_string()));
    }
}
