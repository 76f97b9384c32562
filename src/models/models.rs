use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PersonalInfo {
    pub fullname: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub username: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub profile_img: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SocialLinks {
    #[serde(default)]
    pub youtube: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub github: String,
    #[serde(default)]
    pub website: String,
}

impl SocialLinks {
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("youtube", &self.youtube),
            ("instagram", &self.instagram),
            ("facebook", &self.facebook),
            ("twitter", &self.twitter),
            ("github", &self.github),
            ("website", &self.website),
        ]
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AccountInfo {
    #[serde(default)]
    pub total_posts: i64,
    #[serde(default)]
    pub total_reads: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default)]
    pub account_info: AccountInfo,
    #[serde(default)]
    pub google_auth: bool,
    #[serde(default)]
    pub blogs: Vec<String>,
    #[serde(rename = "joinedAt")]
    pub joined_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Block {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Block-structured document produced by the editor.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BlogContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Activity {
    #[serde(default)]
    pub total_likes: i64,
    #[serde(default)]
    pub total_comments: i64,
    #[serde(default)]
    pub total_reads: i64,
    #[serde(default)]
    pub total_parent_comments: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Blog {
    #[serde(rename = "_id")]
    pub id: String,
    pub blog_id: String,
    pub title: String,
    #[serde(default)]
    pub banner: String,
    #[serde(default)]
    pub des: String,
    #[serde(default)]
    pub content: BlogContent,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author: String,
    #[serde(default)]
    pub activity: Activity,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(rename = "publishedAt")]
    pub published_at: String,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub blog_id: String,
    pub blog_author: String,
    pub comment: String,
    pub commented_by: String,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(rename = "isReply", default)]
    pub is_reply: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(rename = "commentedAt")]
    pub commented_at: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Reply,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Comment => "comment",
            NotificationKind::Reply => "reply",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub blog: String,
    pub notification_for: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replied_on_comment: Option<String>,
    #[serde(default)]
    pub seen: bool,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Claims carried by an issued access token.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TokenClaims {
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

/// Public projection of a user embedded in listings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AuthorCard {
    pub personal_info: AuthorInfo,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AuthorInfo {
    pub fullname: String,
    pub username: String,
    pub profile_img: String,
}

impl From<&User> for AuthorCard {
    fn from(user: &User) -> Self {
        AuthorCard {
            personal_info: AuthorInfo {
                fullname: user.personal_info.fullname.clone(),
                username: user.personal_info.username.clone(),
                profile_img: user.personal_info.profile_img.clone(),
            },
        }
    }
}
