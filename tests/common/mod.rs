#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use blogpad::config::AppConfig;
use blogpad::core::db::find_user_by_email;
use blogpad::core::store::{DocStore, MemoryStore};
use blogpad::external::{FederatedProfile, IdentityProvider, MediaHost};
use blogpad::router::{route, AppContext};
use serde_json::{json, Value};
use spin_sdk::http::{Method, Request};

pub const PASSWORD: &str = "Secret123";

/// Identity provider answering from a fixed token table.
#[derive(Default)]
pub struct StubIdentity {
    pub profiles: HashMap<String, FederatedProfile>,
}

impl StubIdentity {
    pub fn with(token: &str, profile: FederatedProfile) -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(token.to_string(), profile);
        Self { profiles }
    }
}

impl IdentityProvider for StubIdentity {
    async fn verify(&self, token: &str) -> anyhow::Result<FederatedProfile> {
        self.profiles
            .get(token)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown token"))
    }
}

/// Media host that remembers uploads and hands back predictable URLs.
#[derive(Default)]
pub struct StubMedia {
    pub uploads: Mutex<Vec<String>>,
    pub unavailable: bool,
}

impl MediaHost for StubMedia {
    async fn upload(&self, data_uri: &str) -> anyhow::Result<String> {
        if self.unavailable {
            anyhow::bail!("media host unavailable");
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(data_uri.to_string());
        Ok(format!("https://media.test/{}.png", uploads.len()))
    }
}

/// Memory store whose writes or reads fail for keys under chosen prefixes.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing: Arc<Mutex<Vec<String>>>,
    failing_reads: Arc<Mutex<Vec<String>>>,
}

impl FlakyStore {
    pub fn fail_writes(&self, prefix: &str) {
        self.failing.lock().unwrap().push(prefix.to_string());
    }

    pub fn fail_reads(&self, prefix: &str) {
        self.failing_reads.lock().unwrap().push(prefix.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
        self.failing_reads.lock().unwrap().clear();
    }

    fn check(&self, key: &str) -> anyhow::Result<()> {
        if self.failing.lock().unwrap().iter().any(|p| key.starts_with(p.as_str())) {
            anyhow::bail!("injected write failure for {}", key);
        }
        Ok(())
    }
}

impl DocStore for FlakyStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        if self.failing_reads.lock().unwrap().iter().any(|p| key.starts_with(p.as_str())) {
            anyhow::bail!("injected read failure for {}", key);
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        self.check(key)?;
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.check(key)?;
        self.inner.delete(key)
    }

    fn exists(&self, key: &str) -> anyhow::Result<bool> {
        self.inner.exists(key)
    }

    fn get_keys(&self) -> anyhow::Result<Vec<String>> {
        self.inner.get_keys()
    }
}

pub type TestContext<S = MemoryStore> = AppContext<S, StubIdentity, StubMedia>;

pub fn context() -> TestContext {
    context_with(MemoryStore::new())
}

pub fn context_with<S: DocStore>(store: S) -> TestContext<S> {
    AppContext {
        store,
        identity: StubIdentity::default(),
        media: StubMedia::default(),
        config: AppConfig::default(),
    }
}

pub fn request(method: Method, path: &str, token: Option<&str>, body: &Value) -> Request {
    let mut builder = Request::builder();
    builder.method(method).uri(path).header("Content-Type", "application/json");
    if let Some(token) = token {
        builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(serde_json::to_vec(body).unwrap()).build()
}

/// Sends a request through the router and decodes the JSON reply.
pub async fn call<S: DocStore>(ctx: &TestContext<S>, method: Method, path: &str, token: Option<&str>, body: Value) -> (u16, Value) {
    let resp = route(ctx, request(method, path, token, &body)).await;
    let status = *resp.status();
    let value = if resp.body().is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(resp.body()).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn post<S: DocStore>(ctx: &TestContext<S>, path: &str, token: Option<&str>, body: Value) -> (u16, Value) {
    call(ctx, Method::Post, path, token, body).await
}

pub struct TestUser {
    pub id: String,
    pub token: String,
    pub username: String,
}

pub async fn signup<S: DocStore>(ctx: &TestContext<S>, fullname: &str, email: &str) -> TestUser {
    let (status, body) = post(
        ctx,
        "/signup",
        None,
        json!({ "fullname": fullname, "email": email, "password": PASSWORD }),
    )
    .await;
    assert_eq!(status, 200, "signup failed: {}", body);
    let user = find_user_by_email(&ctx.store, email).unwrap().unwrap();
    TestUser {
        id: user.id,
        token: body["access_token"].as_str().unwrap().to_string(),
        username: body["username"].as_str().unwrap().to_string(),
    }
}

pub fn blog_body(title: &str, tags: &[&str]) -> Value {
    json!({
        "title": title,
        "des": "A short description",
        "banner": "https://media.test/banner.png",
        "tags": tags,
        "content": {
            "time": 1,
            "blocks": [{ "type": "paragraph", "data": { "text": "Hello there" } }],
            "version": "2.27.0"
        },
        "draft": false
    })
}

/// Publishes a blog and returns `(document id, slug)`.
pub async fn publish<S: DocStore>(ctx: &TestContext<S>, author: &TestUser, title: &str) -> (String, String) {
    let (status, body) = post(ctx, "/create-blog", Some(&author.token), blog_body(title, &["rust"])).await;
    assert_eq!(status, 200, "create-blog failed: {}", body);
    let slug = body["id"].as_str().unwrap().to_string();
    let blog = blogpad::core::db::find_blog_by_slug(&ctx.store, &slug).unwrap().unwrap();
    (blog.id, slug)
}
