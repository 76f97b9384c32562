mod common;

use blogpad::core::db::{all_comments, find_blog_by_slug, find_user_by_username, load_blog, require_user};
use common::*;
use serde_json::{json, Value};
use spin_sdk::http::Method;

fn draft_body(title: &str) -> Value {
    json!({ "title": title, "draft": true })
}

#[tokio::test]
async fn test_publish_validations() {
    let ctx = context();
    let author = signup(&ctx, "Ken Thompson", "ken@example.com").await;

    let cases = [
        (json!({ "title": "" }), "You must provide a title"),
        (json!({ "title": "T", "des": "" }), "You must provide blog description under 200 characters"),
        (json!({ "title": "T", "des": "x".repeat(201) }), "You must provide blog description under 200 characters"),
        (json!({ "title": "T", "des": "d" }), "You must provide blog banner to publish it"),
        (
            json!({ "title": "T", "des": "d", "banner": "b" }),
            "There must be some blog content to publish it",
        ),
        (
            json!({ "title": "T", "des": "d", "banner": "b", "content": { "blocks": [{ "type": "paragraph", "data": {} }] } }),
            "Provide tags in order to publish the blog, Maximum 10",
        ),
    ];
    for (body, message) in cases {
        let (status, reply) = post(&ctx, "/create-blog", Some(&author.token), body).await;
        assert_eq!(status, 403);
        assert_eq!(reply["error"], message);
    }

    let too_many: Vec<String> = (0..11).map(|i| format!("tag{}", i)).collect();
    let mut body = blog_body("Tags", &[]);
    body["tags"] = json!(too_many);
    let (status, _) = post(&ctx, "/create-blog", Some(&author.token), body).await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn test_create_blog_indexes_and_counts() {
    let ctx = context();
    let author = signup(&ctx, "Dennis Ritchie", "dennis@example.com").await;

    let (status, body) = post(&ctx, "/create-blog", Some(&author.token), blog_body("Hello, World!", &["C", " Unix "])).await;
    assert_eq!(status, 200, "{}", body);
    let slug = body["id"].as_str().unwrap();
    assert!(slug.starts_with("Hello-World"));
    assert_eq!(slug.len(), "Hello-World".len() + 12);

    let blog = find_blog_by_slug(&ctx.store, slug).unwrap().unwrap();
    assert_eq!(blog.tags, vec!["c", "unix"]);
    assert_eq!(blog.author, author.id);

    let user = require_user(&ctx.store, &author.id).unwrap();
    assert_eq!(user.account_info.total_posts, 1);
    assert_eq!(user.blogs, vec![blog.id.clone()]);

    let (status, _) = post(&ctx, "/create-blog", Some(&author.token), draft_body("Unfinished")).await;
    assert_eq!(status, 200);
    let user = require_user(&ctx.store, &author.id).unwrap();
    assert_eq!(user.account_info.total_posts, 1);
    assert_eq!(user.blogs.len(), 2);
}

#[tokio::test]
async fn test_blog_content_is_sanitized() {
    let ctx = context();
    let author = signup(&ctx, "Eve Hacker", "eve@example.com").await;

    let mut body = blog_body("Sneaky", &["xss"]);
    body["content"]["blocks"] = json!([
        { "type": "paragraph", "data": { "text": "<b>bold</b><script>alert(1)</script>" } },
        { "type": "list", "data": { "items": ["<img src=x onerror=alert(1)>ok"] } }
    ]);
    let (_, reply) = post(&ctx, "/create-blog", Some(&author.token), body).await;
    let blog = find_blog_by_slug(&ctx.store, reply["id"].as_str().unwrap()).unwrap().unwrap();

    assert_eq!(blog.content.blocks[0].data["text"], "<b>bold</b>");
    let item = blog.content.blocks[1].data["items"][0].as_str().unwrap();
    assert!(!item.contains("onerror"));
    assert!(item.ends_with("ok"));
}

#[tokio::test]
async fn test_update_blog_keeps_slug_and_checks_author() {
    let ctx = context();
    let author = signup(&ctx, "Bjarne Stroustrup", "bjarne@example.com").await;
    let intruder = signup(&ctx, "Mallory Intruder", "mallory@example.com").await;

    let (status, body) = post(&ctx, "/create-blog", Some(&author.token), draft_body("Draft first")).await;
    assert_eq!(status, 200);
    let slug = body["id"].as_str().unwrap().to_string();
    assert_eq!(require_user(&ctx.store, &author.id).unwrap().account_info.total_posts, 0);

    let mut update = blog_body("Published later", &["cpp"]);
    update["id"] = json!(slug);

    let (status, body) = post(&ctx, "/create-blog", Some(&intruder.token), update.clone()).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "You can not edit this blog");

    let (status, body) = post(&ctx, "/create-blog", Some(&author.token), update).await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], slug);

    let blog = find_blog_by_slug(&ctx.store, &slug).unwrap().unwrap();
    assert_eq!(blog.title, "Published later");
    assert!(!blog.draft);
    assert!(blog.updated_at.is_some());
    assert_eq!(require_user(&ctx.store, &author.id).unwrap().account_info.total_posts, 1);
}

#[tokio::test]
async fn test_drafts_stay_out_of_public_listings() {
    let ctx = context();
    let author = signup(&ctx, "Niklaus Wirth", "niklaus@example.com").await;
    publish(&ctx, &author, "Pascal").await;
    post(&ctx, "/create-blog", Some(&author.token), draft_body("Pascal Revised")).await;

    let (_, latest) = post(&ctx, "/latest-blogs", None, json!({ "page": 1 })).await;
    let titles: Vec<&str> = latest["blogs"].as_array().unwrap().iter().map(|b| b["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Pascal"]);

    let (_, count) = post(&ctx, "/all-latest-blogs-count", None, json!({})).await;
    assert_eq!(count["totalDocs"], 1);

    let (status, trending) = call(&ctx, Method::Get, "/trending-blogs", None, Value::Null).await;
    assert_eq!(status, 200);
    assert_eq!(trending["blogs"].as_array().unwrap().len(), 1);

    let (_, count) = post(&ctx, "/search-blogs-count", None, json!({ "query": "pascal" })).await;
    assert_eq!(count["totalDocs"], 1);

    let (_, own) = post(&ctx, "/user-written-blogs-count", Some(&author.token), json!({ "draft": true })).await;
    assert_eq!(own["totalDocs"], 1);
}

#[tokio::test]
async fn test_latest_blogs_are_newest_first_and_paged() {
    let ctx = context();
    let author = signup(&ctx, "Alan Kay", "alan@example.com").await;
    for i in 0..7 {
        publish(&ctx, &author, &format!("Post {}", i)).await;
    }

    let (_, first) = post(&ctx, "/latest-blogs", None, json!({ "page": 1 })).await;
    let first = first["blogs"].as_array().unwrap().clone();
    assert_eq!(first.len(), 5);
    assert_eq!(first[0]["title"], "Post 6");
    assert_eq!(first[0]["author"]["personal_info"]["username"], "alan");

    let (_, second) = post(&ctx, "/latest-blogs", None, json!({ "page": 2 })).await;
    let second = second["blogs"].as_array().unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[1]["title"], "Post 0");
}

#[tokio::test]
async fn test_search_by_tag_query_and_author() {
    let ctx = context();
    let author = signup(&ctx, "Guido Rossum", "guido@example.com").await;
    let other = signup(&ctx, "Larry Wall", "larry@example.com").await;

    let (_, a) = post(&ctx, "/create-blog", Some(&author.token), blog_body("Snakes and Ladders", &["python"])).await;
    post(&ctx, "/create-blog", Some(&author.token), blog_body("Zen Notes", &["python"])).await;
    post(&ctx, "/create-blog", Some(&other.token), blog_body("Camel Book", &["perl"])).await;

    let (_, by_tag) = post(&ctx, "/search-blogs", None, json!({ "tag": "Python", "limit": 10 })).await;
    assert_eq!(by_tag["blogs"].as_array().unwrap().len(), 2);

    let (_, similar) = post(
        &ctx,
        "/search-blogs",
        None,
        json!({ "tag": "python", "eliminate_blog": a["id"], "limit": 10 }),
    )
    .await;
    let similar = similar["blogs"].as_array().unwrap();
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0]["title"], "Zen Notes");

    let (_, by_query) = post(&ctx, "/search-blogs", None, json!({ "query": "camel" })).await;
    assert_eq!(by_query["blogs"][0]["title"], "Camel Book");

    let (_, by_author) = post(&ctx, "/search-blogs", None, json!({ "author": other.id })).await;
    assert_eq!(by_author["blogs"].as_array().unwrap().len(), 1);

    let (_, default_page) = post(&ctx, "/search-blogs", None, json!({})).await;
    assert_eq!(default_page["blogs"].as_array().unwrap().len(), 2);

    let (_, count) = post(&ctx, "/search-blogs-count", None, json!({ "tag": "python" })).await;
    assert_eq!(count["totalDocs"], 2);
}

#[tokio::test]
async fn test_get_blog_counts_reads_except_in_edit_mode() {
    let ctx = context();
    let author = signup(&ctx, "John McCarthy", "john@example.com").await;
    let (_, slug) = publish(&ctx, &author, "Lisp").await;

    let (status, body) = post(&ctx, "/get-blog", None, json!({ "blog_id": slug })).await;
    assert_eq!(status, 200);
    assert_eq!(body["blog"]["activity"]["total_reads"], 1);
    assert_eq!(body["blog"]["author"]["personal_info"]["username"], "john");

    let (_, body) = post(&ctx, "/get-blog", None, json!({ "blog_id": slug, "mode": "edit" })).await;
    assert_eq!(body["blog"]["activity"]["total_reads"], 1);

    assert_eq!(require_user(&ctx.store, &author.id).unwrap().account_info.total_reads, 1);

    let (status, body) = post(&ctx, "/get-blog", None, json!({ "blog_id": "missing" })).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Blog not found");
}

#[tokio::test]
async fn test_draft_blogs_need_the_draft_flag() {
    let ctx = context();
    let author = signup(&ctx, "Barbara Draft", "draft@example.com").await;
    let (_, body) = post(&ctx, "/create-blog", Some(&author.token), draft_body("Secret")).await;
    let slug = body["id"].as_str().unwrap();

    let (status, body) = post(&ctx, "/get-blog", None, json!({ "blog_id": slug })).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "You can not access draft blogs");
    assert_eq!(find_blog_by_slug(&ctx.store, slug).unwrap().unwrap().activity.total_reads, 0);

    let (status, _) = post(&ctx, "/get-blog", None, json!({ "blog_id": slug, "draft": true, "mode": "edit" })).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_user_written_blogs_filter_by_state_and_query() {
    let ctx = context();
    let author = signup(&ctx, "Donald Knuth", "donald@example.com").await;
    publish(&ctx, &author, "Art of Programming").await;
    publish(&ctx, &author, "Literate Programming").await;
    post(&ctx, "/create-blog", Some(&author.token), draft_body("Volume Five")).await;

    let (_, published) = post(&ctx, "/user-written-blogs", Some(&author.token), json!({ "page": 1, "query": "literate" })).await;
    let published = published["blogs"].as_array().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0]["title"], "Literate Programming");

    let (_, drafts) = post(&ctx, "/user-written-blogs", Some(&author.token), json!({ "page": 1, "draft": true })).await;
    assert_eq!(drafts["blogs"][0]["title"], "Volume Five");
}

#[tokio::test]
async fn test_delete_blog_cascades() {
    let ctx = context();
    let author = signup(&ctx, "Tony Hoare", "tony@example.com").await;
    let reader = signup(&ctx, "Robin Milner", "robin@example.com").await;
    let (blog_id, slug) = publish(&ctx, &author, "Quicksort").await;

    post(&ctx, "/add-comment", Some(&reader.token), json!({ "_id": blog_id, "comment": "Nice", "blog_author": author.id })).await;
    post(&ctx, "/like-blog", Some(&reader.token), json!({ "_id": blog_id, "islikedByUser": false })).await;

    let (status, body) = post(&ctx, "/delete-blog", Some(&reader.token), json!({ "blog_id": slug })).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "You can not delete this blog");

    let (status, body) = post(&ctx, "/delete-blog", Some(&author.token), json!({ "blog_id": slug })).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "done");

    assert!(find_blog_by_slug(&ctx.store, &slug).unwrap().is_none());
    let user = require_user(&ctx.store, &author.id).unwrap();
    assert_eq!(user.account_info.total_posts, 0);
    assert!(user.blogs.is_empty());

    let (_, count) = post(&ctx, "/all-notifications-count", Some(&author.token), json!({})).await;
    assert_eq!(count["totalDocs"], 0);
    let keys = blogpad::core::store::DocStore::get_keys(&ctx.store).unwrap();
    assert!(!keys.iter().any(|k| k.starts_with("comment:")));
}

#[tokio::test]
async fn test_delete_blog_removes_unindexed_comments() {
    let ctx = context_with(FlakyStore::default());
    let author = signup(&ctx, "Barbara Liskov", "barbara@example.com").await;
    let reader = signup(&ctx, "Jeannette Wing", "jeannette@example.com").await;
    let (blog_id, slug) = publish(&ctx, &author, "Substitution").await;
    let (other_id, _) = publish(&ctx, &author, "Abstraction").await;

    post(&ctx, "/add-comment", Some(&reader.token), json!({ "_id": other_id, "comment": "Keep me" })).await;

    ctx.store.fail_writes("blog:");
    let (status, _) = post(&ctx, "/add-comment", Some(&reader.token), json!({ "_id": blog_id, "comment": "Orphan" })).await;
    ctx.store.heal();
    assert_eq!(status, 200);
    assert!(load_blog(&ctx.store, &blog_id).unwrap().unwrap().comments.is_empty());

    let (status, _) = post(&ctx, "/delete-blog", Some(&author.token), json!({ "blog_id": slug })).await;
    assert_eq!(status, 200);

    let remaining = all_comments(&ctx.store).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].blog_id, other_id);
}

#[tokio::test]
async fn test_profiles_and_user_search() {
    let ctx = context();
    let user = signup(&ctx, "Frances Allen", "frances@example.com").await;
    signup(&ctx, "Francis Bacon", "francis@example.com").await;

    let (_, found) = post(&ctx, "/search-users", None, json!({ "query": "FRANC" })).await;
    assert_eq!(found["users"].as_array().unwrap().len(), 2);

    let (status, profile) = post(&ctx, "/get-profile", None, json!({ "username": "frances" })).await;
    assert_eq!(status, 200);
    assert_eq!(profile["personal_info"]["fullname"], "frances allen");
    assert!(profile["personal_info"].get("password").is_none());

    let (status, body) = post(
        &ctx,
        "/update-profile",
        Some(&user.token),
        json!({
            "username": "fran",
            "bio": "Compilers <script>x</script>",
            "social_links": { "github": "https://github.com/fran", "youtube": "" }
        }),
    )
    .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["username"], "fran");
    assert!(find_user_by_username(&ctx.store, "frances").unwrap().is_none());
    let updated = find_user_by_username(&ctx.store, "fran").unwrap().unwrap();
    assert_eq!(updated.personal_info.bio, "Compilers ");

    let (status, body) = post(
        &ctx,
        "/update-profile",
        Some(&user.token),
        json!({ "username": "fran", "social_links": { "twitter": "https://example.com/fran" } }),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "twitter link is invalid. You must enter a full link");

    let (status, body) = post(&ctx, "/update-profile", Some(&user.token), json!({ "username": "francis" })).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "Username is already taken");

    let (status, body) = post(
        &ctx,
        "/update-profile-img",
        Some(&user.token),
        json!({ "url": "https://media.test/me.png" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["profile_img"], "https://media.test/me.png");
}
