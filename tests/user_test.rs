mod common;

use serde_json::{json, Value};

fn sign_up_body() -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "gender": "female",
        "age": 20,
        "pfp": "https://img.example.com/ada.png"
    })
}

#[tokio::test]
async fn sign_up_requires_verified_email() {
    let app = common::spawn_app().await;
    let email = "ada@school.edu";
    let token = common::identity_token("ext_ada", email);

    let resp = app
        .client
        .post(app.url("/auth/sign-up"))
        .bearer_auth(&token)
        .json(&sign_up_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    common::verify_email(&app, email).await;

    let resp = app
        .client
        .post(app.url("/auth/sign-up"))
        .bearer_auth(&token)
        .json(&sign_up_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["email"], email);
    assert_eq!(body["data"]["first_name"], "Ada");

    let resp = app
        .client
        .post(app.url("/auth/sign-up"))
        .bearer_auth(&token)
        .json(&sign_up_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn me_requires_account() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/users/me")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .get(app.url("/users/me"))
        .bearer_auth("garbage.token.value")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let token = common::identity_token("ext_new", "new@school.edu");
    let resp = app
        .client
        .get(app.url("/users/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn identity_cookie_accepted() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "cookie").await;

    let resp = app
        .client
        .get(app.url("/users/me"))
        .header("Cookie", format!("identity_token={}", user.token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["id"], user.id);
}

#[tokio::test]
async fn profile_update() {
    let app = common::spawn_app().await;
    let user = common::create_test_user(&app, "profile").await;

    let resp = app
        .client
        .put(app.url("/users/me"))
        .bearer_auth(&user.token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("No fields to update"));

    let resp = app
        .client
        .put(app.url("/users/me"))
        .bearer_auth(&user.token)
        .json(&json!({ "age": -3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = app
        .client
        .put(app.url("/users/me"))
        .bearer_auth(&user.token)
        .json(&json!({ "first_name": "  Grace ", "age": 30 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["first_name"], "Grace");
    assert_eq!(body["data"]["age"], 30);

    let resp = app
        .client
        .get(app.url(&format!("/users/{}", user.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["first_name"], "Grace");
    assert!(body["data"].get("email").is_none());
}

#[tokio::test]
async fn delete_account_cascades() {
    let app = common::spawn_app().await;
    let lister = common::create_test_user(&app, "leaving").await;
    let saver = common::create_test_user(&app, "staying").await;
    let listing_id = common::create_listing(&app, &lister, 700.0).await;

    let resp = app
        .client
        .post(app.url(&format!("/listings/{}/save", listing_id)))
        .bearer_auth(&saver.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .delete(app.url("/users/me"))
        .bearer_auth(&lister.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/listings/{}", listing_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = app
        .client
        .get(app.url("/users/me/saved"))
        .bearer_auth(&saver.token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 0);

    let resp = app
        .client
        .get(app.url(&format!("/users/{}", lister.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn security_headers_present() {
    let app = common::spawn_app().await;
    let resp = app.client.get(app.url("/listings")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(resp.headers().get("x-frame-options").unwrap(), "DENY");
    assert_eq!(
        resp.headers().get("content-security-policy").unwrap(),
        "default-src 'none'; frame-ancestors 'none'"
    );
    assert!(resp.headers().get("cache-control").is_none());

    let user = common::create_test_user(&app, "private").await;
    let resp = app
        .client
        .get(app.url("/users/me"))
        .bearer_auth(&user.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("cache-control").unwrap(), "no-store");
}

#[tokio::test]
#[ignore = "needs a redis server at REDIS_URL"]
async fn deleting_account_evicts_cached_listings() {
    let app = common::spawn_app_with_cache(Some(common::test_cache().await)).await;
    let lister = common::create_test_user(&app, "cachedlister").await;
    let listing_id = common::create_listing(&app, &lister, 820.0).await;
    let listing_url = app.url(&format!("/listings/{}", listing_id));

    // First read fills the cache.
    let resp = app.client.get(&listing_url).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .delete(app.url("/users/me"))
        .bearer_auth(&lister.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app.client.get(&listing_url).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}
