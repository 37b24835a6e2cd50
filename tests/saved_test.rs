mod common;

use serde_json::Value;

async fn toggle(app: &common::TestApp, token: &str, listing_id: i32) -> (u16, Value) {
    let resp = app
        .client
        .post(app.url(&format!("/listings/{}/save", listing_id)))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn toggle_twice_restores_state() {
    let app = common::spawn_app().await;
    let lister = common::create_test_user(&app, "savelister").await;
    let saver = common::create_test_user(&app, "saver").await;
    let listing_id = common::create_listing(&app, &lister, 750.0).await;

    let (status, body) = toggle(&app, &saver.token, listing_id).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["saved"], true);

    let resp = app
        .client
        .get(app.url(&format!("/listings/{}/save", listing_id)))
        .bearer_auth(&saver.token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["saved"], true);

    let (status, body) = toggle(&app, &saver.token, listing_id).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["saved"], false);

    let resp = app
        .client
        .get(app.url(&format!("/listings/{}/save", listing_id)))
        .bearer_auth(&saver.token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["saved"], false);
}

#[tokio::test]
async fn concurrent_toggles_leave_consistent_state() {
    let app = common::spawn_app().await;
    let lister = common::create_test_user(&app, "racelister").await;
    let saver = common::create_test_user(&app, "racer").await;
    let listing_id = common::create_listing(&app, &lister, 750.0).await;

    let (a, b) = tokio::join!(
        toggle(&app, &saver.token, listing_id),
        toggle(&app, &saver.token, listing_id)
    );
    assert_eq!(a.0, 200);
    assert_eq!(b.0, 200);

    // Two flips from "not saved": one reports saved, the other unsaved.
    let results = [
        a.1["data"]["saved"].as_bool().unwrap(),
        b.1["data"]["saved"].as_bool().unwrap(),
    ];
    assert!(results.contains(&true) && results.contains(&false));

    let resp = app
        .client
        .get(app.url(&format!("/listings/{}/save", listing_id)))
        .bearer_auth(&saver.token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["saved"], false);
}

#[tokio::test]
async fn explicit_save_and_unsave() {
    let app = common::spawn_app().await;
    let lister = common::create_test_user(&app, "explicit").await;
    let saver = common::create_test_user(&app, "keeper").await;
    let listing_id = common::create_listing(&app, &lister, 750.0).await;

    let resp = app
        .client
        .delete(app.url(&format!("/listings/{}/save", listing_id)))
        .bearer_auth(&saver.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    for _ in 0..2 {
        let resp = app
            .client
            .put(app.url(&format!("/listings/{}/save", listing_id)))
            .bearer_auth(&saver.token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = app
        .client
        .delete(app.url(&format!("/listings/{}/save", listing_id)))
        .bearer_auth(&saver.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["saved"], false);
}

#[tokio::test]
async fn saving_missing_listing_is_not_found() {
    let app = common::spawn_app().await;
    let saver = common::create_test_user(&app, "ghost").await;

    let (status, body) = toggle(&app, &saver.token, 999_999).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Listing not found");
}

#[tokio::test]
async fn saved_list_in_save_order() {
    let app = common::spawn_app().await;
    let lister = common::create_test_user(&app, "orderlister").await;
    let saver = common::create_test_user(&app, "collector").await;
    let first = common::create_listing(&app, &lister, 600.0).await;
    let second = common::create_listing(&app, &lister, 700.0).await;

    toggle(&app, &saver.token, second).await;
    toggle(&app, &saver.token, first).await;

    let resp = app
        .client
        .get(app.url("/users/me/saved"))
        .bearer_auth(&saver.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 2);
    let ids: Vec<i64> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![first as i64, second as i64]);

    // Deleting a listing drops it from everyone's saved list.
    let resp = app
        .client
        .delete(app.url(&format!("/listings/{}", first)))
        .bearer_auth(&lister.token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url("/users/me/saved"))
        .bearer_auth(&saver.token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
}
