#![allow(dead_code)]

use burrow::services::cache::CacheService;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once,
};
use tokio::sync::{Mutex, MutexGuard};

const TEST_IDENTITY_SECRET: &str = "integration_test_secret_that_is_at_least_32_characters_long";

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
/// Tests share one database and truncate it on start, so they take turns.
static DB_LOCK: Mutex<()> = Mutex::const_new(());

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var("IDENTITY_JWT_SECRET", TEST_IDENTITY_SECRET);
        std::env::remove_var("IDENTITY_ISSUER");
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = burrow::config::identity::IdentityConfig::from_env().unwrap();
        let _ = burrow::utils::identity::init_identity_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    _guard: MutexGuard<'static, ()>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_cache(None).await
}

/// Like [`spawn_app`], with the listing cache layered in when given.
pub async fn spawn_app_with_cache(cache: Option<CacheService>) -> TestApp {
    init_env();
    let guard = DB_LOCK.lock().await;

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        burrow::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    cleanup_tables(&db).await;

    let email_service = burrow::services::email::EmailService::disabled();

    let mut app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(burrow::routes::create_routes())
        .layer(axum::middleware::from_fn(
            burrow::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(email_service));
    if let Some(cache) = cache {
        app = app.layer(axum::extract::Extension(cache));
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
        _guard: guard,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "saved",
        "apartment_details",
        "house_details",
        "listings",
        "users",
        "email_verifications",
        "verification_requests",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

pub async fn exec(db: &DatabaseConnection, sql: &str, values: Vec<sea_orm::Value>) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        sql,
        values,
    ))
    .await
    .unwrap_or_else(|e| panic!("SQL failed ({sql}): {e}"));
}

/// A token shaped like the identity provider's, signed with the test secret.
pub fn identity_token(auth_id: &str, email: &str) -> String {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = burrow::utils::IdentityClaims {
        sub: auth_id.to_string(),
        email: email.to_string(),
        name: Some("Test User".to_string()),
        iss: None,
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_IDENTITY_SECRET.as_bytes()),
    )
    .expect("Failed to mint identity token")
}

/// Connects to the redis at `REDIS_URL` for cache tests.
pub async fn test_cache() -> CacheService {
    let conn = burrow::config::redis::get_redis()
        .await
        .expect("REDIS_URL must point at a running redis");
    CacheService::new(conn)
}

/// The live code for `email`, read straight from the store.
pub async fn live_code(db: &DatabaseConnection, email: &str) -> String {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT code FROM email_verifications WHERE email = $1 AND verified = FALSE",
            vec![email.into()],
        ))
        .await
        .expect("Failed to query live code")
        .expect("No live code for email");
    row.try_get_by_index::<String>(0).unwrap()
}

pub async fn request_code(app: &TestApp, email: &str) -> reqwest::Response {
    app.client
        .post(app.url("/verification/request"))
        .json(&json!({ "email": email }))
        .send()
        .await
        .expect("Failed to request code")
}

pub async fn submit_code(app: &TestApp, email: &str, code: &str) -> reqwest::Response {
    app.client
        .post(app.url("/verification/verify"))
        .json(&json!({ "email": email, "code": code }))
        .send()
        .await
        .expect("Failed to submit code")
}

/// Runs the request/verify round trip for `email`.
pub async fn verify_email(app: &TestApp, email: &str) {
    let resp = request_code(app, email).await;
    assert_eq!(resp.status(), 200, "code request failed for {email}");
    let code = live_code(&app.db, email).await;
    let resp = submit_code(app, email, &code).await;
    assert_eq!(resp.status(), 200, "code verification failed for {email}");
}

pub struct TestUser {
    pub id: i32,
    pub auth_id: String,
    pub email: String,
    pub token: String,
}

/// Verify an email, sign up, and return the new account.
pub async fn create_test_user(app: &TestApp, prefix: &str) -> TestUser {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let auth_id = format!("ext_{}_{}", prefix, counter);
    let email = format!("{}_{}@school.edu", prefix, counter);
    let token = identity_token(&auth_id, &email);

    verify_email(app, &email).await;

    let resp = app
        .client
        .post(app.url("/auth/sign-up"))
        .bearer_auth(&token)
        .json(&json!({
            "first_name": "Test",
            "last_name": prefix,
            "gender": "unspecified",
            "age": 21
        }))
        .send()
        .await
        .expect("Failed to sign up");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse sign-up response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to sign up '{}': status={}, body={}", email, status, body);
    }

    TestUser {
        id: body["data"]["id"].as_i64().expect("sign-up response missing id") as i32,
        auth_id,
        email,
        token,
    }
}

pub fn listing_body(price: f64) -> Value {
    json!({
        "title": format!("Sublease at ${}", price),
        "address": "123 Test St NW",
        "description": "Furnished room close to campus",
        "property_type": "APARTMENT",
        "location": "Midtown",
        "distance_in_miles": 0.5,
        "price": price,
        "rooms_available": 1,
        "total_rooms": 4,
        "roommates": 3,
        "utilities_included": true,
        "sqft": 350,
        "image_urls": ["https://img.example.com/a.jpg"],
        "start_date": "2025-05-01",
        "end_date": "2025-08-01",
        "details": {
            "kind": "apartment",
            "room_type": "SINGLE",
            "apartment_type": "FourByFour"
        }
    })
}

/// Create a listing for `user` from `body`, returning its id.
pub async fn create_listing_with(app: &TestApp, user: &TestUser, body: Value) -> i32 {
    let resp = app
        .client
        .post(app.url("/listings"))
        .bearer_auth(&user.token)
        .json(&body)
        .send()
        .await
        .expect("Failed to create listing");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse listing response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create listing: status={}, body={}", status, body);
    }
    body["data"]["id"].as_i64().expect("listing response missing id") as i32
}

pub async fn create_listing(app: &TestApp, user: &TestUser, price: f64) -> i32 {
    create_listing_with(app, user, listing_body(price)).await
}
