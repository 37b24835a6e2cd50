use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::cache::CacheService;
use crate::services::user::{ProfilePatch, UserService};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

/// What other users can see.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicProfileResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub pfp: Option<String>,
    pub created_at: String,
}

impl From<UserModel> for PublicProfileResponse {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            pfp: u.pfp,
            created_at: u.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub age: i32,
    pub pfp: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserModel> for AccountResponse {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            gender: u.gender,
            age: u.age,
            pfp: u.pfp,
            created_at: u.created_at.to_string(),
            updated_at: u.updated_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Public profile", body = PublicProfileResponse),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_user_profile(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user = UserService::new(db).get_by_id(id).await?;
    Ok(ApiResponse::ok(PublicProfileResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    security(("identity_token" = [])),
    responses(
        (status = 200, description = "The caller's account", body = AccountResponse),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "No account for this identity yet", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_me(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user = UserService::new(db).get_by_auth_id(&auth_user.auth_id).await?;
    Ok(ApiResponse::ok(AccountResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    security(("identity_token" = [])),
    request_body = ProfilePatch,
    responses(
        (status = 200, description = "Profile updated", body = AccountResponse),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_me(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<ProfilePatch>,
) -> AppResult<impl IntoResponse> {
    let user_id = auth_user.require_user_id()?;
    let user = UserService::new(db).update_profile(user_id, payload).await?;
    Ok(ApiResponse::ok(AccountResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    security(("identity_token" = [])),
    responses(
        (status = 200, description = "Account deleted"),
        (status = 403, description = "Sign-up not completed", body = AppError),
    ),
    tag = "users"
)]
pub async fn delete_me(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user_id = auth_user.require_user_id()?;
    let service = match cache {
        Some(Extension(cache)) => UserService::new(db).with_cache(cache),
        None => UserService::new(db),
    };
    service.delete(user_id).await?;
    Ok(ApiResponse::with_message((), "Account deleted".to_string()))
}
