use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::ListingModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::saved::SavedService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct SaveStateResponse {
    /// Whether the listing is now saved by the caller
    pub saved: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/save",
    security(("identity_token" = [])),
    params(("id" = i32, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Save state flipped", body = SaveStateResponse),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Listing not found", body = AppError),
    ),
    tag = "saved"
)]
pub async fn toggle_save(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(listing_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = auth_user.require_user_id()?;
    let saved = SavedService::new(db).toggle(user_id, listing_id).await?;
    Ok(ApiResponse::ok(SaveStateResponse { saved }))
}

#[utoipa::path(
    put,
    path = "/api/v1/listings/{id}/save",
    security(("identity_token" = [])),
    params(("id" = i32, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing saved", body = SaveStateResponse),
        (status = 404, description = "Listing not found", body = AppError),
    ),
    tag = "saved"
)]
pub async fn save_listing(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(listing_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = auth_user.require_user_id()?;
    SavedService::new(db).save(user_id, listing_id).await?;
    Ok(ApiResponse::ok(SaveStateResponse { saved: true }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}/save",
    security(("identity_token" = [])),
    params(("id" = i32, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing unsaved", body = SaveStateResponse),
        (status = 404, description = "Listing was not saved", body = AppError),
    ),
    tag = "saved"
)]
pub async fn unsave_listing(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(listing_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = auth_user.require_user_id()?;
    SavedService::new(db).unsave(user_id, listing_id).await?;
    Ok(ApiResponse::ok(SaveStateResponse { saved: false }))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/save",
    security(("identity_token" = [])),
    params(("id" = i32, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Current save state", body = SaveStateResponse),
    ),
    tag = "saved"
)]
pub async fn save_state(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(listing_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = auth_user.require_user_id()?;
    let saved = SavedService::new(db).is_saved(user_id, listing_id).await?;
    Ok(ApiResponse::ok(SaveStateResponse { saved }))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me/saved",
    security(("identity_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Saved listings, most recent first", body = PaginatedResponse<ListingModel>),
    ),
    tag = "saved"
)]
pub async fn list_saved(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let user_id = auth_user.require_user_id()?;
    let (page, per_page) = params.resolve();

    let (items, total) = SavedService::new(db)
        .list_for_user(user_id, page, per_page)
        .await?;
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}
