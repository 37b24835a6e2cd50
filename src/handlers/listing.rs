use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{ListingModel, Location, PropertyType};
use crate::response::{ApiResponse, CursorPage, PaginatedResponse, PaginationQuery};
use crate::services::cache::CacheService;
use crate::services::listing::{
    ListingFilters, ListingPatch, ListingService, ListingWithDetails, NewListing,
    DEFAULT_PAGE_SIZE,
};
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// Opaque cursor from the previous page's `next_cursor`
    pub cursor: Option<String>,
    /// Page size (1-100, default 12)
    pub limit: Option<u64>,
    /// Inclusive lower price bound
    pub min_price: Option<f64>,
    /// Inclusive upper price bound
    pub max_price: Option<f64>,
    pub property_type: Option<PropertyType>,
    pub location: Option<Location>,
    /// Minimum rooms available
    pub min_rooms: Option<i32>,
    /// Desired move-in date (YYYY-MM-DD)
    #[param(value_type = Option<String>, format = Date)]
    pub move_in: Option<NaiveDate>,
    /// Desired move-out date (YYYY-MM-DD)
    #[param(value_type = Option<String>, format = Date)]
    pub move_out: Option<NaiveDate>,
}

impl ListingQuery {
    fn filters(&self) -> ListingFilters {
        ListingFilters {
            min_price: self.min_price,
            max_price: self.max_price,
            property_type: self.property_type,
            location: self.location,
            min_rooms: self.min_rooms,
            move_in: self.move_in,
            move_out: self.move_out,
        }
    }
}

fn make_listing_service(db: DatabaseConnection, cache: Option<CacheService>) -> ListingService {
    let service = ListingService::new(db);
    match cache {
        Some(c) => service.with_cache(c),
        None => service,
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/listings",
    params(ListingQuery),
    responses(
        (status = 200, description = "One page of listings, newest first", body = CursorPage<ListingWithDetails>),
        (status = 400, description = "Invalid cursor or filters", body = AppError),
    ),
    tag = "listings"
)]
pub async fn list_listings(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<ListingQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ListingService::new(db);
    let page = service
        .list_page(
            params.cursor.as_deref(),
            params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            &params.filters(),
        )
        .await?;
    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    params(("id" = i32, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing with its details", body = ListingWithDetails),
        (status = 404, description = "Listing not found", body = AppError),
    ),
    tag = "listings"
)]
pub async fn get_listing(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = make_listing_service(db, cache.map(|c| c.0));
    Ok(ApiResponse::ok(service.get(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/listings",
    security(("identity_token" = [])),
    request_body = NewListing,
    responses(
        (status = 200, description = "Listing created", body = ListingWithDetails),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Sign-up not completed", body = AppError),
    ),
    tag = "listings"
)]
pub async fn create_listing(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<NewListing>,
) -> AppResult<impl IntoResponse> {
    let lister_id = auth_user.require_user_id()?;
    let created = ListingService::new(db).create(lister_id, payload).await?;
    Ok(ApiResponse::ok(created))
}

#[utoipa::path(
    put,
    path = "/api/v1/listings/{id}",
    security(("identity_token" = [])),
    params(("id" = i32, Path, description = "Listing ID")),
    request_body = ListingPatch,
    responses(
        (status = 200, description = "Listing updated", body = ListingWithDetails),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Listing not found", body = AppError),
    ),
    tag = "listings"
)]
pub async fn update_listing(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ListingPatch>,
) -> AppResult<impl IntoResponse> {
    let actor_id = auth_user.require_user_id()?;
    let service = make_listing_service(db, cache.map(|c| c.0));
    let updated = service.update(actor_id, id, payload).await?;
    Ok(ApiResponse::ok(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    security(("identity_token" = [])),
    params(("id" = i32, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing deleted"),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Listing not found", body = AppError),
    ),
    tag = "listings"
)]
pub async fn delete_listing(
    Extension(db): Extension<DatabaseConnection>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let actor_id = auth_user.require_user_id()?;
    let service = make_listing_service(db, cache.map(|c| c.0));
    service.delete(actor_id, id).await?;
    Ok(ApiResponse::with_message((), "Listing deleted".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me/listings",
    security(("identity_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "The caller's listings", body = PaginatedResponse<ListingModel>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "listings"
)]
pub async fn my_listings(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let user_id = auth_user.require_user_id()?;
    let (page, per_page) = params.resolve();

    let service = ListingService::new(db);
    let (items, total) = service.list_by_lister(user_id, page, per_page).await?;
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}
