use crate::error::{AppError, AppResult};
use crate::handlers::user::AccountResponse;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::user::{SignUp, UserService};
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;

#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-up",
    security(("identity_token" = [])),
    request_body = SignUp,
    responses(
        (status = 200, description = "Account created", body = AccountResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Email not verified", body = AppError),
        (status = 409, description = "Account already exists", body = AppError),
    ),
    tag = "auth"
)]
pub async fn sign_up(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<SignUp>,
) -> AppResult<impl IntoResponse> {
    if auth_user.user_id.is_some() {
        return Err(AppError::Conflict("Account already exists".to_string()));
    }

    let user = UserService::new(db)
        .sign_up(&auth_user.auth_id, &auth_user.email, payload)
        .await?;
    Ok(ApiResponse::ok(AccountResponse::from(user)))
}
