use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::services::email::EmailService;
use crate::services::verification::{normalize_email, VerificationService};
use axum::{extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RequestCodeRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestCodeResponse {
    /// Id of the issued code record
    pub id: i32,
    /// When the code stops being accepted
    pub expires_at: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyCodeRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    /// The 6-digit code from the email
    #[validate(length(min = 1, max = 16))]
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyCodeResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerificationStatusResponse {
    pub verified: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/verification/request",
    request_body = RequestCodeRequest,
    responses(
        (status = 200, description = "Code issued and sent", body = RequestCodeResponse),
        (status = 400, description = "Invalid email", body = AppError),
        (status = 429, description = "Too many codes requested", body = AppError),
    ),
    tag = "verification"
)]
pub async fn request_code(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<RequestCodeRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = VerificationService::new(db);
    let issued = service.request_code(&payload.email).await?;

    let recipient = normalize_email(&payload.email);
    if let Err(e) = email_service
        .send_verification_code(&recipient, &issued.code, service.config().code_ttl_minutes)
        .await
    {
        tracing::warn!(verification_id = issued.id, "failed to send verification email: {e}");
        return Err(AppError::Internal(anyhow::anyhow!(
            "Failed to send verification email"
        )));
    }

    Ok(ApiResponse::with_message(
        RequestCodeResponse {
            id: issued.id,
            expires_at: issued.expires_at.to_string(),
        },
        "Verification code sent".to_string(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/verification/verify",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Email verified", body = VerifyCodeResponse),
        (status = 400, description = "Missing, expired or wrong code", body = AppError),
        (status = 429, description = "Too many failed attempts", body = AppError),
    ),
    tag = "verification"
)]
pub async fn verify_code(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<VerifyCodeRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    VerificationService::new(db)
        .verify_code(&payload.email, &payload.code)
        .await?;
    Ok(ApiResponse::ok(VerifyCodeResponse { success: true }))
}

#[utoipa::path(
    get,
    path = "/api/v1/verification/status",
    params(StatusQuery),
    responses(
        (status = 200, description = "Whether the email has been verified", body = VerificationStatusResponse),
    ),
    tag = "verification"
)]
pub async fn verification_status(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<StatusQuery>,
) -> AppResult<impl IntoResponse> {
    let verified = VerificationService::new(db)
        .is_email_verified(&params.email)
        .await?;
    Ok(ApiResponse::ok(VerificationStatusResponse { verified }))
}
