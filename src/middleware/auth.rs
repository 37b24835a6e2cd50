use crate::{
    error::{AppError, AppResult},
    services::user::UserService,
    utils::decode_identity_token,
};
use axum::{
    extract::{FromRequestParts, Request},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::DatabaseConnection;
use std::{env, sync::OnceLock};

const DEFAULT_IDENTITY_COOKIE: &str = "identity_token";

/// The caller, as vouched for by the identity provider.
///
/// `user_id` is set once the identity has a local account (after sign-up).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub auth_id: String,
    pub email: String,
    pub name: Option<String>,
    pub user_id: Option<i32>,
}

impl AuthUser {
    /// Local user id, or 403 if the identity never completed sign-up.
    pub fn require_user_id(&self) -> AppResult<i32> {
        self.user_id.ok_or_else(|| {
            AppError::Forbidden("Complete sign-up before using this endpoint".to_string())
        })
    }
}

/// Verifies the identity token (Authorization: Bearer, falling back to the
/// provider's session cookie) and resolves the local account for it.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers)
        .or_else(|| extract_cookie(&headers, identity_cookie_name()))
        .ok_or(AppError::Unauthorized)?;

    let claims = decode_identity_token(&token).map_err(|e| {
        tracing::debug!("identity token rejected: {e}");
        AppError::Unauthorized
    })?;

    let user = UserService::new(db)
        .resolve_identity(&claims.sub, &claims.email)
        .await?;

    request.extensions_mut().insert(AuthUser {
        auth_id: claims.sub,
        email: claims.email,
        name: claims.name,
        user_id: user.map(|u| u.id),
    });

    Ok(next.run(request).await)
}

fn identity_cookie_name() -> &'static str {
    static NAME: OnceLock<String> = OnceLock::new();
    NAME.get_or_init(|| {
        env::var("IDENTITY_COOKIE").unwrap_or_else(|_| DEFAULT_IDENTITY_COOKIE.to_string())
    })
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie_header| {
            cookie_header.split(';').find_map(|cookie| {
                let (key, value) = cookie.trim().split_once('=')?;
                (key.trim() == name && !value.trim().is_empty())
                    .then(|| value.trim().to_string())
            })
        })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
