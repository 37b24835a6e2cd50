use crate::config::parse_bool_env;
use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::OnceLock;

/// JSON responses never load sub-resources.
const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";
/// Swagger UI ships inline scripts and styles.
const DOCS_CSP: &str = "default-src 'self'; frame-ancestors 'none'; object-src 'none'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; img-src 'self' data:";
const DOCS_PREFIXES: [&str; 2] = ["/swagger-ui", "/api-docs"];
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

fn hsts_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| parse_bool_env("ENABLE_HSTS", true))
}

fn csp_for(path: &str) -> &'static str {
    if DOCS_PREFIXES.iter().any(|p| path.starts_with(p)) {
        DOCS_CSP
    } else {
        API_CSP
    }
}

/// Requests carrying an identity (bearer header or cookie) get per-user data back.
fn carries_identity(headers: &HeaderMap) -> bool {
    headers.contains_key(header::AUTHORIZATION) || headers.contains_key(header::COOKIE)
}

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let csp = csp_for(request.uri().path());
    let personal = carries_identity(request.headers());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(csp),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    if personal && !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }
    if hsts_enabled() {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docs_get_relaxed_policy() {
        assert_eq!(csp_for("/swagger-ui/index.html"), DOCS_CSP);
        assert_eq!(csp_for("/api-docs/openapi.json"), DOCS_CSP);
        assert_eq!(csp_for("/api/v1/listings"), API_CSP);
    }

    #[test]
    fn identity_detected_from_header_or_cookie() {
        let mut headers = HeaderMap::new();
        assert!(!carries_identity(&headers));
        headers.insert(header::COOKIE, HeaderValue::from_static("identity_token=x"));
        assert!(carries_identity(&headers));
    }
}
