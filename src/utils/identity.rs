use crate::config::identity::IdentityConfig;
use anyhow::Result;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static IDENTITY_CONFIG: OnceLock<IdentityConfig> = OnceLock::new();

/// Install the identity provider settings. Must be called once at startup.
pub fn init_identity_config(config: IdentityConfig) -> Result<()> {
    IDENTITY_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Identity config already initialized"))?;
    Ok(())
}

fn get_config() -> Result<&'static IdentityConfig> {
    IDENTITY_CONFIG
        .get()
        .ok_or_else(|| anyhow::anyhow!("Identity config not initialized"))
}

/// Claims the identity provider puts in its access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Provider-side user id.
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

pub fn decode_identity_token(token: &str) -> Result<IdentityClaims> {
    let config = get_config()?;

    let mut validation = Validation::default();
    if let Some(issuer) = &config.issuer {
        validation.set_issuer(&[issuer]);
    }

    decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| anyhow::anyhow!("Failed to decode identity token: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::sync::Once;

    static INIT: Once = Once::new();

    fn ensure_config() {
        INIT.call_once(|| {
            let _ = init_identity_config(IdentityConfig {
                secret: "a_very_long_identity_secret_that_is_at_least_32_chars".to_string(),
                issuer: None,
            });
        });
    }

    fn mint(email: &str, name: Option<&str>, exp_offset: i64) -> String {
        let config = get_config().unwrap();
        let now = chrono::Utc::now().timestamp();
        let claims = IdentityClaims {
            sub: "user_abc".to_string(),
            email: email.to_string(),
            name: name.map(str::to_owned),
            iss: None,
            exp: (now + exp_offset) as usize,
            iat: (now - 60) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn decodes_provider_token() {
        ensure_config();
        let token = mint("a@school.edu", Some("Ada L"), 600);
        let claims = decode_identity_token(&token).unwrap();
        assert_eq!(claims.sub, "user_abc");
        assert_eq!(claims.email, "a@school.edu");
        assert_eq!(claims.name.as_deref(), Some("Ada L"));
    }

    #[test]
    fn tampered_token_fails() {
        ensure_config();
        let token = mint("a@school.edu", None, 600);
        let mut chars: Vec<char> = token.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert!(decode_identity_token(&tampered).is_err());
    }

    #[test]
    fn expired_token_fails() {
        ensure_config();
        let token = mint("a@school.edu", None, -3600);
        assert!(decode_identity_token(&token).is_err());
    }
}
