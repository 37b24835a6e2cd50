use anyhow::Result;
use std::env;

/// Settings for verifying bearer tokens minted by the external identity provider.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub secret: String,
    /// Expected `iss` claim; unchecked when unset.
    pub issuer: Option<String>,
}

impl IdentityConfig {
    pub fn from_env() -> Result<Self> {
        let secret = env::var("IDENTITY_JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("IDENTITY_JWT_SECRET environment variable must be set"))?;

        if secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "IDENTITY_JWT_SECRET must be at least 32 characters"
            ));
        }

        let issuer = env::var("IDENTITY_ISSUER")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self { secret, issuer })
    }
}
