use super::parse_env_or;
use chrono::Duration;
use std::sync::OnceLock;

/// Tunables for verification code issuance and checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationConfig {
    pub max_attempts: i32,
    pub code_ttl_minutes: i64,
    pub rate_window_minutes: i64,
    pub max_codes_per_window: u64,
    pub retention_hours: i64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            code_ttl_minutes: 10,
            rate_window_minutes: 60,
            max_codes_per_window: 20,
            retention_hours: 24,
        }
    }
}

impl VerificationConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_attempts: parse_env_or("VERIFICATION_MAX_ATTEMPTS", d.max_attempts).max(1),
            code_ttl_minutes: parse_env_or("VERIFICATION_CODE_TTL_MINUTES", d.code_ttl_minutes)
                .max(1),
            rate_window_minutes: parse_env_or(
                "VERIFICATION_RATE_WINDOW_MINUTES",
                d.rate_window_minutes,
            )
            .max(1),
            max_codes_per_window: parse_env_or(
                "VERIFICATION_MAX_CODES_PER_WINDOW",
                d.max_codes_per_window,
            )
            .max(1),
            retention_hours: parse_env_or("VERIFICATION_RETENTION_HOURS", d.retention_hours)
                .max(1),
        }
    }

    /// Process-wide settings, read from the environment on first use.
    pub fn global() -> &'static Self {
        static CONFIG: OnceLock<VerificationConfig> = OnceLock::new();
        CONFIG.get_or_init(Self::from_env)
    }

    pub fn code_ttl(&self) -> Duration {
        Duration::minutes(self.code_ttl_minutes)
    }

    pub fn rate_window(&self) -> Duration {
        Duration::minutes(self.rate_window_minutes)
    }

    pub fn retention(&self) -> Duration {
        Duration::hours(self.retention_hours)
    }
}
