use super::parse_bool_env;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

/// Per-IP request limits for each route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub verify: RateLimitRule,
    pub public_read: RateLimitRule,
    pub protected: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            verify: RateLimitRule::new(5, 10),
            public_read: RateLimitRule::new(30, 60),
            protected: RateLimitRule::new(10, 20),
        }
    }
}

impl RateLimitConfig {
    /// `RATE_LIMIT_CONFIG` overrides individual groups, e.g.
    /// `verify=5:10,public=30:60,protected=10:20`. An invalid value keeps the defaults.
    pub fn from_env() -> Self {
        let defaults = Self {
            enabled: parse_bool_env("RATE_LIMIT_ENABLED", true),
            ..Self::default()
        };

        match env::var("RATE_LIMIT_CONFIG") {
            Ok(raw) => defaults.with_overrides(&raw).unwrap_or_else(|err| {
                tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
                defaults
            }),
            Err(_) => defaults,
        }
    }

    fn with_overrides(mut self, raw: &str) -> Result<Self, String> {
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (group, rule) = item
                .split_once('=')
                .ok_or_else(|| format!("invalid item '{}', expected group=per:burst", item))?;
            let rule = parse_rule(rule.trim())?;
            match group.trim() {
                "verify" => self.verify = rule,
                "public" => self.public_read = rule,
                "protected" => self.protected = rule,
                other => {
                    return Err(format!(
                        "unknown group '{}', expected verify/public/protected",
                        other
                    ))
                }
            }
        }
        Ok(self)
    }
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second, burst_size) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw))?;

    let per_second: u64 = per_second
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second.trim()))?;
    let burst_size: u32 = burst_size
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst_size.trim()))?;

    if per_second == 0 || burst_size == 0 {
        return Err("per_second and burst_size must be > 0".to_string());
    }
    Ok(RateLimitRule::new(per_second, burst_size))
}
