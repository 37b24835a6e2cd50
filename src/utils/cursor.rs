use crate::error::{AppError, AppResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Keyset boundary for listing pages: the sort key of the last row handed out.
///
/// On the wire it is base64url(JSON) and callers must treat it as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCursor {
    #[serde(rename = "t")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "i")]
    pub id: i32,
}

impl ListingCursor {
    pub fn new(created_at: NaiveDateTime, id: i32) -> Self {
        Self { created_at, id }
    }

    pub fn encode(&self) -> AppResult<String> {
        let json = serde_json::to_vec(self).map_err(|e| AppError::Internal(e.into()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(token: &str) -> AppResult<Self> {
        let invalid = || AppError::Validation("Invalid cursor".to_string());
        let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|_| invalid())?;
        serde_json::from_slice(&bytes).map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> ListingCursor {
        let ts = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_micro_opt(15, 9, 26, 535_897)
            .unwrap();
        ListingCursor::new(ts, 42)
    }

    #[test]
    fn encoded_cursor_is_url_safe() {
        let token = sample().encode().unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(ListingCursor::decode(&token).unwrap(), sample());
    }

    #[test]
    fn microseconds_survive() {
        let decoded = ListingCursor::decode(&sample().encode().unwrap()).unwrap();
        assert_eq!(decoded.created_at.and_utc().timestamp_subsec_micros(), 535_897);
    }

    #[test]
    fn garbage_is_a_validation_error() {
        for token in ["", "not base64!!", "e30", "eyJ0IjoxfQ"] {
            match ListingCursor::decode(token) {
                Err(AppError::Validation(msg)) => assert_eq!(msg, "Invalid cursor"),
                other => panic!("expected validation error for {token:?}, got {other:?}"),
            }
        }
    }
}
