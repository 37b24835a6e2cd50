use crate::error::{AppError, AppResult};

const CODE_MIN: u32 = 100_000;
const CODE_SPAN: u32 = 900_000;

/// Uniform 6-digit code in 100000..=999999.
///
/// Short-lived and attempt-limited; not a secret of long-term value.
pub fn generate_verification_code() -> AppResult<String> {
    // Largest multiple of CODE_SPAN that fits in u32; values above it are redrawn.
    let zone = u32::MAX - (u32::MAX % CODE_SPAN);
    loop {
        let mut buf = [0u8; 4];
        getrandom::getrandom(&mut buf)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("OS RNG unavailable: {e}")))?;
        let value = u32::from_le_bytes(buf);
        if value < zone {
            return Ok((CODE_MIN + value % CODE_SPAN).to_string());
        }
    }
}

/// Compare a submitted code against the stored one without an early exit.
pub fn codes_match(stored: &str, submitted: &str) -> bool {
    let a = stored.as_bytes();
    let b = submitted.trim().as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits_in_range() {
        for _ in 0..500 {
            let code = generate_verification_code().unwrap();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn match_ignores_surrounding_whitespace() {
        assert!(codes_match("482913", "482913"));
        assert!(codes_match("482913", " 482913\n"));
        assert!(!codes_match("482913", "000000"));
        assert!(!codes_match("482913", "48291"));
    }
}
