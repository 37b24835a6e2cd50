use crate::{
    config::verification::VerificationConfig,
    error::{AppError, AppResult},
    models::{email_verification, EmailVerification},
    services::store::bounded,
    utils::{codes_match, generate_verification_code},
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseBackend,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Statement, TransactionTrait,
    Value,
};

/// A freshly issued code. The caller is responsible for delivering it.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub id: i32,
    pub code: String,
    pub expires_at: NaiveDateTime,
}

pub struct VerificationService {
    db: DatabaseConnection,
    config: VerificationConfig,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn stmt(sql: &str, values: Vec<Value>) -> Statement {
    Statement::from_sql_and_values(DatabaseBackend::Postgres, sql, values)
}

impl VerificationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, *VerificationConfig::global())
    }

    pub fn with_config(db: DatabaseConnection, config: VerificationConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Issues a new code for `email`, replacing any live one.
    ///
    /// Serialized per email with a transaction-scoped advisory lock; the
    /// partial unique index on live codes backs this up.
    pub async fn request_code(&self, email: &str) -> AppResult<IssuedCode> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AppError::Validation("Email is required".to_string()));
        }
        let code = generate_verification_code()?;

        let issued = bounded("request_code", async {
            let now = chrono::Utc::now().naive_utc();
            let txn = self.db.begin().await?;

            txn.execute(stmt(
                "SELECT pg_advisory_xact_lock(hashtext($1))",
                vec![email.clone().into()],
            ))
            .await?;

            let window_start = now - self.config.rate_window();
            let recent = txn
                .query_one(stmt(
                    "SELECT COUNT(*) FROM verification_requests
                     WHERE email = $1 AND created_at >= $2",
                    vec![email.clone().into(), window_start.into()],
                ))
                .await?
                .ok_or(AppError::Internal(anyhow::anyhow!("Count query failed")))?;
            let recent: i64 = recent.try_get_by_index(0)?;

            if recent as u64 >= self.config.max_codes_per_window {
                return Err(AppError::RateLimited(
                    "Too many verification attempts. Please try again later.".to_string(),
                ));
            }

            EmailVerification::delete_many()
                .filter(email_verification::Column::Email.eq(email.as_str()))
                .filter(email_verification::Column::Verified.eq(false))
                .exec(&txn)
                .await?;

            let row = email_verification::ActiveModel {
                email: Set(email.clone()),
                code: Set(code.clone()),
                expires_at: Set(now + self.config.code_ttl()),
                verified: Set(false),
                attempts: Set(0),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            txn.execute(stmt(
                "INSERT INTO verification_requests (email, created_at) VALUES ($1, $2)",
                vec![email.clone().into(), now.into()],
            ))
            .await?;

            txn.commit().await?;
            Ok(IssuedCode {
                id: row.id,
                code: row.code,
                expires_at: row.expires_at,
            })
        })
        .await?;

        tracing::info!(verification_id = issued.id, "verification code issued");
        Ok(issued)
    }

    /// Checks `code` against the newest live code for `email`.
    pub async fn verify_code(&self, email: &str, code: &str) -> AppResult<()> {
        let email = normalize_email(email);
        let max_attempts = self.config.max_attempts;

        bounded("verify_code", async {
            let live = EmailVerification::find()
                .filter(email_verification::Column::Email.eq(email.as_str()))
                .filter(email_verification::Column::Verified.eq(false))
                .order_by_desc(email_verification::Column::CreatedAt)
                .order_by_desc(email_verification::Column::Id)
                .one(&self.db)
                .await?
                .ok_or_else(no_code_found)?;

            if chrono::Utc::now().naive_utc() > live.expires_at {
                return Err(AppError::Validation(
                    "Verification code has expired. Please request a new code.".to_string(),
                ));
            }

            if live.attempts >= max_attempts {
                return Err(too_many_attempts());
            }

            if !codes_match(&live.code, code) {
                // Guarded increment so concurrent wrong guesses cannot overshoot.
                let bumped = self
                    .db
                    .query_one(stmt(
                        "UPDATE email_verifications SET attempts = attempts + 1
                         WHERE id = $1 AND verified = FALSE AND attempts < $2
                         RETURNING attempts",
                        vec![live.id.into(), max_attempts.into()],
                    ))
                    .await?;
                let Some(bumped) = bumped else {
                    return Err(self.lost_update(live.id).await?);
                };
                let attempts: i32 = bumped.try_get_by_index(0)?;

                tracing::debug!(verification_id = live.id, attempts, "wrong verification code");
                return Err(AppError::Validation(format!(
                    "Invalid verification code. {} attempts remaining.",
                    max_attempts - attempts
                )));
            }

            let marked = self
                .db
                .execute(stmt(
                    "UPDATE email_verifications SET verified = TRUE
                     WHERE id = $1 AND verified = FALSE AND attempts < $2",
                    vec![live.id.into(), max_attempts.into()],
                ))
                .await?
                .rows_affected();
            if marked == 0 {
                return Err(self.lost_update(live.id).await?);
            }

            tracing::info!(verification_id = live.id, "email verified");
            Ok(())
        })
        .await
    }

    /// Explains why a guarded update on code `id` matched nothing. Only a
    /// row that is still live with its attempts used up counts as locked;
    /// one verified or replaced by a concurrent request is gone.
    async fn lost_update(&self, id: i32) -> AppResult<AppError> {
        let current = EmailVerification::find_by_id(id).one(&self.db).await?;
        Ok(match current {
            Some(row) if !row.verified && row.attempts >= self.config.max_attempts => {
                too_many_attempts()
            }
            _ => no_code_found(),
        })
    }

    pub async fn is_email_verified(&self, email: &str) -> AppResult<bool> {
        let email = normalize_email(email);
        bounded("is_email_verified", async {
            let found = EmailVerification::find()
                .filter(email_verification::Column::Email.eq(email.as_str()))
                .filter(email_verification::Column::Verified.eq(true))
                .one(&self.db)
                .await?;
            Ok(found.is_some())
        })
        .await
    }

    /// Deletes every code older than the retention period, verified or not.
    /// Returns the number of codes removed.
    pub async fn cleanup_expired(&self) -> AppResult<u64> {
        let now = chrono::Utc::now().naive_utc();
        let cutoff = now - self.config.retention();
        // The issuance ledger must cover at least one full rate window.
        let ledger_cutoff = now - self.config.retention().max(self.config.rate_window());

        let deleted = bounded("cleanup_expired", async {
            let result = EmailVerification::delete_many()
                .filter(email_verification::Column::CreatedAt.lt(cutoff))
                .exec(&self.db)
                .await?;

            self.db
                .execute(stmt(
                    "DELETE FROM verification_requests WHERE created_at < $1",
                    vec![ledger_cutoff.into()],
                ))
                .await?;

            Ok(result.rows_affected)
        })
        .await?;

        tracing::info!(deleted, "expired verification codes removed");
        Ok(deleted)
    }
}

fn no_code_found() -> AppError {
    AppError::Validation("No verification code found. Please request a new code.".to_string())
}

fn too_many_attempts() -> AppError {
    AppError::RateLimited("Too many failed attempts. Please request a new code.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  A@School.EDU "), "a@school.edu");
    }

    #[test]
    fn missing_code_is_validation_error() {
        assert_eq!(
            no_code_found().status_code(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn attempts_error_is_rate_limited() {
        assert_eq!(
            too_many_attempts().status_code(),
            axum::http::StatusCode::TOO_MANY_REQUESTS
        );
    }
}
