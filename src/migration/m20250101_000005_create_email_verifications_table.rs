use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS email_verifications (
                id SERIAL PRIMARY KEY,
                email VARCHAR(255) NOT NULL,
                code VARCHAR(6) NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                verified BOOLEAN NOT NULL DEFAULT FALSE,
                attempts INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .await?;

        // At most one live (unverified) code per email.
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_email_verifications_live
             ON email_verifications(email) WHERE verified = FALSE",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_email_verifications_email_created
             ON email_verifications(email, created_at)",
        )
        .await?;

        // One row per issued code. Survives the unverified-code purge so the
        // per-window issuance count stays accurate.
        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS verification_requests (
                id SERIAL PRIMARY KEY,
                email VARCHAR(255) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_verification_requests_email_created
             ON verification_requests(email, created_at)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS verification_requests")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS email_verifications")
            .await?;
        Ok(())
    }
}
