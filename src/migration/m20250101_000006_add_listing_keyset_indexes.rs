use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // Browse order: newest first, id as tie-breaker.
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_listings_created_id
             ON listings(created_at DESC, id DESC)",
        )
        .await?;

        db.execute_unprepared("CREATE INDEX IF NOT EXISTS idx_listings_price ON listings(price)")
            .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_listings_type_location
             ON listings(property_type, location)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP INDEX IF EXISTS idx_listings_type_location")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_listings_price")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_listings_created_id")
            .await?;
        Ok(())
    }
}
