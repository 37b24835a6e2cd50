use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS apartment_details (
                id SERIAL PRIMARY KEY,
                listing_id INTEGER NOT NULL UNIQUE REFERENCES listings(id) ON DELETE CASCADE,
                room_type VARCHAR(16) NOT NULL,
                apartment_type VARCHAR(32) NOT NULL
            )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS house_details (
                id SERIAL PRIMARY KEY,
                listing_id INTEGER NOT NULL UNIQUE REFERENCES listings(id) ON DELETE CASCADE,
                num_bathrooms DOUBLE PRECISION NOT NULL,
                num_rooms INTEGER NOT NULL
            )",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS house_details")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS apartment_details")
            .await?;
        Ok(())
    }
}
