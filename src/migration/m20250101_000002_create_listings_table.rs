use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS listings (
                id SERIAL PRIMARY KEY,
                title VARCHAR(200) NOT NULL,
                address VARCHAR(300) NOT NULL,
                description TEXT NOT NULL,
                property_type VARCHAR(16) NOT NULL
                    CHECK (property_type IN ('APARTMENT', 'HOUSE')),
                location VARCHAR(32) NOT NULL
                    CHECK (location IN ('Midtown', 'WestMidtown', 'HomePark', 'NorthAvenue')),
                distance_in_miles DOUBLE PRECISION NOT NULL DEFAULT 0,
                price DOUBLE PRECISION NOT NULL,
                rooms_available INTEGER NOT NULL DEFAULT 0,
                total_rooms INTEGER NOT NULL DEFAULT 0,
                roommates INTEGER NOT NULL DEFAULT 0,
                utilities_included BOOLEAN NOT NULL DEFAULT FALSE,
                sqft INTEGER NOT NULL DEFAULT 0,
                image_urls TEXT[] NOT NULL DEFAULT '{}',
                start_date DATE NOT NULL,
                end_date DATE NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                lister_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_listings_lister_id ON listings(lister_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS listings").await?;
        Ok(())
    }
}
