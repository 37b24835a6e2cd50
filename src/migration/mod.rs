use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users_table;
mod m20250101_000002_create_listings_table;
mod m20250101_000003_create_listing_details_tables;
mod m20250101_000004_create_saved_table;
mod m20250101_000005_create_email_verifications_table;
mod m20250101_000006_add_listing_keyset_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users_table::Migration),
            Box::new(m20250101_000002_create_listings_table::Migration),
            Box::new(m20250101_000003_create_listing_details_tables::Migration),
            Box::new(m20250101_000004_create_saved_table::Migration),
            Box::new(m20250101_000005_create_email_verifications_table::Migration),
            Box::new(m20250101_000006_add_listing_keyset_indexes::Migration),
        ]
    }
}
