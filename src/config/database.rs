use super::parse_env_or;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

pub async fn get_database() -> anyhow::Result<DatabaseConnection> {
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable must be set"))?;

    let max_connections: u32 = parse_env_or("DB_MAX_CONNECTIONS", 10);
    let min_connections: u32 = parse_env_or("DB_MIN_CONNECTIONS", 2);

    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(operation_timeout())
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);

    Ok(Database::connect(opt).await?)
}

/// Upper bound for a single store operation (`DB_OPERATION_TIMEOUT_MS`).
/// Read once; later changes to the environment are ignored.
pub fn operation_timeout() -> Duration {
    static TIMEOUT: OnceLock<Duration> = OnceLock::new();
    *TIMEOUT.get_or_init(|| {
        Duration::from_millis(parse_env_or("DB_OPERATION_TIMEOUT_MS", 5_000u64))
    })
}
