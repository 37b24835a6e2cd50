use std::env;

use anyhow::{Context, Result};
use burrow::{config, services::verification::VerificationService};

const USAGE: &str = "Usage: burrow-maintenance cleanup-codes";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    burrow::init_tracing("burrow=info");

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("cleanup-codes") => cleanup_codes().await?,
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
        None => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn cleanup_codes() -> Result<()> {
    let db = config::database::get_database()
        .await
        .context("failed to connect to database")?;

    let service = VerificationService::new(db);
    tracing::info!(
        component = "maintenance",
        retention_hours = service.config().retention_hours,
        "removing old verification codes"
    );

    let deleted = service
        .cleanup_expired()
        .await
        .context("failed to clean up verification codes")?;

    println!("Removed {deleted} verification codes.");
    Ok(())
}
