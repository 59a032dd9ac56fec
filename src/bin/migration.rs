use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use orderdesk_api::{config, db, migrator::Migrator, telemetry};

/// `migration [up|down|status]`, defaulting to `up`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config().context("loading configuration")?;
    telemetry::init_tracing(cfg.log_level(), cfg.log_json);

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("connecting to database")?;

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    match command.as_str() {
        "up" => db::run_migrations(&pool).await?,
        "down" => {
            info!("Rolling back the most recent migration");
            Migrator::down(&pool, Some(1)).await?;
        }
        "status" => Migrator::status(&pool).await?,
        other => anyhow::bail!("unknown command '{}'; expected up, down or status", other),
    }

    info!("Migration command '{}' finished", command);
    Ok(())
}
