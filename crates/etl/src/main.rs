use std::sync::Arc;

use anyhow::{Context, Result};
use common::{config::AppConfig, logging, TimezoneNormalizer};
use db::pg::PgDatabase;
use db::Stores;
use etl::{JsonFileConnector, Pipeline};
use loader::Loader;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging("info");
    let config = AppConfig::load()?;

    let tz = TimezoneNormalizer::parse(&config.etl.timezone_offset)
        .with_context(|| format!("invalid etl.timezone_offset '{}'", config.etl.timezone_offset))?;

    let database = Arc::new(PgDatabase::connect(&config.database.url).await?);
    let stores: Arc<dyn Stores> = database.clone();
    let loader = Loader::new(stores, tz);
    let connector = Box::new(JsonFileConnector::new(&config.etl.streams_path));

    let pipeline = Pipeline::new(connector, loader, config.etl.streams.clone());
    let report = pipeline.run().await?;

    for collection in &report.load.collections {
        match &collection.error {
            None => info!(
                collection = %collection.collection,
                inserted = collection.inserted,
                skipped = collection.skipped,
                "loaded"
            ),
            Some(error) => warn!(
                collection = %collection.collection,
                inserted = collection.inserted,
                skipped = collection.skipped,
                error = %error,
                "load failed for collection"
            ),
        }
    }
    info!(
        inserted = report.load.total_inserted(),
        skipped = report.load.total_skipped(),
        commits_dropped_no_author = report.stats.commits_dropped_no_author,
        success = report.is_success(),
        "etl run finished"
    );

    Ok(())
}
