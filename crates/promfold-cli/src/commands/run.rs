use std::path::Path;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::info;

use promfold_modules::Catalog;
use promfold_scrape::{CollectorConfig, CollectorPool};

pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let config = CollectorConfig::from_file(Path::new(config_path))
        .with_context(|| format!("loading {config_path}"))?;
    let catalog = Catalog::builtin()?;

    let (tx, mut rx) = mpsc::channel(64);
    let pool = CollectorPool::from_config(&config, &catalog, tx)?;
    if pool.is_empty() {
        anyhow::bail!("{config_path} defines no targets");
    }
    info!(collectors = pool.len(), "promfold running");

    loop {
        tokio::select! {
            report = rx.recv() => {
                let Some(report) = report else { break };
                for doc in report.documents() {
                    println!("{}", serde_json::to_string(&doc)?);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    // Workers blocked on a full channel see it close and exit.
    drop(rx);
    pool.shutdown().await;
    Ok(())
}
