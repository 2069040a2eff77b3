use anyhow::Context;
use promfold_scrape::Collector;
use promfold_scrape::config::parse_interval;

use super::resolve_spec;

pub async fn scrape(
    module: &str,
    metricset: &str,
    host: &str,
    mapping: Option<&str>,
    timeout: &str,
) -> anyhow::Result<()> {
    let spec = resolve_spec(module, metricset, mapping)?;
    let timeout = parse_interval(timeout).context("invalid --timeout")?;
    let collector = Collector::new(spec, host)?;

    let report = collector.collect(timeout).await?;
    for doc in report.documents() {
        println!("{}", serde_json::to_string(&doc)?);
    }
    Ok(())
}
