//! One collection cycle: fetch → parse → assemble.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use promfold_core::{Assembler, Event};
use promfold_modules::ModuleSpec;

use crate::error::HostError;
use crate::fetch::fetch;
use crate::host::{HostParser, HostUrl};

/// Events of one cycle plus the metadata the publisher attaches.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub module: String,
    pub metricset: String,
    pub host: String,
    /// Milliseconds since the Unix epoch when the cycle finished.
    pub timestamp: u64,
    pub events: Vec<Event>,
}

impl CycleReport {
    /// One publishable document per event, with the event fields nested
    /// under `<module>.<metricset>`.
    pub fn documents(&self) -> Vec<Value> {
        self.events
            .iter()
            .map(|event| {
                let mut metricset = Map::new();
                metricset.insert(self.metricset.clone(), event.to_json());
                let mut doc = Map::new();
                doc.insert("@timestamp".to_string(), Value::from(self.timestamp));
                doc.insert("host".to_string(), Value::from(self.host.clone()));
                doc.insert("module".to_string(), Value::from(self.module.clone()));
                doc.insert("metricset".to_string(), Value::from(self.metricset.clone()));
                doc.insert(self.module.clone(), Value::Object(metricset));
                Value::Object(doc)
            })
            .collect()
    }
}

/// Collects one module from one host.
#[derive(Debug, Clone)]
pub struct Collector {
    spec: ModuleSpec,
    url: HostUrl,
}

impl Collector {
    /// Resolve `host` against the module's default scheme and path.
    pub fn new(spec: ModuleSpec, host: &str) -> Result<Self, HostError> {
        let url = HostParser::new(&spec.default_scheme, &spec.default_path).parse(host)?;
        Ok(Self { spec, url })
    }

    pub fn spec(&self) -> &ModuleSpec {
        &self.spec
    }

    pub fn url(&self) -> &HostUrl {
        &self.url
    }

    /// Parse and assemble an already-fetched payload.
    pub fn collect_text(&self, payload: &str) -> anyhow::Result<CycleReport> {
        let families = promfold_expo::parse(payload)
            .with_context(|| format!("parsing metrics from {}", self.url))?;

        let mut assembler = Assembler::new(&self.spec.mapping);
        for family in &families {
            assembler.fold_family(family);
        }
        let stats = assembler.stats();
        let events = assembler.finish();

        debug!(
            module = %self.spec.qualified_name(),
            url = %self.url,
            events = events.len(),
            skipped = stats.families_skipped,
            missing_key = stats.samples_missing_key,
            "cycle assembled"
        );

        Ok(CycleReport {
            module: self.spec.module.clone(),
            metricset: self.spec.metricset.clone(),
            host: self.url.address(),
            timestamp: epoch_millis(),
            events,
        })
    }

    /// Run a full cycle against the endpoint.
    pub async fn collect(&self, timeout: Duration) -> anyhow::Result<CycleReport> {
        let payload = fetch(&self.url, timeout).await?;
        self.collect_text(&payload)
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
