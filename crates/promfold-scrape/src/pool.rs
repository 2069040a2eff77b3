//! Collector pool: one background task per (module, host) pair.
//!
//! Each worker runs a cycle immediately, then once per period, and sends
//! its [`CycleReport`] to a shared channel. A failed cycle is logged and
//! the worker carries on with the next one. Workers share nothing but the
//! read-only mapping table.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use promfold_core::MappingConfig;
use promfold_modules::Catalog;

use crate::collector::{Collector, CycleReport};
use crate::config::CollectorConfig;

/// How often a worker collects, and how long one fetch may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub period: Duration,
    pub timeout: Duration,
}

struct Worker {
    name: String,
    handle: JoinHandle<()>,
}

pub struct CollectorPool {
    workers: Vec<Worker>,
    shutdown_tx: watch::Sender<bool>,
}

impl Default for CollectorPool {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorPool {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            workers: Vec::new(),
            shutdown_tx,
        }
    }

    /// Build a pool from a config file's targets. Must be called inside a
    /// tokio runtime.
    pub fn from_config(
        config: &CollectorConfig,
        catalog: &Catalog,
        sink: mpsc::Sender<CycleReport>,
    ) -> anyhow::Result<Self> {
        let mut pool = Self::new();
        for target in &config.targets {
            let mut spec = catalog.require(&target.module, &target.metricset)?.clone();
            if let Some(path) = &target.mapping {
                let mapping = MappingConfig::from_file(path)
                    .with_context(|| format!("loading mapping {}", path.display()))?
                    .build()
                    .with_context(|| format!("invalid mapping {}", path.display()))?;
                spec.mapping = Arc::new(mapping);
            }
            let schedule = Schedule {
                period: target.period()?,
                timeout: target.timeout()?,
            };
            for host in &target.hosts {
                let collector = Collector::new(spec.clone(), host)
                    .with_context(|| format!("target {}", spec.qualified_name()))?;
                pool.spawn(collector, schedule, sink.clone());
            }
        }
        Ok(pool)
    }

    /// Start a worker for `collector`.
    pub fn spawn(
        &mut self,
        collector: Collector,
        schedule: Schedule,
        sink: mpsc::Sender<CycleReport>,
    ) {
        let name = format!("{}@{}", collector.spec().qualified_name(), collector.url());
        let shutdown = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(run_worker(collector, schedule, sink, shutdown));
        info!(worker = %name, period = ?schedule.period, "collector started");
        self.workers.push(Worker { name, handle });
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Worker names, `module/metricset@url`.
    pub fn worker_names(&self) -> Vec<String> {
        self.workers.iter().map(|w| w.name.clone()).collect()
    }

    /// Signal every worker to stop and wait for them.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for worker in self.workers {
            if let Err(e) = worker.handle.await {
                warn!(worker = %worker.name, error = %e, "collector task ended abnormally");
            }
        }
        info!("all collectors stopped");
    }
}

async fn run_worker(
    collector: Collector,
    schedule: Schedule,
    sink: mpsc::Sender<CycleReport>,
    mut shutdown: watch::Receiver<bool>,
) {
    let url = collector.url().to_string();
    debug!(%url, "collector loop starting");

    loop {
        let outcome = tokio::select! {
            result = collector.collect(schedule.timeout) => Some(result),
            _ = shutdown.changed() => None,
        };
        let Some(result) = outcome else { break };

        match result {
            Ok(report) => {
                // A full sink must not hold the worker past shutdown.
                tokio::select! {
                    sent = sink.send(report) => {
                        if sent.is_err() {
                            debug!(%url, "report sink closed, stopping collector");
                            break;
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
            Err(e) => {
                let error = format!("{e:#}");
                warn!(%url, %error, "collection cycle failed");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(schedule.period) => {}
            _ = shutdown.changed() => break,
        }
    }

    debug!(%url, "collector loop shutting down");
}
