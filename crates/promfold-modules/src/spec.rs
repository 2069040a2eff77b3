//! Service module descriptors.

use std::sync::Arc;

use promfold_core::MetricsMapping;

pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_PATH: &str = "/metrics";

/// A monitored-service type: where its metrics live by default and how
/// they map into events.
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    pub module: String,
    pub metricset: String,
    pub default_scheme: String,
    pub default_path: String,
    pub mapping: Arc<MetricsMapping>,
}

impl ModuleSpec {
    pub fn new(module: &str, metricset: &str, mapping: MetricsMapping) -> Self {
        Self {
            module: module.to_string(),
            metricset: metricset.to_string(),
            default_scheme: DEFAULT_SCHEME.to_string(),
            default_path: DEFAULT_PATH.to_string(),
            mapping: Arc::new(mapping),
        }
    }

    pub fn with_default_path(mut self, path: &str) -> Self {
        self.default_path = path.to_string();
        self
    }

    /// `module/metricset`, the name used in logs and the CLI.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.module, self.metricset)
    }
}
