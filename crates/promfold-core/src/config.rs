//! Mapping documents in TOML.
//!
//! ```toml
//! missing_key = "empty"
//!
//! [metrics]
//! tekton_taskrun_count = "total"
//!
//! [metrics.tekton_taskrun_duration_seconds]
//! field = "taskrun.duration.sec"
//! ops = [{ multiply_by = 1000.0 }]
//!
//! [labels]
//! task = "key"
//! pod = "copy"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::mapping::{LabelRole, MetricMap, MetricsMapping, MissingKeyPolicy};
use crate::ops::Operation;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub missing_key: MissingKeyPolicy,
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricEntry>,
    #[serde(default)]
    pub labels: BTreeMap<String, LabelRole>,
}

/// A metric entry: either just the target field, or a field with operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricEntry {
    Field(String),
    Full {
        field: String,
        #[serde(default)]
        ops: Vec<Operation>,
    },
}

impl From<MetricEntry> for MetricMap {
    fn from(entry: MetricEntry) -> Self {
        match entry {
            MetricEntry::Field(field) => MetricMap::new(field),
            MetricEntry::Full { field, ops } => MetricMap {
                target_field: field,
                ops,
            },
        }
    }
}

impl MappingConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: MappingConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate and build the mapping table.
    pub fn build(self) -> Result<MetricsMapping, ConfigurationError> {
        let mut builder = MetricsMapping::builder().missing_key_policy(self.missing_key);
        for (name, entry) in self.metrics {
            builder = builder.metric(name, entry.into());
        }
        for (name, role) in self.labels {
            builder = builder.label(name, role);
        }
        builder.build()
    }

    /// Describe an existing mapping as a config document.
    pub fn from_mapping(mapping: &MetricsMapping) -> Self {
        let metrics = mapping
            .metrics()
            .map(|(name, map)| {
                let entry = if map.ops.is_empty() {
                    MetricEntry::Field(map.target_field.clone())
                } else {
                    MetricEntry::Full {
                        field: map.target_field.clone(),
                        ops: map.ops.clone(),
                    }
                };
                (name.to_string(), entry)
            })
            .collect();
        let labels = mapping
            .labels()
            .map(|(name, role)| (name.to_string(), role))
            .collect();
        Self {
            missing_key: mapping.missing_key_policy(),
            metrics,
            labels,
        }
    }
}
