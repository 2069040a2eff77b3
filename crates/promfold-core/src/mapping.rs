//! Mapping tables: which metrics are collected, where they land, and
//! which labels identify an event.
//!
//! A [`MetricsMapping`] is built once through [`MappingBuilder`], which
//! validates it, and is read-only afterwards. It is `Send + Sync` and is
//! normally shared behind an `Arc` by every collection cycle.
//!
//! # Field collisions
//!
//! Two metrics that map to the same target path (or a metric path that
//! collides with a label field) overwrite each other within an event, last
//! write wins. The builder does not detect this; reviewing target paths is
//! the mapping author's job.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::ops::Operation;

/// What the assembler does with a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelRole {
    /// Part of the group key, also emitted as a field.
    Key,
    /// Emitted as a field, not part of the group key.
    Copy,
    /// Dropped. Unmapped labels behave this way.
    #[default]
    Ignore,
}

impl fmt::Display for LabelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LabelRole::Key => "key",
            LabelRole::Copy => "copy",
            LabelRole::Ignore => "ignore",
        })
    }
}

/// What happens to a sample that lacks one of the declared key labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingKeyPolicy {
    /// Group the sample as if the label had the value `""`.
    #[default]
    Empty,
    /// Skip the sample.
    Drop,
}

/// Destination of one source metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricMap {
    pub target_field: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ops: Vec<Operation>,
}

impl MetricMap {
    pub fn new(target_field: impl Into<String>) -> Self {
        Self {
            target_field: target_field.into(),
            ops: Vec::new(),
        }
    }

    /// Append an operation; operations run in the order they were added.
    pub fn with_op(mut self, op: Operation) -> Self {
        self.ops.push(op);
        self
    }

    /// Target path split on `.`.
    pub fn path(&self) -> impl Iterator<Item = &str> {
        self.target_field.split('.')
    }

    /// Histogram buckets are written per bound rather than to one field.
    pub fn splits_buckets(&self) -> bool {
        self.ops.iter().any(Operation::splits_buckets)
    }
}

/// Shorthand for a plain metric map.
pub fn metric(target_field: impl Into<String>) -> MetricMap {
    MetricMap::new(target_field)
}

/// A validated, immutable mapping table for one service type.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsMapping {
    metrics: HashMap<String, MetricMap>,
    labels: BTreeMap<String, LabelRole>,
    /// Key labels in name order, cached for group-key construction.
    key_labels: Vec<String>,
    missing_key: MissingKeyPolicy,
}

impl MetricsMapping {
    pub fn builder() -> MappingBuilder {
        MappingBuilder::default()
    }

    /// Build from plain spec lists.
    pub fn from_specs<M, L>(metrics: M, labels: L) -> Result<Self, ConfigurationError>
    where
        M: IntoIterator<Item = (String, MetricMap)>,
        L: IntoIterator<Item = (String, LabelRole)>,
    {
        let mut builder = Self::builder();
        for (name, map) in metrics {
            builder = builder.metric(name, map);
        }
        for (name, role) in labels {
            builder = builder.label(name, role);
        }
        builder.build()
    }

    pub fn metric(&self, name: &str) -> Option<&MetricMap> {
        self.metrics.get(name)
    }

    pub fn metrics(&self) -> impl Iterator<Item = (&str, &MetricMap)> {
        self.metrics.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn label_role(&self, name: &str) -> LabelRole {
        self.labels.get(name).copied().unwrap_or_default()
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, LabelRole)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Key labels sorted by name.
    pub fn key_labels(&self) -> &[String] {
        &self.key_labels
    }

    /// Copy labels sorted by name.
    pub fn copy_labels(&self) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .filter(|(_, role)| **role == LabelRole::Copy)
            .map(|(name, _)| name.as_str())
    }

    pub fn missing_key_policy(&self) -> MissingKeyPolicy {
        self.missing_key
    }
}

/// Collects metric and label declarations and validates them on `build`.
///
/// Errors are reported for the first offending declaration, in the
/// order declarations were made.
#[derive(Debug, Default)]
pub struct MappingBuilder {
    metrics: Vec<(String, MetricMap)>,
    labels: Vec<(String, LabelRole)>,
    missing_key: MissingKeyPolicy,
}

impl MappingBuilder {
    pub fn metric(mut self, name: impl Into<String>, map: MetricMap) -> Self {
        self.metrics.push((name.into(), map));
        self
    }

    pub fn label(mut self, name: impl Into<String>, role: LabelRole) -> Self {
        self.labels.push((name.into(), role));
        self
    }

    pub fn key_label(self, name: impl Into<String>) -> Self {
        self.label(name, LabelRole::Key)
    }

    pub fn copy_label(self, name: impl Into<String>) -> Self {
        self.label(name, LabelRole::Copy)
    }

    pub fn missing_key_policy(mut self, policy: MissingKeyPolicy) -> Self {
        self.missing_key = policy;
        self
    }

    pub fn build(self) -> Result<MetricsMapping, ConfigurationError> {
        let mut metrics = HashMap::with_capacity(self.metrics.len());
        for (name, map) in self.metrics {
            if map.target_field.is_empty() || map.path().any(str::is_empty) {
                return Err(ConfigurationError::EmptyTargetField { metric: name });
            }
            for op in &map.ops {
                op.validate().map_err(|reason| ConfigurationError::InvalidOperation {
                    metric: name.clone(),
                    reason,
                })?;
            }
            if metrics.contains_key(&name) {
                return Err(ConfigurationError::DuplicateMetric { metric: name });
            }
            metrics.insert(name, map);
        }

        let mut labels: BTreeMap<String, LabelRole> = BTreeMap::new();
        for (name, role) in self.labels {
            match labels.get(&name) {
                Some(&first) if first != role => {
                    return Err(ConfigurationError::ConflictingLabelRole {
                        label: name,
                        first,
                        second: role,
                    });
                }
                Some(_) => {}
                None => {
                    labels.insert(name, role);
                }
            }
        }

        let key_labels = labels
            .iter()
            .filter(|(_, role)| **role == LabelRole::Key)
            .map(|(name, _)| name.clone())
            .collect();

        Ok(MetricsMapping {
            metrics,
            labels,
            key_labels,
            missing_key: self.missing_key,
        })
    }
}
