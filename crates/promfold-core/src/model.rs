//! Metric family model: the decoded form of one scrape payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metric type as declared by the exposition `# TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
    #[default]
    Untyped,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
            MetricKind::Untyped => "untyped",
        }
    }

    /// Whether samples of this kind may carry a bucket bound or quantile.
    pub fn has_bounds(&self) -> bool {
        matches!(self, MetricKind::Histogram | MetricKind::Summary)
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(MetricKind::Counter),
            "gauge" => Ok(MetricKind::Gauge),
            "histogram" => Ok(MetricKind::Histogram),
            "summary" => Ok(MetricKind::Summary),
            "untyped" | "unknown" => Ok(MetricKind::Untyped),
            other => Err(other.to_string()),
        }
    }
}

/// One observation within a family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub labels: BTreeMap<String, String>,
    pub value: f64,
    /// Bucket upper bound (`le`) or quantile, for histogram and summary samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bound: Option<f64>,
}

impl Sample {
    pub fn new(value: f64) -> Self {
        Self {
            labels: BTreeMap::new(),
            value,
            bound: None,
        }
    }

    /// Builder-style label setter.
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }

    pub fn with_bound(mut self, bound: f64) -> Self {
        self.bound = Some(bound);
        self
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

/// A named metric and all of its samples from one scrape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFamily {
    pub name: String,
    pub kind: MetricKind,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn new(name: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            kind,
            samples: Vec::new(),
        }
    }

    pub fn with_sample(mut self, sample: Sample) -> Self {
        self.samples.push(sample);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            MetricKind::Counter,
            MetricKind::Gauge,
            MetricKind::Histogram,
            MetricKind::Summary,
            MetricKind::Untyped,
        ] {
            assert_eq!(kind.as_str().parse::<MetricKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_is_an_alias_for_untyped() {
        assert_eq!("unknown".parse::<MetricKind>().unwrap(), MetricKind::Untyped);
        assert!("stateset".parse::<MetricKind>().is_err());
    }

    #[test]
    fn sample_builder_sets_labels_and_bound() {
        let s = Sample::new(4.0)
            .with_label("task", "build")
            .with_bound(0.5);
        assert_eq!(s.label("task"), Some("build"));
        assert_eq!(s.label("missing"), None);
        assert_eq!(s.bound, Some(0.5));
    }

    #[test]
    fn only_histograms_and_summaries_have_bounds() {
        assert!(MetricKind::Histogram.has_bounds());
        assert!(MetricKind::Summary.has_bounds());
        assert!(!MetricKind::Counter.has_bounds());
    }
}
