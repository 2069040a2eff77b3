//! Grouping and assembly: folds metric families into events.
//!
//! Samples are grouped by the values of the mapping's key labels. Each
//! distinct key yields one event, emitted in the order the key was first
//! seen, so identical input always produces identical output.
//!
//! Histogram buckets are ordinary samples unless their metric carries
//! [`Operation::MultiplyBuckets`]; then each bucket is written at
//! `<target>.bucket.<bound>` with the scaled bound as its key.
//!
//! Assembly is pure computation: no I/O, no locking. The mapping is only
//! read, and all accumulator state lives in the [`Assembler`] for one cycle.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::event::{Event, GroupKey};
use crate::mapping::{MetricMap, MetricsMapping, MissingKeyPolicy};
use crate::model::{MetricFamily, MetricKind, Sample};
use crate::ops::Operation;

/// Counters describing one assembly pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub families_seen: usize,
    pub families_skipped: usize,
    pub samples_folded: usize,
    /// Samples that lacked at least one key label.
    pub samples_missing_key: usize,
    /// Samples dropped under [`MissingKeyPolicy::Drop`].
    pub samples_dropped: usize,
}

/// Accumulates events for a single collection cycle.
pub struct Assembler<'m> {
    mapping: &'m MetricsMapping,
    index: HashMap<GroupKey, usize>,
    events: Vec<Event>,
    stats: AssemblyStats,
}

impl<'m> Assembler<'m> {
    pub fn new(mapping: &'m MetricsMapping) -> Self {
        Self {
            mapping,
            index: HashMap::new(),
            events: Vec::new(),
            stats: AssemblyStats::default(),
        }
    }

    /// Fold every sample of `family` into the accumulators. Families whose
    /// name is not in the mapping are skipped without looking at samples.
    pub fn fold_family(&mut self, family: &MetricFamily) {
        self.stats.families_seen += 1;
        let mapping = self.mapping;
        let Some(metric) = mapping.metric(&family.name) else {
            self.stats.families_skipped += 1;
            trace!(metric = %family.name, "metric not mapped, skipping family");
            return;
        };

        let split = family.kind == MetricKind::Histogram && metric.splits_buckets();
        for sample in &family.samples {
            self.fold_sample(&family.name, metric, sample, split);
        }
    }

    fn fold_sample(&mut self, name: &str, metric: &MetricMap, sample: &Sample, split: bool) {
        let Some(key) = self.group_key(name, sample) else {
            self.stats.samples_dropped += 1;
            return;
        };

        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.events.len();
                self.events.push(Event::new(key.clone()));
                self.index.insert(key, slot);
                slot
            }
        };
        let event = &mut self.events[slot];

        for label in self.mapping.copy_labels() {
            if let Some(value) = sample.label(label) {
                event.set(label, value);
            }
        }

        match sample.bound {
            Some(bound) if split => {
                let (bound, count) = Operation::apply_bucket(&metric.ops, bound, sample.value);
                let container = format!("{}.bucket", metric.target_field);
                event.put_entry(&container, &bucket_name(bound), count);
            }
            _ => {
                let value = Operation::apply_all(&metric.ops, sample.value);
                event.put(&metric.target_field, value);
            }
        }
        self.stats.samples_folded += 1;
    }

    /// Resolve the group key for `sample`. `None` means the sample is
    /// dropped because of a missing key label.
    fn group_key(&mut self, name: &str, sample: &Sample) -> Option<GroupKey> {
        let mut pairs = Vec::with_capacity(self.mapping.key_labels().len());
        let mut missing = false;
        for label in self.mapping.key_labels() {
            let value = match sample.label(label) {
                Some(v) => v.to_string(),
                None => {
                    debug!(metric = %name, %label, "sample is missing a key label");
                    missing = true;
                    String::new()
                }
            };
            pairs.push((label.clone(), value));
        }

        if missing {
            self.stats.samples_missing_key += 1;
            if self.mapping.missing_key_policy() == MissingKeyPolicy::Drop {
                return None;
            }
        }
        Some(GroupKey(pairs))
    }

    pub fn stats(&self) -> AssemblyStats {
        self.stats
    }

    /// Emit the events in first-seen key order.
    pub fn finish(self) -> Vec<Event> {
        debug!(
            events = self.events.len(),
            families = self.stats.families_seen,
            skipped = self.stats.families_skipped,
            samples = self.stats.samples_folded,
            "assembly finished"
        );
        self.events
    }
}

/// Field name for a bucket bound, using the exposition spelling of infinity.
fn bucket_name(bound: f64) -> String {
    if bound == f64::INFINITY {
        "+Inf".to_string()
    } else if bound == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        bound.to_string()
    }
}

/// Assemble one cycle's families into events.
pub fn assemble<'a, I>(families: I, mapping: &MetricsMapping) -> Vec<Event>
where
    I: IntoIterator<Item = &'a MetricFamily>,
{
    let mut assembler = Assembler::new(mapping);
    for family in families {
        assembler.fold_family(family);
    }
    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{LabelRole, metric};
    use crate::model::MetricKind;
    use serde_json::json;

    fn taskrun_mapping() -> MetricsMapping {
        MetricsMapping::builder()
            .metric("tekton_taskrun_count", metric("total"))
            .metric("tekton_running_taskruns_count", metric("running"))
            .metric(
                "tekton_taskrun_duration_seconds",
                metric("taskrun.duration.sec").with_op(Operation::MultiplyBy(1000.0)),
            )
            .key_label("task")
            .key_label("taskrun")
            .key_label("namespace")
            .build()
            .unwrap()
    }

    fn taskrun_sample(task: &str, run: &str, value: f64) -> Sample {
        Sample::new(value)
            .with_label("task", task)
            .with_label("taskrun", run)
            .with_label("namespace", "ci")
    }

    fn family(name: &str, samples: Vec<Sample>) -> MetricFamily {
        MetricFamily {
            name: name.to_string(),
            kind: MetricKind::Gauge,
            samples,
        }
    }

    #[test]
    fn single_sample_single_event() {
        let families = vec![family(
            "tekton_taskrun_count",
            vec![taskrun_sample("build", "build-1", 3.0)],
        )];
        let events = assemble(&families, &taskrun_mapping());

        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].to_json(),
            json!({"task": "build", "taskrun": "build-1", "namespace": "ci", "total": 3.0})
        );
    }

    #[test]
    fn metrics_with_same_key_share_an_event() {
        let families = vec![
            family("tekton_taskrun_count", vec![taskrun_sample("build", "build-1", 3.0)]),
            family(
                "tekton_taskrun_duration_seconds",
                vec![taskrun_sample("build", "build-1", 2.5)],
            ),
        ];
        let events = assemble(&families, &taskrun_mapping());

        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].to_json(),
            json!({
                "task": "build",
                "taskrun": {"duration": {"sec": 2500.0}},
                "namespace": "ci",
                "total": 3.0,
            })
        );
    }

    #[test]
    fn events_follow_first_seen_order() {
        let families = vec![
            family(
                "tekton_taskrun_count",
                vec![
                    taskrun_sample("test", "test-1", 1.0),
                    taskrun_sample("build", "build-1", 2.0),
                ],
            ),
            family(
                "tekton_running_taskruns_count",
                vec![
                    taskrun_sample("deploy", "deploy-1", 1.0),
                    taskrun_sample("test", "test-1", 0.0),
                ],
            ),
        ];
        let events = assemble(&families, &taskrun_mapping());

        let tasks: Vec<_> = events
            .iter()
            .map(|e| e.get("task").and_then(|v| v.as_str()).unwrap().to_string())
            .collect();
        assert_eq!(tasks, ["test", "build", "deploy"]);
        assert_eq!(events[0].get("running").and_then(|v| v.as_f64()), Some(0.0));
    }

    #[test]
    fn unmapped_family_is_skipped() {
        let families = vec![family(
            "tekton_unknown_metric",
            vec![taskrun_sample("build", "build-1", 9.0)],
        )];
        let mapping = taskrun_mapping();
        let mut assembler = Assembler::new(&mapping);
        for f in &families {
            assembler.fold_family(f);
        }
        assert_eq!(assembler.stats().families_skipped, 1);
        assert!(assembler.finish().is_empty());
    }

    #[test]
    fn empty_family_contributes_nothing() {
        let families = vec![family("tekton_taskrun_count", vec![])];
        assert!(assemble(&families, &taskrun_mapping()).is_empty());
    }

    #[test]
    fn missing_key_label_defaults_to_empty() {
        let sample = Sample::new(1.0).with_label("task", "build");
        let families = vec![family("tekton_taskrun_count", vec![sample])];
        let mapping = taskrun_mapping();
        let mut assembler = Assembler::new(&mapping);
        assembler.fold_family(&families[0]);
        assert_eq!(assembler.stats().samples_missing_key, 1);

        let events = assembler.finish();
        assert_eq!(
            events[0].to_json(),
            json!({"task": "build", "taskrun": "", "namespace": "", "total": 1.0})
        );
    }

    #[test]
    fn missing_key_label_dropped_under_drop_policy() {
        let mapping = MetricsMapping::builder()
            .metric("m", metric("v"))
            .key_label("status")
            .missing_key_policy(MissingKeyPolicy::Drop)
            .build()
            .unwrap();
        let families = vec![family(
            "m",
            vec![Sample::new(1.0), Sample::new(2.0).with_label("status", "ok")],
        )];

        let mut assembler = Assembler::new(&mapping);
        assembler.fold_family(&families[0]);
        assert_eq!(assembler.stats().samples_dropped, 1);

        let events = assembler.finish();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].to_json(), json!({"status": "ok", "v": 2.0}));
    }

    #[test]
    fn copy_labels_are_written_but_do_not_group() {
        let mapping = MetricsMapping::builder()
            .metric("m", metric("v"))
            .key_label("status")
            .label("pod", LabelRole::Copy)
            .label("instance", LabelRole::Ignore)
            .build()
            .unwrap();
        let families = vec![family(
            "m",
            vec![
                Sample::new(1.0)
                    .with_label("status", "ok")
                    .with_label("pod", "a")
                    .with_label("instance", "x"),
                Sample::new(2.0)
                    .with_label("status", "ok")
                    .with_label("pod", "b"),
            ],
        )];
        let events = assemble(&families, &mapping);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].to_json(), json!({"status": "ok", "pod": "b", "v": 2.0}));
    }

    #[test]
    fn no_key_labels_yields_one_event() {
        let mapping = MetricsMapping::builder()
            .metric("a", metric("a"))
            .metric("b", metric("b"))
            .build()
            .unwrap();
        let families = vec![
            family("a", vec![Sample::new(1.0).with_label("x", "1")]),
            family("b", vec![Sample::new(2.0).with_label("x", "2")]),
        ];
        let events = assemble(&families, &mapping);

        assert_eq!(events.len(), 1);
        assert!(events[0].key().is_empty());
        assert_eq!(events[0].to_json(), json!({"a": 1.0, "b": 2.0}));
    }

    #[test]
    fn bucket_samples_are_ordinary_samples() {
        let mapping = MetricsMapping::builder()
            .metric("h", metric("h.value"))
            .key_label("status")
            .build()
            .unwrap();
        let families = vec![MetricFamily {
            name: "h".to_string(),
            kind: MetricKind::Histogram,
            samples: vec![
                Sample::new(1.0).with_label("status", "ok").with_bound(0.5),
                Sample::new(4.0).with_label("status", "ok").with_bound(f64::INFINITY),
            ],
        }];
        let events = assemble(&families, &mapping);

        // Same key, same path: the last bucket wins.
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].get("h.value").and_then(|v| v.as_f64()), Some(4.0));
    }

    #[test]
    fn multiply_buckets_writes_one_field_per_bound() {
        let mapping = MetricsMapping::builder()
            .metric(
                "latency_seconds",
                metric("latency.ms").with_op(Operation::MultiplyBuckets(1000.0)),
            )
            .metric(
                "latency_seconds_sum",
                metric("latency.ms.sum").with_op(Operation::MultiplyBy(1000.0)),
            )
            .key_label("status")
            .build()
            .unwrap();
        let families = vec![
            MetricFamily {
                name: "latency_seconds".to_string(),
                kind: MetricKind::Histogram,
                samples: vec![
                    Sample::new(1.0).with_label("status", "ok").with_bound(0.0025),
                    Sample::new(3.0).with_label("status", "ok").with_bound(0.5),
                    Sample::new(4.0).with_label("status", "ok").with_bound(f64::INFINITY),
                ],
            },
            family(
                "latency_seconds_sum",
                vec![Sample::new(1.25).with_label("status", "ok")],
            ),
        ];
        let events = assemble(&families, &mapping);

        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].to_json(),
            json!({
                "status": "ok",
                "latency": {"ms": {
                    "bucket": {"2.5": 1.0, "500": 3.0, "+Inf": 4.0},
                    "sum": 1250.0,
                }},
            })
        );
    }

    #[test]
    fn multiply_buckets_on_gauge_scales_value() {
        let mapping = MetricsMapping::builder()
            .metric("d", metric("d.ms").with_op(Operation::MultiplyBuckets(1000.0)))
            .build()
            .unwrap();
        let families = vec![family("d", vec![Sample::new(2.5)])];
        let events = assemble(&families, &mapping);
        assert_eq!(events[0].to_json(), json!({"d": {"ms": 2500.0}}));
    }

    #[test]
    fn non_finite_values_written_through() {
        let mapping = MetricsMapping::builder()
            .metric("m", metric("v").with_op(Operation::MultiplyBy(2.0)))
            .build()
            .unwrap();
        let families = vec![family("m", vec![Sample::new(f64::INFINITY)])];
        let events = assemble(&families, &mapping);
        assert_eq!(
            events[0].get("v").and_then(|v| v.as_f64()),
            Some(f64::INFINITY)
        );
    }
}
