//! Tekton Pipelines controller metrics.

use promfold_core::{ConfigurationError, MetricsMapping, Operation, metric};

use crate::spec::ModuleSpec;

pub const MODULE: &str = "tekton";

/// Per-taskrun events keyed by task, taskrun and namespace. Durations are
/// reported in seconds and stored in milliseconds; the duration histogram
/// keeps its buckets, with bounds converted to milliseconds.
pub fn taskruns_mapping() -> Result<MetricsMapping, ConfigurationError> {
    MetricsMapping::builder()
        .metric("tekton_taskrun_count", metric("total"))
        .metric("tekton_running_taskruns_count", metric("running"))
        .metric(
            "tekton_taskrun_duration_seconds",
            metric("taskrun.duration.sec").with_op(Operation::MultiplyBuckets(1000.0)),
        )
        .metric(
            "tekton_taskrun_duration_seconds_sum",
            metric("taskrun.duration.sec.sum").with_op(Operation::MultiplyBy(1000.0)),
        )
        .metric(
            "tekton_taskrun_duration_seconds_count",
            metric("taskrun.duration.sec.count"),
        )
        .key_label("task")
        .key_label("taskrun")
        .key_label("namespace")
        .build()
}

/// Controller-wide run counts keyed by status.
pub fn pipelines_stats_mapping() -> Result<MetricsMapping, ConfigurationError> {
    MetricsMapping::builder()
        .metric("tekton_taskrun_count", metric("taskrun.count"))
        .metric("tekton_running_taskruns_count", metric("taskrun.running.count"))
        .metric("tekton_pipelinerun_count", metric("pipelinerun.count"))
        .metric(
            "tekton_running_pipelineruns_count",
            metric("pipelinerun.running.count"),
        )
        .key_label("status")
        .build()
}

pub fn taskruns() -> Result<ModuleSpec, ConfigurationError> {
    Ok(ModuleSpec::new(MODULE, "taskruns", taskruns_mapping()?))
}

pub fn pipelines_stats() -> Result<ModuleSpec, ConfigurationError> {
    Ok(ModuleSpec::new(MODULE, "pipelines_stats", pipelines_stats_mapping()?))
}
