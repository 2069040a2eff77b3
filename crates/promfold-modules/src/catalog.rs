//! Module catalog: an explicit, immutable lookup of known modules.
//!
//! Modules are values composed into a catalog; nothing registers itself
//! globally.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use promfold_core::ConfigurationError;

use crate::spec::ModuleSpec;
use crate::tekton;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("module {0} is already in the catalog")]
    Duplicate(String),

    #[error("module {module} is not in the catalog")]
    NotFound { module: String },

    #[error("invalid mapping: {0}")]
    Configuration(#[from] ConfigurationError),
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    modules: BTreeMap<(String, String), ModuleSpec>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every module shipped with promfold.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new()
            .with(tekton::taskruns()?)?
            .with(tekton::pipelines_stats()?)
    }

    /// Add a module. Fails if `module/metricset` is already present.
    pub fn with(mut self, spec: ModuleSpec) -> Result<Self, CatalogError> {
        let key = (spec.module.clone(), spec.metricset.clone());
        if self.modules.contains_key(&key) {
            return Err(CatalogError::Duplicate(spec.qualified_name()));
        }
        debug!(module = %spec.qualified_name(), "module added to catalog");
        self.modules.insert(key, spec);
        Ok(self)
    }

    pub fn get(&self, module: &str, metricset: &str) -> Option<&ModuleSpec> {
        self.modules
            .get(&(module.to_string(), metricset.to_string()))
    }

    /// Like [`Catalog::get`] but with an error naming the missing module.
    pub fn require(&self, module: &str, metricset: &str) -> Result<&ModuleSpec, CatalogError> {
        self.get(module, metricset)
            .ok_or_else(|| CatalogError::NotFound {
                module: format!("{module}/{metricset}"),
            })
    }

    /// Modules ordered by module then metricset.
    pub fn list(&self) -> impl Iterator<Item = &ModuleSpec> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promfold_core::{MetricsMapping, metric};

    #[test]
    fn builtin_contains_tekton_modules() {
        let catalog = Catalog::builtin().unwrap();
        let names: Vec<String> = catalog.list().map(ModuleSpec::qualified_name).collect();
        assert_eq!(names, ["tekton/pipelines_stats", "tekton/taskruns"]);

        let taskruns = catalog.get("tekton", "taskruns").unwrap();
        assert_eq!(taskruns.default_scheme, "http");
        assert_eq!(taskruns.default_path, "/metrics");
        assert!(taskruns.mapping.metric("tekton_taskrun_count").is_some());
    }

    #[test]
    fn missing_module_is_none() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.get("tekton", "nope").is_none());
        let err = catalog.require("argo", "workflows").unwrap_err();
        assert_eq!(err.to_string(), "module argo/workflows is not in the catalog");
    }

    #[test]
    fn duplicate_module_rejected() {
        let err = Catalog::builtin()
            .unwrap()
            .with(tekton::taskruns().unwrap())
            .unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(name) if name == "tekton/taskruns"));
    }

    #[test]
    fn custom_modules_compose() {
        let mapping = MetricsMapping::builder()
            .metric("argo_workflows_count", metric("count"))
            .key_label("status")
            .build()
            .unwrap();
        let catalog = Catalog::new()
            .with(ModuleSpec::new("argo", "workflows", mapping).with_default_path("/stats"))
            .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("argo", "workflows").unwrap().default_path, "/stats");
    }
}
