pub mod assemble;
pub mod modules;
pub mod run;
pub mod scrape;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use promfold_core::MappingConfig;
use promfold_modules::{Catalog, ModuleSpec};

/// Look up a built-in module, optionally replacing its mapping from a file.
pub fn resolve_spec(
    module: &str,
    metricset: &str,
    mapping: Option<&str>,
) -> anyhow::Result<ModuleSpec> {
    let catalog = Catalog::builtin()?;
    let mut spec = catalog.require(module, metricset)?.clone();
    if let Some(path) = mapping {
        spec.mapping = Arc::new(
            MappingConfig::from_file(Path::new(path))
                .with_context(|| format!("loading mapping {path}"))?
                .build()
                .with_context(|| format!("invalid mapping {path}"))?,
        );
    }
    Ok(spec)
}
