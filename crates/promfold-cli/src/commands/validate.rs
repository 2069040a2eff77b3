use std::path::Path;

use anyhow::Context;
use promfold_core::MappingConfig;

pub fn validate(path: &str) -> anyhow::Result<()> {
    let mapping = MappingConfig::from_file(Path::new(path))
        .with_context(|| format!("loading mapping {path}"))?
        .build()
        .with_context(|| format!("invalid mapping {path}"))?;

    println!(
        "✓ {path}: {} metrics, key labels [{}]",
        mapping.metrics().count(),
        mapping.key_labels().join(", ")
    );
    Ok(())
}
