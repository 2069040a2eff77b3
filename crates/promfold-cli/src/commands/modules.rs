use promfold_modules::Catalog;

pub fn list() -> anyhow::Result<()> {
    let catalog = Catalog::builtin()?;
    for spec in catalog.list() {
        println!(
            "{:<24} {}://<host>{}  metrics={} keys=[{}]",
            spec.qualified_name(),
            spec.default_scheme,
            spec.default_path,
            spec.mapping.metrics().count(),
            spec.mapping.key_labels().join(", "),
        );
    }
    Ok(())
}
