use std::io::Read;

use anyhow::Context;
use promfold_core::Event;

use super::resolve_spec;

pub fn assemble(
    module: &str,
    metricset: &str,
    mapping: Option<&str>,
    input: &str,
    format: &str,
) -> anyhow::Result<()> {
    let spec = resolve_spec(module, metricset, mapping)?;
    let payload = read_input(input)?;
    let events = assemble_payload(&spec.mapping, &payload)?;

    match format {
        "pretty" => println!("{}", serde_json::to_string_pretty(&events)?),
        _ => {
            for event in &events {
                println!("{}", serde_json::to_string(event)?);
            }
        }
    }
    Ok(())
}

fn assemble_payload(
    mapping: &promfold_core::MetricsMapping,
    payload: &str,
) -> anyhow::Result<Vec<Event>> {
    let families = promfold_expo::parse(payload).context("parsing exposition payload")?;
    Ok(promfold_core::assemble(&families, mapping))
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {input}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn assemble_payload_with_builtin_module() {
        let spec = resolve_spec("tekton", "taskruns", None).unwrap();
        let payload = "tekton_taskrun_count{task=\"build\",taskrun=\"build-1\",namespace=\"ci\"} 3\n";
        let events = assemble_payload(&spec.mapping, payload).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            serde_json::to_string(&events[0]).unwrap(),
            r#"{"namespace":"ci","task":"build","taskrun":"build-1","total":3.0}"#
        );
    }

    #[test]
    fn mapping_file_overrides_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[metrics]\ntekton_taskrun_count = \"runs\"\n[labels]\ntask = \"key\"\n")
            .unwrap();
        let spec =
            resolve_spec("tekton", "taskruns", Some(file.path().to_str().unwrap())).unwrap();
        let payload = "tekton_taskrun_count{task=\"build\",taskrun=\"build-1\"} 3\n";
        let events = assemble_payload(&spec.mapping, payload).unwrap();
        assert_eq!(
            serde_json::to_string(&events[0]).unwrap(),
            r#"{"runs":3.0,"task":"build"}"#
        );
    }

    #[test]
    fn unknown_module_fails() {
        assert!(resolve_spec("tekton", "steps", None).is_err());
    }

    #[test]
    fn read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"m 1\n").unwrap();
        assert_eq!(read_input(file.path().to_str().unwrap()).unwrap(), "m 1\n");
        assert!(read_input("/nonexistent/payload.txt").is_err());
    }
}
