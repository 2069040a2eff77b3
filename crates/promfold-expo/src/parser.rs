//! Line-oriented parser for the text exposition format.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use promfold_core::{MetricFamily, MetricKind, Sample};

use crate::error::{ParseError, ParseResult};

/// Parse a full exposition payload.
pub fn parse(text: &str) -> ParseResult<Vec<MetricFamily>> {
    let mut builder = FamilyBuilder::default();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            builder.comment(line_no, comment)?;
            continue;
        }
        let parsed = parse_sample_line(line_no, line)?;
        builder.push(line_no, parsed)?;
    }

    let families = builder.finish();
    debug!(families = families.len(), "exposition payload parsed");
    Ok(families)
}

/// Families in first-seen order plus the declared types.
#[derive(Default)]
struct FamilyBuilder {
    families: Vec<MetricFamily>,
    index: HashMap<String, usize>,
    types: HashMap<String, MetricKind>,
}

impl FamilyBuilder {
    fn comment(&mut self, line: usize, comment: &str) -> ParseResult<()> {
        let mut parts = comment.split_whitespace();
        if parts.next() != Some("TYPE") {
            // HELP and free-form comments carry nothing we need.
            return Ok(());
        }
        let (Some(name), Some(kind)) = (parts.next(), parts.next()) else {
            return Err(ParseError::MalformedLine {
                line,
                reason: "TYPE needs a metric name and a type".to_string(),
            });
        };
        let kind: MetricKind = kind
            .parse()
            .map_err(|kind| ParseError::InvalidKind { line, kind })?;

        self.types.insert(name.to_string(), kind);
        self.family_mut(name, kind).kind = kind;
        Ok(())
    }

    fn push(&mut self, line: usize, parsed: ParsedLine) -> ParseResult<()> {
        let ParsedLine {
            name,
            mut labels,
            value,
        } = parsed;

        let (family, kind, bound_label) = self.resolve(&name);
        let bound = match bound_label.and_then(|l| labels.remove(l)) {
            Some(raw) => Some(parse_value(&raw).ok_or(ParseError::InvalidValue {
                line,
                value: raw,
            })?),
            None => None,
        };

        self.family_mut(&family, kind).samples.push(Sample {
            labels,
            value,
            bound,
        });
        Ok(())
    }

    /// Map a series name to (family name, family kind, label holding the bound).
    fn resolve(&self, series: &str) -> (String, MetricKind, Option<&'static str>) {
        if let Some(&kind) = self.types.get(series) {
            let bound = match kind {
                MetricKind::Summary => Some("quantile"),
                _ => None,
            };
            return (series.to_string(), kind, bound);
        }
        if let Some(base) = series.strip_suffix("_bucket") {
            if self.types.get(base) == Some(&MetricKind::Histogram) {
                return (base.to_string(), MetricKind::Histogram, Some("le"));
            }
        }
        (series.to_string(), MetricKind::Untyped, None)
    }

    fn family_mut(&mut self, name: &str, kind: MetricKind) -> &mut MetricFamily {
        let slot = match self.index.get(name) {
            Some(&slot) => slot,
            None => {
                let slot = self.families.len();
                self.families.push(MetricFamily::new(name, kind));
                self.index.insert(name.to_string(), slot);
                slot
            }
        };
        &mut self.families[slot]
    }

    fn finish(self) -> Vec<MetricFamily> {
        self.families
    }
}

struct ParsedLine {
    name: String,
    labels: BTreeMap<String, String>,
    value: f64,
}

/// Parse `name{labels} value [timestamp]`.
fn parse_sample_line(line: usize, text: &str) -> ParseResult<ParsedLine> {
    let name_end = text
        .find(|c: char| c == '{' || c.is_whitespace())
        .unwrap_or(text.len());
    let name = &text[..name_end];
    if !is_valid_name(name) {
        return Err(ParseError::MalformedLine {
            line,
            reason: format!("invalid metric name {name:?}"),
        });
    }

    let mut rest = &text[name_end..];
    let mut labels = BTreeMap::new();
    if let Some(after_brace) = rest.strip_prefix('{') {
        let (parsed, remaining) = parse_labels(line, after_brace)?;
        labels = parsed;
        rest = remaining;
    }

    let mut fields = rest.split_whitespace();
    let raw_value = fields.next().ok_or_else(|| ParseError::MalformedLine {
        line,
        reason: "missing sample value".to_string(),
    })?;
    let value = parse_value(raw_value).ok_or_else(|| ParseError::InvalidValue {
        line,
        value: raw_value.to_string(),
    })?;

    // Optional timestamp; the cycle timestamp is attached downstream.
    if let Some(ts) = fields.next() {
        if ts.parse::<i64>().is_err() {
            return Err(ParseError::MalformedLine {
                line,
                reason: format!("invalid timestamp {ts:?}"),
            });
        }
    }
    if fields.next().is_some() {
        return Err(ParseError::MalformedLine {
            line,
            reason: "trailing characters after timestamp".to_string(),
        });
    }

    Ok(ParsedLine {
        name: name.to_string(),
        labels,
        value,
    })
}

/// Parse the inside of `{…}`; returns the labels and the text after `}`.
fn parse_labels(line: usize, text: &str) -> ParseResult<(BTreeMap<String, String>, &str)> {
    let mut labels = BTreeMap::new();
    let mut rest = text.trim_start();

    loop {
        if let Some(after) = rest.strip_prefix('}') {
            return Ok((labels, after));
        }
        if rest.is_empty() {
            return Err(ParseError::UnterminatedLabels { line });
        }

        let eq = rest.find('=').ok_or(ParseError::UnterminatedLabels { line })?;
        let label = rest[..eq].trim();
        if !is_valid_label_name(label) {
            return Err(ParseError::MalformedLine {
                line,
                reason: format!("invalid label name {label:?}"),
            });
        }
        let after_eq = rest[eq + 1..].trim_start();
        let quoted = after_eq
            .strip_prefix('"')
            .ok_or_else(|| ParseError::MalformedLine {
                line,
                reason: format!("label {label:?} value must be quoted"),
            })?;
        let (value, after_value) = read_quoted(quoted).ok_or(ParseError::UnterminatedLabels { line })?;

        if labels.insert(label.to_string(), value).is_some() {
            return Err(ParseError::DuplicateLabel {
                line,
                label: label.to_string(),
            });
        }

        rest = after_value.trim_start();
        if let Some(after_comma) = rest.strip_prefix(',') {
            rest = after_comma.trim_start();
        } else if rest.is_empty() {
            return Err(ParseError::UnterminatedLabels { line });
        } else if !rest.starts_with('}') {
            return Err(ParseError::MalformedLine {
                line,
                reason: "expected ',' or '}' after label value".to_string(),
            });
        }
    }
}

/// Read an escaped string up to the closing quote. `text` starts just
/// after the opening quote.
fn read_quoted(text: &str) -> Option<(String, &str)> {
    let mut out = String::new();
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, &text[i + 1..])),
            '\\' => match chars.next()?.1 {
                'n' => out.push('\n'),
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            },
            c => out.push(c),
        }
    }
    None
}

/// Sample values: floats plus `NaN`, `+Inf`, `-Inf`.
fn parse_value(raw: &str) -> Option<f64> {
    match raw {
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => raw.parse::<f64>().ok(),
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
