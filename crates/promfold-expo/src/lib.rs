//! promfold-expo: Prometheus text exposition decoding.
//!
//! Turns a scrape payload into the [`MetricFamily`] sequence consumed by
//! `promfold_core::assemble`, preserving the order families first appear.
//!
//! Histogram buckets (`name_bucket{le="…"}`) join family `name` with the
//! `le` label moved into [`Sample::bound`]; summary quantiles do the same
//! with `quantile`. The `_sum` and `_count` series of histograms and
//! summaries become untyped families of their own so a mapping can
//! target them by name.
//!
//! [`MetricFamily`]: promfold_core::MetricFamily
//! [`Sample::bound`]: promfold_core::Sample::bound

pub mod error;
pub mod parser;

pub use error::{ParseError, ParseResult};
pub use parser::parse;
