//! promfold-core: turns scraped metric families into structured events.
//!
//! A declarative [`MetricsMapping`] says which metrics are collected, into
//! which field paths, and which labels identify an entity. The assembler
//! groups samples by those key labels and produces one [`Event`] per entity
//! per collection cycle.
//!
//! # Architecture
//!
//! ```text
//! Vec<MetricFamily>  (from an exposition parser)
//!   └── assemble(&families, &mapping)
//!         ├── skip families not in the mapping
//!         ├── group samples by key labels → Event accumulators
//!         ├── copy labels, apply Operations, write target fields
//!         └── emit events in first-seen order
//! ```
//!
//! Mapping tables are built once via [`MappingBuilder`] or a TOML
//! [`MappingConfig`], validated, and shared read-only afterwards.

pub mod assemble;
pub mod config;
pub mod error;
pub mod event;
pub mod mapping;
pub mod model;
pub mod ops;

pub use assemble::{Assembler, AssemblyStats, assemble};
pub use config::{MappingConfig, MetricEntry};
pub use error::ConfigurationError;
pub use event::{Event, FieldTree, FieldValue, GroupKey};
pub use mapping::{LabelRole, MappingBuilder, MetricMap, MetricsMapping, MissingKeyPolicy, metric};
pub use model::{MetricFamily, MetricKind, Sample};
pub use ops::{MAX_ROUND_DECIMALS, Operation};
