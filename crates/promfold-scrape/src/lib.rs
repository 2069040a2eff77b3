//! promfold-scrape: fetching and periodic collection.
//!
//! Everything around the assembly engine that touches the network or a
//! clock: resolving module host defaults, fetching exposition payloads
//! over HTTP/1.1, and running one collection loop per target.
//!
//! # Architecture
//!
//! ```text
//! CollectorPool
//!   └── per (module, host) background task
//!         ├── fetch()            → exposition text
//!         ├── promfold_expo::parse → Vec<MetricFamily>
//!         ├── promfold_core::Assembler → Vec<Event>
//!         └── CycleReport → mpsc sink (publisher)
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod fetch;
pub mod host;
pub mod pool;

pub use collector::{Collector, CycleReport};
pub use config::{CollectorConfig, TargetConfig};
pub use error::{FetchError, HostError};
pub use fetch::fetch;
pub use host::{HostParser, HostUrl};
pub use pool::{CollectorPool, Schedule};
