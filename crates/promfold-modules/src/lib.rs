//! promfold-modules: built-in service modules.
//!
//! Each module pairs a monitored-service type with its mapping table and
//! host defaults. A [`Catalog`] is assembled from module values at startup
//! and handed to the collector; there is no global registry.
//!
//! # Modules
//!
//! ```text
//! tekton/taskruns         one event per (task, taskrun, namespace)
//! tekton/pipelines_stats  one event per run status
//! ```

pub mod catalog;
pub mod spec;
pub mod tekton;

pub use catalog::{Catalog, CatalogError};
pub use spec::{DEFAULT_PATH, DEFAULT_SCHEME, ModuleSpec};
