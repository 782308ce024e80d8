//! OptiCore core: shared error type, configuration and the complaint domain
//! model used by the service clients and the CLI.

pub mod complaint;
pub mod config;
pub mod error;
pub mod import;
pub mod report;

// Re-export common error type
pub use error::{OptiCoreError, Result};
