//! Druid Smoke Test Library
//!
//! Read-only health checks for an EKS cluster running Apache Druid and its
//! platform addons. Each check yields a pass, fail or warning verdict; the
//! run's exit code is non-zero when anything failed.

pub mod checks;
pub mod config;
pub mod error;
pub mod k8s;
pub mod models;
pub mod probe;
pub mod report;
pub mod suite;

pub use config::{Config, OutputFormat};
pub use error::{InitError, QueryError, QueryResult};
pub use models::{CheckResult, ResultLog, RunSummary, Verdict};
pub use suite::{CheckGroup, SmokeSuite};
