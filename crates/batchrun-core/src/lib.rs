//! batchrun Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - An async runtime
//! - Network clients
//! - Terminal rendering
//!
//! All types here describe one batch run: the items going in, the outcome
//! produced for each of them, and the report they fold into.

pub mod config;
pub mod error;
pub mod ids;
pub mod item;
pub mod outcome;
pub mod report;
pub mod status;

// Re-export commonly used types
pub use config::{ConcurrencyConfig, MAX_IN_FLIGHT};
pub use error::{ConfigError, TaskError};
pub use ids::RunId;
pub use item::WorkItem;
pub use outcome::{OutcomeError, TaskOutcome};
pub use report::{success_rate, RunReport};
pub use status::FailureKind;
