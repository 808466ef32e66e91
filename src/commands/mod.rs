//! Command-line use cases.

mod export;
mod inspect;
mod strategies;

pub use export::{ExportSummary, export};
pub use inspect::{inspect, inspect_report};
pub use strategies::strategies;
