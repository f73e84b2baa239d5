pub mod aggregator;
pub mod orchestrator;
pub mod pipeline;
pub mod stages;
pub mod types;
pub mod verdict;

pub use orchestrator::Orchestrator;
pub use pipeline::{CaseOutcome, CasePipeline};
pub use stages::{Judge, Solver};
pub use types::ResultRow;
