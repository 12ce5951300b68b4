//! Results aggregation and persisted summaries.

mod summary;

pub use summary::{aggregate, ResultBucket, SuiteResult};

/// File name of the per-case runtime summary written under build A's run root.
pub const RUNTIME_SUMMARY_FILE: &str = "run_times.csv";
/// File name of the categorized results document written under build A's run root.
pub const RESULTS_SUMMARY_FILE: &str = "test_results.json";
