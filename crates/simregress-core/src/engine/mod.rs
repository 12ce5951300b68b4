//! Execution scheduler: prepares run directories, executes the case list
//! against both builds with an optional bounded worker pool, then drives the
//! diff and aggregation phases.

mod runner;

pub use runner::SuiteRunner;
