//! Callback surface connecting the engine to a consumer (CLI or GUI).
//!
//! Every notification is fire-and-forget: the engine calls into the observer
//! and continues without awaiting any response.

use std::sync::Arc;

use crate::model::CaseCompleted;
use crate::report::SuiteResult;

pub trait SuiteObserver: Send + Sync {
    /// Free-form progress/log line.
    fn on_print(&self, _message: &str) {}
    fn on_simulations_starting(&self, _num_builds: usize, _num_cases: usize) {}
    /// A case finished executing against one build. Completion order, not
    /// submission order.
    fn on_case_completed(&self, _record: &CaseCompleted) {}
    fn on_all_simulations_complete(&self) {}
    fn on_diff_completed(&self, _case: &str) {}
    fn on_suite_complete(&self, _result: &SuiteResult) {}
    /// The run stopped early on the cooperative cancel flag. Emitted instead
    /// of `on_suite_complete`; partial results are discarded.
    fn on_cancelled(&self) {}
}

pub type SharedObserver = Arc<dyn SuiteObserver>;

/// Observer that drops every event. Default for embedding and tests.
pub struct NullObserver;

impl SuiteObserver for NullObserver {}
