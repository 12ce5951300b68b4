//! Console consumer of the engine's event protocol.

use std::sync::atomic::{AtomicUsize, Ordering};

use simregress_core::events::SuiteObserver;
use simregress_core::model::CaseCompleted;
use simregress_core::SuiteResult;

#[derive(Default)]
pub struct ConsoleObserver {
    completed: AtomicUsize,
}

impl SuiteObserver for ConsoleObserver {
    fn on_print(&self, message: &str) {
        eprintln!("{message}");
    }

    fn on_simulations_starting(&self, num_builds: usize, num_cases: usize) {
        eprintln!("Starting the test suite: {num_builds} builds, {num_cases} cases per build");
    }

    fn on_case_completed(&self, record: &CaseCompleted) {
        let n = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let status = if record.success { "ok" } else { "FAILED" };
        eprintln!(
            "[{n}] {status:<6} {}  ({})",
            record.case_name,
            record.run_directory.display()
        );
    }

    fn on_all_simulations_complete(&self) {
        eprintln!("Completed all simulations");
    }

    fn on_diff_completed(&self, case: &str) {
        eprintln!("Completed diffing case: {case}");
    }

    fn on_suite_complete(&self, result: &SuiteResult) {
        eprintln!();
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        eprintln!(
            "Cases: {} total, {} diffed",
            result.all_cases.len(),
            result.diffed.len()
        );
        eprintln!(
            "Build A: {} passed, {} failed",
            result.success_a.len(),
            result.failure_a.len()
        );
        eprintln!(
            "Build B: {} passed, {} failed",
            result.success_b.len(),
            result.failure_b.len()
        );
        eprintln!(
            "Diffs: {} big math, {} small math, {} big table, {} small table, {} text",
            result.big_math_diffs.len(),
            result.small_math_diffs.len(),
            result.big_table_diffs.len(),
            result.small_table_diffs.len(),
            result.text_diffs.len()
        );
        eprintln!("Summaries written under {}", result.output_root.display());
    }

    fn on_cancelled(&self) {
        eprintln!("Test suite cancelled; partial results were discarded");
    }
}
