//! Diff dispatcher: given two completed run directories for a case, decide
//! (via the end-status classifier and the outcome decision matrix) whether to
//! diff at all, then dispatch each applicable artifact kind.

pub mod builtin;
pub mod text;
pub mod thresholds;

use std::path::Path;
use std::sync::Arc;

use crate::decision::{self, CaseDisposition};
use crate::events::SuiteObserver;
use crate::marker;
use crate::model::{CompletionStatus, DiffSeverity, EndSummary, MathDiffKind, TestEntry, TextDiffKind};

pub use thresholds::ThresholdConfig;

/// File name of the tabular report artifact.
pub const TABLE_ARTIFACT: &str = "simtbl.htm";

/// External numeric diff call: both inputs, three output artifact paths, and
/// the shared thresholds; returns the overall severity.
pub trait NumericDiff: Send + Sync {
    fn diff(
        &self,
        thresholds: &ThresholdConfig,
        file_a: &Path,
        file_b: &Path,
        abs_out: &Path,
        perc_out: &Path,
        summary_out: &Path,
    ) -> anyhow::Result<DiffSeverity>;
}

/// External tabular diff call; same contract as [`NumericDiff`].
pub trait TabularDiff: Send + Sync {
    fn diff(
        &self,
        thresholds: &ThresholdConfig,
        file_a: &Path,
        file_b: &Path,
        abs_out: &Path,
        perc_out: &Path,
        summary_out: &Path,
    ) -> anyhow::Result<DiffSeverity>;
}

/// The diff engines one suite run dispatches to.
#[derive(Clone)]
pub struct DiffEngines {
    pub numeric: Arc<dyn NumericDiff>,
    pub table: Arc<dyn TabularDiff>,
}

impl Default for DiffEngines {
    fn default() -> Self {
        Self {
            numeric: Arc::new(builtin::CsvNumericDiff),
            table: Arc::new(builtin::HtmlTabularDiff),
        }
    }
}

fn both_exist(dir_a: &Path, dir_b: &Path, name: &str) -> bool {
    dir_a.join(name).exists() && dir_b.join(name).exists()
}

/// Classify both builds' completion markers, run the decision matrix, and —
/// when the case proceeds — dispatch every applicable diff kind.
///
/// Diff artifacts are written next to build A's outputs. Errors bubble to the
/// caller, which absorbs them at the case boundary.
pub fn process_case(
    entry: &mut TestEntry,
    dir_a: &Path,
    dir_b: &Path,
    thresholds: &ThresholdConfig,
    engines: &DiffEngines,
    observer: &dyn SuiteObserver,
) -> anyhow::Result<()> {
    let (status_a, runtime_a) = marker::classify_run_dir(dir_a);
    let (status_b, runtime_b) = marker::classify_run_dir(dir_b);

    let disposition = decision::decide(&entry.basename, status_a, status_b);
    entry.disposition = Some(disposition);

    if disposition == CaseDisposition::ForcedSuccess {
        entry.add_summary(EndSummary {
            status_a: CompletionStatus::Success,
            runtime_a,
            status_b: CompletionStatus::Success,
            runtime_b,
        });
        observer.on_print(&format!(
            "{} fataled as expected, continuing with no diff checking on it",
            entry.basename
        ));
        return Ok(());
    }

    entry.add_summary(EndSummary {
        status_a,
        runtime_a,
        status_b,
        runtime_b,
    });

    if let Some(reason) = disposition.skip_reason() {
        observer.on_print(&format!(
            "Skipping entry because {}: {}",
            reason, entry.basename
        ));
        return Ok(());
    }

    observer.on_print(&format!("Processing (Diffs) : {}", entry.basename));

    for kind in MathDiffKind::ALL {
        let name = kind.artifact();
        if !both_exist(dir_a, dir_b, name) {
            continue;
        }
        let severity = engines.numeric.diff(
            thresholds,
            &dir_a.join(name),
            &dir_b.join(name),
            &dir_a.join(format!("{name}.absdiff.csv")),
            &dir_a.join(format!("{name}.percdiff.csv")),
            &dir_a.join(format!("{name}.diffsummary.csv")),
        )?;
        entry.add_math_diff(kind, severity);
    }

    if both_exist(dir_a, dir_b, TABLE_ARTIFACT) {
        let severity = engines.table.diff(
            thresholds,
            &dir_a.join(TABLE_ARTIFACT),
            &dir_b.join(TABLE_ARTIFACT),
            &dir_a.join(format!("{TABLE_ARTIFACT}.absdiff.htm")),
            &dir_a.join(format!("{TABLE_ARTIFACT}.percdiff.htm")),
            &dir_a.join(format!("{TABLE_ARTIFACT}.summarydiff.htm")),
        )?;
        entry.add_table_diff(severity);
    }

    for kind in TextDiffKind::ALL {
        let name = kind.artifact();
        if !both_exist(dir_a, dir_b, name) {
            continue;
        }
        let outcome = text::diff_text_files(
            &dir_a.join(name),
            &dir_b.join(name),
            &dir_a.join(format!("{name}.diff")),
        )?;
        entry.add_text_diff(kind, outcome);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullObserver;
    use crate::model::TextDiffOutcome;

    const SUCCESS_MARKER: &str =
        "Simulation Completed Successfully-- 0 Warning; 0 Severe Errors; Elapsed Time=00hr 00min 10.00sec";
    const FATAL_MARKER: &str =
        "Simulation Terminated--Fatal Error Detected. 2 Severe Errors; Elapsed Time=00hr 00min  1.00sec";

    fn case_dirs(root: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let a = root.join("a");
        let b = root.join("b");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        (a, b)
    }

    fn run_case(entry: &mut TestEntry, dir_a: &Path, dir_b: &Path) {
        process_case(
            entry,
            dir_a,
            dir_b,
            &ThresholdConfig::default(),
            &DiffEngines::default(),
            &NullObserver,
        )
        .unwrap();
    }

    #[test]
    fn proceed_dispatches_only_artifacts_present_on_both_sides() {
        let root = tempfile::tempdir().unwrap();
        let (dir_a, dir_b) = case_dirs(root.path());
        std::fs::write(dir_a.join(marker::END_MARKER), SUCCESS_MARKER).unwrap();
        std::fs::write(dir_b.join(marker::END_MARKER), SUCCESS_MARKER).unwrap();
        std::fs::write(dir_a.join("simout.csv"), "Date,Load\n01/01,100.0\n").unwrap();
        std::fs::write(dir_b.join("simout.csv"), "Date,Load\n01/01,100.0\n").unwrap();
        // Meter output present only on side A: must not be dispatched.
        std::fs::write(dir_a.join("simmtr.csv"), "Date,Meter\n01/01,5.0\n").unwrap();
        std::fs::write(dir_a.join("simout.err"), "warmup converged\n").unwrap();
        std::fs::write(dir_b.join("simout.err"), "warmup converged\n").unwrap();

        let mut entry = TestEntry::new("SimpleTest", None);
        run_case(&mut entry, &dir_a, &dir_b);

        assert_eq!(entry.disposition, Some(CaseDisposition::Proceed));
        assert_eq!(entry.math_diffs.len(), 1);
        assert_eq!(entry.math_diffs[0].kind, MathDiffKind::Primary);
        assert_eq!(entry.math_diffs[0].severity, DiffSeverity::None);
        assert!(entry.table_diffs.is_empty());
        assert_eq!(entry.text_diffs.len(), 1);
        assert_eq!(entry.text_diffs[0].outcome, TextDiffOutcome::Equal);
    }

    #[test]
    fn skip_records_summary_but_no_diffs() {
        let root = tempfile::tempdir().unwrap();
        let (dir_a, dir_b) = case_dirs(root.path());
        std::fs::write(dir_a.join(marker::END_MARKER), SUCCESS_MARKER).unwrap();
        // No marker on side B: crashed before writing it.
        std::fs::write(dir_a.join("simout.csv"), "Date,Load\n01/01,100.0\n").unwrap();
        std::fs::write(dir_b.join("simout.csv"), "Date,Load\n01/01,100.0\n").unwrap();

        let mut entry = TestEntry::new("CrashCase", None);
        run_case(&mut entry, &dir_a, &dir_b);

        assert_eq!(entry.disposition, Some(CaseDisposition::SkipOneMissing));
        let summary = entry.summary.unwrap();
        assert_eq!(summary.status_a, CompletionStatus::Success);
        assert_eq!(summary.status_b, CompletionStatus::Missing);
        assert!(entry.math_diffs.is_empty());
        assert!(entry.text_diffs.is_empty());
    }

    #[test]
    fn expected_fatal_case_gets_synthetic_success_and_no_diffs() {
        let root = tempfile::tempdir().unwrap();
        let (dir_a, dir_b) = case_dirs(root.path());
        std::fs::write(dir_a.join(marker::END_MARKER), FATAL_MARKER).unwrap();
        std::fs::write(dir_b.join(marker::END_MARKER), FATAL_MARKER).unwrap();
        std::fs::write(dir_a.join("simout.csv"), "Date,Load\n01/01,1.0\n").unwrap();
        std::fs::write(dir_b.join("simout.csv"), "Date,Load\n01/01,2.0\n").unwrap();

        let mut entry = TestEntry::new("ScriptedKillTest", None);
        run_case(&mut entry, &dir_a, &dir_b);

        assert_eq!(entry.disposition, Some(CaseDisposition::ForcedSuccess));
        let summary = entry.summary.unwrap();
        assert_eq!(summary.status_a, CompletionStatus::Success);
        assert_eq!(summary.status_b, CompletionStatus::Success);
        assert!(entry.math_diffs.is_empty());
    }

    #[test]
    fn diff_artifacts_are_written_next_to_build_a_outputs() {
        let root = tempfile::tempdir().unwrap();
        let (dir_a, dir_b) = case_dirs(root.path());
        std::fs::write(dir_a.join(marker::END_MARKER), SUCCESS_MARKER).unwrap();
        std::fs::write(dir_b.join(marker::END_MARKER), SUCCESS_MARKER).unwrap();
        std::fs::write(dir_a.join("simout.csv"), "Date,Load\n01/01,100.0\n").unwrap();
        std::fs::write(dir_b.join("simout.csv"), "Date,Load\n01/01,150.0\n").unwrap();

        let mut entry = TestEntry::new("BigDiffCase", None);
        run_case(&mut entry, &dir_a, &dir_b);

        assert_eq!(entry.math_diffs[0].severity, DiffSeverity::Big);
        assert!(dir_a.join("simout.csv.absdiff.csv").exists());
        assert!(dir_a.join("simout.csv.percdiff.csv").exists());
        assert!(dir_a.join("simout.csv.diffsummary.csv").exists());
        assert!(!dir_b.join("simout.csv.absdiff.csv").exists());
    }
}
