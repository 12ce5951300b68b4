//! Work-item model: one [`TestEntry`] per input case, plus the record types
//! the scheduler and diff dispatcher attach to it during a run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::decision::CaseDisposition;

/// Completion classification for one build's run of one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// The completion marker contained the success token.
    Success,
    /// The completion marker contained the fatal token.
    Fatal,
    /// The marker existed but matched neither token (or failed to parse).
    Unknown,
    /// No completion marker was written; the run crashed before finishing.
    Missing,
}

impl CompletionStatus {
    pub fn is_success(self) -> bool {
        self == CompletionStatus::Success
    }
}

/// End-of-run summary for a case across both builds. Runtimes are in seconds
/// and only meaningful for `Success`/`Fatal`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EndSummary {
    pub status_a: CompletionStatus,
    pub runtime_a: f64,
    pub status_b: CompletionStatus,
    pub runtime_b: f64,
}

/// Numeric (CSV) output artifacts subject to threshold diffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathDiffKind {
    Primary,
    Meter,
    ZoneSizing,
    SystemSizing,
}

impl MathDiffKind {
    pub const ALL: [MathDiffKind; 4] = [
        MathDiffKind::Primary,
        MathDiffKind::Meter,
        MathDiffKind::ZoneSizing,
        MathDiffKind::SystemSizing,
    ];

    /// File name of this artifact inside a case's run directory.
    pub fn artifact(self) -> &'static str {
        match self {
            MathDiffKind::Primary => "simout.csv",
            MathDiffKind::Meter => "simmtr.csv",
            MathDiffKind::ZoneSizing => "simzsz.csv",
            MathDiffKind::SystemSizing => "simssz.csv",
        }
    }
}

/// Magnitude classification returned by the numeric/tabular diff engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffSeverity {
    None,
    Small,
    Big,
}

impl std::fmt::Display for DiffSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DiffSeverity::None => "none",
            DiffSeverity::Small => "small",
            DiffSeverity::Big => "big",
        })
    }
}

/// Textual output artifacts compared line-by-line after volatile-line
/// stripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDiffKind {
    Audit,
    Bounds,
    Geometry,
    EnvironmentIo,
    MeterDictionary,
    MeterDetails,
    ReportDictionary,
    Shading,
    ErrorLog,
    DaylightingIn,
    DaylightingOut,
}

impl TextDiffKind {
    pub const ALL: [TextDiffKind; 11] = [
        TextDiffKind::Audit,
        TextDiffKind::Bounds,
        TextDiffKind::Geometry,
        TextDiffKind::EnvironmentIo,
        TextDiffKind::MeterDictionary,
        TextDiffKind::MeterDetails,
        TextDiffKind::ReportDictionary,
        TextDiffKind::Shading,
        TextDiffKind::ErrorLog,
        TextDiffKind::DaylightingIn,
        TextDiffKind::DaylightingOut,
    ];

    pub fn artifact(self) -> &'static str {
        match self {
            TextDiffKind::Audit => "simout.audit",
            TextDiffKind::Bounds => "simout.bnd",
            TextDiffKind::Geometry => "simout.dxf",
            TextDiffKind::EnvironmentIo => "simout.eio",
            TextDiffKind::MeterDictionary => "simout.mdd",
            TextDiffKind::MeterDetails => "simout.mtd",
            TextDiffKind::ReportDictionary => "simout.rdd",
            TextDiffKind::Shading => "simout.shd",
            TextDiffKind::ErrorLog => "simout.err",
            TextDiffKind::DaylightingIn => "simout.dlin",
            TextDiffKind::DaylightingOut => "simout.dlout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextDiffOutcome {
    Equal,
    Differs,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MathDiffRecord {
    pub kind: MathDiffKind,
    pub severity: DiffSeverity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TableDiffRecord {
    pub severity: DiffSeverity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TextDiffRecord {
    pub kind: TextDiffKind,
    pub outcome: TextDiffOutcome,
}

/// One test case and everything learned about it during a suite run.
///
/// Created when the case list is assembled; the scheduler fills in the
/// completion summary and the diff dispatcher attaches diff records. The two
/// phases are strictly sequential, so the entry is never mutated
/// concurrently. Read-only once the run finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestEntry {
    pub basename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_override: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<EndSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disposition: Option<CaseDisposition>,
    pub math_diffs: Vec<MathDiffRecord>,
    pub table_diffs: Vec<TableDiffRecord>,
    pub text_diffs: Vec<TextDiffRecord>,
}

impl TestEntry {
    pub fn new(basename: impl Into<String>, weather_override: Option<String>) -> Self {
        Self {
            basename: basename.into(),
            weather_override,
            summary: None,
            disposition: None,
            math_diffs: Vec::new(),
            table_diffs: Vec::new(),
            text_diffs: Vec::new(),
        }
    }

    pub fn add_summary(&mut self, summary: EndSummary) {
        self.summary = Some(summary);
    }

    pub fn add_math_diff(&mut self, kind: MathDiffKind, severity: DiffSeverity) {
        self.math_diffs.push(MathDiffRecord { kind, severity });
    }

    pub fn add_table_diff(&mut self, severity: DiffSeverity) {
        self.table_diffs.push(TableDiffRecord { severity });
    }

    pub fn add_text_diff(&mut self, kind: TextDiffKind, outcome: TextDiffOutcome) {
        self.text_diffs.push(TextDiffRecord { kind, outcome });
    }

    /// Highest math severity reached by any per-file record.
    pub fn worst_math_severity(&self) -> DiffSeverity {
        self.math_diffs
            .iter()
            .map(|r| r.severity)
            .max()
            .unwrap_or(DiffSeverity::None)
    }

    pub fn worst_table_severity(&self) -> DiffSeverity {
        self.table_diffs
            .iter()
            .map(|r| r.severity)
            .max()
            .unwrap_or(DiffSeverity::None)
    }

    pub fn has_text_diffs(&self) -> bool {
        self.text_diffs
            .iter()
            .any(|r| r.outcome == TextDiffOutcome::Differs)
    }
}

/// Completion record handed back by the simulation executor for one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseCompleted {
    pub run_directory: PathBuf,
    pub case_name: String,
    pub success: bool,
    /// True when the executor already surfaced the failure itself, so the
    /// consumer should not report it a second time.
    pub already_reported: bool,
    pub worker: String,
}

impl CaseCompleted {
    /// Record for a case that never executed (missing input, staging failure,
    /// or a crashed worker task).
    pub fn failed(run_directory: PathBuf, case_name: impl Into<String>) -> Self {
        Self {
            run_directory,
            case_name: case_name.into(),
            success: false,
            already_reported: false,
            worker: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_severity_prefers_big_over_small() {
        let mut entry = TestEntry::new("Case1", None);
        entry.add_math_diff(MathDiffKind::Primary, DiffSeverity::Small);
        entry.add_math_diff(MathDiffKind::Meter, DiffSeverity::Big);
        entry.add_math_diff(MathDiffKind::ZoneSizing, DiffSeverity::None);
        assert_eq!(entry.worst_math_severity(), DiffSeverity::Big);
    }

    #[test]
    fn worst_severity_defaults_to_none() {
        let entry = TestEntry::new("Case1", None);
        assert_eq!(entry.worst_math_severity(), DiffSeverity::None);
        assert_eq!(entry.worst_table_severity(), DiffSeverity::None);
        assert!(!entry.has_text_diffs());
    }

    #[test]
    fn text_diffs_detected_only_when_some_record_differs() {
        let mut entry = TestEntry::new("Case1", None);
        entry.add_text_diff(TextDiffKind::Audit, TextDiffOutcome::Equal);
        assert!(!entry.has_text_diffs());
        entry.add_text_diff(TextDiffKind::ErrorLog, TextDiffOutcome::Differs);
        assert!(entry.has_text_diffs());
    }
}
