//! Outcome decision matrix: given both builds' completion statuses for a
//! case, decide whether diffing proceeds, and how a skip is reported.

use serde::{Deserialize, Serialize};

use crate::model::CompletionStatus;

/// Cases that are deliberate negative tests: a fatal error in **both** builds
/// counts as a passing regression, with diffing skipped.
pub const EXPECTED_FATAL_CASES: &[&str] = &["ScriptedKillTest"];

/// Per-case verdict from the decision matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseDisposition {
    /// Both builds succeeded; run diffs.
    Proceed,
    /// Expected-fatal case fataled in both builds: record a synthetic
    /// success/success summary and skip diffing.
    ForcedSuccess,
    SkipBothFatal,
    SkipOneFatal,
    SkipBothMissing,
    SkipOneMissing,
    SkipUnknown,
}

impl CaseDisposition {
    /// Human-readable skip reason, `None` for `Proceed`/`ForcedSuccess`.
    pub fn skip_reason(self) -> Option<&'static str> {
        match self {
            CaseDisposition::Proceed | CaseDisposition::ForcedSuccess => None,
            CaseDisposition::SkipBothFatal => {
                Some("it has a fatal error in both base and mod cases")
            }
            CaseDisposition::SkipOneFatal => Some("it appears to have a fatal error in one case"),
            CaseDisposition::SkipBothMissing => {
                Some("it failed (crashed) in both base and mod cases")
            }
            CaseDisposition::SkipOneMissing => {
                Some("it appears to have failed (crashed) in one case")
            }
            CaseDisposition::SkipUnknown => Some("it has an unknown end status"),
        }
    }
}

/// Decide a case's disposition. The expected-fatal exception list is checked
/// before the general matrix and only applies when **both** builds fataled.
pub fn decide(basename: &str, a: CompletionStatus, b: CompletionStatus) -> CaseDisposition {
    use CompletionStatus::{Fatal, Missing, Success};

    if a == Fatal && b == Fatal && EXPECTED_FATAL_CASES.contains(&basename) {
        return CaseDisposition::ForcedSuccess;
    }

    match (a, b) {
        (Success, Success) => CaseDisposition::Proceed,
        (Fatal, Fatal) => CaseDisposition::SkipBothFatal,
        (Success, Fatal) | (Fatal, Success) => CaseDisposition::SkipOneFatal,
        (Missing, Missing) => CaseDisposition::SkipBothMissing,
        (Missing, _) | (_, Missing) => CaseDisposition::SkipOneMissing,
        _ => CaseDisposition::SkipUnknown,
    }
}
