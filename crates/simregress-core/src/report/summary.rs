//! [`SuiteResult`]: the final categorized outcome of one suite run, plus its
//! two persisted serializations (runtime CSV and full JSON document).

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::decision::CaseDisposition;
use crate::model::{DiffSeverity, TestEntry, TextDiffOutcome};

/// One named result bucket: parallel vectors of human-readable per-case
/// descriptions and bare case identifiers (for downstream copy/export).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultBucket {
    pub descriptions: Vec<String>,
    pub cases: Vec<String>,
}

impl ResultBucket {
    pub fn add(&mut self, case: &str, description: impl Into<String>) {
        self.descriptions.push(description.into());
        self.cases.push(case.to_string());
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn contains(&self, case: &str) -> bool {
        self.cases.iter().any(|c| c == case)
    }
}

/// Categorized outcome of one full suite run. Built once after the diff
/// phase; read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub build_a_dir: PathBuf,
    pub build_b_dir: PathBuf,
    /// Build A's per-run output root; both summary files land here.
    pub output_root: PathBuf,

    pub all_cases: ResultBucket,
    pub success_a: ResultBucket,
    pub failure_a: ResultBucket,
    pub success_b: ResultBucket,
    pub failure_b: ResultBucket,
    /// Cases that reached the diff stage (both builds succeeded).
    pub diffed: ResultBucket,
    pub big_math_diffs: ResultBucket,
    pub small_math_diffs: ResultBucket,
    pub big_table_diffs: ResultBucket,
    pub small_table_diffs: ResultBucket,
    pub text_diffs: ResultBucket,

    /// Full per-case detail; the bucket views above are summaries over this.
    pub entries: Vec<TestEntry>,
}

fn describe_math(entry: &TestEntry) -> String {
    let parts: Vec<String> = entry
        .math_diffs
        .iter()
        .filter(|r| r.severity != DiffSeverity::None)
        .map(|r| format!("{}: {}", r.kind.artifact(), r.severity))
        .collect();
    format!("{} [{}]", entry.basename, parts.join(", "))
}

fn describe_table(entry: &TestEntry) -> String {
    format!(
        "{} [table: {}]",
        entry.basename,
        entry.worst_table_severity()
    )
}

fn describe_text(entry: &TestEntry) -> String {
    let parts: Vec<&str> = entry
        .text_diffs
        .iter()
        .filter(|r| r.outcome == TextDiffOutcome::Differs)
        .map(|r| r.kind.artifact())
        .collect();
    format!("{} [{}]", entry.basename, parts.join(", "))
}

/// Reduce the full work-item collection into bucket membership. Entry order
/// is preserved as given; membership is independent of completion order.
pub fn aggregate(
    entries: Vec<TestEntry>,
    build_a_dir: PathBuf,
    build_b_dir: PathBuf,
    output_root: PathBuf,
) -> SuiteResult {
    let mut result = SuiteResult {
        build_a_dir,
        build_b_dir,
        output_root,
        all_cases: ResultBucket::default(),
        success_a: ResultBucket::default(),
        failure_a: ResultBucket::default(),
        success_b: ResultBucket::default(),
        failure_b: ResultBucket::default(),
        diffed: ResultBucket::default(),
        big_math_diffs: ResultBucket::default(),
        small_math_diffs: ResultBucket::default(),
        big_table_diffs: ResultBucket::default(),
        small_table_diffs: ResultBucket::default(),
        text_diffs: ResultBucket::default(),
        entries: Vec::new(),
    };

    for entry in &entries {
        let name = &entry.basename;
        result.all_cases.add(name, name.clone());

        match entry.summary {
            Some(summary) => {
                if summary.status_a.is_success() {
                    result
                        .success_a
                        .add(name, format!("{name} [{:.2} s]", summary.runtime_a));
                } else {
                    result
                        .failure_a
                        .add(name, format!("{name} [{:?}]", summary.status_a));
                }
                if summary.status_b.is_success() {
                    result
                        .success_b
                        .add(name, format!("{name} [{:.2} s]", summary.runtime_b));
                } else {
                    result
                        .failure_b
                        .add(name, format!("{name} [{:?}]", summary.status_b));
                }
            }
            None => {
                result.failure_a.add(name, format!("{name} [no result]"));
                result.failure_b.add(name, format!("{name} [no result]"));
            }
        }

        if entry.disposition == Some(CaseDisposition::Proceed) {
            result.diffed.add(name, name.clone());
        }

        // An entry lands in at most the highest severity bucket it reaches;
        // the per-file records in `entries` keep the individual severities.
        match entry.worst_math_severity() {
            DiffSeverity::Big => result.big_math_diffs.add(name, describe_math(entry)),
            DiffSeverity::Small => result.small_math_diffs.add(name, describe_math(entry)),
            DiffSeverity::None => {}
        }
        match entry.worst_table_severity() {
            DiffSeverity::Big => result.big_table_diffs.add(name, describe_table(entry)),
            DiffSeverity::Small => result.small_table_diffs.add(name, describe_table(entry)),
            DiffSeverity::None => {}
        }
        if entry.has_text_diffs() {
            result.text_diffs.add(name, describe_text(entry));
        }
    }

    result.entries = entries;
    result
}

impl SuiteResult {
    /// Tabular per-case runtime summary: case identifier plus both builds'
    /// runtimes in seconds.
    pub fn write_runtime_summary(&self, path: &Path) -> anyhow::Result<()> {
        let mut out = String::from("Case,Runtime A (s),Runtime B (s)\n");
        for entry in &self.entries {
            let (runtime_a, runtime_b) = entry
                .summary
                .map(|s| (s.runtime_a, s.runtime_b))
                .unwrap_or((0.0, 0.0));
            out.push_str(&format!(
                "{},{runtime_a:.2},{runtime_b:.2}\n",
                entry.basename
            ));
        }
        std::fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Full structured summary document: every bucket plus per-case detail.
    pub fn write_json_summary(&self, path: &Path) -> anyhow::Result<()> {
        let rendered = serde_json::to_string_pretty(self).context("failed to serialize results")?;
        std::fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}
