//! Line-oriented comparison for textual output artifacts.
//!
//! Lines matching a fixed set of volatile substrings (version banners,
//! completion stamps, transient path echoes) are stripped before comparison
//! so that cosmetic churn never reads as a regression.

use std::path::Path;

use anyhow::Context;
use similar::TextDiff;

use crate::model::TextDiffOutcome;

/// Substrings marking a line as volatile between otherwise-identical runs.
pub const VOLATILE_MARKERS: &[&str] = &[
    "Program Version,",
    "Simulation Completed",
    "Simulation Terminated",
    "Daylighting input generated",
    "(idf)=",
    "(user input)=",
    "(input file)=",
];

fn cleaned(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if VOLATILE_MARKERS.iter().any(|m| line.contains(m)) {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Compare two text artifacts after volatile-line stripping. Equal contents
/// return [`TextDiffOutcome::Equal`]; otherwise a unified diff is written to
/// `diff_out` and [`TextDiffOutcome::Differs`] is returned.
pub fn diff_text_files(
    file_a: &Path,
    file_b: &Path,
    diff_out: &Path,
) -> anyhow::Result<TextDiffOutcome> {
    let raw_a = std::fs::read_to_string(file_a)
        .with_context(|| format!("failed to read {}", file_a.display()))?;
    let raw_b = std::fs::read_to_string(file_b)
        .with_context(|| format!("failed to read {}", file_b.display()))?;

    let text_a = cleaned(&raw_a);
    let text_b = cleaned(&raw_b);
    if text_a == text_b {
        return Ok(TextDiffOutcome::Equal);
    }

    let diff = TextDiff::from_lines(&text_a, &text_b);
    let rendered = diff
        .unified_diff()
        .context_radius(3)
        .header(&file_a.display().to_string(), &file_b.display().to_string())
        .to_string();
    std::fs::write(diff_out, rendered)
        .with_context(|| format!("failed to write {}", diff_out.display()))?;

    Ok(TextDiffOutcome::Differs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn identical_files_are_equal() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.audit", "line one\nline two\n");
        let b = write(dir.path(), "b.audit", "line one\nline two\n");
        let out = dir.path().join("a.audit.diff");
        assert_eq!(diff_text_files(&a, &b, &out).unwrap(), TextDiffOutcome::Equal);
        assert!(!out.exists());
    }

    #[test]
    fn volatile_lines_do_not_count_as_differences() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(
            dir.path(),
            "a.err",
            "Program Version,Engine 9.1\nwarmup converged\nSimulation Completed in run A\n",
        );
        let b = write(
            dir.path(),
            "b.err",
            "Program Version,Engine 9.2\nwarmup converged\nSimulation Completed in run B\n",
        );
        let out = dir.path().join("a.err.diff");
        assert_eq!(diff_text_files(&a, &b, &out).unwrap(), TextDiffOutcome::Equal);
    }

    #[test]
    fn real_differences_write_a_unified_diff() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.eio", "zone count, 4\n");
        let b = write(dir.path(), "b.eio", "zone count, 5\n");
        let out = dir.path().join("a.eio.diff");
        assert_eq!(
            diff_text_files(&a, &b, &out).unwrap(),
            TextDiffOutcome::Differs
        );
        let rendered = std::fs::read_to_string(&out).unwrap();
        assert!(rendered.contains("-zone count, 4"));
        assert!(rendered.contains("+zone count, 5"));
    }
}
