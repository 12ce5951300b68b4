//! Built-in diff engines: a cell-wise CSV comparator and a tag-stripping
//! tabular comparator. Both honor the shared [`ThresholdConfig`] and write
//! the three standard diff artifacts.

use std::path::Path;

use anyhow::Context;

use super::thresholds::ThresholdConfig;
use super::{NumericDiff, TabularDiff};
use crate::model::DiffSeverity;

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write(path: &Path, contents: &str) -> anyhow::Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Cell-wise comparator for the simulator's CSV outputs.
pub struct CsvNumericDiff;

impl CsvNumericDiff {
    fn parse_rows(text: &str) -> Vec<Vec<&str>> {
        text.lines()
            .map(|line| line.split(',').map(str::trim).collect())
            .collect()
    }
}

impl NumericDiff for CsvNumericDiff {
    fn diff(
        &self,
        thresholds: &ThresholdConfig,
        file_a: &Path,
        file_b: &Path,
        abs_out: &Path,
        perc_out: &Path,
        summary_out: &Path,
    ) -> anyhow::Result<DiffSeverity> {
        let text_a = read(file_a)?;
        let text_b = read(file_b)?;
        let rows_a = Self::parse_rows(&text_a);
        let rows_b = Self::parse_rows(&text_b);

        let mut worst = DiffSeverity::None;
        let mut small_cells = 0usize;
        let mut big_cells = 0usize;
        let mut abs_lines = Vec::new();
        let mut perc_lines = Vec::new();

        let row_count = rows_a.len().max(rows_b.len());
        for i in 0..row_count {
            let (row_a, row_b) = match (rows_a.get(i), rows_b.get(i)) {
                (Some(a), Some(b)) => (a, b),
                // Row present on one side only: structural change.
                _ => {
                    worst = DiffSeverity::Big;
                    big_cells += 1;
                    abs_lines.push("<row missing in one output>".to_string());
                    perc_lines.push("<row missing in one output>".to_string());
                    continue;
                }
            };

            let mut abs_cells = Vec::with_capacity(row_a.len());
            let mut perc_cells = Vec::with_capacity(row_a.len());
            let width = row_a.len().max(row_b.len());
            for j in 0..width {
                match (row_a.get(j), row_b.get(j)) {
                    (Some(cell_a), Some(cell_b)) => {
                        if let (Ok(va), Ok(vb)) =
                            (cell_a.parse::<f64>(), cell_b.parse::<f64>())
                        {
                            let severity = thresholds.classify(va, vb);
                            worst = worst.max(severity);
                            match severity {
                                DiffSeverity::Small => small_cells += 1,
                                DiffSeverity::Big => big_cells += 1,
                                DiffSeverity::None => {}
                            }
                            let abs = (va - vb).abs();
                            abs_cells.push(format!("{abs:.6}"));
                            let denom = va.abs().max(vb.abs());
                            if denom > 0.0 {
                                perc_cells.push(format!("{:.4}", 100.0 * abs / denom));
                            } else {
                                perc_cells.push("0".to_string());
                            }
                        } else if cell_a == cell_b {
                            abs_cells.push((*cell_a).to_string());
                            perc_cells.push((*cell_a).to_string());
                        } else {
                            // Differing labels (renamed column or variable).
                            worst = DiffSeverity::Big;
                            big_cells += 1;
                            abs_cells.push(format!("{cell_a} -> {cell_b}"));
                            perc_cells.push(format!("{cell_a} -> {cell_b}"));
                        }
                    }
                    _ => {
                        worst = DiffSeverity::Big;
                        big_cells += 1;
                        abs_cells.push("<missing>".to_string());
                        perc_cells.push("<missing>".to_string());
                    }
                }
            }
            abs_lines.push(abs_cells.join(","));
            perc_lines.push(perc_cells.join(","));
        }

        write(abs_out, &(abs_lines.join("\n") + "\n"))?;
        write(perc_out, &(perc_lines.join("\n") + "\n"))?;
        write(
            summary_out,
            &format!(
                "big cell diffs,small cell diffs,worst\n{big_cells},{small_cells},{worst}\n"
            ),
        )?;

        Ok(worst)
    }
}

/// Comparator for the simulator's tabular HTML report. Markup is stripped
/// and the remaining cell texts are compared pairwise.
pub struct HtmlTabularDiff;

impl HtmlTabularDiff {
    fn extract_cells(html: &str) -> Vec<String> {
        let mut cells = Vec::new();
        let mut rest = html;
        while let Some(start) = rest.find('>') {
            rest = &rest[start + 1..];
            let end = rest.find('<').unwrap_or(rest.len());
            let cell = rest[..end].trim();
            if !cell.is_empty() {
                cells.push(cell.to_string());
            }
            if end == rest.len() {
                break;
            }
            rest = &rest[end..];
        }
        cells
    }
}

impl TabularDiff for HtmlTabularDiff {
    fn diff(
        &self,
        thresholds: &ThresholdConfig,
        file_a: &Path,
        file_b: &Path,
        abs_out: &Path,
        perc_out: &Path,
        summary_out: &Path,
    ) -> anyhow::Result<DiffSeverity> {
        let cells_a = Self::extract_cells(&read(file_a)?);
        let cells_b = Self::extract_cells(&read(file_b)?);

        let mut worst = DiffSeverity::None;
        let mut small_cells = 0usize;
        let mut big_cells = 0usize;
        let mut abs_rows = Vec::new();
        let mut perc_rows = Vec::new();

        if cells_a.len() != cells_b.len() {
            worst = DiffSeverity::Big;
            big_cells += 1;
            abs_rows.push(format!(
                "<tr><td>cell count</td><td>{}</td><td>{}</td></tr>",
                cells_a.len(),
                cells_b.len()
            ));
        }

        for (cell_a, cell_b) in cells_a.iter().zip(cells_b.iter()) {
            if let (Ok(va), Ok(vb)) = (cell_a.parse::<f64>(), cell_b.parse::<f64>()) {
                let severity = thresholds.classify(va, vb);
                worst = worst.max(severity);
                match severity {
                    DiffSeverity::Small => small_cells += 1,
                    DiffSeverity::Big => big_cells += 1,
                    DiffSeverity::None => continue,
                }
                let abs = (va - vb).abs();
                abs_rows.push(format!(
                    "<tr><td>{cell_a}</td><td>{cell_b}</td><td>{abs:.6}</td></tr>"
                ));
                let denom = va.abs().max(vb.abs());
                perc_rows.push(format!(
                    "<tr><td>{cell_a}</td><td>{cell_b}</td><td>{:.4}</td></tr>",
                    100.0 * abs / denom
                ));
            } else if cell_a != cell_b {
                worst = DiffSeverity::Big;
                big_cells += 1;
                abs_rows.push(format!("<tr><td>{cell_a}</td><td>{cell_b}</td></tr>"));
            }
        }

        write(
            abs_out,
            &format!("<html><body><table>\n{}\n</table></body></html>\n", abs_rows.join("\n")),
        )?;
        write(
            perc_out,
            &format!("<html><body><table>\n{}\n</table></body></html>\n", perc_rows.join("\n")),
        )?;
        write(
            summary_out,
            &format!(
                "<html><body><p>big: {big_cells} small: {small_cells} worst: {worst}</p></body></html>\n"
            ),
        )?;

        Ok(worst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(dir: &Path, base: &str) -> (std::path::PathBuf, std::path::PathBuf, std::path::PathBuf) {
        (
            dir.join(format!("{base}.absdiff.csv")),
            dir.join(format!("{base}.percdiff.csv")),
            dir.join(format!("{base}.diffsummary.csv")),
        )
    }

    #[test]
    fn identical_csv_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "Date,Zone Temp\n01/01,21.5\n").unwrap();
        std::fs::write(&b, "Date,Zone Temp\n01/01,21.5\n").unwrap();
        let (abs, perc, summary) = paths(dir.path(), "a.csv");
        let severity = CsvNumericDiff
            .diff(&ThresholdConfig::default(), &a, &b, &abs, &perc, &summary)
            .unwrap();
        assert_eq!(severity, DiffSeverity::None);
        assert!(abs.exists() && perc.exists() && summary.exists());
    }

    #[test]
    fn perturbed_csv_classifies_by_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "Date,Load\n01/01,100.0\n").unwrap();
        // 1% off: small under the default thresholds.
        std::fs::write(&b, "Date,Load\n01/01,101.0\n").unwrap();
        let (abs, perc, summary) = paths(dir.path(), "a.csv");
        let severity = CsvNumericDiff
            .diff(&ThresholdConfig::default(), &a, &b, &abs, &perc, &summary)
            .unwrap();
        assert_eq!(severity, DiffSeverity::Small);

        // 50% off: big.
        std::fs::write(&b, "Date,Load\n01/01,150.0\n").unwrap();
        let severity = CsvNumericDiff
            .diff(&ThresholdConfig::default(), &a, &b, &abs, &perc, &summary)
            .unwrap();
        assert_eq!(severity, DiffSeverity::Big);
    }

    #[test]
    fn structural_csv_changes_are_big() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "Date,Load\n01/01,100.0\n").unwrap();
        std::fs::write(&b, "Date,Load\n01/01,100.0\n01/02,100.0\n").unwrap();
        let (abs, perc, summary) = paths(dir.path(), "a.csv");
        let severity = CsvNumericDiff
            .diff(&ThresholdConfig::default(), &a, &b, &abs, &perc, &summary)
            .unwrap();
        assert_eq!(severity, DiffSeverity::Big);
    }

    #[test]
    fn html_cells_compare_numerically() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.htm");
        let b = dir.path().join("b.htm");
        std::fs::write(&a, "<table><tr><td>Total</td><td>100.0</td></tr></table>").unwrap();
        std::fs::write(&b, "<table><tr><td>Total</td><td>101.0</td></tr></table>").unwrap();
        let severity = HtmlTabularDiff
            .diff(
                &ThresholdConfig::default(),
                &a,
                &b,
                &dir.path().join("a.htm.absdiff.htm"),
                &dir.path().join("a.htm.percdiff.htm"),
                &dir.path().join("a.htm.summarydiff.htm"),
            )
            .unwrap();
        assert_eq!(severity, DiffSeverity::Small);
    }

    #[test]
    fn html_label_changes_are_big() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.htm");
        let b = dir.path().join("b.htm");
        std::fs::write(&a, "<table><tr><td>North Zone</td></tr></table>").unwrap();
        std::fs::write(&b, "<table><tr><td>South Zone</td></tr></table>").unwrap();
        let severity = HtmlTabularDiff
            .diff(
                &ThresholdConfig::default(),
                &a,
                &b,
                &dir.path().join("a.htm.absdiff.htm"),
                &dir.path().join("a.htm.percdiff.htm"),
                &dir.path().join("a.htm.summarydiff.htm"),
            )
            .unwrap();
        assert_eq!(severity, DiffSeverity::Big);
    }
}
