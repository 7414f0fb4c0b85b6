//! Formatted terminal output.
//!
//! We keep formatting code in one place so the matching code stays free of
//! presentation concerns.

use crate::domain::{DeviationBound, FitMapping, SeriesTable};
use crate::fit::AssignmentSummary;

/// Sizes of the three input tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetShape {
    pub rows: usize,
    pub series: usize,
}

impl DatasetShape {
    pub fn of(table: &SeriesTable) -> Self {
        Self {
            rows: table.len(),
            series: table.series().len(),
        }
    }
}

/// Format the mapping table printed by `ideal match` (and as part of a run).
pub fn format_mapping(mapping: &FitMapping, bounds: Option<&[DeviationBound]>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<12} {:<12} {:>16} {:>14}\n", "training", "ideal", "sse", "max_dev"));
    out.push_str(&format!("{:-<12} {:-<12} {:->16} {:->14}\n", "", "", "", ""));

    for m in mapping.entries() {
        let max_dev = bounds
            .and_then(|b| b.iter().find(|b| b.training == m.training))
            .map(|b| format!("{:.6}", b.max_deviation))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(
            format!(
                "{:<12} {:<12} {:>16.6} {:>14}",
                truncate(&m.training, 12),
                truncate(&m.ideal, 12),
                m.sse,
                max_dev
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Format the full run summary (inputs + mapping + assignment counts).
pub fn format_run_summary(
    training: DatasetShape,
    ideal: DatasetShape,
    test: DatasetShape,
    mapping: &FitMapping,
    bounds: &[DeviationBound],
    summary: &AssignmentSummary,
) -> String {
    let mut out = String::new();

    out.push_str("=== ideal - least-squares function matching ===\n");
    out.push_str(&format!(
        "Training: {} rows x {} series | Ideal: {} rows x {} series | Test: {} points\n",
        training.rows, training.series, ideal.rows, ideal.series, test.rows
    ));

    out.push_str("\nBest fits:\n");
    out.push_str(&format_mapping(mapping, Some(bounds)));

    out.push_str("\nTest assignment:\n");
    out.push_str(&format!(
        "- assigned: {} of {} ({} outside tolerance, {} with no reference x)\n",
        summary.assigned, summary.total, summary.out_of_tolerance, summary.no_reference
    ));
    for (ideal, count) in &summary.per_ideal {
        out.push_str(&format!("  {ideal:<12} {count}\n"));
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FitMatch;

    fn mapping() -> FitMapping {
        FitMapping::new(vec![
            FitMatch {
                training: "y1".to_string(),
                ideal: "y42".to_string(),
                sse: 1.5,
            },
            FitMatch {
                training: "y2".to_string(),
                ideal: "y7".to_string(),
                sse: 0.25,
            },
        ])
    }

    #[test]
    fn mapping_table_lists_each_training_series() {
        let bounds = vec![DeviationBound {
            training: "y1".to_string(),
            ideal: "y42".to_string(),
            max_deviation: 0.5,
        }];
        let text = format_mapping(&mapping(), Some(&bounds));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("y1"));
        assert!(lines[2].contains("y42"));
        assert!(lines[2].ends_with("0.500000"));
        assert!(lines[3].ends_with('-'));
    }

    #[test]
    fn run_summary_reports_counts() {
        let summary = AssignmentSummary {
            total: 100,
            assigned: 60,
            no_reference: 10,
            out_of_tolerance: 30,
            per_ideal: [("y42".to_string(), 60)].into_iter().collect(),
        };
        let shape = DatasetShape { rows: 400, series: 4 };
        let text = format_run_summary(
            shape,
            DatasetShape { rows: 400, series: 50 },
            DatasetShape { rows: 100, series: 1 },
            &mapping(),
            &[],
            &summary,
        );

        assert!(text.contains("Training: 400 rows x 4 series"));
        assert!(text.contains("- assigned: 60 of 100 (30 outside tolerance, 10 with no reference x)"));
        assert!(text.contains("y42          60"));
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
