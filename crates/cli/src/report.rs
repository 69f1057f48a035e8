//! Human-readable run summaries.

use panelcut_cabinet::BrandResult;
use panelcut_core::RunResult;
use std::fmt::Write;

/// One-line summary of a single packer run.
pub fn run_report(result: &RunResult) -> String {
    let s = result.summary();
    let seed = s
        .seed
        .map(|seed| seed.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}/{} placed on {} sheet(s), {:.1}% efficiency, {} iterations, {} ms ({}, seed {})",
        s.total_placed, s.total_requested, s.sheets, s.efficiency_pct, s.iterations, s.time_ms, s.strategy, seed
    )
}

/// Table of material groups followed by offcut counts per sheet.
pub fn group_report(results: &[BrandResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<40} {:>6} {:>8} {:>8} {:>9}",
        "Group", "Sheets", "Placed", "Unplaced", "Eff %"
    );
    let _ = writeln!(out, "{:-<75}", "");
    for group in results {
        let r = &group.result;
        let _ = writeln!(
            out,
            "{:<40} {:>6} {:>8} {:>8} {:>9.1}",
            group.key,
            r.totals.sheet_count,
            r.placed_count(),
            r.unplaced_count(),
            r.totals.efficiency_pct
        );
        for sheet in &r.sheets {
            let _ = writeln!(
                out,
                "  {:<38} {:>3} part(s), {:.1}% used, {} offcut(s)",
                sheet.id,
                sheet.placements.len(),
                sheet.efficiency_pct(),
                sheet.offcuts().len()
            );
        }
        for missing in &r.unplaced {
            let _ = writeln!(
                out,
                "  unplaced {} ({}x{})",
                missing.id, missing.part.width, missing.part.height
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelcut_core::{PackedSheet, Sheet};

    #[test]
    fn test_run_report() {
        let mut result = RunResult::new().with_strategy("BSSF");
        result.seed = Some(12);
        result.iterations = 40;
        let line = run_report(&result);
        assert!(line.starts_with("0/0 placed on 0 sheet(s)"));
        assert!(line.ends_with("(BSSF, seed 12)"));
    }

    #[test]
    fn test_group_report_lists_sheets() {
        let mut result = RunResult::new();
        result
            .sheets
            .push(PackedSheet::new("oak|||w1::0", 0, &Sheet::standard()));
        result.recompute_totals();
        let report = group_report(&[BrandResult {
            key: "oak|||w1".into(),
            brand: "oak".into(),
            laminate: "w1".into(),
            result,
        }]);
        assert!(report.contains("oak|||w1::0"));
        assert_eq!(report.lines().count(), 4);
    }
}
