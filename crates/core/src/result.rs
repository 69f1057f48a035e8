//! Packing result representation.

use crate::geometry::{Rect, Sheet};
use crate::part::{Part, PartInstance};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Final position of one part instance on a sheet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Placement {
    pub instance_id: String,
    /// Originating part; grain lock, role and nominal dimensions travel with it.
    pub part: Arc<Part>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// True when the footprint is the part's 90 degree orientation.
    pub rotated: bool,
}

impl Placement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// A sheet together with the parts cut from it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PackedSheet {
    /// Stable identifier; the pipeline rewrites it to `"{group_key}::{index}"`.
    pub id: String,
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub kerf: f64,
    pub placements: Vec<Placement>,
    /// Residual free rectangles in packer coordinates (grown by half a kerf).
    pub free_rects: Vec<Rect>,
    pub used_area: f64,
}

impl PackedSheet {
    /// Creates an empty packed sheet.
    pub fn new(id: impl Into<String>, index: usize, sheet: &Sheet) -> Self {
        Self {
            id: id.into(),
            index,
            width: sheet.width,
            height: sheet.height,
            kerf: sheet.kerf,
            placements: Vec::new(),
            free_rects: Vec::new(),
            used_area: 0.0,
        }
    }

    pub fn sheet(&self) -> Sheet {
        Sheet::new(self.width, self.height, self.kerf)
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn waste_area(&self) -> f64 {
        (self.area() - self.used_area).max(0.0)
    }

    /// Used area as a percentage of the sheet.
    pub fn efficiency_pct(&self) -> f64 {
        if self.area() > 0.0 {
            self.used_area / self.area() * 100.0
        } else {
            0.0
        }
    }

    /// Residual free rectangles clipped to the sheet, largest first.
    pub fn offcuts(&self) -> Vec<Rect> {
        let bounds = Rect::new(0.0, 0.0, self.width, self.height);
        let mut offcuts: Vec<Rect> = self
            .free_rects
            .iter()
            .filter_map(|r| r.intersection(&bounds))
            .collect();
        offcuts.sort_by(|a, b| b.area().total_cmp(&a.area()));
        offcuts
    }

    /// Recomputes `used_area` from the placements.
    pub fn recompute_used_area(&mut self) {
        self.used_area = self.placements.iter().map(Placement::area).sum();
    }
}

/// Aggregate accounting over a set of sheets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Totals {
    pub sheet_count: usize,
    pub used_area: f64,
    pub waste_area: f64,
    pub efficiency_pct: f64,
}

impl Totals {
    pub fn from_sheets(sheets: &[PackedSheet]) -> Self {
        let used_area: f64 = sheets.iter().map(|s| s.used_area).sum();
        let total_area: f64 = sheets.iter().map(PackedSheet::area).sum();
        let efficiency_pct = if total_area > 0.0 {
            (used_area / total_area * 100.0).min(100.0)
        } else {
            0.0
        };
        Self {
            sheet_count: sheets.len(),
            used_area,
            waste_area: (total_area - used_area).max(0.0),
            efficiency_pct,
        }
    }
}

/// Result of one packer run over a single material.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RunResult {
    pub sheets: Vec<PackedSheet>,
    /// Instances that could not be placed. Never silently dropped.
    pub unplaced: Vec<PartInstance>,
    pub totals: Totals,
    /// Search iterations performed.
    pub iterations: u64,
    pub elapsed_ms: u64,
    /// Cost of the returned layout (lower is better).
    pub best_cost: f64,
    /// PRNG seed actually used, so an unseeded run can be replayed.
    pub seed: Option<u32>,
    pub strategy: Option<String>,
    /// Whether the search stopped on a cancel request.
    pub cancelled: bool,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placed_count(&self) -> usize {
        self.sheets.iter().map(|s| s.placements.len()).sum()
    }

    pub fn unplaced_count(&self) -> usize {
        self.unplaced.len()
    }

    pub fn all_placed(&self) -> bool {
        self.unplaced.is_empty()
    }

    pub fn unplaced_area(&self) -> f64 {
        self.unplaced.iter().map(PartInstance::area).sum()
    }

    /// Iterates all placements together with their sheet.
    pub fn placements(&self) -> impl Iterator<Item = (&PackedSheet, &Placement)> {
        self.sheets
            .iter()
            .flat_map(|s| s.placements.iter().map(move |p| (s, p)))
    }

    pub fn recompute_totals(&mut self) {
        self.totals = Totals::from_sheets(&self.sheets);
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from(self)
    }
}

/// Compact run statistics for logging and reporting.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RunSummary {
    pub total_requested: usize,
    pub total_placed: usize,
    pub sheets: usize,
    pub efficiency_pct: f64,
    pub iterations: u64,
    pub time_ms: u64,
    pub strategy: String,
    pub seed: Option<u32>,
}

impl From<&RunResult> for RunSummary {
    fn from(result: &RunResult) -> Self {
        Self {
            total_requested: result.placed_count() + result.unplaced_count(),
            total_placed: result.placed_count(),
            sheets: result.totals.sheet_count,
            efficiency_pct: result.totals.efficiency_pct,
            iterations: result.iterations,
            time_ms: result.elapsed_ms,
            strategy: result
                .strategy
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            seed: result.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn placement(id: &str, x: f64, y: f64, w: f64, h: f64) -> Placement {
        Placement {
            instance_id: format!("{id}#0"),
            part: Arc::new(Part::new(id, w, h)),
            x,
            y,
            width: w,
            height: h,
            rotated: false,
        }
    }

    #[test]
    fn test_result_new() {
        let result = RunResult::new();
        assert!(result.sheets.is_empty());
        assert!(result.all_placed());
        assert_eq!(result.totals.efficiency_pct, 0.0);
    }

    #[test]
    fn test_totals_from_sheets() {
        let sheet = Sheet::new(100.0, 100.0, 0.0);
        let mut a = PackedSheet::new("s0", 0, &sheet);
        a.placements.push(placement("A", 0.0, 0.0, 50.0, 100.0));
        a.recompute_used_area();
        let mut b = PackedSheet::new("s1", 1, &sheet);
        b.placements.push(placement("B", 0.0, 0.0, 100.0, 25.0));
        b.recompute_used_area();

        let totals = Totals::from_sheets(&[a, b]);
        assert_eq!(totals.sheet_count, 2);
        assert_relative_eq!(totals.used_area, 7500.0);
        assert_relative_eq!(totals.waste_area, 12500.0);
        assert_relative_eq!(totals.efficiency_pct, 37.5);
    }

    #[test]
    fn test_offcuts_are_clipped_and_sorted() {
        let sheet = Sheet::new(100.0, 100.0, 4.0);
        let mut packed = PackedSheet::new("s0", 0, &sheet);
        packed.free_rects = vec![
            Rect::new(-2.0, 50.0, 30.0, 52.0),
            Rect::new(40.0, -2.0, 62.0, 104.0),
        ];
        let offcuts = packed.offcuts();
        assert_eq!(offcuts.len(), 2);
        assert_relative_eq!(offcuts[0].x, 40.0);
        assert_relative_eq!(offcuts[0].width, 60.0);
        assert_relative_eq!(offcuts[0].height, 100.0);
        assert_relative_eq!(offcuts[1].x, 0.0);
        assert_relative_eq!(offcuts[1].height, 50.0);
    }

    #[test]
    fn test_summary() {
        let sheet = Sheet::new(100.0, 100.0, 0.0);
        let mut packed = PackedSheet::new("s0", 0, &sheet);
        packed.placements.push(placement("A", 0.0, 0.0, 100.0, 75.0));
        packed.recompute_used_area();

        let mut result = RunResult::new().with_strategy("BAF");
        result.sheets.push(packed);
        result.unplaced.push(PartInstance::new(Arc::new(Part::new("Z", 500.0, 500.0)), 0));
        result.recompute_totals();

        let summary = result.summary();
        assert_eq!(summary.total_requested, 2);
        assert_eq!(summary.total_placed, 1);
        assert_eq!(summary.sheets, 1);
        assert_relative_eq!(summary.efficiency_pct, 75.0);
        assert_eq!(summary.strategy, "BAF");
        assert_relative_eq!(result.unplaced_area(), 250_000.0);
    }
}
