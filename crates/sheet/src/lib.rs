//! # panelcut sheet
//!
//! Rectangle packing onto stock sheets for the panelcut optimizer.
//!
//! ## Features
//!
//! - MaxRects-style free-rectangle packer with BAF, BSSF and BLSF scoring
//! - Saw kerf between neighbouring parts, none lost at the sheet edge
//! - Per-part rotation lock (wood grain)
//! - Randomized local search over the placement order under a time budget
//! - Mandatory validation of bounds, overlap and grain on every result
//!
//! ## Quick Start
//!
//! ```rust
//! use panelcut_sheet::{Config, Part, Sheet, SheetNester, Solver, Strategy};
//!
//! let parts = vec![
//!     Part::new("SIDE", 560.0, 720.0).with_quantity(2).with_rotation(false),
//!     Part::new("SHELF", 560.0, 864.0).with_quantity(3),
//! ];
//!
//! let config = Config::new()
//!     .with_strategy(Strategy::BestShortSideFit)
//!     .with_seed(42)
//!     .with_max_iterations(50);
//!
//! let nester = SheetNester::new(config);
//! let result = nester.solve(&parts, &Sheet::standard()).unwrap();
//!
//! println!(
//!     "Placed {} parts on {} sheet(s), efficiency {:.1}%",
//!     result.placed_count(),
//!     result.totals.sheet_count,
//!     result.totals.efficiency_pct
//! );
//! ```

pub mod free_rect;
pub mod local_search;
pub mod nester;
pub mod packer;
pub mod validate;

pub use free_rect::{FitScore, FreeRectArena, SlotFit};
pub use local_search::PackingProblem;
pub use nester::SheetNester;
pub use packer::{PackOutcome, SheetPacker};
pub use validate::{validate_result, validate_sheet};

// Re-export core types
pub use panelcut_core::{
    expand_instances, Config, Error, PackedSheet, PanelRole, Part, PartInstance, Placement,
    ProgressCallback, ProgressInfo, Rect, Result, RunResult, RunSummary, Sheet, Solver, Strategy,
    Totals,
};

/// Packs `parts` onto copies of `sheet` within `time_limit_ms`.
///
/// Without a seed a fresh one is drawn and reported in [`RunResult::seed`].
pub fn pack(
    parts: &[Part],
    sheet: &Sheet,
    time_limit_ms: u64,
    strategy: Strategy,
    seed: Option<u32>,
) -> Result<RunResult> {
    let mut config = Config::new()
        .with_strategy(strategy)
        .with_time_limit(time_limit_ms);
    config.seed = seed;
    SheetNester::new(config).solve(parts, sheet)
}
