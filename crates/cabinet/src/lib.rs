//! # panelcut cabinet
//!
//! The cabinet-facing optimizer pipeline.
//!
//! Raw panel descriptors from a cabinet generator are mapped onto sheet axes
//! by role, grouped by material, packed per group and validated. Results can
//! be memoized, and extra panels can be pinned onto an existing sheet later.
//!
//! ## Quick Start
//!
//! ```rust
//! use panelcut_cabinet::{OptimizeRequest, Optimizer, OptimizerConfig, RawPanel};
//! use panelcut_core::Config;
//!
//! let panels = vec![
//!     RawPanel::new("Top", 900.0, 560.0).with_brand("Century").with_laminate("W101"),
//!     RawPanel::new("Left", 560.0, 720.0).with_quantity(2).with_grain(true),
//! ];
//!
//! let config = OptimizerConfig::new()
//!     .with_solver(Config::new().with_seed(7).with_max_iterations(20))
//!     .with_grain_preference("W101", true);
//!
//! let results = Optimizer::new(config)
//!     .optimize(&OptimizeRequest::new(panels))
//!     .unwrap();
//!
//! for group in &results {
//!     println!("{}: {} sheet(s)", group.key, group.result.totals.sheet_count);
//! }
//! ```

pub mod cache;
pub mod grouping;
pub mod manual;
pub mod mapper;
pub mod optimizer;
pub mod panel;

pub use cache::{canonical_json, BoundedResultCache, CacheKey, ResultCache};
pub use grouping::{group_parts, material_key, normalize, MaterialGroup};
pub use manual::find_sheet;
pub use mapper::{
    detect_role, laminate_key, normalize_grain_preferences, DimensionalMapper, GrainPreferences,
};
pub use optimizer::{
    find_group, optimize, sheet_id, BrandResult, ManualInsertion, OptimizeRequest, Optimizer,
    OptimizerConfig, MANUAL_ID_PREFIX,
};
pub use panel::{parse_panels, parse_panels_str, RawPanel};
