//! # panelcut core
//!
//! Shared data model and solver abstractions for the panelcut sheet
//! optimizer.
//!
//! This crate holds everything the packer, the cabinet pipeline and the
//! worker boundary agree on: parts and sheets, packing results, the error
//! type, solver configuration and the randomized local search framework.
//!
//! ## Core Components
//!
//! - **Geometry**: [`Rect`], [`Sheet`]
//! - **Parts**: [`Part`], [`PartInstance`], [`PanelRole`]
//! - **Results**: [`RunResult`], [`PackedSheet`], [`Placement`], [`Totals`]
//! - **Solver trait**: [`Solver`], configured by [`Config`]
//! - **Search framework**: [`LocalSearchRunner`], [`OrderingProblem`]
//! - **Randomness**: [`Mulberry32`], a seedable PRNG
//!
//! ## Packing Strategies
//!
//! | Strategy | Scores a free rectangle by |
//! |----------|----------------------------|
//! | `BestAreaFit` (BAF) | leftover area |
//! | `BestShortSideFit` (BSSF) | shorter leftover side |
//! | `BestLongSideFit` (BLSF) | longer leftover side |
//!
//! ## Configuration
//!
//! ```rust
//! use panelcut_core::{Config, Strategy};
//!
//! let config = Config::new()
//!     .with_strategy(Strategy::BestShortSideFit)
//!     .with_time_limit(500)
//!     .with_seed(42);
//! assert_eq!(config.seed, Some(42));
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod error;
pub mod geometry;
pub mod part;
pub mod random;
pub mod result;
pub mod search;
pub mod solver;

// Re-exports
pub use error::{Error, Result};
pub use geometry::{Rect, Sheet, EPSILON};
pub use part::{expand_instances, PanelRole, Part, PartInstance, MAX_QUANTITY};
pub use random::Mulberry32;
pub use result::{PackedSheet, Placement, RunResult, RunSummary, Totals};
pub use search::{
    LocalSearchConfig, LocalSearchProgress, LocalSearchResult, LocalSearchRunner, OrderingProblem,
};
pub use solver::{Config, ProgressCallback, ProgressInfo, Solver, Strategy};
