//! Solver traits and configuration.

use crate::result::RunResult;
use crate::Result;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Free-rectangle scoring heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Strategy {
    /// Best Area Fit: least leftover area in the chosen free rectangle.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "BAF", alias = "baf"))]
    BestAreaFit,
    /// Best Short Side Fit: least leftover on the shorter side.
    #[cfg_attr(feature = "serde", serde(rename = "BSSF", alias = "bssf"))]
    BestShortSideFit,
    /// Best Long Side Fit: least leftover on the longer side.
    #[cfg_attr(feature = "serde", serde(rename = "BLSF", alias = "blsf"))]
    BestLongSideFit,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::BestAreaFit,
        Strategy::BestShortSideFit,
        Strategy::BestLongSideFit,
    ];

    /// Short code (`BAF`, `BSSF`, `BLSF`).
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::BestAreaFit => "BAF",
            Strategy::BestShortSideFit => "BSSF",
            Strategy::BestLongSideFit => "BLSF",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baf" | "best-area-fit" => Ok(Strategy::BestAreaFit),
            "bssf" | "best-short-side-fit" => Ok(Strategy::BestShortSideFit),
            "blsf" | "best-long-side-fit" => Ok(Strategy::BestLongSideFit),
            other => Err(crate::Error::InvalidConfig(format!(
                "unknown packing strategy '{other}' (expected BAF, BSSF or BLSF)"
            ))),
        }
    }
}

/// Common configuration for the packer and its search driver.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct Config {
    /// Free-rectangle scoring heuristic.
    pub strategy: Strategy,

    /// Search budget in milliseconds. Values below [`Config::MIN_TIME_LIMIT_MS`] are raised to it.
    pub time_limit_ms: u64,

    /// PRNG seed. `None` draws a fresh seed per run (reported in the result).
    pub seed: Option<u32>,

    /// Upper bound on search iterations, independent of the clock.
    pub max_iterations: Option<u64>,

    /// Minimum random swaps applied per perturbation.
    pub min_swaps: usize,

    /// Swaps per perturbation as a fraction of the instance count.
    pub swap_fraction: f64,

    /// Probability of re-sorting a perturbed order by aspect ratio.
    pub resort_probability: f64,
}

impl Config {
    /// Floor applied to the search budget.
    pub const MIN_TIME_LIMIT_MS: u64 = 80;

    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the time budget in milliseconds.
    pub fn with_time_limit(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations.max(1));
        self
    }

    pub fn with_min_swaps(mut self, swaps: usize) -> Self {
        self.min_swaps = swaps;
        self
    }

    pub fn with_swap_fraction(mut self, fraction: f64) -> Self {
        self.swap_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_resort_probability(mut self, probability: f64) -> Self {
        self.resort_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Budget actually enforced by the search driver.
    pub fn effective_time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms.max(Self::MIN_TIME_LIMIT_MS))
    }

    /// Number of pairwise swaps applied to an order of `n` instances.
    pub fn swaps_for(&self, n: usize) -> usize {
        let scaled = (n as f64 * self.swap_fraction).floor() as usize;
        scaled.max(self.min_swaps)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            time_limit_ms: Self::MIN_TIME_LIMIT_MS,
            seed: None,
            max_iterations: None,
            min_swaps: 5,
            swap_fraction: 0.2,
            resort_probability: 0.5,
        }
    }
}

/// Progress callback for long-running operations.
pub type ProgressCallback = Box<dyn Fn(ProgressInfo) + Send + Sync>;

/// Progress information during a search.
#[derive(Debug, Clone, Default)]
pub struct ProgressInfo {
    /// Current iteration number.
    pub iteration: u64,
    /// Best cost found so far.
    pub best_cost: f64,
    /// Sheets used by the best layout.
    pub sheets: usize,
    /// Instances placed by the best layout.
    pub items_placed: usize,
    /// Total number of instances.
    pub total_items: usize,
    /// Elapsed time in milliseconds.
    pub elapsed_ms: u64,
    /// Current phase description.
    pub phase: String,
    /// Whether the solver is still running.
    pub running: bool,
}

impl ProgressInfo {
    pub fn new() -> Self {
        Self {
            running: true,
            ..Default::default()
        }
    }

    pub fn with_iteration(mut self, iteration: u64) -> Self {
        self.iteration = iteration;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.best_cost = cost;
        self
    }

    pub fn with_sheets(mut self, sheets: usize) -> Self {
        self.sheets = sheets;
        self
    }

    pub fn with_items(mut self, placed: usize, total: usize) -> Self {
        self.items_placed = placed;
        self.total_items = total;
        self
    }

    pub fn with_elapsed(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }

    /// Marks the solver as finished.
    pub fn finished(mut self) -> Self {
        self.running = false;
        self
    }
}

/// Trait for sheet packing solvers.
pub trait Solver {
    /// Input item type.
    type Item;
    /// Stock the items are packed onto.
    type Stock;

    /// Packs `items` onto as many copies of `stock` as needed.
    fn solve(&self, items: &[Self::Item], stock: &Self::Stock) -> Result<RunResult>;

    /// Solves with a progress callback.
    fn solve_with_progress(
        &self,
        items: &[Self::Item],
        stock: &Self::Stock,
        callback: ProgressCallback,
    ) -> Result<RunResult>;

    /// Requests cooperative cancellation; the search stops at its next iteration.
    fn cancel(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.strategy, Strategy::BestAreaFit);
        assert_eq!(config.time_limit_ms, 80);
        assert_eq!(config.min_swaps, 5);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_time_limit_floor() {
        let config = Config::new().with_time_limit(10);
        assert_eq!(config.effective_time_limit(), Duration::from_millis(80));
        let config = Config::new().with_time_limit(500);
        assert_eq!(config.effective_time_limit(), Duration::from_millis(500));
    }

    #[test]
    fn test_swaps_for() {
        let config = Config::default();
        assert_eq!(config.swaps_for(3), 5);
        assert_eq!(config.swaps_for(24), 5);
        assert_eq!(config.swaps_for(100), 20);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("baf".parse::<Strategy>().unwrap(), Strategy::BestAreaFit);
        assert_eq!(" BSSF ".parse::<Strategy>().unwrap(), Strategy::BestShortSideFit);
        assert_eq!(
            "best-long-side-fit".parse::<Strategy>().unwrap(),
            Strategy::BestLongSideFit
        );
        assert!("nfp".parse::<Strategy>().is_err());
        assert_eq!(Strategy::BestShortSideFit.to_string(), "BSSF");
    }

    #[test]
    fn test_progress_builder() {
        let info = ProgressInfo::new()
            .with_iteration(4)
            .with_items(3, 10)
            .with_phase("Search")
            .finished();
        assert_eq!(info.iteration, 4);
        assert_eq!(info.total_items, 10);
        assert!(!info.running);
    }
}
