//! Sheet nesting solver.

use crate::local_search::PackingProblem;
use crate::packer::{PackOutcome, SheetPacker};
use crate::validate::validate_result;
use instant::Instant;
use panelcut_core::solver::{Config, ProgressCallback, ProgressInfo, Solver};
use panelcut_core::{
    expand_instances, LocalSearchConfig, LocalSearchProgress, LocalSearchRunner, Mulberry32, Part,
    PartInstance, Result, RunResult, Sheet,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Sheet nesting solver: greedy free-rectangle packing driven by a
/// randomized local search over the placement order.
pub struct SheetNester {
    config: Config,
    cancelled: Arc<AtomicBool>,
}

impl SheetNester {
    /// Creates a new nester with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a nester with default configuration.
    pub fn default_config() -> Self {
        Self::new(Config::default())
    }

    /// Shares an external cancellation flag, e.g. one per optimizer run.
    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a handle that cancels the running search when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Packs already-expanded instances.
    ///
    /// Unlike [`Solver::solve`] this keeps instance ids and pre-rotation as
    /// given, which the manual re-pack relies on.
    pub fn solve_instances(&self, instances: &[PartInstance], sheet: &Sheet) -> Result<RunResult> {
        self.run(instances, sheet, None)
    }

    fn run(
        &self,
        instances: &[PartInstance],
        sheet: &Sheet,
        callback: Option<&ProgressCallback>,
    ) -> Result<RunResult> {
        sheet.validate()?;
        let start = Instant::now();

        let (seed, mut rng) = match self.config.seed {
            Some(seed) => (seed, Mulberry32::new(seed)),
            None => {
                let (seed, rng) = Mulberry32::unseeded();
                log::debug!("no seed configured, drew seed {}", seed);
                (seed, rng)
            }
        };

        let packer = SheetPacker::new(*sheet, self.config.strategy);
        let problem = PackingProblem::new(instances, &packer);
        let runner = LocalSearchRunner::new(LocalSearchConfig::from(&self.config), problem)
            .with_cancel_flag(self.cancelled.clone());

        let total = instances.len();
        let search = match callback {
            Some(cb) => runner.run_with_rng_and_progress(
                &mut rng,
                Some(|p: LocalSearchProgress<'_, PackOutcome>| {
                    if p.running {
                        cb(ProgressInfo::new()
                            .with_iteration(p.iteration)
                            .with_cost(p.best_cost)
                            .with_sheets(p.best.sheets.len())
                            .with_items(p.best.placed_count(), total)
                            .with_elapsed(p.elapsed.as_millis() as u64)
                            .with_phase("Search"));
                    }
                }),
            ),
            None => runner.run_with_rng(&mut rng),
        };

        let PackOutcome { sheets, unplaced } = search.best;
        let mut result = RunResult {
            sheets,
            unplaced,
            iterations: search.iterations,
            elapsed_ms: start.elapsed().as_millis() as u64,
            best_cost: search.best_cost,
            seed: Some(seed),
            strategy: Some(self.config.strategy.as_str().to_string()),
            cancelled: search.cancelled,
            ..RunResult::default()
        };
        result.recompute_totals();

        if let Err(err) = validate_result(&result) {
            log::error!("packed layout failed validation: {}", err);
            return Err(err);
        }

        if let Some(cb) = callback {
            cb(ProgressInfo::new()
                .with_iteration(result.iterations)
                .with_cost(result.best_cost)
                .with_sheets(result.totals.sheet_count)
                .with_items(result.placed_count(), total)
                .with_elapsed(result.elapsed_ms)
                .with_phase("Complete")
                .finished());
        }

        log::info!(
            "packed {}/{} instances on {} sheet(s), {:.1}% efficiency, {} iterations in {} ms ({}, seed {})",
            result.placed_count(),
            total,
            result.totals.sheet_count,
            result.totals.efficiency_pct,
            result.iterations,
            result.elapsed_ms,
            self.config.strategy,
            seed
        );

        Ok(result)
    }

    /// Drops parts that cannot be packed and expands the rest.
    fn prepare(&self, parts: &[Part]) -> Vec<PartInstance> {
        let valid: Vec<Part> = parts
            .iter()
            .filter(|part| match part.validate() {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("skipping part: {}", err);
                    false
                }
            })
            .cloned()
            .collect();
        expand_instances(&valid)
    }
}

impl Solver for SheetNester {
    type Item = Part;
    type Stock = Sheet;

    fn solve(&self, parts: &[Part], sheet: &Sheet) -> Result<RunResult> {
        sheet.validate()?;

        // Reset cancellation flag
        self.cancelled.store(false, Ordering::Relaxed);

        let instances = self.prepare(parts);
        self.run(&instances, sheet, None)
    }

    fn solve_with_progress(
        &self,
        parts: &[Part],
        sheet: &Sheet,
        callback: ProgressCallback,
    ) -> Result<RunResult> {
        sheet.validate()?;

        // Reset cancellation flag
        self.cancelled.store(false, Ordering::Relaxed);

        let instances = self.prepare(parts);
        self.run(&instances, sheet, Some(&callback))
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}
