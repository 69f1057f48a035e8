//! Randomized local search over placement orders.
//!
//! The search is restart + perturbation, not a genetic algorithm: every
//! iteration starts again from the same base order, applies a number of
//! random pairwise swaps (and sometimes a re-sort), evaluates the resulting
//! order and keeps the cheapest outcome seen before the budget runs out.
//!
//! Problems plug in through [`OrderingProblem`]; the runner owns the loop,
//! the deadline and the cancellation flag.

use crate::solver::Config;
use instant::Instant;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the local search loop.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSearchConfig {
    /// Cooperative deadline, checked once per iteration.
    pub time_limit: Duration,
    /// Optional cap on evaluated orders (including the base order).
    pub max_iterations: Option<u64>,
    /// Minimum swaps per perturbation.
    pub min_swaps: usize,
    /// Swaps per perturbation as a fraction of the order length.
    pub swap_fraction: f64,
    /// Probability of calling [`OrderingProblem::reorder`] after swapping.
    pub resort_probability: f64,
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for LocalSearchConfig {
    fn from(config: &Config) -> Self {
        Self {
            time_limit: config.effective_time_limit(),
            max_iterations: config.max_iterations,
            min_swaps: config.min_swaps,
            swap_fraction: config.swap_fraction,
            resort_probability: config.resort_probability,
        }
    }
}

impl LocalSearchConfig {
    fn swaps_for(&self, n: usize) -> usize {
        ((n as f64 * self.swap_fraction).floor() as usize).max(self.min_swaps)
    }
}

/// A problem whose solutions are permutations of `0..len()`.
pub trait OrderingProblem {
    /// Decoded result of one order.
    type Outcome: Clone;

    /// Number of elements in an order.
    fn len(&self) -> usize;

    /// Returns true if there is nothing to order.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The starting order every iteration perturbs.
    fn base_order(&self) -> Vec<usize>;

    /// Deterministic re-sort applied to some perturbed orders.
    fn reorder(&self, order: &mut [usize]);

    /// Decodes an order into an outcome.
    fn evaluate(&self, order: &[usize]) -> Self::Outcome;

    /// Scalar cost of an outcome (lower is better).
    fn cost(&self, outcome: &Self::Outcome) -> f64;
}

/// Progress information emitted when the best outcome improves.
#[derive(Debug, Clone)]
pub struct LocalSearchProgress<'a, O> {
    pub iteration: u64,
    pub best_cost: f64,
    /// Best outcome so far.
    pub best: &'a O,
    pub elapsed: Duration,
    pub running: bool,
}

/// Result of a local search run.
#[derive(Debug, Clone)]
pub struct LocalSearchResult<O> {
    pub best: O,
    pub best_cost: f64,
    /// Orders evaluated, including the base order.
    pub iterations: u64,
    pub elapsed: Duration,
    /// Best cost after each improvement, starting with the base order's cost.
    pub history: Vec<f64>,
    pub cancelled: bool,
}

/// Runs [`OrderingProblem`]s under a time budget.
pub struct LocalSearchRunner<P: OrderingProblem> {
    config: LocalSearchConfig,
    problem: P,
    cancelled: Arc<AtomicBool>,
}

impl<P: OrderingProblem> LocalSearchRunner<P> {
    pub fn new(config: LocalSearchConfig, problem: P) -> Self {
        Self {
            config,
            problem,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares an external cancellation flag.
    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Returns a handle to cancel the search.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Runs the search with the given RNG.
    pub fn run_with_rng<R: Rng>(&self, rng: &mut R) -> LocalSearchResult<P::Outcome> {
        self.run_with_rng_and_progress::<R, fn(LocalSearchProgress<'_, P::Outcome>)>(rng, None)
    }

    /// Runs the search with the given RNG and an optional progress callback.
    pub fn run_with_rng_and_progress<R: Rng, F>(
        &self,
        rng: &mut R,
        progress_callback: Option<F>,
    ) -> LocalSearchResult<P::Outcome>
    where
        F: Fn(LocalSearchProgress<'_, P::Outcome>),
    {
        let start = Instant::now();
        let base = self.problem.base_order();

        let mut best = self.problem.evaluate(&base);
        let mut best_cost = self.problem.cost(&best);
        let mut history = vec![best_cost];
        let mut iterations = 1u64;
        let mut cancelled = false;

        if let Some(ref callback) = progress_callback {
            callback(LocalSearchProgress {
                iteration: 0,
                best_cost,
                best: &best,
                elapsed: start.elapsed(),
                running: true,
            });
        }

        // Fewer than two elements admit a single order.
        if base.len() >= 2 {
            let swaps = self.config.swaps_for(base.len());
            loop {
                if self.cancelled.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
                if start.elapsed() >= self.config.time_limit {
                    break;
                }
                if let Some(max) = self.config.max_iterations {
                    if iterations >= max {
                        break;
                    }
                }

                let mut order = base.clone();
                self.perturb(&mut order, swaps, rng);
                let outcome = self.problem.evaluate(&order);
                let cost = self.problem.cost(&outcome);
                iterations += 1;

                if cost < best_cost {
                    best = outcome;
                    best_cost = cost;
                    history.push(cost);

                    if let Some(ref callback) = progress_callback {
                        callback(LocalSearchProgress {
                            iteration: iterations - 1,
                            best_cost,
                            best: &best,
                            elapsed: start.elapsed(),
                            running: true,
                        });
                    }
                }
            }
        }

        if let Some(ref callback) = progress_callback {
            callback(LocalSearchProgress {
                iteration: iterations,
                best_cost,
                best: &best,
                elapsed: start.elapsed(),
                running: false,
            });
        }

        log::debug!(
            "local search finished: {} iterations, best cost {:.3}, {:?}",
            iterations,
            best_cost,
            start.elapsed()
        );

        LocalSearchResult {
            best,
            best_cost,
            iterations,
            elapsed: start.elapsed(),
            history,
            cancelled,
        }
    }

    fn perturb<R: Rng>(&self, order: &mut [usize], swaps: usize, rng: &mut R) {
        let n = order.len();
        for _ in 0..swaps {
            let i = rng.gen_range(0..n);
            let j = rng.gen_range(0..n);
            order.swap(i, j);
        }
        if rng.gen::<f64>() < self.config.resort_probability {
            self.problem.reorder(order);
        }
    }
}
