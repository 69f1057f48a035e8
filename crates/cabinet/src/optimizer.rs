//! Cabinet panel optimization pipeline.
//!
//! raw panels -> dimensional mapper -> material groups -> per-group sheet
//! nesting -> validated results, optionally followed by manual insertions.

use crate::cache::{CacheKey, ResultCache};
use crate::grouping::{group_parts, split_key, MaterialGroup};
use crate::manual;
use crate::mapper::{normalize_grain_preferences, DimensionalMapper, GrainPreferences};
use crate::panel::RawPanel;
use panelcut_core::{expand_instances, Config, Error, Result, RunResult, Sheet};
use panelcut_sheet::SheetNester;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Id prefix given to manually inserted parts.
pub const MANUAL_ID_PREFIX: &str = "MANUAL";

/// Packing result of one material group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandResult {
    /// Group key, `brand|||laminate`.
    pub key: String,
    pub brand: String,
    pub laminate: String,
    pub result: RunResult,
}

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptimizerConfig {
    /// Stock sheet shared by every group.
    pub sheet: Sheet,
    /// Packer and search settings.
    pub solver: Config,
    /// Laminate key to grain-sensitivity flag.
    pub grain_preferences: GrainPreferences,
    /// Pack material groups on the rayon pool.
    pub parallel: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            sheet: Sheet::standard(),
            solver: Config::default(),
            grain_preferences: GrainPreferences::new(),
            parallel: true,
        }
    }
}

impl OptimizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn with_solver(mut self, solver: Config) -> Self {
        self.solver = solver;
        self
    }

    /// Marks a laminate (keyed as the mapper keys it) as grain sensitive or not.
    pub fn with_grain_preference(mut self, laminate: &str, sensitive: bool) -> Self {
        self.grain_preferences
            .insert(crate::mapper::laminate_key(laminate), sensitive);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Extra panels to pin onto an existing sheet after the main run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualInsertion {
    /// `"{group_key}::{index}"`.
    pub target_sheet_id: String,
    pub panels: Vec<RawPanel>,
}

/// Input of one optimizer run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub panels: Vec<RawPanel>,
    #[serde(default)]
    pub manual: Vec<ManualInsertion>,
}

impl OptimizeRequest {
    pub fn new(panels: Vec<RawPanel>) -> Self {
        Self {
            panels,
            manual: Vec::new(),
        }
    }

    pub fn with_manual(mut self, target_sheet_id: impl Into<String>, panels: Vec<RawPanel>) -> Self {
        self.manual.push(ManualInsertion {
            target_sheet_id: target_sheet_id.into(),
            panels,
        });
        self
    }
}

/// Stable id of a sheet within its material group.
pub fn sheet_id(group_key: &str, index: usize) -> String {
    format!("{}::{}", group_key, index)
}

/// Runs the cabinet pipeline.
pub struct Optimizer {
    config: OptimizerConfig,
    cache: Option<Arc<dyn ResultCache>>,
    cancelled: Arc<AtomicBool>,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            cache: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Memoizes runs in `cache`.
    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Returns a handle that stops every group's search when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Cache key of a request under this configuration.
    ///
    /// Covers every solver setting except the time budget, which bounds effort.
    pub fn cache_key(&self, request: &OptimizeRequest) -> Result<CacheKey> {
        let to_value = |value: serde_json::Result<serde_json::Value>| {
            value.map_err(|e| Error::Serialization(e.to_string()))
        };
        let mut solver = to_value(serde_json::to_value(&self.config.solver))?;
        if let Some(fields) = solver.as_object_mut() {
            fields.remove("timeLimitMs");
        }
        let grain_preferences = normalize_grain_preferences(&self.config.grain_preferences);
        let value = serde_json::json!({
            "panels": to_value(serde_json::to_value(&request.panels))?,
            "manual": to_value(serde_json::to_value(&request.manual))?,
            "sheet": {
                "width": self.config.sheet.width,
                "height": self.config.sheet.height,
                "kerf": self.config.sheet.kerf,
            },
            "grainPreferences": to_value(serde_json::to_value(&grain_preferences))?,
            "solver": solver,
        });
        Ok(CacheKey::from_value(&value))
    }

    /// Optimizes `request`, one [`BrandResult`] per material group in first-seen order.
    ///
    /// Clears any earlier cancellation. Cancelled runs are not cached.
    pub fn optimize(&self, request: &OptimizeRequest) -> Result<Vec<BrandResult>> {
        self.config.sheet.validate()?;
        self.cancelled.store(false, Ordering::Relaxed);

        let key = match self.cache {
            Some(_) => Some(self.cache_key(request)?),
            None => None,
        };
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.get(key)? {
                log::debug!("result cache hit {}", key);
                return Ok(hit.as_ref().clone());
            }
        }

        let mut mapper = DimensionalMapper::new(&self.config.grain_preferences);
        let parts = mapper.map_all(&request.panels);
        let groups = group_parts(parts);

        let run_seed = self.config.solver.seed.unwrap_or_else(rand::random);
        log::info!(
            "optimizing {} panel(s) in {} material group(s), seed {}",
            request.panels.len(),
            groups.len(),
            run_seed
        );

        let mut results = if self.config.parallel && groups.len() > 1 {
            groups
                .par_iter()
                .enumerate()
                .map(|(i, group)| self.pack_group(group, i, run_seed))
                .collect::<Result<Vec<_>>>()?
        } else {
            groups
                .iter()
                .enumerate()
                .map(|(i, group)| self.pack_group(group, i, run_seed))
                .collect::<Result<Vec<_>>>()?
        };

        for insertion in &request.manual {
            match self.insert_manual(&results, &insertion.target_sheet_id, &insertion.panels) {
                Ok(updated) => results = updated,
                Err(err) if err.is_geometry_violation() => return Err(err),
                Err(err) => log::warn!("skipping manual insertion: {}", err),
            }
        }

        let cancelled = results.iter().any(|r| r.result.cancelled);
        if let (Some(cache), Some(key)) = (&self.cache, key) {
            if cancelled {
                log::debug!("not caching cancelled run {}", key);
            } else {
                cache.put(key, Arc::new(results.clone()))?;
            }
        }
        Ok(results)
    }

    /// Pins `panels` onto the sheet `target_sheet_id` of `results`.
    ///
    /// Manual ids continue after those already in `results`. On rejection the
    /// error is returned and `results` stay as they were.
    pub fn insert_manual(
        &self,
        results: &[BrandResult],
        target_sheet_id: &str,
        panels: &[RawPanel],
    ) -> Result<Vec<BrandResult>> {
        let mut mapper =
            DimensionalMapper::new(&self.config.grain_preferences).with_id_prefix(MANUAL_ID_PREFIX);
        mapper.reserve_ids(results.iter().flat_map(|brand| {
            brand
                .result
                .placements()
                .map(|(_, p)| p.part.id.as_str())
                .chain(brand.result.unplaced.iter().map(|i| i.part.id.as_str()))
        }));
        let parts = mapper.map_all(panels);
        manual::insert_manual(results, target_sheet_id, &parts, &self.config.solver)
    }

    fn pack_group(&self, group: &MaterialGroup, index: usize, run_seed: u32) -> Result<BrandResult> {
        let solver = self
            .config
            .solver
            .clone()
            .with_seed(run_seed.wrapping_add(index as u32));
        let nester = SheetNester::new(solver).with_cancel_flag(self.cancelled.clone());
        let instances = expand_instances(&group.parts);

        let mut result = nester.solve_instances(&instances, &self.config.sheet)?;
        for sheet in &mut result.sheets {
            sheet.id = sheet_id(&group.key, sheet.index);
        }
        if !result.unplaced.is_empty() {
            log::warn!(
                "{} instance(s) of group {} do not fit the sheet",
                result.unplaced.len(),
                group.key
            );
        }

        let (brand, laminate) = split_key(&group.key);
        Ok(BrandResult {
            key: group.key.clone(),
            brand: brand.to_string(),
            laminate: laminate.to_string(),
            result,
        })
    }
}

/// One-shot optimization with default solver settings.
pub fn optimize(
    panels: &[RawPanel],
    sheet_width: f64,
    sheet_height: f64,
    kerf: f64,
    grain_preferences: &GrainPreferences,
) -> Result<Vec<BrandResult>> {
    let config = OptimizerConfig {
        sheet: Sheet::new(sheet_width, sheet_height, kerf),
        grain_preferences: grain_preferences.clone(),
        ..OptimizerConfig::default()
    };
    Optimizer::new(config).optimize(&OptimizeRequest::new(panels.to_vec()))
}

/// Looks up a group result by key.
pub fn find_group<'a>(results: &'a [BrandResult], key: &str) -> Result<&'a BrandResult> {
    results
        .iter()
        .find(|r| r.key == key)
        .ok_or_else(|| Error::GroupNotFound(key.to_string()))
}
