//! Manual insertion: pin extra parts onto an already packed sheet.
//!
//! The target sheet's placements are turned back into instances that start
//! in their current orientation, combined with the new parts and re-packed
//! as a single-sheet run. The insertion succeeds only if everything still
//! fits on one sheet; otherwise the input results are left untouched.

use crate::optimizer::BrandResult;
use panelcut_core::{expand_instances, Config, Error, Part, PartInstance, Placement, Result};
use panelcut_sheet::SheetNester;
use std::collections::HashSet;

/// Locates a sheet by id, returning `(brand index, sheet index)`.
pub fn find_sheet(results: &[BrandResult], sheet_id: &str) -> Option<(usize, usize)> {
    results.iter().enumerate().find_map(|(b, brand)| {
        brand
            .result
            .sheets
            .iter()
            .position(|s| s.id == sheet_id)
            .map(|s| (b, s))
    })
}

/// Instance for an existing placement, oriented as currently placed.
fn pinned_instance(placement: &Placement) -> PartInstance {
    let copy_index = placement
        .instance_id
        .rsplit_once('#')
        .and_then(|(_, copy)| copy.parse().ok())
        .unwrap_or(0);
    PartInstance {
        id: placement.instance_id.clone(),
        part: placement.part.clone(),
        copy_index,
        pre_rotated: placement.rotated,
    }
}

/// Expands `parts`, bumping copy indices that collide with `taken` ids.
fn fresh_instances(parts: &[Part], taken: &mut HashSet<String>) -> Vec<PartInstance> {
    let mut instances = expand_instances(parts);
    for instance in &mut instances {
        while taken.contains(&instance.id) {
            instance.copy_index += 1;
            instance.id = format!("{}#{}", instance.part.id, instance.copy_index);
        }
        taken.insert(instance.id.clone());
    }
    instances
}

/// Re-packs `target_sheet_id` together with `parts`.
///
/// Returns the updated results, or [`Error::InsertionRejected`] when the
/// combined set needs more than one sheet or leaves anything unplaced.
pub fn insert_manual(
    results: &[BrandResult],
    target_sheet_id: &str,
    parts: &[Part],
    solver: &Config,
) -> Result<Vec<BrandResult>> {
    let (brand_idx, sheet_idx) = find_sheet(results, target_sheet_id)
        .ok_or_else(|| Error::SheetNotFound(target_sheet_id.to_string()))?;
    let original = &results[brand_idx].result.sheets[sheet_idx];

    let mut instances: Vec<PartInstance> = original.placements.iter().map(pinned_instance).collect();
    let mut taken: HashSet<String> = instances.iter().map(|i| i.id.clone()).collect();
    instances.extend(fresh_instances(parts, &mut taken));

    log::debug!(
        "re-packing {} with {} existing and {} new instance(s)",
        target_sheet_id,
        original.placements.len(),
        instances.len() - original.placements.len()
    );

    let repacked = SheetNester::new(solver.clone()).solve_instances(&instances, &original.sheet())?;

    if repacked.sheets.len() != 1 || !repacked.unplaced.is_empty() {
        log::warn!(
            "manual insertion into {} rejected: {} sheet(s), {} unplaced",
            target_sheet_id,
            repacked.sheets.len(),
            repacked.unplaced.len()
        );
        return Err(Error::InsertionRejected {
            sheet: target_sheet_id.to_string(),
            sheets_needed: repacked.sheets.len(),
            unplaced: repacked.unplaced.len(),
        });
    }

    let mut sheet = repacked.sheets.into_iter().next().ok_or_else(|| {
        Error::Internal("re-pack reported one sheet but returned none".to_string())
    })?;
    sheet.id = original.id.clone();
    sheet.index = original.index;

    let mut updated = results.to_vec();
    let brand = &mut updated[brand_idx];
    brand.result.sheets[sheet_idx] = sheet;
    brand.result.recompute_totals();

    log::info!(
        "inserted {} part(s) into {}",
        parts.iter().map(|p| p.quantity).sum::<usize>(),
        target_sheet_id
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use panelcut_core::{PackedSheet, RunResult, Sheet};
    use std::sync::Arc;

    fn solver() -> Config {
        Config::new()
            .with_seed(3)
            .with_max_iterations(20)
            .with_time_limit(60_000)
    }

    fn one_sheet_results(placements: Vec<Placement>) -> Vec<BrandResult> {
        let mut sheet = PackedSheet::new("oak|||w1::0", 0, &Sheet::new(1000.0, 1000.0, 0.0));
        sheet.placements = placements;
        sheet.recompute_used_area();
        let mut result = RunResult::new();
        result.sheets.push(sheet);
        result.recompute_totals();
        vec![BrandResult {
            key: "oak|||w1".into(),
            brand: "oak".into(),
            laminate: "w1".into(),
            result,
        }]
    }

    fn placed(id: &str, w: f64, h: f64, rotated: bool, locked: bool) -> Placement {
        let part = Part::new(id, if rotated { h } else { w }, if rotated { w } else { h })
            .with_rotation(!locked);
        Placement {
            instance_id: format!("{id}#0"),
            part: Arc::new(part),
            x: 0.0,
            y: 0.0,
            width: w,
            height: h,
            rotated,
        }
    }

    #[test]
    fn test_unknown_sheet() {
        let results = one_sheet_results(vec![]);
        let err = insert_manual(&results, "nope::0", &[], &solver()).unwrap_err();
        assert_eq!(err, Error::SheetNotFound("nope::0".into()));
    }

    #[test]
    fn test_insert_fits() {
        let results = one_sheet_results(vec![placed("A", 500.0, 1000.0, false, true)]);
        let extra = vec![Part::new("MANUAL_PANEL_1", 400.0, 900.0).with_rotation(false)];
        let updated = insert_manual(&results, "oak|||w1::0", &extra, &solver()).unwrap();

        let sheet = &updated[0].result.sheets[0];
        assert_eq!(sheet.id, "oak|||w1::0");
        assert_eq!(sheet.index, 0);
        assert_eq!(sheet.placements.len(), 2);
        assert!(updated[0].result.totals.used_area > results[0].result.totals.used_area);
        // Input untouched.
        assert_eq!(results[0].result.sheets[0].placements.len(), 1);
    }

    #[test]
    fn test_insert_rejected_when_full() {
        let results = one_sheet_results(vec![placed("A", 1000.0, 1000.0, false, true)]);
        let extra = vec![Part::new("MANUAL_PANEL_1", 100.0, 100.0)];
        let err = insert_manual(&results, "oak|||w1::0", &extra, &solver()).unwrap_err();
        assert!(matches!(
            err,
            Error::InsertionRejected {
                sheets_needed: 2,
                unplaced: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_rotation_flag_stays_relative_to_part() {
        // A rotatable part placed turned keeps a consistent rotated flag.
        let results = one_sheet_results(vec![placed("R", 1000.0, 300.0, true, false)]);
        let updated = insert_manual(&results, "oak|||w1::0", &[], &solver()).unwrap();
        let p = &updated[0].result.sheets[0].placements[0];
        let upright = (p.width - p.part.width).abs() < 1e-9;
        assert_eq!(p.rotated, !upright);
    }

    #[test]
    fn test_colliding_ids_are_bumped() {
        let mut taken: HashSet<String> = ["X#0".to_string()].into_iter().collect();
        let instances = fresh_instances(&[Part::new("X", 1.0, 1.0).with_quantity(2)], &mut taken);
        let ids: Vec<&str> = instances.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["X#1", "X#2"]);
    }
}
