//! Integration tests for panelcut-cabinet.

use approx::assert_relative_eq;
use panelcut_cabinet::{
    optimize, parse_panels, BoundedResultCache, BrandResult, GrainPreferences, OptimizeRequest,
    Optimizer, OptimizerConfig, RawPanel, ResultCache,
};
use panelcut_core::{Config, Error, PanelRole, Sheet};
use panelcut_sheet::validate_result;
use serde_json::json;
use std::sync::Arc;

fn seeded_config() -> OptimizerConfig {
    OptimizerConfig::new().with_solver(
        Config::new()
            .with_seed(5)
            .with_max_iterations(25)
            .with_time_limit(60_000),
    )
}

fn kitchen_run() -> Vec<RawPanel> {
    let carcass = |name: &str, w: f64, h: f64, qty: usize| {
        RawPanel::new(name, w, h)
            .with_quantity(qty)
            .with_brand("Century Ply")
            .with_laminate("Walnut 1234 + PVC")
    };
    vec![
        carcass("Top", 900.0, 560.0, 3),
        carcass("Bottom", 900.0, 560.0, 3),
        carcass("Left Side", 560.0, 720.0, 3),
        carcass("Right Side", 560.0, 720.0, 3),
        carcass("Shelf", 864.0, 540.0, 3),
        carcass("Centre Post", 100.0, 720.0, 1),
        RawPanel::new("Back", 900.0, 720.0)
            .with_quantity(3)
            .with_brand("Century Ply")
            .with_back_brand("Green Ply")
            .with_laminate("Walnut 1234 + PVC"),
        RawPanel::new("Shutter 1", 447.0, 717.0)
            .with_quantity(6)
            .with_brand("Century Ply")
            .with_laminate("Gloss White")
            .with_gaddi(true),
    ]
}

fn requested(panels: &[RawPanel]) -> usize {
    panels.iter().map(|p| p.quantity.unwrap_or(1)).sum()
}

fn placed_and_unplaced(results: &[BrandResult]) -> usize {
    results
        .iter()
        .map(|r| r.result.placed_count() + r.result.unplaced_count())
        .sum()
}

mod pipeline_tests {
    use super::*;

    #[test]
    fn test_kitchen_run_conserves_and_validates() {
        let panels = kitchen_run();
        let results = Optimizer::new(seeded_config())
            .optimize(&OptimizeRequest::new(panels.clone()))
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(placed_and_unplaced(&results), requested(&panels));
        for group in &results {
            assert!(validate_result(&group.result).is_ok());
            assert!(group.result.all_placed());
            assert!(group.result.totals.efficiency_pct > 0.0);
            assert!(group.result.totals.efficiency_pct <= 100.0);
        }
    }

    #[test]
    fn test_grain_preferences_lock_rotation() {
        let config = seeded_config().with_grain_preference("Walnut 1234", true);
        let results = Optimizer::new(config)
            .optimize(&OptimizeRequest::new(kitchen_run()))
            .unwrap();
        let walnut = &results[0];
        assert_eq!(walnut.key, "century ply|||walnut 1234 + pvc");
        for (_, p) in walnut.result.placements() {
            assert!(!p.part.rotate_allowed);
            assert!(!p.rotated);
        }
    }

    #[test]
    fn test_raw_grain_preference_keys_lock_rotation() {
        let panels = vec![
            RawPanel::new("Left", 560.0, 720.0).with_laminate("W101"),
            RawPanel::new("Right", 560.0, 720.0).with_laminate("oak 7 + pvc"),
            RawPanel::new("Shelf", 860.0, 540.0).with_laminate("Maple"),
        ];
        let mut prefs = GrainPreferences::new();
        prefs.insert("W101".to_string(), true);
        prefs.insert("OAK 7 + 1mm edge".to_string(), true);
        let results = optimize(&panels, 1220.0, 2440.0, 4.0, &prefs).unwrap();
        for group in &results {
            let locked = group.laminate != "maple";
            for (_, p) in group.result.placements() {
                assert_eq!(p.part.rotate_allowed, !locked, "{}", group.key);
            }
        }
    }

    #[test]
    fn test_grain_preferences_from_json_config() {
        let config: OptimizerConfig = serde_json::from_value(json!({
            "solver": { "seed": 5, "maxIterations": 10 },
            "grainPreferences": { "W101": true }
        }))
        .unwrap();
        let results = Optimizer::new(config)
            .optimize(&OptimizeRequest::new(vec![
                RawPanel::new("Left", 560.0, 720.0).with_laminate("W101")
            ]))
            .unwrap();
        let (_, placement) = results[0].result.placements().next().unwrap();
        assert!(!placement.part.rotate_allowed);
    }

    #[test]
    fn test_absurd_quantity_dropped() {
        let panels = parse_panels(&json!([
            { "name": "Top", "width": 900, "height": 560, "quantity": 1e30 },
            { "name": "Left", "width": 560, "height": 720, "quantity": 2 }
        ]));
        assert_eq!(panels.len(), 2);
        let results = Optimizer::new(seeded_config())
            .optimize(&OptimizeRequest::new(panels))
            .unwrap();
        assert_eq!(placed_and_unplaced(&results), 2);
    }

    #[test]
    fn test_metadata_travels_with_placements() {
        let results = Optimizer::new(seeded_config())
            .optimize(&OptimizeRequest::new(kitchen_run()))
            .unwrap();
        let shutters = results
            .iter()
            .find(|r| r.laminate == "gloss white")
            .unwrap();
        for (_, p) in shutters.result.placements() {
            assert_eq!(p.part.role, PanelRole::Shutter);
            assert!(p.part.edge_banding);
            assert_eq!(p.part.label, "Shutter 1");
            assert_relative_eq!(p.part.nominal_width, 447.0);
        }

        let walnut = &results[0];
        let top = walnut
            .result
            .placements()
            .find(|(_, p)| p.part.role == PanelRole::Top)
            .map(|(_, p)| p.part.clone())
            .unwrap();
        assert_relative_eq!(top.width, 560.0);
        assert_relative_eq!(top.height, 900.0);
    }

    #[test]
    fn test_oversized_panel_reported_unplaced() {
        let panels = vec![
            RawPanel::new("Back", 2000.0, 3000.0).with_grain(true),
            RawPanel::new("Left", 560.0, 720.0),
        ];
        let results = optimize(&panels, 1210.0, 2420.0, 4.0, &GrainPreferences::new()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].result.unplaced_count(), 1);
        assert_eq!(results[0].result.placed_count(), 1);
    }

    #[test]
    fn test_lenient_json_input() {
        let panels = parse_panels(&json!([
            { "name": "Top", "nominalWidth": "900", "nominalHeight": "560", "brand": "Century" },
            null,
            { "name": "Broken", "nominalWidth": "wide" },
            { "panelType": "Left", "width": 560, "height": 720, "quantity": 2 }
        ]));
        assert_eq!(panels.len(), 2);
        let results = Optimizer::new(seeded_config())
            .optimize(&OptimizeRequest::new(panels))
            .unwrap();
        assert_eq!(placed_and_unplaced(&results), 3);
    }
}

mod manual_tests {
    use super::*;

    #[test]
    fn test_insert_into_existing_sheet() {
        let optimizer = Optimizer::new(seeded_config());
        let results = optimizer
            .optimize(&OptimizeRequest::new(vec![RawPanel::new("Left", 560.0, 720.0)
                .with_brand("Oak")
                .with_laminate("W1")]))
            .unwrap();
        let target = results[0].result.sheets[0].id.clone();
        assert_eq!(target, "oak|||w1::0");

        let updated = optimizer
            .insert_manual(&results, &target, &[RawPanel::new("Shelf", 860.0, 540.0)])
            .unwrap();
        let sheet = &updated[0].result.sheets[0];
        assert_eq!(sheet.id, target);
        assert_eq!(sheet.placements.len(), 2);
        assert!(sheet
            .placements
            .iter()
            .any(|p| p.part.id.starts_with("MANUAL_SHELF")));
        assert!(validate_result(&updated[0].result).is_ok());
        assert_eq!(updated[0].result.totals.sheet_count, 1);
    }

    #[test]
    fn test_rejected_insertion_is_an_error() {
        let optimizer = Optimizer::new(seeded_config().with_sheet(Sheet::standard_1210()));
        let results = optimizer
            .optimize(&OptimizeRequest::new(vec![
                RawPanel::new("Back", 1210.0, 2420.0).with_grain(true)
            ]))
            .unwrap();
        let target = results[0].result.sheets[0].id.clone();

        let err = optimizer
            .insert_manual(&results, &target, &[RawPanel::new("Shelf", 300.0, 300.0)])
            .unwrap_err();
        assert!(matches!(err, Error::InsertionRejected { .. }));
        assert!(!err.is_geometry_violation());
    }

    #[test]
    fn test_repeated_insertions_get_fresh_ids() {
        let optimizer = Optimizer::new(seeded_config());
        let results = optimizer
            .optimize(&OptimizeRequest::new(vec![RawPanel::new("Left", 560.0, 720.0)
                .with_brand("Oak")
                .with_laminate("W1")]))
            .unwrap();
        let target = results[0].result.sheets[0].id.clone();

        let once = optimizer
            .insert_manual(&results, &target, &[RawPanel::new("Shelf", 500.0, 400.0)])
            .unwrap();
        let twice = optimizer
            .insert_manual(&once, &target, &[RawPanel::new("Shelf", 300.0, 200.0)])
            .unwrap();

        let mut ids: Vec<&str> = twice[0]
            .result
            .placements()
            .map(|(_, p)| p.part.id.as_str())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["LEFT_1", "MANUAL_SHELF_1", "MANUAL_SHELF_2"]);
        assert!(validate_result(&twice[0].result).is_ok());
    }

    #[test]
    fn test_unknown_target_sheet() {
        let optimizer = Optimizer::new(seeded_config());
        let err = optimizer
            .insert_manual(&[], "missing::0", &[RawPanel::new("Top", 10.0, 10.0)])
            .unwrap_err();
        assert!(matches!(err, Error::SheetNotFound(_)));
    }
}

mod cache_tests {
    use super::*;

    #[test]
    fn test_cancelled_run_not_cached() {
        let cache = Arc::new(BoundedResultCache::with_capacity(2));
        let optimizer = Optimizer::new(seeded_config()).with_cache(cache.clone());
        let request = OptimizeRequest::new(kitchen_run());
        let handle = optimizer.cancel_handle();

        optimizer.cancel();
        let fresh = optimizer.optimize(&request).unwrap();
        assert!(!handle.load(std::sync::atomic::Ordering::Relaxed));
        assert!(fresh.iter().all(|r| !r.result.cancelled));

        let uncached = Optimizer::new(seeded_config()).optimize(&request).unwrap();
        for (x, y) in fresh.iter().zip(&uncached) {
            assert_eq!(x.result.sheets, y.result.sheets);
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_is_transparent() {
        let cache = Arc::new(BoundedResultCache::with_capacity(2));
        let cached = Optimizer::new(seeded_config()).with_cache(cache.clone());
        let uncached = Optimizer::new(seeded_config());
        let request = OptimizeRequest::new(kitchen_run());

        let a = cached.optimize(&request).unwrap();
        let b = cached.optimize(&request).unwrap();
        let c = uncached.optimize(&request).unwrap();
        assert_eq!(a, b);
        for (x, y) in a.iter().zip(&c) {
            assert_eq!(x.result.sheets, y.result.sheets);
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_different_inputs_different_entries() {
        let cache = Arc::new(BoundedResultCache::with_capacity(2));
        let optimizer = Optimizer::new(seeded_config()).with_cache(cache.clone());
        for width in [500.0, 600.0, 700.0] {
            optimizer
                .optimize(&OptimizeRequest::new(vec![RawPanel::new("Top", width, 400.0)]))
                .unwrap();
        }
        assert_eq!(cache.len(), 2);
    }
}
