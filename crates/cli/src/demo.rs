//! Synthetic kitchen cabinet panel generator.
//!
//! Produces the raw panel descriptors a cabinet generator would emit for a
//! run of base cabinets: carcass, shelf, back and shutters.

use panelcut_cabinet::RawPanel;
use rand::prelude::*;

const WIDTHS: [f64; 5] = [450.0, 600.0, 750.0, 900.0, 1050.0];
const LAMINATES: [&str; 3] = ["Walnut 1234 + PVC", "Gloss White", "Oak Natural"];
const BRANDS: [&str; 2] = ["Century Ply", "Green Ply"];

const DEPTH: f64 = 560.0;
const HEIGHT: f64 = 720.0;
const BOARD: f64 = 18.0;
const SHUTTER_GAP: f64 = 3.0;

/// Generator for synthetic cabinet runs.
#[derive(Debug, Clone)]
pub struct KitchenGenerator {
    rng: StdRng,
}

impl KitchenGenerator {
    /// Creates a new generator with a random seed.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a new generator with a specific seed for reproducibility.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Panels for `count` base cabinets sharing one carcass material.
    pub fn cabinets(&mut self, count: usize) -> Vec<RawPanel> {
        let brand = BRANDS[self.rng.gen_range(0..BRANDS.len())];
        let carcass = LAMINATES[self.rng.gen_range(0..LAMINATES.len())];
        let mut panels = Vec::with_capacity(count * 8);
        let mut shutter_no = 0;

        for _ in 0..count {
            let width = WIDTHS[self.rng.gen_range(0..WIDTHS.len())];
            let inner = width - 2.0 * BOARD;
            let part = |name: &str, w: f64, h: f64| {
                RawPanel::new(name, w, h)
                    .with_brand(brand)
                    .with_laminate(carcass)
            };

            panels.push(part("Top", inner, DEPTH));
            panels.push(part("Bottom", inner, DEPTH));
            panels.push(part("Left Side", DEPTH, HEIGHT).with_grain(true));
            panels.push(part("Right Side", DEPTH, HEIGHT).with_grain(true));
            panels.push(part("Shelf", inner - 2.0, DEPTH - 20.0));
            panels.push(
                part("Back", width, HEIGHT)
                    .with_back_brand(BRANDS[self.rng.gen_range(0..BRANDS.len())]),
            );

            let doors = if width > 600.0 { 2 } else { 1 };
            let finish = LAMINATES[self.rng.gen_range(0..LAMINATES.len())];
            let door_width = (width / doors as f64 - SHUTTER_GAP).floor();
            for _ in 0..doors {
                shutter_no += 1;
                panels.push(
                    RawPanel::new(format!("Shutter {}", shutter_no), door_width, HEIGHT - SHUTTER_GAP)
                        .with_brand(brand)
                        .with_laminate(finish)
                        .with_gaddi(true),
                );
            }
        }

        if count > 1 && self.rng.gen_bool(0.5) {
            panels.push(
                RawPanel::new("Centre Post", 100.0, HEIGHT)
                    .with_brand(brand)
                    .with_laminate(carcass),
            );
        }
        panels
    }
}

impl Default for KitchenGenerator {
    fn default() -> Self {
        Self::new()
    }
}
