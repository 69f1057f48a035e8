//! Greedy multi-sheet rectangle packer.
//!
//! Instances are placed one at a time in the given order. Each instance goes
//! to the best-scoring free rectangle across all open sheets; when none fits
//! a new sheet is opened, and an instance too large for an empty sheet is
//! reported as unplaced. The packer is deterministic for a given order.

use crate::free_rect::{FitScore, FreeRectArena};
use panelcut_core::{PackedSheet, PartInstance, Placement, Rect, Sheet, Strategy};

/// Packs ordered instances onto copies of one stock sheet.
#[derive(Debug, Clone)]
pub struct SheetPacker {
    sheet: Sheet,
    strategy: Strategy,
}

/// Outcome of packing one order.
#[derive(Debug, Clone, Default)]
pub struct PackOutcome {
    pub sheets: Vec<PackedSheet>,
    pub unplaced: Vec<PartInstance>,
}

impl PackOutcome {
    pub fn used_area(&self) -> f64 {
        self.sheets.iter().map(|s| s.used_area).sum()
    }

    pub fn unplaced_area(&self) -> f64 {
        self.unplaced.iter().map(PartInstance::area).sum()
    }

    pub fn placed_count(&self) -> usize {
        self.sheets.iter().map(|s| s.placements.len()).sum()
    }

    /// Search objective: waste, plus a heavy penalty per unit of unplaced
    /// area, plus a small per-sheet term preferring fewer sheets on ties.
    pub fn cost(&self, sheet_area: f64) -> f64 {
        let sheets = self.sheets.len() as f64;
        sheets * sheet_area - self.used_area()
            + UNPLACED_PENALTY * self.unplaced_area()
            + SHEET_PENALTY * sheets
    }
}

/// Cost weight per square millimetre of unplaced parts.
pub const UNPLACED_PENALTY: f64 = 1e6;

/// Cost weight per opened sheet.
pub const SHEET_PENALTY: f64 = 0.01;

/// A footprint the packer may try for an instance.
#[derive(Debug, Clone, Copy)]
struct Orientation {
    width: f64,
    height: f64,
    /// Turned 90 degrees from the instance's starting orientation.
    turned: bool,
}

struct Candidate {
    sheet: usize,
    slot: Rect,
    orientation: Orientation,
    score: FitScore,
}

struct OpenSheet {
    packed: PackedSheet,
    arena: FreeRectArena,
}

impl SheetPacker {
    pub fn new(sheet: Sheet, strategy: Strategy) -> Self {
        Self { sheet, strategy }
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns true if `instance` fits an empty sheet in some allowed orientation.
    pub fn fits_empty_sheet(&self, instance: &PartInstance) -> bool {
        self.orientations(instance)
            .iter()
            .any(|o| self.sheet.can_hold(o.width, o.height))
    }

    /// Packs `instances` in the given order.
    pub fn pack<'a, I>(&self, instances: I) -> PackOutcome
    where
        I: IntoIterator<Item = &'a PartInstance>,
    {
        let mut open: Vec<OpenSheet> = Vec::new();
        let mut unplaced = Vec::new();

        for instance in instances {
            if let Some(candidate) = self.best_candidate(&open, instance) {
                Self::commit(&mut open[candidate.sheet], instance, &candidate, self.sheet.kerf);
                continue;
            }

            if !self.fits_empty_sheet(instance) {
                unplaced.push(instance.clone());
                continue;
            }

            let index = open.len();
            open.push(OpenSheet {
                packed: PackedSheet::new(format!("sheet::{index}"), index, &self.sheet),
                arena: FreeRectArena::new(&self.sheet),
            });
            match self.best_candidate(&open[index..], instance) {
                Some(mut candidate) => {
                    candidate.sheet = index;
                    Self::commit(&mut open[index], instance, &candidate, self.sheet.kerf);
                }
                None => {
                    // An empty arena holds anything the sheet holds; only
                    // tolerance edge cases land here.
                    open.pop();
                    unplaced.push(instance.clone());
                }
            }
        }

        let sheets = open
            .into_iter()
            .map(|s| {
                let mut packed = s.packed;
                packed.free_rects = s.arena.into_rects();
                packed
            })
            .collect();

        PackOutcome { sheets, unplaced }
    }

    fn orientations(&self, instance: &PartInstance) -> Vec<Orientation> {
        let upright = Orientation {
            width: instance.width(),
            height: instance.height(),
            turned: false,
        };
        let square = (upright.width - upright.height).abs() <= panelcut_core::EPSILON;
        if instance.rotate_allowed() && !square {
            vec![
                upright,
                Orientation {
                    width: upright.height,
                    height: upright.width,
                    turned: true,
                },
            ]
        } else {
            vec![upright]
        }
    }

    /// Best fit across `open`; ties keep the earlier sheet and orientation.
    fn best_candidate(&self, open: &[OpenSheet], instance: &PartInstance) -> Option<Candidate> {
        let kerf = self.sheet.kerf;
        let mut best: Option<Candidate> = None;

        for orientation in self.orientations(instance) {
            let slot_w = orientation.width + kerf;
            let slot_h = orientation.height + kerf;
            for (sheet, state) in open.iter().enumerate() {
                let Some(fit) = state.arena.find_slot(slot_w, slot_h, self.strategy) else {
                    continue;
                };
                let better = match best {
                    Some(ref current) => fit.score.is_better_than(&current.score),
                    None => true,
                };
                if better {
                    best = Some(Candidate {
                        sheet,
                        slot: fit.slot,
                        orientation,
                        score: fit.score,
                    });
                }
            }
        }
        best
    }

    fn commit(state: &mut OpenSheet, instance: &PartInstance, candidate: &Candidate, kerf: f64) {
        let footprint = candidate.slot.inset(kerf / 2.0);
        state.arena.occupy(&candidate.slot);
        state.packed.placements.push(Placement {
            instance_id: instance.id.clone(),
            part: instance.part.clone(),
            x: footprint.x,
            y: footprint.y,
            width: candidate.orientation.width,
            height: candidate.orientation.height,
            rotated: instance.pre_rotated != candidate.orientation.turned,
        });
        state.packed.used_area += candidate.orientation.width * candidate.orientation.height;
    }
}
