//! Randomized local search over packing orders.

use crate::packer::{PackOutcome, SheetPacker};
use panelcut_core::{OrderingProblem, PartInstance};

/// Ordering problem binding a [`SheetPacker`] to a fixed set of instances.
pub struct PackingProblem<'a> {
    instances: &'a [PartInstance],
    packer: &'a SheetPacker,
    sheet_area: f64,
}

impl<'a> PackingProblem<'a> {
    pub fn new(instances: &'a [PartInstance], packer: &'a SheetPacker) -> Self {
        Self {
            instances,
            packer,
            sheet_area: packer.sheet().area(),
        }
    }

    fn by_aspect_desc(&self, a: usize, b: usize) -> std::cmp::Ordering {
        self.instances[b]
            .aspect_ratio()
            .total_cmp(&self.instances[a].aspect_ratio())
    }
}

impl OrderingProblem for PackingProblem<'_> {
    type Outcome = PackOutcome;

    fn len(&self) -> usize {
        self.instances.len()
    }

    /// Area descending, then aspect ratio descending. Stable on input order.
    fn base_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.instances.len()).collect();
        order.sort_by(|&a, &b| {
            self.instances[b]
                .area()
                .total_cmp(&self.instances[a].area())
                .then_with(|| self.by_aspect_desc(a, b))
        });
        order
    }

    fn reorder(&self, order: &mut [usize]) {
        order.sort_by(|&a, &b| self.by_aspect_desc(a, b));
    }

    fn evaluate(&self, order: &[usize]) -> PackOutcome {
        self.packer.pack(order.iter().map(|&i| &self.instances[i]))
    }

    fn cost(&self, outcome: &PackOutcome) -> f64 {
        outcome.cost(self.sheet_area)
    }
}
