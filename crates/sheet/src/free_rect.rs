//! Free-rectangle bookkeeping for a single sheet.
//!
//! The arena keeps the empty space of a sheet as a set of pairwise disjoint
//! axis-aligned rectangles. Coordinates are packer coordinates: the arena
//! starts as the sheet grown by half a kerf on every side, and every slot it
//! hands out is a part footprint grown by a full kerf.

use panelcut_core::{Rect, Sheet, Strategy, EPSILON};
use std::cmp::Ordering;

/// Score of a candidate slot. Compared lexicographically, lower is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitScore {
    pub primary: f64,
    pub short_side: f64,
    pub long_side: f64,
}

impl FitScore {
    /// Scores a `width` x `height` slot inside `free`.
    pub fn new(free: &Rect, width: f64, height: f64, strategy: Strategy) -> Self {
        let leftover_x = (free.width - width).max(0.0);
        let leftover_y = (free.height - height).max(0.0);
        let short_side = leftover_x.min(leftover_y);
        let long_side = leftover_x.max(leftover_y);
        let primary = match strategy {
            Strategy::BestAreaFit => (free.area() - width * height).max(0.0),
            Strategy::BestShortSideFit => short_side,
            Strategy::BestLongSideFit => long_side,
        };
        Self {
            primary,
            short_side,
            long_side,
        }
    }

    /// Both leftover sides vanish.
    #[inline]
    pub fn is_perfect(&self) -> bool {
        self.long_side <= EPSILON
    }

    pub fn compare(&self, other: &FitScore) -> Ordering {
        self.primary
            .total_cmp(&other.primary)
            .then(self.short_side.total_cmp(&other.short_side))
            .then(self.long_side.total_cmp(&other.long_side))
    }

    #[inline]
    pub fn is_better_than(&self, other: &FitScore) -> bool {
        self.compare(other) == Ordering::Less
    }
}

/// Best slot found in an arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotFit {
    /// Index of the free rectangle the slot sits in.
    pub index: usize,
    /// Slot anchored at the free rectangle's lower-left corner.
    pub slot: Rect,
    pub score: FitScore,
}

/// Disjoint free rectangles of one sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FreeRectArena {
    rects: Vec<Rect>,
}

impl FreeRectArena {
    /// Arena of an empty sheet.
    pub fn new(sheet: &Sheet) -> Self {
        let half = sheet.kerf / 2.0;
        Self {
            rects: vec![Rect::new(
                -half,
                -half,
                sheet.width + sheet.kerf,
                sheet.height + sheet.kerf,
            )],
        }
    }

    /// Arena over an arbitrary set of free rectangles.
    pub fn from_rects(rects: Vec<Rect>) -> Self {
        let mut arena = Self { rects };
        arena.prune();
        arena.merge();
        arena
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn into_rects(self) -> Vec<Rect> {
        self.rects
    }

    /// Total free area.
    pub fn free_area(&self) -> f64 {
        self.rects.iter().map(Rect::area).sum()
    }

    /// Finds the best slot for a `width` x `height` footprint.
    ///
    /// Ties keep the earlier rectangle. A perfect fit ends the scan.
    pub fn find_slot(&self, width: f64, height: f64, strategy: Strategy) -> Option<SlotFit> {
        let mut best: Option<SlotFit> = None;
        for (index, free) in self.rects.iter().enumerate() {
            if !free.fits(width, height) {
                continue;
            }
            let score = FitScore::new(free, width, height, strategy);
            let candidate = SlotFit {
                index,
                slot: Rect::new(free.x, free.y, width, height),
                score,
            };
            if score.is_perfect() {
                return Some(candidate);
            }
            match best {
                Some(ref current) if !score.is_better_than(&current.score) => {}
                _ => best = Some(candidate),
            }
        }
        best
    }

    /// Removes `used` from the free space.
    pub fn occupy(&mut self, used: &Rect) {
        let mut next = Vec::with_capacity(self.rects.len() + 3);
        for free in self.rects.drain(..) {
            match free.intersection(used) {
                Some(cut) => next.extend(split(&free, &cut)),
                None => next.push(free),
            }
        }
        self.rects = next;
        self.prune();
        self.merge();
    }

    /// Drops degenerate rectangles and rectangles contained in another one.
    pub fn prune(&mut self) {
        self.rects.retain(|r| !r.is_degenerate());
        let mut i = 0;
        while i < self.rects.len() {
            let rect = self.rects[i];
            // Of two identical rectangles only the first survives.
            let contained = self.rects.iter().enumerate().any(|(j, other)| {
                j != i && other.contains(&rect) && (j < i || !rect.contains(other))
            });
            if contained {
                self.rects.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Merges rectangles sharing a full edge until no pair merges.
    pub fn merge(&mut self) {
        loop {
            let mut merged = None;
            'scan: for i in 0..self.rects.len() {
                for j in (i + 1)..self.rects.len() {
                    if let Some(rect) = join(&self.rects[i], &self.rects[j]) {
                        merged = Some((i, j, rect));
                        break 'scan;
                    }
                }
            }
            match merged {
                Some((i, j, rect)) => {
                    self.rects.swap_remove(j);
                    self.rects[i] = rect;
                }
                None => break,
            }
        }
    }
}

/// Partitions `free` minus `cut` into at most four disjoint slices.
///
/// Two partitions exist: full-height side slices with clipped top and bottom,
/// or full-width top and bottom slices with clipped sides. The one whose
/// largest slice is bigger wins, keeping big offcuts intact.
fn split(free: &Rect, cut: &Rect) -> Vec<Rect> {
    let left_w = cut.x - free.x;
    let right_w = free.right() - cut.right();
    let bottom_h = cut.y - free.y;
    let top_h = free.top() - cut.top();

    let vertical = [
        Rect::new(free.x, free.y, left_w, free.height),
        Rect::new(cut.right(), free.y, right_w, free.height),
        Rect::new(cut.x, free.y, cut.width, bottom_h),
        Rect::new(cut.x, cut.top(), cut.width, top_h),
    ];
    let horizontal = [
        Rect::new(free.x, free.y, free.width, bottom_h),
        Rect::new(free.x, cut.top(), free.width, top_h),
        Rect::new(free.x, cut.y, left_w, cut.height),
        Rect::new(cut.right(), cut.y, right_w, cut.height),
    ];

    let largest = |slices: &[Rect; 4]| {
        slices
            .iter()
            .filter(|r| !r.is_degenerate())
            .map(Rect::area)
            .fold(0.0, f64::max)
    };

    let chosen = if largest(&horizontal) > largest(&vertical) {
        horizontal
    } else {
        vertical
    };
    chosen.into_iter().filter(|r| !r.is_degenerate()).collect()
}

/// Union of two rectangles when it is itself a rectangle sharing a full edge.
fn join(a: &Rect, b: &Rect) -> Option<Rect> {
    let close = |p: f64, q: f64| (p - q).abs() <= EPSILON;

    if close(a.x, b.x) && close(a.width, b.width) {
        if close(a.top(), b.y) {
            return Some(Rect::new(a.x, a.y, a.width, b.top() - a.y));
        }
        if close(b.top(), a.y) {
            return Some(Rect::new(a.x, b.y, a.width, a.top() - b.y));
        }
    }
    if close(a.y, b.y) && close(a.height, b.height) {
        if close(a.right(), b.x) {
            return Some(Rect::new(a.x, a.y, b.right() - a.x, a.height));
        }
        if close(b.right(), a.x) {
            return Some(Rect::new(b.x, a.y, a.right() - b.x, a.height));
        }
    }
    None
}
