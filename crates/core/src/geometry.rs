//! Rectangle primitives and sheet stock.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Geometric tolerance in millimetres.
pub const EPSILON: f64 = 1e-4;

/// Axis-aligned rectangle with its origin at the lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Top edge.
    #[inline]
    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Returns true when either side is within tolerance of zero.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width <= EPSILON || self.height <= EPSILON
    }

    /// Returns true if the interiors intersect by more than [`EPSILON`] on both axes.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right() - EPSILON
            && other.x < self.right() - EPSILON
            && self.y < other.top() - EPSILON
            && other.y < self.top() - EPSILON
    }

    /// Returns true if `other` lies entirely inside `self` (with tolerance).
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.top() <= self.top() + EPSILON
    }

    /// Returns true if a `width` x `height` footprint fits inside this rectangle.
    #[inline]
    pub fn fits(&self, width: f64, height: f64) -> bool {
        width <= self.width + EPSILON && height <= self.height + EPSILON
    }

    /// Shrinks the rectangle by `amount` on every side.
    pub fn inset(&self, amount: f64) -> Rect {
        Rect::new(
            self.x + amount,
            self.y + amount,
            self.width - 2.0 * amount,
            self.height - 2.0 * amount,
        )
    }

    /// Intersection of two rectangles, if it has positive area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let top = self.top().min(other.top());
        let rect = Rect::new(x, y, right - x, top - y);
        if rect.is_degenerate() {
            None
        } else {
            Some(rect)
        }
    }
}

/// Stock sheet the parts are cut from. Immutable for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sheet {
    /// Sheet width in millimetres (packer X axis).
    pub width: f64,
    /// Sheet height in millimetres (packer Y axis).
    pub height: f64,
    /// Saw blade width in millimetres.
    #[cfg_attr(feature = "serde", serde(default))]
    pub kerf: f64,
}

impl Sheet {
    /// Default blade width used by the presets.
    pub const DEFAULT_KERF: f64 = 4.0;

    pub fn new(width: f64, height: f64, kerf: f64) -> Self {
        Self {
            width,
            height,
            kerf,
        }
    }

    /// 1220 x 2440 mm plywood stock (8 x 4 ft).
    pub fn standard() -> Self {
        Self::new(1220.0, 2440.0, Self::DEFAULT_KERF)
    }

    /// 1210 x 2420 mm plywood stock.
    pub fn standard_1210() -> Self {
        Self::new(1210.0, 2420.0, Self::DEFAULT_KERF)
    }

    /// Sets the kerf.
    pub fn with_kerf(mut self, kerf: f64) -> Self {
        self.kerf = kerf;
        self
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Returns true if a `width` x `height` part fits on an empty sheet.
    pub fn can_hold(&self, width: f64, height: f64) -> bool {
        width <= self.width + EPSILON && height <= self.height + EPSILON
    }

    /// Checks that dimensions are finite and positive and the kerf is non-negative.
    pub fn validate(&self) -> Result<()> {
        if !self.width.is_finite() || !self.height.is_finite() || !self.kerf.is_finite() {
            return Err(Error::InvalidSheet(format!(
                "non-finite sheet dimensions {}x{} kerf {}",
                self.width, self.height, self.kerf
            )));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::InvalidSheet(format!(
                "sheet dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.kerf < 0.0 {
            return Err(Error::InvalidSheet(format!(
                "kerf must not be negative, got {}",
                self.kerf
            )));
        }
        if self.kerf >= self.width.min(self.height) {
            return Err(Error::InvalidSheet(format!(
                "kerf {} leaves no usable area on a {}x{} sheet",
                self.kerf, self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::standard()
    }
}
