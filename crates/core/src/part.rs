//! Parts and their physical instances.

use crate::geometry::EPSILON;
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Largest quantity accepted for a single part.
pub const MAX_QUANTITY: usize = 10_000;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Functional role of a cabinet panel. Drives axis mapping and id prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PanelRole {
    Top,
    Bottom,
    Left,
    Right,
    Back,
    Shelf,
    Shutter,
    CenterPost,
    #[default]
    Generic,
}

impl PanelRole {
    pub const ALL: [PanelRole; 9] = [
        PanelRole::Top,
        PanelRole::Bottom,
        PanelRole::Left,
        PanelRole::Right,
        PanelRole::Back,
        PanelRole::Shelf,
        PanelRole::Shutter,
        PanelRole::CenterPost,
        PanelRole::Generic,
    ];

    /// Prefix used for role-scoped part ids (`TOP_1`, `SHUTTER_2`, ...).
    pub fn id_prefix(self) -> &'static str {
        match self {
            PanelRole::Top => "TOP",
            PanelRole::Bottom => "BOTTOM",
            PanelRole::Left => "LEFT",
            PanelRole::Right => "RIGHT",
            PanelRole::Back => "BACK",
            PanelRole::Shelf => "SHELF",
            PanelRole::Shutter => "SHUTTER",
            PanelRole::CenterPost => "CENTER_POST",
            PanelRole::Generic => "PANEL",
        }
    }

    /// Horizontal carcass panels whose depth runs along the sheet X axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, PanelRole::Top | PanelRole::Bottom | PanelRole::Shelf)
    }

    /// Vertical carcass sides.
    pub fn is_side(self) -> bool {
        matches!(self, PanelRole::Left | PanelRole::Right)
    }
}

impl fmt::Display for PanelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id_prefix())
    }
}

/// A logical cut piece, already mapped onto the packer's X/Y axes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Part {
    pub id: String,
    /// Extent along the sheet X axis.
    pub width: f64,
    /// Extent along the sheet Y axis.
    pub height: f64,
    pub quantity: usize,
    /// False when the grain must run a fixed direction.
    pub rotate_allowed: bool,
    /// Width before axis mapping, kept for display.
    pub nominal_width: f64,
    /// Height before axis mapping, kept for display.
    pub nominal_height: f64,
    /// Normalized `brand|||laminate` signature.
    #[cfg_attr(feature = "serde", serde(default))]
    pub material: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub role: PanelRole,
    /// Edge-banding (gaddi) marker, passed through to placements untouched.
    #[cfg_attr(feature = "serde", serde(default))]
    pub edge_banding: bool,
    /// Human-readable label such as `Shutter 2`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String,
}

impl Part {
    /// Creates a rotatable generic part; nominal dimensions equal the packer dimensions.
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            width,
            height,
            quantity: 1,
            rotate_allowed: true,
            nominal_width: width,
            nominal_height: height,
            material: String::new(),
            role: PanelRole::Generic,
            edge_banding: false,
        }
    }

    pub fn with_quantity(mut self, quantity: usize) -> Self {
        self.quantity = quantity;
        self
    }

    /// Allows or forbids 90 degree rotation.
    pub fn with_rotation(mut self, allowed: bool) -> Self {
        self.rotate_allowed = allowed;
        self
    }

    pub fn with_nominal(mut self, width: f64, height: f64) -> Self {
        self.nominal_width = width;
        self.nominal_height = height;
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = material.into();
        self
    }

    pub fn with_role(mut self, role: PanelRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_edge_banding(mut self, edge_banding: bool) -> Self {
        self.edge_banding = edge_banding;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Checks the `width > 0 && height > 0` invariant.
    pub fn validate(&self) -> Result<()> {
        if !self.width.is_finite() || !self.height.is_finite() {
            return Err(Error::InvalidPart(format!(
                "part {} has non-finite dimensions",
                self.id
            )));
        }
        if self.width <= EPSILON || self.height <= EPSILON {
            return Err(Error::InvalidPart(format!(
                "part {} has zero area ({}x{})",
                self.id, self.width, self.height
            )));
        }
        if self.quantity > MAX_QUANTITY {
            return Err(Error::InvalidPart(format!(
                "part {} quantity {} exceeds {}",
                self.id, self.quantity, MAX_QUANTITY
            )));
        }
        Ok(())
    }
}

/// One physical copy of a [`Part`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PartInstance {
    /// `"{part.id}#{copy_index}"`.
    pub id: String,
    pub part: Arc<Part>,
    pub copy_index: usize,
    /// Start from the part's 90 degree orientation. Used when an existing
    /// placement is fed back into the packer.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pre_rotated: bool,
}

impl PartInstance {
    pub fn new(part: Arc<Part>, copy_index: usize) -> Self {
        Self {
            id: format!("{}#{}", part.id, copy_index),
            part,
            copy_index,
            pre_rotated: false,
        }
    }

    pub fn with_pre_rotation(mut self, pre_rotated: bool) -> Self {
        self.pre_rotated = pre_rotated;
        self
    }

    /// Footprint width in the starting orientation.
    #[inline]
    pub fn width(&self) -> f64 {
        if self.pre_rotated {
            self.part.height
        } else {
            self.part.width
        }
    }

    /// Footprint height in the starting orientation.
    #[inline]
    pub fn height(&self) -> f64 {
        if self.pre_rotated {
            self.part.width
        } else {
            self.part.height
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.part.area()
    }

    #[inline]
    pub fn rotate_allowed(&self) -> bool {
        self.part.rotate_allowed
    }

    /// Long side over short side (always >= 1).
    pub fn aspect_ratio(&self) -> f64 {
        let long = self.part.width.max(self.part.height);
        let short = self.part.width.min(self.part.height);
        if short > 0.0 {
            long / short
        } else {
            f64::INFINITY
        }
    }
}

/// Expands part quantities into individual instances, preserving input order.
///
/// Quantities are trusted; run parts through [`Part::validate`] first.
pub fn expand_instances(parts: &[Part]) -> Vec<PartInstance> {
    let mut instances = Vec::new();
    for part in parts {
        let shared = Arc::new(part.clone());
        for copy in 0..part.quantity {
            instances.push(PartInstance::new(Arc::clone(&shared), copy));
        }
    }
    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_part_builder() {
        let part = Part::new("TOP_1", 450.0, 800.0)
            .with_quantity(2)
            .with_rotation(false)
            .with_nominal(800.0, 450.0)
            .with_role(PanelRole::Top)
            .with_material("oak|||w101");

        assert_eq!(part.quantity, 2);
        assert!(!part.rotate_allowed);
        assert_relative_eq!(part.nominal_width, 800.0);
        assert_relative_eq!(part.area(), 360_000.0);
        assert_eq!(part.role.id_prefix(), "TOP");
        assert!(part.validate().is_ok());
    }

    #[test]
    fn test_zero_area_part_is_invalid() {
        assert!(Part::new("a", 0.0, 100.0).validate().is_err());
        assert!(Part::new("b", 100.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_quantity_cap() {
        assert!(Part::new("a", 10.0, 10.0).with_quantity(MAX_QUANTITY).validate().is_ok());
        let err = Part::new("b", 10.0, 10.0)
            .with_quantity(usize::MAX)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPart(_)));
    }

    #[test]
    fn test_expand_instances_ids() {
        let parts = vec![
            Part::new("A", 10.0, 20.0).with_quantity(3),
            Part::new("B", 5.0, 5.0).with_quantity(0),
            Part::new("C", 1.0, 2.0),
        ];
        let instances = expand_instances(&parts);
        let ids: Vec<&str> = instances.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["A#0", "A#1", "A#2", "C#0"]);
    }

    #[test]
    fn test_pre_rotated_footprint() {
        let inst = PartInstance::new(Arc::new(Part::new("A", 10.0, 30.0)), 0).with_pre_rotation(true);
        assert_relative_eq!(inst.width(), 30.0);
        assert_relative_eq!(inst.height(), 10.0);
        assert_relative_eq!(inst.aspect_ratio(), 3.0);
    }

    #[test]
    fn test_role_classification() {
        assert!(PanelRole::Shelf.is_horizontal());
        assert!(PanelRole::Right.is_side());
        assert!(!PanelRole::Back.is_horizontal());
        assert_eq!(PanelRole::CenterPost.to_string(), "CENTER_POST");
    }
}
