//! Material grouping.
//!
//! Parts are bucketed by a normalized `brand|||laminate` signature. Groups
//! are packed independently and never share a sheet.

use crate::mapper::detect_role;
use crate::panel::RawPanel;
use panelcut_core::{PanelRole, Part};

/// Separator between brand and laminate in a group key.
pub const KEY_SEPARATOR: &str = "|||";

/// Trims, lower-cases and collapses internal whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Group key of a raw panel.
///
/// Back panels are cut from plywood and use `backPanelPlywoodBrand` when set.
pub fn material_key(panel: &RawPanel) -> String {
    let brand = match (detect_role(&panel.name).0, &panel.back_panel_plywood_brand) {
        (PanelRole::Back, Some(back)) if !back.trim().is_empty() => back.as_str(),
        _ => panel.brand.as_str(),
    };
    format!(
        "{}{}{}",
        normalize(brand),
        KEY_SEPARATOR,
        normalize(&panel.laminate_code)
    )
}

/// Parts sharing one material signature.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialGroup {
    pub key: String,
    pub parts: Vec<Part>,
}

impl MaterialGroup {
    /// Normalized brand half of the key.
    pub fn brand(&self) -> &str {
        split_key(&self.key).0
    }

    /// Normalized laminate half of the key.
    pub fn laminate(&self) -> &str {
        split_key(&self.key).1
    }

    pub fn instance_count(&self) -> usize {
        self.parts.iter().map(|p| p.quantity).sum()
    }
}

/// Splits a group key into `(brand, laminate)`.
pub fn split_key(key: &str) -> (&str, &str) {
    key.split_once(KEY_SEPARATOR).unwrap_or((key, ""))
}

/// Buckets parts by [`Part::material`], in first-seen order.
pub fn group_parts(parts: Vec<Part>) -> Vec<MaterialGroup> {
    let mut groups: Vec<MaterialGroup> = Vec::new();
    for part in parts {
        match groups.iter_mut().find(|g| g.key == part.material) {
            Some(group) => group.parts.push(part),
            None => groups.push(MaterialGroup {
                key: part.material.clone(),
                parts: vec![part],
            }),
        }
    }
    groups
}
