//! Dimensional mapper: raw panels to packer parts.
//!
//! Cabinet generators describe a panel by its nominal width and height as a
//! carpenter would, which does not say how it lies on the sheet. The mapper
//! assigns sheet axes by role so the grain runs the right way:
//!
//! | Role | X (sheet width) | Y (sheet height) |
//! |------|-----------------|------------------|
//! | top, bottom, shelf | depth (nominal height) | width |
//! | left, right | depth (nominal width) | height |
//! | back | width | height |
//! | shutter, center post, other | nominal width | nominal height |

use crate::grouping::material_key;
use crate::panel::RawPanel;
use once_cell::sync::Lazy;
use panelcut_core::{PanelRole, Part, EPSILON, MAX_QUANTITY};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// Laminate key to grain-sensitivity flag.
pub type GrainPreferences = BTreeMap<String, bool>;

static SHUTTER_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)shutter\s*(\d+)").expect("shutter pattern is valid"));

/// Detects the role named in `name`, plus the shutter number if present.
pub fn detect_role(name: &str) -> (PanelRole, Option<u32>) {
    let lower = name.to_lowercase();
    if lower.contains("shutter") {
        let number = SHUTTER_NUMBER
            .captures(name)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok());
        return (PanelRole::Shutter, number);
    }
    let role = if (lower.contains("center") || lower.contains("centre")) && lower.contains("post")
    {
        PanelRole::CenterPost
    } else if lower.contains("back") {
        PanelRole::Back
    } else if lower.contains("top") {
        PanelRole::Top
    } else if lower.contains("bottom") {
        PanelRole::Bottom
    } else if lower.contains("shelf") {
        PanelRole::Shelf
    } else if lower.contains("left") {
        PanelRole::Left
    } else if lower.contains("right") {
        PanelRole::Right
    } else {
        PanelRole::Generic
    };
    (role, None)
}

/// Preference-map key of a laminate code: the part before `+`, trimmed and lower-cased.
pub fn laminate_key(code: &str) -> String {
    code.split('+').next().unwrap_or("").trim().to_lowercase()
}

/// Rekeys `preferences` by [`laminate_key`]. Keys that collapse together lock if any of them does.
pub fn normalize_grain_preferences(preferences: &GrainPreferences) -> GrainPreferences {
    let mut normalized = GrainPreferences::new();
    for (code, &locked) in preferences {
        let entry = normalized.entry(laminate_key(code)).or_insert(false);
        *entry |= locked;
    }
    normalized
}

/// Maps raw panels to parts, numbering ids per role across one batch.
pub struct DimensionalMapper {
    grain_preferences: GrainPreferences,
    id_prefix: Option<String>,
    counters: HashMap<PanelRole, usize>,
}

impl DimensionalMapper {
    pub fn new(grain_preferences: &GrainPreferences) -> Self {
        Self {
            grain_preferences: normalize_grain_preferences(grain_preferences),
            id_prefix: None,
            counters: HashMap::new(),
        }
    }

    /// Prefixes every id, e.g. `MANUAL_TOP_1`.
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = Some(prefix.into());
        self
    }

    /// Continues numbering after ids already in use, so `TOP_3` makes the next top `TOP_4`.
    /// Ids that do not follow this mapper's prefix are ignored.
    pub fn reserve_ids<'b>(&mut self, ids: impl IntoIterator<Item = &'b str>) {
        for id in ids {
            let rest = match &self.id_prefix {
                Some(prefix) => id
                    .strip_prefix(prefix.as_str())
                    .and_then(|r| r.strip_prefix('_')),
                None => Some(id),
            };
            let Some(rest) = rest else {
                continue;
            };
            for role in PanelRole::ALL {
                let Some(number) = rest
                    .strip_prefix(role.id_prefix())
                    .and_then(|r| r.strip_prefix('_'))
                    .and_then(|n| n.parse::<usize>().ok())
                else {
                    continue;
                };
                let counter = self.counters.entry(role).or_insert(0);
                *counter = (*counter).max(number);
            }
        }
    }

    /// Returns true if `panel` must keep its grain direction.
    pub fn grain_locked(&self, panel: &RawPanel) -> bool {
        panel.grain
            || self
                .grain_preferences
                .get(&laminate_key(&panel.laminate_code))
                .copied()
                .unwrap_or(false)
    }

    /// Maps one panel. Returns `None` for panels without usable area.
    pub fn map(&mut self, panel: &RawPanel) -> Option<Part> {
        let Some((nominal_w, nominal_h)) = panel.nominal_dimensions() else {
            log::warn!("dropping panel {:?}: no usable dimensions", panel.name);
            return None;
        };
        if nominal_w <= EPSILON || nominal_h <= EPSILON {
            log::warn!(
                "dropping panel {:?}: zero area ({}x{})",
                panel.name,
                nominal_w,
                nominal_h
            );
            return None;
        }
        let quantity = panel.quantity.unwrap_or(1);
        if quantity == 0 {
            log::debug!("panel {:?} has quantity 0, skipping", panel.name);
            return None;
        }
        if quantity > MAX_QUANTITY {
            log::warn!(
                "dropping panel {:?}: quantity {} exceeds {}",
                panel.name,
                quantity,
                MAX_QUANTITY
            );
            return None;
        }

        let (role, shutter_number) = detect_role(&panel.name);
        let (width, height) = if role.is_horizontal() {
            (nominal_h, nominal_w)
        } else {
            (nominal_w, nominal_h)
        };

        let counter = self.counters.entry(role).or_insert(0);
        *counter += 1;
        let id = match &self.id_prefix {
            Some(prefix) => format!("{}_{}_{}", prefix, role.id_prefix(), counter),
            None => format!("{}_{}", role.id_prefix(), counter),
        };

        let label = match shutter_number {
            Some(n) => format!("Shutter {}", n),
            None if panel.name.trim().is_empty() => id.clone(),
            None => panel.name.trim().to_string(),
        };

        Some(
            Part::new(id, width, height)
                .with_quantity(quantity)
                .with_rotation(!self.grain_locked(panel))
                .with_nominal(nominal_w, nominal_h)
                .with_material(material_key(panel))
                .with_role(role)
                .with_edge_banding(panel.gaddi)
                .with_label(label),
        )
    }

    /// Maps a batch, dropping unusable panels.
    pub fn map_all(&mut self, panels: &[RawPanel]) -> Vec<Part> {
        panels.iter().filter_map(|p| self.map(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn map_one(panel: RawPanel) -> Part {
        let prefs = GrainPreferences::new();
        DimensionalMapper::new(&prefs).map(&panel).unwrap()
    }

    #[test]
    fn test_role_detection() {
        assert_eq!(detect_role("TOP"), (PanelRole::Top, None));
        assert_eq!(detect_role("Bottom Panel"), (PanelRole::Bottom, None));
        assert_eq!(detect_role("Left Side"), (PanelRole::Left, None));
        assert_eq!(detect_role("right side"), (PanelRole::Right, None));
        assert_eq!(detect_role("Back"), (PanelRole::Back, None));
        assert_eq!(detect_role("Shelf 2"), (PanelRole::Shelf, None));
        assert_eq!(detect_role("Centre Post"), (PanelRole::CenterPost, None));
        assert_eq!(detect_role("Shutter 3"), (PanelRole::Shutter, Some(3)));
        assert_eq!(detect_role("shutter"), (PanelRole::Shutter, None));
        assert_eq!(detect_role("Drawer front"), (PanelRole::Generic, None));
    }

    #[test]
    fn test_top_swaps_axes() {
        let part = map_one(RawPanel::new("Top", 800.0, 450.0));
        assert_relative_eq!(part.width, 450.0);
        assert_relative_eq!(part.height, 800.0);
        assert_relative_eq!(part.nominal_width, 800.0);
        assert_relative_eq!(part.nominal_height, 450.0);
        assert_eq!(part.id, "TOP_1");
    }

    #[test]
    fn test_back_is_identity() {
        let part = map_one(RawPanel::new("Back", 800.0, 2000.0));
        assert_relative_eq!(part.width, 800.0);
        assert_relative_eq!(part.height, 2000.0);
        assert_eq!(part.role, PanelRole::Back);
    }

    #[test]
    fn test_side_is_identity() {
        let part = map_one(RawPanel::new("Left", 560.0, 720.0));
        assert_relative_eq!(part.width, 560.0);
        assert_relative_eq!(part.height, 720.0);
    }

    #[test]
    fn test_grain_lock_sources() {
        let mut prefs = GrainPreferences::new();
        prefs.insert("w101".to_string(), true);
        let mut mapper = DimensionalMapper::new(&prefs);

        let own = mapper.map(&RawPanel::new("Left", 560.0, 720.0).with_grain(true)).unwrap();
        assert!(!own.rotate_allowed);

        let by_pref = mapper
            .map(&RawPanel::new("Left", 560.0, 720.0).with_laminate(" W101 + 0.8mm edge"))
            .unwrap();
        assert!(!by_pref.rotate_allowed);

        let free = mapper
            .map(&RawPanel::new("Left", 560.0, 720.0).with_laminate("W202"))
            .unwrap();
        assert!(free.rotate_allowed);
        assert_eq!(free.id, "LEFT_3");
    }

    #[test]
    fn test_ids_and_labels() {
        let prefs = GrainPreferences::new();
        let mut mapper = DimensionalMapper::new(&prefs).with_id_prefix("MANUAL");
        let parts = mapper.map_all(&[
            RawPanel::new("Shutter 3", 447.0, 717.0),
            RawPanel::new("Shutter 4", 447.0, 717.0),
            RawPanel::new("Top", 900.0, 560.0),
        ]);
        let ids: Vec<&str> = parts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["MANUAL_SHUTTER_1", "MANUAL_SHUTTER_2", "MANUAL_TOP_1"]);
        assert_eq!(parts[0].label, "Shutter 3");
        assert_eq!(parts[2].label, "Top");
    }

    #[test]
    fn test_reserved_ids_continue_numbering() {
        let prefs = GrainPreferences::new();
        let mut mapper = DimensionalMapper::new(&prefs).with_id_prefix("MANUAL");
        mapper.reserve_ids(["MANUAL_SHELF_2", "SHELF_9", "MANUAL_CENTER_POST_1", "TOP_1"]);
        let parts = mapper.map_all(&[
            RawPanel::new("Shelf", 500.0, 400.0),
            RawPanel::new("Centre post", 100.0, 700.0),
            RawPanel::new("Top", 900.0, 560.0),
        ]);
        let ids: Vec<&str> = parts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["MANUAL_SHELF_3", "MANUAL_CENTER_POST_2", "MANUAL_TOP_1"]);
    }

    #[test]
    fn test_zero_area_and_fallback() {
        let prefs = GrainPreferences::new();
        let mut mapper = DimensionalMapper::new(&prefs);
        assert!(mapper.map(&RawPanel::new("Top", 0.0, 450.0)).is_none());
        assert!(mapper
            .map(&RawPanel::new("Top", 900.0, 450.0).with_quantity(usize::MAX))
            .is_none());

        let plain = RawPanel {
            name: "Shelf".into(),
            width: Some(600.0),
            height: Some(300.0),
            ..RawPanel::default()
        };
        let part = mapper.map(&plain).unwrap();
        assert_relative_eq!(part.width, 300.0);
        assert_relative_eq!(part.height, 600.0);
    }

    #[test]
    fn test_grain_preference_keys_normalized() {
        let mut prefs = GrainPreferences::new();
        prefs.insert("W101".to_string(), true);
        prefs.insert(" Oak 7 + PVC ".to_string(), true);
        prefs.insert("oak 7".to_string(), false);
        let mut mapper = DimensionalMapper::new(&prefs);

        let upper = mapper
            .map(&RawPanel::new("Left", 560.0, 720.0).with_laminate("W101"))
            .unwrap();
        assert!(!upper.rotate_allowed);

        let suffixed = mapper
            .map(&RawPanel::new("Left", 560.0, 720.0).with_laminate("OAK 7"))
            .unwrap();
        assert!(!suffixed.rotate_allowed);

        let normalized = normalize_grain_preferences(&prefs);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized.get("oak 7"), Some(&true));
        assert_eq!(normalized.get("w101"), Some(&true));
    }

    #[test]
    fn test_laminate_key() {
        assert_eq!(laminate_key("  Walnut 1234 + PVC "), "walnut 1234");
        assert_eq!(laminate_key("OAK"), "oak");
        assert_eq!(laminate_key(""), "");
    }
}
