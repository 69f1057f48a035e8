//! Raw panel descriptors as produced by cabinet generators.
//!
//! Generators and hand-written files are not always tidy: dimensions arrive
//! as numbers or numeric strings, flags as booleans, numbers or strings.
//! Deserialization is lenient about representation; entries that still lack
//! usable dimensions are dropped by [`parse_panels`] with a warning.

use panelcut_core::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A panel before axis mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPanel {
    /// Free-text role name such as `"Top"`, `"Left Side"` or `"Shutter 3"`.
    #[serde(alias = "panelType", alias = "role", alias = "type")]
    pub name: String,
    #[serde(deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub nominal_width: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub nominal_height: Option<f64>,
    #[serde(deserialize_with = "lenient::opt_usize", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<usize>,
    /// Grain must run along the panel's height.
    #[serde(deserialize_with = "lenient::flag", alias = "grainSensitive")]
    pub grain: bool,
    #[serde(alias = "laminate")]
    pub laminate_code: String,
    pub brand: String,
    /// Brand used instead of `brand` for back panels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_panel_plywood_brand: Option<String>,
    /// Edge banding (gaddi) marker.
    #[serde(deserialize_with = "lenient::flag", alias = "edgeBanding")]
    pub gaddi: bool,
}

impl RawPanel {
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            nominal_width: Some(width),
            nominal_height: Some(height),
            ..Self::default()
        }
    }

    pub fn with_quantity(mut self, quantity: usize) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_grain(mut self, grain: bool) -> Self {
        self.grain = grain;
        self
    }

    pub fn with_laminate(mut self, code: impl Into<String>) -> Self {
        self.laminate_code = code.into();
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    pub fn with_back_brand(mut self, brand: impl Into<String>) -> Self {
        self.back_panel_plywood_brand = Some(brand.into());
        self
    }

    pub fn with_gaddi(mut self, gaddi: bool) -> Self {
        self.gaddi = gaddi;
        self
    }

    /// Nominal width and height, falling back to the plain fields.
    ///
    /// Returns `None` when either side is missing or not finite.
    pub fn nominal_dimensions(&self) -> Option<(f64, f64)> {
        let width = self.nominal_width.or(self.width)?;
        let height = self.nominal_height.or(self.height)?;
        (width.is_finite() && height.is_finite()).then_some((width, height))
    }
}

/// Parses a JSON array of raw panels, dropping malformed entries.
pub fn parse_panels(value: &Value) -> Vec<RawPanel> {
    let Some(entries) = value.as_array() else {
        log::warn!("panel list is not an array, ignoring it");
        return Vec::new();
    };

    let mut panels = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            log::warn!("dropping panel entry {}: not an object", index);
            continue;
        }
        match RawPanel::deserialize(entry) {
            Ok(panel) if panel.nominal_dimensions().is_some() => panels.push(panel),
            Ok(panel) => {
                log::warn!(
                    "dropping panel entry {} ({:?}): missing or non-numeric dimensions",
                    index,
                    panel.name
                );
            }
            Err(err) => log::warn!("dropping panel entry {}: {}", index, err),
        }
    }
    panels
}

/// Parses a JSON document holding an array of raw panels.
pub fn parse_panels_str(json: &str) -> Result<Vec<RawPanel>> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(parse_panels(&value))
}

mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Bool(bool),
        Number(f64),
        Text(String),
    }

    impl Scalar {
        fn as_f64(&self) -> Option<f64> {
            match self {
                Scalar::Number(n) => Some(*n),
                Scalar::Text(s) => s.trim().parse().ok(),
                Scalar::Bool(_) => None,
            }
        }

        fn as_flag(&self) -> bool {
            match self {
                Scalar::Bool(b) => *b,
                Scalar::Number(n) => *n != 0.0,
                Scalar::Text(s) => matches!(
                    s.trim().to_ascii_lowercase().as_str(),
                    "true" | "yes" | "y" | "1"
                ),
            }
        }
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
        let value: Option<Scalar> = Option::deserialize(d)?;
        Ok(value.as_ref().and_then(Scalar::as_f64))
    }

    pub fn opt_usize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<Option<usize>, D::Error> {
        let value = opt_f64(d)?;
        Ok(value
            .filter(|q| q.is_finite() && *q >= 0.0)
            .map(|q| q.round() as usize))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
        let value: Option<Scalar> = Option::deserialize(d)?;
        Ok(value.as_ref().map(Scalar::as_flag).unwrap_or(false))
    }
}
