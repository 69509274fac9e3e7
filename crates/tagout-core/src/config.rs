//! Editor tuning knobs.

use serde::{Deserialize, Serialize};

/// World-space tolerances and defaults used by the editor.
///
/// Every field has a default, so a partial JSON document overrides only
/// what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Pointer-to-polyline distance that still counts as a hit.
    pub hit_threshold: f64,
    /// Free-draw points closer than this to the previous one are dropped.
    pub min_point_spacing: f64,
    /// Stroke width assigned to every new annotation.
    pub stroke_width: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplicative zoom step for one wheel notch.
    pub zoom_step: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            hit_threshold: 8.0,
            min_point_spacing: 3.0,
            stroke_width: 3.0,
            min_zoom: 0.1,
            max_zoom: 8.0,
            zoom_step: 1.1,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "hit_threshold": 12.0 }"#).unwrap();
        assert_eq!(config.hit_threshold, 12.0);
        assert_eq!(config.min_point_spacing, 3.0);
        assert_eq!(config.stroke_width, 3.0);
    }
}
