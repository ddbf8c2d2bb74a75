use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// Zoom bounds enforced by every [`ViewportState`] mutation.
pub const ZOOM_MIN: f64 = 1.0;
pub const ZOOM_MAX: f64 = 16.0;

/// The user-visible state of one loupe: where it sits, how far it magnifies,
/// and which render layers are enabled.
///
/// Owned by the session, replicated to the host UI through [`StoreUpdate`]s.
/// `zoom` is clamped to `[ZOOM_MIN, ZOOM_MAX]` — construct and mutate only
/// through the provided methods so the invariant holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub position: Point,
    zoom: f64,
    pub grid_on: bool,
    pub fisheye_on: bool,
}

impl ViewportState {
    pub fn new(position: Point, zoom: f64) -> Self {
        Self {
            position,
            zoom: zoom.clamp(ZOOM_MIN, ZOOM_MAX),
            grid_on: false,
            fisheye_on: false,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
    }
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(Point::default(), 2.0)
    }
}

/// Everything derived from one sampled center pixel.
///
/// `rgb` is the CSS string of the sample; recomputation keys off string
/// equality, so two identical samples are one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSample {
    /// `rgb(r, g, b)` of the pixel under the viewport center.
    pub rgb: String,
    /// `#000000` or `#FFFFFF`, whichever reads against the sample.
    pub contrast: String,
    /// Deterministic hue-harmony swatches, base color first.
    pub harmony: Vec<String>,
    /// Material-style tonal ramp keyed by tone stop (50–900).
    pub material: BTreeMap<u16, String>,
}

/// One write the engine pushes to the external reactive store.
///
/// The store itself lives outside this workspace (background process / UI
/// replication); the engine only emits these, in order, through a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
pub enum StoreUpdate {
    LensePosition(Point),
    Zoom(f64),
    HoveredColor(String),
    ColorPalette(Vec<String>),
    MaterialPalette(BTreeMap<u16, String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_clamped_on_construction_and_mutation() {
        let mut vs = ViewportState::new(Point::new(0.0, 0.0), 64.0);
        assert_eq!(vs.zoom(), ZOOM_MAX);
        vs.set_zoom(0.25);
        assert_eq!(vs.zoom(), ZOOM_MIN);
        vs.set_zoom(8.0);
        assert_eq!(vs.zoom(), 8.0);
    }

    #[test]
    fn store_update_serializes_with_store_keys() {
        let json = serde_json::to_string(&StoreUpdate::Zoom(4.0)).unwrap();
        assert_eq!(json, r#"{"key":"zoom","value":4.0}"#);

        let json = serde_json::to_string(&StoreUpdate::HoveredColor("rgb(1, 2, 3)".into())).unwrap();
        assert!(json.contains(r#""key":"hoveredColor""#));
    }
}
