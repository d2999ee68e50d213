use crate::layers::{LayerSide, LayerType};
use serde::{Deserialize, Serialize};

/// One paint per layer type for a single board side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SidePaints {
    pub default: String,
    pub mask: String,
    pub copper: String,
    pub silkscreen: String,
    pub paste: String,
    pub fabrication: String,
    pub courtyard: String,
}

impl SidePaints {
    pub fn get(&self, layer_type: LayerType) -> &str {
        match layer_type {
            LayerType::Default => &self.default,
            LayerType::Mask => &self.mask,
            LayerType::Copper => &self.copper,
            LayerType::Silkscreen => &self.silkscreen,
            LayerType::Paste => &self.paste,
            LayerType::Fabrication => &self.fabrication,
            LayerType::Courtyard => &self.courtyard,
        }
    }
}

/// Colors used when painting a scene. Values are opaque paint tokens
/// handed to the drawing surface (`"red"`, `"#FFFFFF33"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    pub back: SidePaints,
    pub inner: SidePaints,
    pub front: SidePaints,
    /// Fill for drill holes.
    pub drill: String,
    /// Outline stroke around pads; `None` disables it.
    pub outline: Option<String>,
    /// Canvas fill before anything is drawn; `None` leaves it untouched.
    pub background: Option<String>,
}

impl Palette {
    pub fn paint(&self, side: LayerSide, layer_type: LayerType) -> &str {
        let paints = match side {
            LayerSide::Back => &self.back,
            LayerSide::Inner => &self.inner,
            LayerSide::Front => &self.front,
        };
        paints.get(layer_type)
    }
}

fn paints(default: &str, copper: &str, silk: &str, fab: &str, crtyd: &str) -> SidePaints {
    SidePaints {
        default: default.to_string(),
        mask: "#D864FF33".to_string(),
        copper: copper.to_string(),
        silkscreen: silk.to_string(),
        paste: "#B4A0A066".to_string(),
        fabrication: fab.to_string(),
        courtyard: crtyd.to_string(),
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            back: paints("#808080", "#4D7FC4", "#E8B2A7", "#585D84", "#26E9FF"),
            inner: paints("#808080", "#7FC87F", "#FFFFFF33", "#AFAFAF", "#FFFFFF33"),
            front: paints("red", "red", "#F2EDA1", "#AFAFAF", "#FF26E2"),
            drill: "grey".to_string(),
            outline: Some("black".to_string()),
            background: Some("white".to_string()),
        }
    }
}
