use crate::parsers::sexpr::{unquote, Node};
use log::warn;
use serde::Serialize;

/// Board side of a layer. Declaration order is the paint order: back first,
/// front last, so the front ends up on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerSide {
    Back,
    Inner,
    Front,
}

impl LayerSide {
    pub const ALL: [LayerSide; 3] = [LayerSide::Back, LayerSide::Inner, LayerSide::Front];

    /// Resolve the part before the `.` of a layer name. `*` and `F&B` expand
    /// to several sides, always in declared order.
    fn parse(prefix: &str) -> Option<&'static [LayerSide]> {
        let sides: &'static [LayerSide] = match prefix {
            "*" => &Self::ALL,
            "F&B" => &[LayerSide::Back, LayerSide::Front],
            "F" => &[LayerSide::Front],
            "B" => &[LayerSide::Back],
            p if is_inner(p) => &[LayerSide::Inner],
            _ => return None,
        };
        Some(sides)
    }
}

fn is_inner(prefix: &str) -> bool {
    prefix
        .strip_prefix("In")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Kind of manufacturing layer, in paint order within one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Default,
    Mask,
    Copper,
    Silkscreen,
    Paste,
    Fabrication,
    Courtyard,
}

impl LayerType {
    pub const ALL: [LayerType; 7] = [
        LayerType::Default,
        LayerType::Mask,
        LayerType::Copper,
        LayerType::Silkscreen,
        LayerType::Paste,
        LayerType::Fabrication,
        LayerType::Courtyard,
    ];

    fn parse(suffix: &str) -> Option<LayerType> {
        match suffix {
            "Cu" => Some(LayerType::Copper),
            "SilkS" | "Silkscreen" => Some(LayerType::Silkscreen),
            "Fab" | "Fabrication" => Some(LayerType::Fabrication),
            "CrtYd" | "Courtyard" => Some(LayerType::Courtyard),
            "Mask" => Some(LayerType::Mask),
            "Paste" => Some(LayerType::Paste),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LayerEntry {
    pub side: LayerSide,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
}

impl LayerEntry {
    pub const FALLBACK: LayerEntry = LayerEntry {
        side: LayerSide::Front,
        layer_type: LayerType::Default,
    };

    pub fn new(side: LayerSide, layer_type: LayerType) -> Self {
        Self { side, layer_type }
    }
}

/// Ordered set of layers an element is drawn on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LayerSpec(Vec<LayerEntry>);

impl Default for LayerSpec {
    fn default() -> Self {
        Self(vec![LayerEntry::FALLBACK])
    }
}

impl LayerSpec {
    /// Build a layer set from raw layer names such as `F.Cu` or `*.Mask`.
    ///
    /// A single unrecognized name discards the whole list and yields the
    /// `(Front, Default)` fallback.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        Self::try_from_tokens(tokens).unwrap_or_else(|name| {
            warn!("unrecognized layer {name:?}, falling back to front default layer");
            Self::default()
        })
    }

    /// Like [`LayerSpec::from_tokens`], but hands back the first
    /// unrecognized name instead of falling back.
    pub fn try_from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, String> {
        let mut entries: Vec<LayerEntry> = Vec::new();
        for token in tokens {
            let name = unquote(token.as_ref());
            let resolved = name.split_once('.').and_then(|(prefix, suffix)| {
                Some((LayerSide::parse(prefix)?, LayerType::parse(suffix)?))
            });
            let Some((sides, layer_type)) = resolved else {
                return Err(name.to_string());
            };
            for &side in sides {
                let entry = LayerEntry::new(side, layer_type);
                if !entries.contains(&entry) {
                    entries.push(entry);
                }
            }
        }
        if entries.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self(entries))
    }

    pub fn entries(&self) -> &[LayerEntry] {
        &self.0
    }

    pub fn contains(&self, side: LayerSide, layer_type: LayerType) -> bool {
        self.0.contains(&LayerEntry::new(side, layer_type))
    }
}

/// Resolve the `layer`/`layers` child of an element, if any. An
/// unrecognized name is returned as the error.
pub fn resolve(layer_node: Option<Node<'_>>) -> Result<LayerSpec, String> {
    match layer_node {
        Some(node) => LayerSpec::try_from_tokens(node.fields()),
        None => Ok(LayerSpec::default()),
    }
}
