use crate::layers::LayerSpec;
use crate::render::ops::DrawOp;
use crate::render::DrawStyle;
use crate::types::{distance, Extents};
use serde::Serialize;

// ─── Line ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub from: [f64; 2],
    pub to: [f64; 2],
    pub width: f64,
    pub layers: LayerSpec,
}

impl Line {
    fn extents(&self) -> Extents {
        let mut e = Extents::empty();
        e.expand_point(self.from[0], self.from[1]);
        e.expand_point(self.to[0], self.to[1]);
        e
    }

    fn rescale(&mut self, k: f64) {
        scale_point(&mut self.from, k);
        scale_point(&mut self.to, k);
        self.width *= k;
    }

    fn draw(&self, color: &str, out: &mut Vec<DrawOp>) {
        out.push(DrawOp::Segment {
            from: self.from,
            to: self.to,
            width: self.width,
            color: color.to_string(),
        });
    }
}

// ─── Arc ─────────────────────────────────────────────────────────────

/// Arc around `from`, starting at `to` and sweeping `angle` degrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arc {
    pub from: [f64; 2],
    pub to: [f64; 2],
    pub angle: f64,
    pub width: f64,
    pub layers: LayerSpec,
}

impl Arc {
    pub fn radius(&self) -> f64 {
        distance(self.from, self.to)
    }

    /// Direction of `to` as seen from the center, in radians.
    pub fn start_angle(&self) -> f64 {
        (self.to[1] - self.from[1]).atan2(self.to[0] - self.from[0])
    }

    // Full circle, not just the swept part.
    fn extents(&self) -> Extents {
        let r = self.radius();
        Extents::around(self.from, [r, r])
    }

    fn rescale(&mut self, k: f64) {
        scale_point(&mut self.from, k);
        scale_point(&mut self.to, k);
        self.width *= k;
    }

    fn draw(&self, color: &str, out: &mut Vec<DrawOp>) {
        let start = self.start_angle();
        out.push(DrawOp::Arc {
            center: self.from,
            radius: self.radius(),
            start_angle: start,
            end_angle: start + self.angle.to_radians(),
            anticlockwise: self.angle < 0.0,
            width: self.width,
            color: color.to_string(),
        });
    }
}

// ─── Pad ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PadType {
    ThruHole,
    NpThruHole,
    Smd,
}

impl PadType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "thru_hole" => Some(PadType::ThruHole),
            "np_thru_hole" => Some(PadType::NpThruHole),
            "smd" => Some(PadType::Smd),
            _ => None,
        }
    }

    pub fn has_drill(&self) -> bool {
        !matches!(self, PadType::Smd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PadShape {
    Circle,
    Rect,
    RoundRect,
    Oval,
}

impl PadShape {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "circle" => Some(PadShape::Circle),
            "rect" => Some(PadShape::Rect),
            "roundrect" => Some(PadShape::RoundRect),
            "oval" => Some(PadShape::Oval),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pad {
    pub number: String,
    pub pad_type: PadType,
    pub shape: PadShape,
    pub pos: [f64; 2],
    /// Degrees. Only quarter turns change how the pad is drawn.
    pub rotation: f64,
    pub size: [f64; 2],
    /// Hole diameter, 0 for SMD pads.
    pub drill: f64,
    /// Corner radius as a fraction of the shorter side.
    pub rounding: f64,
    pub layers: LayerSpec,
}

/// Number of quarter turns in `rotation`, if it is a multiple of 90°.
pub(crate) fn quarter_turns(rotation: f64) -> Option<i64> {
    let turns = (rotation / 90.0).round();
    ((rotation - turns * 90.0).abs() < 1e-6).then_some(turns as i64)
}

impl Pad {
    /// Size after applying quarter-turn rotation.
    pub fn rotated_size(&self) -> [f64; 2] {
        match quarter_turns(self.rotation) {
            Some(turns) if turns.rem_euclid(2) == 1 => [self.size[1], self.size[0]],
            _ => self.size,
        }
    }

    /// Tight box around the pad: half of the larger of size and drill on
    /// each side of the center, never the full size.
    fn extents(&self) -> Extents {
        let size = self.rotated_size();
        Extents::around(
            self.pos,
            [size[0].max(self.drill) / 2.0, size[1].max(self.drill) / 2.0],
        )
    }

    fn rescale(&mut self, k: f64) {
        scale_point(&mut self.pos, k);
        scale_point(&mut self.size, k);
        self.drill *= k;
    }

    fn draw(&self, color: &str, style: &DrawStyle<'_>, out: &mut Vec<DrawOp>) {
        let center = self.pos;
        let size = self.rotated_size();
        let fill = color.to_string();
        let stroke = style.outline.clone();
        out.push(match self.shape {
            PadShape::Circle => DrawOp::Ellipse {
                center,
                radii: [size[0] / 2.0, size[1] / 2.0],
                fill,
                stroke,
            },
            PadShape::Rect => DrawOp::Rect {
                center,
                size,
                fill,
                stroke,
            },
            PadShape::RoundRect => DrawOp::RoundRect {
                center,
                size,
                radius: self.rounding * size[0].min(size[1]),
                fill,
                stroke,
            },
            PadShape::Oval => DrawOp::Oval {
                center,
                size,
                fill,
                stroke,
            },
        });

        if self.drill > style.min_extent {
            out.push(DrawOp::Ellipse {
                center,
                radii: [self.drill / 2.0, self.drill / 2.0],
                fill: style.drill.to_string(),
                stroke: style.outline.clone(),
            });
        }
    }
}

// ─── Element ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Element {
    Line(Line),
    Arc(Arc),
    Pad(Pad),
}

impl Element {
    pub fn layers(&self) -> &LayerSpec {
        match self {
            Element::Line(line) => &line.layers,
            Element::Arc(arc) => &arc.layers,
            Element::Pad(pad) => &pad.layers,
        }
    }

    pub fn extents(&self) -> Extents {
        match self {
            Element::Line(line) => line.extents(),
            Element::Arc(arc) => arc.extents(),
            Element::Pad(pad) => pad.extents(),
        }
    }

    /// Multiply every linear dimension by `k`. Angles and ratios are kept.
    pub fn rescale(&mut self, k: f64) {
        match self {
            Element::Line(line) => line.rescale(k),
            Element::Arc(arc) => arc.rescale(k),
            Element::Pad(pad) => pad.rescale(k),
        }
    }

    /// Append the primitives for one layer pass, painted with `color`.
    pub fn draw(&self, color: &str, style: &DrawStyle<'_>, out: &mut Vec<DrawOp>) {
        match self {
            Element::Line(line) => line.draw(color, out),
            Element::Arc(arc) => arc.draw(color, out),
            Element::Pad(pad) => pad.draw(color, style, out),
        }
    }
}

fn scale_point(p: &mut [f64; 2], k: f64) {
    p[0] *= k;
    p[1] *= k;
}

// ─── Module ──────────────────────────────────────────────────────────

/// A parsed footprint: its elements in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Module {
    name: Option<String>,
    elements: Vec<Element>,
}

impl Module {
    pub fn new(name: Option<String>, elements: Vec<Element>) -> Self {
        Self { name, elements }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Union of every element's extents. Non-finite boxes are skipped.
    pub fn extents(&self) -> Extents {
        let mut total = Extents::empty();
        for e in self.elements.iter().map(Element::extents) {
            if e.is_finite() {
                total.union(&e);
            }
        }
        total
    }

    pub fn rescale(&mut self, k: f64) {
        for element in &mut self.elements {
            element.rescale(k);
        }
    }
}
