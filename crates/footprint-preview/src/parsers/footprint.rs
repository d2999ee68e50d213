use crate::elements::{quarter_turns, Arc, Element, Line, Module, Pad, PadShape, PadType};
use crate::error::ElementError;
use crate::layers::{self, LayerSpec};
use crate::parsers::sexpr::{unquote, Node};
use log::{debug, warn};
use std::f64::consts::TAU;
use std::fmt;

/// An element that was dropped while building a module.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Position of the offending node among the module's children.
    pub index: usize,
    /// Type of the offending node (`fp_line`, `pad`, ...).
    pub kind: String,
    pub error: ElementError,
}

impl Diagnostic {
    /// Whether the element was left out of the model.
    pub fn dropped(&self) -> bool {
        !matches!(self.error, ElementError::UnknownLayer(_))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}: {}", self.kind, self.index, self.error)
    }
}

/// Build the element list of a footprint node, discarding diagnostics.
pub fn build(module: Node<'_>) -> Module {
    build_with_diagnostics(module).0
}

/// Build the element list of a footprint node.
///
/// Lines, arcs and pads are modeled; every other child is skipped. An
/// element that fails to build is left out and reported as a diagnostic.
/// An element with unrecognized layers is kept and reported too.
pub fn build_with_diagnostics(module: Node<'_>) -> (Module, Vec<Diagnostic>) {
    if !matches!(module.kind(), "module" | "footprint") {
        debug!("top-level form is {:?}, building it as a footprint", module.kind());
    }
    let name = module.field(0).map(|n| unquote(n).to_string());

    let mut elements = Vec::new();
    let mut diagnostics = Vec::new();
    let mut notes = Vec::new();
    for (index, child) in module.children().enumerate() {
        let built = match child.kind() {
            "fp_line" => parse_fp_line(child, &mut notes).map(Element::Line),
            "fp_arc" => parse_fp_arc(child, &mut notes).map(Element::Arc),
            "pad" => parse_pad(child, &mut notes).map(Element::Pad),
            other => {
                debug!("skipping {other:?} node");
                continue;
            }
        };
        let report = |error: ElementError| Diagnostic {
            index,
            kind: child.kind().to_string(),
            error,
        };
        match built {
            Ok(element) => {
                elements.push(element);
                for note in notes.drain(..) {
                    let diagnostic = report(note);
                    warn!("{diagnostic}");
                    diagnostics.push(diagnostic);
                }
            }
            Err(error) => {
                notes.clear();
                let diagnostic = report(error);
                warn!("dropping {diagnostic}");
                diagnostics.push(diagnostic);
            }
        }
    }

    (Module::new(name, elements), diagnostics)
}

// ─── Field helpers ───────────────────────────────────────────────────

fn require<'a>(parent: Node<'a>, kind: &'static str) -> Result<Node<'a>, ElementError> {
    parent
        .find(kind)
        .ok_or(ElementError::MissingNode { node: kind })
}

fn require_fields(node: Node<'_>, expected: usize) -> Result<(), ElementError> {
    let found = node.fields().len();
    if found < expected {
        return Err(ElementError::TooFewFields {
            node: node.kind().to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Parse field `index` of `node` as a finite float.
fn number(node: Node<'_>, index: usize) -> Result<f64, ElementError> {
    require_fields(node, index + 1)?;
    let raw = &node.fields()[index];
    unquote(raw)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ElementError::InvalidNumber {
            node: node.kind().to_string(),
            value: raw.clone(),
        })
}

fn parse_xy(parent: Node<'_>, kind: &'static str) -> Result<[f64; 2], ElementError> {
    let node = require(parent, kind)?;
    require_fields(node, 2)?;
    Ok([number(node, 0)?, number(node, 1)?])
}

/// `(width w)`, or `(stroke (width w))` in newer files.
fn parse_width(node: Node<'_>) -> Result<f64, ElementError> {
    let width = node
        .find("width")
        .or_else(|| node.find("stroke").and_then(|s| s.find("width")))
        .ok_or(ElementError::MissingNode { node: "width" })?;
    number(width, 0)
}

/// Layers of an element. An unrecognized name falls back to the default
/// layer and is recorded in `notes`.
fn layer_spec(node: Node<'_>, notes: &mut Vec<ElementError>) -> LayerSpec {
    layers::resolve(node.find_any(&["layer", "layers"])).unwrap_or_else(|name| {
        notes.push(ElementError::UnknownLayer(name));
        LayerSpec::default()
    })
}

// ─── Elements ────────────────────────────────────────────────────────

fn parse_fp_line(node: Node<'_>, notes: &mut Vec<ElementError>) -> Result<Line, ElementError> {
    Ok(Line {
        from: parse_xy(node, "start")?,
        to: parse_xy(node, "end")?,
        width: parse_width(node)?,
        layers: layer_spec(node, notes),
    })
}

fn parse_fp_arc(node: Node<'_>, notes: &mut Vec<ElementError>) -> Result<Arc, ElementError> {
    let width = parse_width(node)?;
    let layers = layer_spec(node, notes);

    if node.find("mid").is_some() {
        // Three-point form: rewrite as center + start point + sweep.
        let start = parse_xy(node, "start")?;
        let mid = parse_xy(node, "mid")?;
        let end = parse_xy(node, "end")?;
        let (center, angle) =
            arc_from_three_points(start, mid, end).ok_or(ElementError::DegenerateArc)?;
        return Ok(Arc {
            from: center,
            to: start,
            angle,
            width,
            layers,
        });
    }

    // Legacy form: start is the center, end a point on the circle.
    Ok(Arc {
        from: parse_xy(node, "start")?,
        to: parse_xy(node, "end")?,
        angle: number(require(node, "angle")?, 0)?,
        width,
        layers,
    })
}

fn parse_pad(node: Node<'_>, notes: &mut Vec<ElementError>) -> Result<Pad, ElementError> {
    require_fields(node, 3)?;
    let fields = node.fields();
    let number_str = unquote(&fields[0]).to_string();
    let pad_type = PadType::parse(&fields[1])
        .ok_or_else(|| ElementError::UnknownPadType(fields[1].clone()))?;
    let shape = PadShape::parse(&fields[2])
        .ok_or_else(|| ElementError::UnsupportedPadShape(fields[2].clone()))?;

    let at = require(node, "at")?;
    let pos = [number(at, 0)?, number(at, 1)?];
    let rotation = if at.fields().len() > 2 {
        number(at, 2)?
    } else {
        0.0
    };
    if quarter_turns(rotation).is_none() {
        warn!("pad {number_str:?} rotated by {rotation} degrees, drawing it unrotated");
    }

    let size = parse_xy(node, "size")?;

    let drill = if pad_type.has_drill() {
        parse_drill(require(node, "drill")?)?
    } else {
        0.0
    };

    let rounding = match node.find("roundrect_rratio") {
        Some(ratio) => number(ratio, 0)?,
        None => 0.0,
    };

    Ok(Pad {
        number: number_str,
        pad_type,
        shape,
        pos,
        rotation,
        size,
        drill,
        rounding,
        layers: layer_spec(node, notes),
    })
}

/// `(drill d)` or `(drill oval w h)`; the first size is the modeled diameter.
fn parse_drill(drill: Node<'_>) -> Result<f64, ElementError> {
    let index = usize::from(drill.field(0) == Some("oval"));
    number(drill, index)
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Center of the circle through three points and the signed sweep, in
/// degrees, from `p1` through `p2` to `p3`.
fn arc_from_three_points(p1: [f64; 2], p2: [f64; 2], p3: [f64; 2]) -> Option<([f64; 2], f64)> {
    let [ax, ay] = p1;
    let [bx, by] = p2;
    let [cx, cy] = p3;

    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < 1e-10 {
        return None;
    }

    let ux = ((ax * ax + ay * ay) * (by - cy)
        + (bx * bx + by * by) * (cy - ay)
        + (cx * cx + cy * cy) * (ay - by))
        / d;
    let uy = ((ax * ax + ay * ay) * (cx - bx)
        + (bx * bx + by * by) * (ax - cx)
        + (cx * cx + cy * cy) * (bx - ax))
        / d;

    let angle_of = |x: f64, y: f64| (y - uy).atan2(x - ux);
    let start = angle_of(ax, ay);
    let to_mid = (angle_of(bx, by) - start).rem_euclid(TAU);
    let to_end = (angle_of(cx, cy) - start).rem_euclid(TAU);
    let sweep = if to_mid <= to_end {
        to_end
    } else {
        to_end - TAU
    };

    Some(([ux, uy], sweep.to_degrees()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{LayerSide, LayerType};
    use crate::parsers::sexpr;
    use approx::assert_relative_eq;

    fn build_str(text: &str) -> (Module, Vec<Diagnostic>) {
        let tree = sexpr::parse(text).unwrap();
        build_with_diagnostics(tree.module())
    }

    const RESISTOR: &str = r#"(module R_0805 (layer F.Cu) (tedit 5B36C52B)
  (descr "Resistor SMD 0805")
  (fp_text reference REF** (at 0 -1.65) (layer F.SilkS)
    (effects (font (size 1 1) (thickness 0.15))))
  (fp_line (start -1 0.6) (end -1 -0.6) (layer F.Fab) (width 0.1))
  (fp_line (start -1.68 0.95) (end 1.68 0.95) (layer F.CrtYd) (width 0.05))
  (fp_arc (start 0 0) (end 1 0) (angle 90) (layer F.SilkS) (width 0.12))
  (pad 1 smd roundrect (at -0.95 0) (size 0.95 1.4) (layers F.Cu F.Paste F.Mask) (roundrect_rratio 0.25))
  (pad 2 smd rect (at 0.95 0 90) (size 0.95 1.4) (layers F.Cu F.Paste F.Mask))
  (model ${KISYS3DMOD}/Resistor_SMD.3dshapes/R_0805.wrl
    (at (xyz 0 0 0)) (scale (xyz 1 1 1)) (rotate (xyz 0 0 0)))
)"#;

    #[test]
    fn test_builds_supported_elements_in_order() {
        let (module, diagnostics) = build_str(RESISTOR);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert_eq!(module.name(), Some("R_0805"));
        let kinds: Vec<_> = module
            .elements()
            .iter()
            .map(|e| match e {
                Element::Line(_) => "line",
                Element::Arc(_) => "arc",
                Element::Pad(_) => "pad",
            })
            .collect();
        assert_eq!(kinds, ["line", "line", "arc", "pad", "pad"]);
    }

    #[test]
    fn test_line_fields() {
        let (module, _) = build_str(RESISTOR);
        let Element::Line(line) = &module.elements()[0] else {
            panic!("expected line");
        };
        assert_eq!(line.from, [-1.0, 0.6]);
        assert_eq!(line.to, [-1.0, -0.6]);
        assert_eq!(line.width, 0.1);
        assert!(line.layers.contains(LayerSide::Front, LayerType::Fabrication));
    }

    #[test]
    fn test_pad_fields() {
        let (module, _) = build_str(RESISTOR);
        let Element::Pad(p1) = &module.elements()[3] else {
            panic!("expected pad");
        };
        assert_eq!(p1.number, "1");
        assert_eq!(p1.pad_type, PadType::Smd);
        assert_eq!(p1.shape, PadShape::RoundRect);
        assert_eq!(p1.pos, [-0.95, 0.0]);
        assert_eq!(p1.drill, 0.0);
        assert_eq!(p1.rounding, 0.25);
        assert_eq!(p1.layers.entries().len(), 3);

        let Element::Pad(p2) = &module.elements()[4] else {
            panic!("expected pad");
        };
        assert_eq!(p2.rotation, 90.0);
        assert_eq!(p2.rotated_size(), [1.4, 0.95]);
        assert_eq!(p2.rounding, 0.0);
    }

    #[test]
    fn test_thru_hole_pads() {
        let (module, diagnostics) = build_str(
            r#"(footprint "Conn" (layer "F.Cu")
                (pad "1" thru_hole circle (at 0 0) (size 1.7 1.7) (drill 1) (layers "*.Cu" "*.Mask"))
                (pad "2" thru_hole oval (at 2.54 0) (size 1.7 2) (drill oval 0.8 1.2) (layers *.Cu *.Mask)))"#,
        );
        assert!(diagnostics.is_empty());
        assert_eq!(module.name(), Some("Conn"));
        let drills: Vec<_> = module
            .elements()
            .iter()
            .map(|e| match e {
                Element::Pad(p) => p.drill,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(drills, [1.0, 0.8]);
        assert!(module.elements()[0]
            .layers()
            .contains(LayerSide::Inner, LayerType::Copper));
    }

    #[test]
    fn test_np_thru_hole_without_drill_is_dropped() {
        let (module, diagnostics) = build_str(
            "(module X (pad \"\" np_thru_hole circle (at 0 0) (size 3 3) (layers *.Cu *.Mask)))",
        );
        assert!(module.is_empty());
        assert_eq!(
            diagnostics,
            [Diagnostic {
                index: 0,
                kind: "pad".to_string(),
                error: ElementError::MissingNode { node: "drill" },
            }]
        );
    }

    #[test]
    fn test_soft_failures_keep_the_rest() {
        let (module, diagnostics) = build_str(
            "(module X
               (fp_line (start 0 0) (end 1 0) (layer F.SilkS))
               (fp_line (start 0 abc) (end 1 0) (width 0.1))
               (fp_line (start 0) (end 1 0) (width 0.1))
               (fp_line (start 0 0) (end 1 inf) (width 0.1))
               (pad 1 smd custom (at 0 0) (size 1 1))
               (pad 1 connect rect (at 0 0) (size 1 1))
               (pad 1 smd rect (at 0 0))
               (fp_arc (start 0 0) (end 1 0) (width 0.1))
               (fp_line (start 0 0) (end 2 0) (width 0.2)))",
        );
        assert_eq!(module.len(), 1);
        let errors: Vec<_> = diagnostics.iter().map(|d| (d.index, d.error.clone())).collect();
        assert_eq!(
            errors,
            [
                (0, ElementError::MissingNode { node: "width" }),
                (
                    1,
                    ElementError::InvalidNumber {
                        node: "start".to_string(),
                        value: "abc".to_string()
                    }
                ),
                (
                    2,
                    ElementError::TooFewFields {
                        node: "start".to_string(),
                        expected: 2,
                        found: 1
                    }
                ),
                (
                    3,
                    ElementError::InvalidNumber {
                        node: "end".to_string(),
                        value: "inf".to_string()
                    }
                ),
                (4, ElementError::UnsupportedPadShape("custom".to_string())),
                (5, ElementError::UnknownPadType("connect".to_string())),
                (6, ElementError::MissingNode { node: "size" }),
                (7, ElementError::MissingNode { node: "angle" }),
            ]
        );
    }

    #[test]
    fn test_stroke_width_and_quoted_layer() {
        let (module, _) = build_str(
            r#"(footprint "X"
                (fp_line (start 0 0) (end 1 0) (stroke (width 0.12) (type solid)) (layer "B.SilkS")))"#,
        );
        let Element::Line(line) = &module.elements()[0] else {
            panic!("expected line");
        };
        assert_eq!(line.width, 0.12);
        assert_eq!(
            line.layers.entries(),
            [crate::layers::LayerEntry::new(LayerSide::Back, LayerType::Silkscreen)]
        );
    }

    #[test]
    fn test_unknown_layer_keeps_element_and_reports_it() {
        let (module, diagnostics) = build_str(
            "(module X
               (fp_line (start 0 0) (end 1 0) (layer F.SilkS) (width 0.1))
               (fp_line (start 0 0) (end 1 0) (layer Dwgs.User) (width 0.1))
               (pad 1 smd rect (at 0 0) (size 1 1) (layers F.Cu garbage)))",
        );
        assert_eq!(module.len(), 3);
        assert!(module.elements()[1]
            .layers()
            .contains(LayerSide::Front, LayerType::Default));
        assert_eq!(module.elements()[2].layers().entries().len(), 1);

        let reported: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.index, d.kind.as_str(), d.dropped(), d.error.clone()))
            .collect();
        assert_eq!(
            reported,
            [
                (1, "fp_line", false, ElementError::UnknownLayer("Dwgs.User".to_string())),
                (2, "pad", false, ElementError::UnknownLayer("garbage".to_string())),
            ]
        );
    }

    #[test]
    fn test_dropped_element_reports_only_its_failure() {
        let (module, diagnostics) =
            build_str("(module X (fp_arc (start 0 0) (end 1 0) (layer Dwgs.User) (width 0.1)))");
        assert!(module.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].dropped());
        assert_eq!(diagnostics[0].error, ElementError::MissingNode { node: "angle" });
    }

    #[test]
    fn test_missing_layer_defaults_to_front() {
        let (module, _) = build_str("(module X (fp_line (start 0 0) (end 1 0) (width 0.1)))");
        assert!(module.elements()[0]
            .layers()
            .contains(LayerSide::Front, LayerType::Default));
    }

    #[test]
    fn test_three_point_arc() {
        let (module, _) = build_str(
            "(footprint X (fp_arc (start 1 0) (mid 0 1) (end -1 0) (stroke (width 0.1)) (layer F.SilkS)))",
        );
        let Element::Arc(arc) = &module.elements()[0] else {
            panic!("expected arc");
        };
        assert_relative_eq!(arc.from[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(arc.from[1], 0.0, epsilon = 1e-12);
        assert_eq!(arc.to, [1.0, 0.0]);
        assert_relative_eq!(arc.angle, 180.0, epsilon = 1e-9);
        assert_relative_eq!(arc.radius(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_three_point_arc_direction() {
        let (_, cw) = arc_from_three_points([1.0, 0.0], [0.0, 1.0], [-1.0, 0.0]).unwrap();
        let (_, ccw) = arc_from_three_points([1.0, 0.0], [0.0, -1.0], [-1.0, 0.0]).unwrap();
        assert_relative_eq!(cw, 180.0, epsilon = 1e-9);
        assert_relative_eq!(ccw, -180.0, epsilon = 1e-9);
        let (_, quarter) = arc_from_three_points(
            [1.0, 0.0],
            [std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2],
            [0.0, 1.0],
        )
        .unwrap();
        assert_relative_eq!(quarter, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_collinear_arc_is_dropped() {
        let (module, diagnostics) = build_str(
            "(footprint X (fp_arc (start 0 0) (mid 1 0) (end 2 0) (width 0.1)))",
        );
        assert!(module.is_empty());
        assert_eq!(diagnostics[0].error, ElementError::DegenerateArc);
    }
}
