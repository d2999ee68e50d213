pub mod ops;
pub mod surface;
pub mod svg;

use crate::elements::Module;
use crate::layers::{LayerEntry, LayerSide, LayerType};
use crate::types::{serialize_f64_rounded, serialize_point, Extents};
use crate::PreviewOptions;
use log::debug;
use ops::{DrawOp, Stroke};
use serde::Serialize;
use surface::Surface;

/// Target surface size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> [f64; 2] {
        [self.width / 2.0, self.height / 2.0]
    }
}

/// Paints shared by every element drawn in one scene.
#[derive(Debug, Clone)]
pub struct DrawStyle<'a> {
    pub drill: &'a str,
    pub outline: Option<Stroke>,
    /// Drill holes at or below this size are not drawn.
    pub min_extent: f64,
}

/// One primitive tagged with the layer pass and element that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawCall {
    pub layer: LayerEntry,
    pub element: usize,
    #[serde(flatten)]
    pub op: DrawOp,
}

/// Draw calls in paint order plus the transform that centers them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub canvas: Canvas,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub scale: f64,
    /// Translation applied before any call is painted.
    #[serde(serialize_with = "serialize_point")]
    pub origin: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    pub calls: Vec<DrawCall>,
}

impl Scene {
    /// Map a scaled model point to canvas coordinates.
    pub fn to_canvas(&self, p: [f64; 2]) -> [f64; 2] {
        [p[0] + self.origin[0], p[1] + self.origin[1]]
    }

    /// Replay the scene onto a drawing surface.
    pub fn paint(&self, surface: &mut dyn Surface) {
        if let Some(background) = &self.background {
            surface.set_fill_style(background);
            surface.fill_rect(0.0, 0.0, self.canvas.width, self.canvas.height);
        }
        surface.translate(self.origin[0], self.origin[1]);
        for call in &self.calls {
            call.op.paint(surface);
        }
    }
}

/// Uniform factor that fits `extents` into the canvas with a margin.
pub fn fit_scale(extents: &Extents, canvas: Canvas, margin: f64, min_extent: f64) -> f64 {
    let dx = extents.width().max(min_extent);
    let dy = extents.height().max(min_extent);
    margin * (canvas.width / dx).min(canvas.height / dy)
}

/// Scale `module` in place to fit the canvas and emit its draw calls.
///
/// Layers are painted back to front: for each side (back, inner, front),
/// for each layer type, every element on that layer in model order. An
/// element on several layers is drawn once per layer.
pub fn render(module: &mut Module, canvas: Canvas, opts: &PreviewOptions) -> Scene {
    let extents = module.extents();
    let scale = if extents.is_empty() {
        1.0
    } else {
        fit_scale(&extents, canvas, opts.fit_margin, opts.min_extent)
    };
    debug!(
        "fitting {}x{} extents into {}x{} canvas, scale {scale}",
        extents.width(),
        extents.height(),
        canvas.width,
        canvas.height
    );
    module.rescale(scale);

    let fitted = module.extents();
    let origin = if fitted.is_empty() {
        canvas.center()
    } else {
        let mid = fitted.center();
        let target = canvas.center();
        [target[0] - mid[0], target[1] - mid[1]]
    };

    let palette = &opts.palette;
    let style = DrawStyle {
        drill: &palette.drill,
        outline: palette.outline.as_ref().map(|color| Stroke {
            color: color.clone(),
            width: opts.outline_width,
        }),
        min_extent: opts.min_extent,
    };

    let mut calls = Vec::new();
    let mut ops = Vec::new();
    for side in LayerSide::ALL {
        for layer_type in LayerType::ALL {
            let color = palette.paint(side, layer_type);
            let layer = LayerEntry::new(side, layer_type);
            for (index, element) in module.elements().iter().enumerate() {
                if !element.layers().contains(side, layer_type) {
                    continue;
                }
                element.draw(color, &style, &mut ops);
                calls.extend(ops.drain(..).map(|op| DrawCall {
                    layer,
                    element: index,
                    op,
                }));
            }
        }
    }

    Scene {
        canvas,
        scale,
        origin,
        background: palette.background.clone(),
        calls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Element, Line, Pad, PadShape, PadType};
    use crate::layers::LayerSpec;
    use approx::assert_relative_eq;

    fn line(from: [f64; 2], to: [f64; 2], layers: &[&str]) -> Element {
        Element::Line(Line {
            from,
            to,
            width: 0.1,
            layers: LayerSpec::from_tokens(layers),
        })
    }

    fn pad(layers: &[&str]) -> Element {
        Element::Pad(Pad {
            number: "1".to_string(),
            pad_type: PadType::ThruHole,
            shape: PadShape::Circle,
            pos: [0.0, 0.0],
            rotation: 0.0,
            size: [1.0, 1.0],
            drill: 0.5,
            rounding: 0.0,
            layers: LayerSpec::from_tokens(layers),
        })
    }

    /// Records surface calls by name.
    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl Surface for Recorder {
        fn begin_path(&mut self) {
            self.0.push("begin_path".into());
        }
        fn close_path(&mut self) {
            self.0.push("close_path".into());
        }
        fn move_to(&mut self, x: f64, y: f64) {
            self.0.push(format!("move_to {x} {y}"));
        }
        fn line_to(&mut self, x: f64, y: f64) {
            self.0.push(format!("line_to {x} {y}"));
        }
        fn arc(&mut self, _: f64, _: f64, _: f64, _: f64, _: f64, _: bool) {
            self.0.push("arc".into());
        }
        fn ellipse(&mut self, _: f64, _: f64, rx: f64, _: f64, _: f64, _: f64, _: f64) {
            self.0.push(format!("ellipse {rx}"));
        }
        fn fill(&mut self) {
            self.0.push("fill".into());
        }
        fn stroke(&mut self) {
            self.0.push("stroke".into());
        }
        fn set_fill_style(&mut self, color: &str) {
            self.0.push(format!("fill_style {color}"));
        }
        fn set_stroke_style(&mut self, color: &str) {
            self.0.push(format!("stroke_style {color}"));
        }
        fn set_line_width(&mut self, width: f64) {
            self.0.push(format!("line_width {width}"));
        }
        fn translate(&mut self, dx: f64, dy: f64) {
            self.0.push(format!("translate {dx} {dy}"));
        }
    }

    #[test]
    fn test_fit_scale_uses_tighter_axis() {
        let extents = Extents::around([0.0, 0.0], [5.0, 1.0]);
        assert_relative_eq!(fit_scale(&extents, Canvas::new(100.0, 100.0), 0.9, 1e-5), 9.0);
        assert_relative_eq!(fit_scale(&extents, Canvas::new(100.0, 10.0), 0.9, 1e-5), 4.5);
    }

    #[test]
    fn test_fit_scale_floors_degenerate_axis() {
        let extents = Extents::around([3.0, 3.0], [0.0, 0.0]);
        assert_relative_eq!(
            fit_scale(&extents, Canvas::new(100.0, 50.0), 0.9, 1e-5),
            0.9 * 50.0 / 1e-5
        );
    }

    #[test]
    fn test_scene_is_centered() {
        let mut module = Module::new(None, vec![line([2.0, 1.0], [6.0, 3.0], &["F.SilkS"])]);
        let scene = render(&mut module, Canvas::new(200.0, 100.0), &PreviewOptions::default());
        assert_relative_eq!(scene.scale, 45.0);
        let extents = module.extents();
        let lo = scene.to_canvas([extents.min_x, extents.min_y]);
        let hi = scene.to_canvas([extents.max_x, extents.max_y]);
        assert_relative_eq!((lo[0] + hi[0]) / 2.0, 100.0);
        assert_relative_eq!((lo[1] + hi[1]) / 2.0, 50.0);
    }

    #[test]
    fn test_layer_order() {
        let mut module = Module::new(
            None,
            vec![
                line([0.0, 0.0], [1.0, 0.0], &["F.SilkS"]),
                pad(&["F.Cu", "F.Mask"]),
                line([0.0, 0.0], [0.0, 1.0], &["B.SilkS"]),
                line([0.0, 1.0], [1.0, 1.0], &["F.CrtYd"]),
                line([0.0, 1.0], [1.0, 1.0], &["F.Fab"]),
            ],
        );
        let scene = render(&mut module, Canvas::new(100.0, 100.0), &PreviewOptions::default());
        let order: Vec<_> = scene
            .calls
            .iter()
            .map(|c| (c.element, c.layer.side, c.layer.layer_type))
            .collect();
        assert_eq!(
            order,
            [
                (2, LayerSide::Back, LayerType::Silkscreen),
                (1, LayerSide::Front, LayerType::Mask),
                (1, LayerSide::Front, LayerType::Mask),
                (1, LayerSide::Front, LayerType::Copper),
                (1, LayerSide::Front, LayerType::Copper),
                (0, LayerSide::Front, LayerType::Silkscreen),
                (4, LayerSide::Front, LayerType::Fabrication),
                (3, LayerSide::Front, LayerType::Courtyard),
            ]
        );
    }

    #[test]
    fn test_wildcard_pad_drawn_on_every_side() {
        let mut module = Module::new(None, vec![pad(&["*.Cu"])]);
        let scene = render(&mut module, Canvas::new(10.0, 10.0), &PreviewOptions::default());
        let sides: Vec<_> = scene
            .calls
            .iter()
            .filter(|c| matches!(c.op, DrawOp::Ellipse { ref fill, .. } if fill != "grey"))
            .map(|c| c.layer.side)
            .collect();
        assert_eq!(sides, LayerSide::ALL);
    }

    #[test]
    fn test_colors_follow_palette() {
        let opts = PreviewOptions::default();
        let mut module = Module::new(None, vec![line([0.0, 0.0], [1.0, 0.0], &["B.Cu"])]);
        let scene = render(&mut module, Canvas::new(10.0, 10.0), &opts);
        match &scene.calls[0].op {
            DrawOp::Segment { color, .. } => {
                assert_eq!(color, opts.palette.paint(LayerSide::Back, LayerType::Copper))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_module() {
        let mut module = Module::default();
        let scene = render(&mut module, Canvas::new(40.0, 20.0), &PreviewOptions::default());
        assert!(scene.calls.is_empty());
        assert_eq!(scene.scale, 1.0);
        assert_eq!(scene.origin, [20.0, 10.0]);
    }

    #[test]
    fn test_paint_replays_background_then_ops() {
        let mut module = Module::new(None, vec![line([0.0, 0.0], [10.0, 0.0], &["F.SilkS"])]);
        let scene = render(&mut module, Canvas::new(100.0, 100.0), &PreviewOptions::default());
        let mut recorder = Recorder::default();
        scene.paint(&mut recorder);
        assert_eq!(
            recorder.0,
            [
                "fill_style white",
                "begin_path",
                "move_to 0 0",
                "line_to 100 0",
                "line_to 100 100",
                "line_to 0 100",
                "close_path",
                "fill",
                "translate 5 50",
                "begin_path",
                "move_to 0 0",
                "line_to 90 0",
                "line_width 0.9",
                "stroke_style #F2EDA1",
                "stroke",
            ]
        );
    }

    #[test]
    fn test_pad_outline_width_is_unscaled() {
        let opts = PreviewOptions {
            outline_width: 2.0,
            ..PreviewOptions::default()
        };
        let mut module = Module::new(None, vec![pad(&["F.Cu"])]);
        let scene = render(&mut module, Canvas::new(100.0, 100.0), &opts);
        for call in &scene.calls {
            match &call.op {
                DrawOp::Ellipse { stroke, .. } => {
                    assert_eq!(stroke.as_ref().map(|s| s.width), Some(2.0))
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(scene.calls.len(), 2);
    }
}
