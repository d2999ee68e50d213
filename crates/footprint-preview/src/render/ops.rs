use super::surface::Surface;
use crate::types::{serialize_f64_rounded, serialize_point};
use serde::Serialize;
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub color: String,
    #[serde(serialize_with = "serialize_f64_rounded")]
    pub width: f64,
}

/// One resolved drawing primitive. Geometry is in scaled model units; the
/// scene's origin translation is applied by the surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Segment {
        #[serde(serialize_with = "serialize_point")]
        from: [f64; 2],
        #[serde(serialize_with = "serialize_point")]
        to: [f64; 2],
        #[serde(serialize_with = "serialize_f64_rounded")]
        width: f64,
        color: String,
    },
    /// Stroked circular arc, angles in radians.
    Arc {
        #[serde(serialize_with = "serialize_point")]
        center: [f64; 2],
        #[serde(serialize_with = "serialize_f64_rounded")]
        radius: f64,
        #[serde(serialize_with = "serialize_f64_rounded")]
        start_angle: f64,
        #[serde(serialize_with = "serialize_f64_rounded")]
        end_angle: f64,
        anticlockwise: bool,
        #[serde(serialize_with = "serialize_f64_rounded")]
        width: f64,
        color: String,
    },
    Ellipse {
        #[serde(serialize_with = "serialize_point")]
        center: [f64; 2],
        #[serde(serialize_with = "serialize_point")]
        radii: [f64; 2],
        fill: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stroke: Option<Stroke>,
    },
    Rect {
        #[serde(serialize_with = "serialize_point")]
        center: [f64; 2],
        #[serde(serialize_with = "serialize_point")]
        size: [f64; 2],
        fill: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stroke: Option<Stroke>,
    },
    RoundRect {
        #[serde(serialize_with = "serialize_point")]
        center: [f64; 2],
        #[serde(serialize_with = "serialize_point")]
        size: [f64; 2],
        #[serde(serialize_with = "serialize_f64_rounded")]
        radius: f64,
        fill: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stroke: Option<Stroke>,
    },
    /// Stadium: a rectangle capped by two half circles on its short sides.
    Oval {
        #[serde(serialize_with = "serialize_point")]
        center: [f64; 2],
        #[serde(serialize_with = "serialize_point")]
        size: [f64; 2],
        fill: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stroke: Option<Stroke>,
    },
}

impl DrawOp {
    pub fn paint(&self, surface: &mut dyn Surface) {
        match self {
            DrawOp::Segment {
                from,
                to,
                width,
                color,
            } => {
                surface.begin_path();
                surface.move_to(from[0], from[1]);
                surface.line_to(to[0], to[1]);
                surface.set_line_width(*width);
                surface.set_stroke_style(color);
                surface.stroke();
            }
            DrawOp::Arc {
                center,
                radius,
                start_angle,
                end_angle,
                anticlockwise,
                width,
                color,
            } => {
                surface.begin_path();
                surface.arc(
                    center[0],
                    center[1],
                    *radius,
                    *start_angle,
                    *end_angle,
                    *anticlockwise,
                );
                surface.set_line_width(*width);
                surface.set_stroke_style(color);
                surface.stroke();
            }
            DrawOp::Ellipse {
                center,
                radii,
                fill,
                stroke,
            } => {
                surface.begin_path();
                surface.ellipse(center[0], center[1], radii[0], radii[1], 0.0, 0.0, 2.0 * PI);
                fill_and_stroke(surface, fill, stroke.as_ref());
            }
            DrawOp::Rect {
                center,
                size,
                fill,
                stroke,
            } => {
                surface.begin_path();
                surface.rect(
                    center[0] - size[0] / 2.0,
                    center[1] - size[1] / 2.0,
                    size[0],
                    size[1],
                );
                fill_and_stroke(surface, fill, stroke.as_ref());
            }
            DrawOp::RoundRect {
                center,
                size,
                radius,
                fill,
                stroke,
            } => {
                surface.begin_path();
                rounded_rect_path(surface, *center, *size, *radius);
                fill_and_stroke(surface, fill, stroke.as_ref());
            }
            DrawOp::Oval {
                center,
                size,
                fill,
                stroke,
            } => {
                surface.begin_path();
                rounded_rect_path(surface, *center, *size, size[0].min(size[1]) / 2.0);
                fill_and_stroke(surface, fill, stroke.as_ref());
            }
        }
    }
}

fn fill_and_stroke(surface: &mut dyn Surface, fill: &str, stroke: Option<&Stroke>) {
    surface.set_fill_style(fill);
    surface.fill();
    if let Some(stroke) = stroke {
        surface.set_line_width(stroke.width);
        surface.set_stroke_style(&stroke.color);
        surface.stroke();
    }
}

/// Trace a rectangle with circular corners, clockwise from the top edge.
fn rounded_rect_path(surface: &mut dyn Surface, center: [f64; 2], size: [f64; 2], radius: f64) {
    let r = radius.clamp(0.0, size[0].min(size[1]) / 2.0);
    let x0 = center[0] - size[0] / 2.0;
    let y0 = center[1] - size[1] / 2.0;
    let x1 = center[0] + size[0] / 2.0;
    let y1 = center[1] + size[1] / 2.0;

    surface.move_to(x0 + r, y0);
    surface.line_to(x1 - r, y0);
    surface.arc(x1 - r, y0 + r, r, -PI / 2.0, 0.0, false);
    surface.line_to(x1, y1 - r);
    surface.arc(x1 - r, y1 - r, r, 0.0, PI / 2.0, false);
    surface.line_to(x0 + r, y1);
    surface.arc(x0 + r, y1 - r, r, PI / 2.0, PI, false);
    surface.line_to(x0, y0 + r);
    surface.arc(x0 + r, y0 + r, r, PI, 1.5 * PI, false);
    surface.close_path();
}
