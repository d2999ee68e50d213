use super::surface::Surface;
use crate::types::round_f64;
use std::f64::consts::{PI, TAU};
use std::fmt::Write;

/// [`Surface`] that records paths into a standalone SVG document.
pub struct SvgSurface {
    width: f64,
    height: f64,
    title: Option<String>,
    body: String,
    path: String,
    current: Option<[f64; 2]>,
    offset: [f64; 2],
    fill: String,
    stroke: String,
    line_width: f64,
}

fn num(v: f64) -> f64 {
    // Avoids "-0" in the output.
    round_f64(v, 3) + 0.0
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl SvgSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            title: None,
            body: String::new(),
            path: String::new(),
            current: None,
            offset: [0.0, 0.0],
            fill: "black".to_string(),
            stroke: "black".to_string(),
            line_width: 1.0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Close the document and return the SVG text.
    pub fn finish(self) -> String {
        let title = self
            .title
            .map(|t| format!("<title>{}</title>\n", xml_escape(&t)))
            .unwrap_or_default();
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{title}{body}</svg>\n",
            w = num(self.width),
            h = num(self.height),
            body = self.body,
        )
    }

    fn point(&self, x: f64, y: f64) -> [f64; 2] {
        [x + self.offset[0], y + self.offset[1]]
    }

    fn jump_to(&mut self, p: [f64; 2]) {
        let cmd = if self.current.is_some() { 'L' } else { 'M' };
        let _ = write!(self.path, "{cmd}{} {} ", num(p[0]), num(p[1]));
        self.current = Some(p);
    }

    /// Elliptical arc from the current point, split into halves so a full
    /// turn still renders.
    #[allow(clippy::too_many_arguments)]
    fn arc_segments(
        &mut self,
        center: [f64; 2],
        radii: [f64; 2],
        rotation: f64,
        start: f64,
        sweep: f64,
    ) {
        let (sin_r, cos_r) = rotation.sin_cos();
        let at = |angle: f64| {
            let (s, c) = angle.sin_cos();
            let (ex, ey) = (radii[0] * c, radii[1] * s);
            [
                center[0] + ex * cos_r - ey * sin_r,
                center[1] + ex * sin_r + ey * cos_r,
            ]
        };
        self.jump_to(at(start));
        if sweep == 0.0 {
            return;
        }
        let pieces = if sweep.abs() > PI { 2 } else { 1 };
        let step = sweep / pieces as f64;
        for i in 1..=pieces {
            let end = at(start + step * i as f64);
            let _ = write!(
                self.path,
                "A{} {} {} 0 {} {} {} ",
                num(radii[0]),
                num(radii[1]),
                num(rotation.to_degrees()),
                u8::from(step > 0.0),
                num(end[0]),
                num(end[1]),
            );
            self.current = Some(end);
        }
    }
}

/// Signed sweep the way a canvas resolves `arc(start, end, anticlockwise)`.
fn canvas_sweep(start: f64, end: f64, anticlockwise: bool) -> f64 {
    if anticlockwise {
        let delta = start - end;
        if delta >= TAU {
            -TAU
        } else {
            -delta.rem_euclid(TAU)
        }
    } else {
        let delta = end - start;
        if delta >= TAU {
            TAU
        } else {
            delta.rem_euclid(TAU)
        }
    }
}

impl Surface for SvgSurface {
    fn begin_path(&mut self) {
        self.path.clear();
        self.current = None;
    }

    fn close_path(&mut self) {
        self.path.push_str("Z ");
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let p = self.point(x, y);
        let _ = write!(self.path, "M{} {} ", num(p[0]), num(p[1]));
        self.current = Some(p);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let p = self.point(x, y);
        self.jump_to(p);
    }

    fn arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
    ) {
        let center = self.point(x, y);
        let sweep = canvas_sweep(start_angle, end_angle, anticlockwise);
        self.arc_segments(center, [radius, radius], 0.0, start_angle, sweep);
    }

    fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start_angle: f64,
        end_angle: f64,
    ) {
        let center = self.point(x, y);
        let sweep = canvas_sweep(start_angle, end_angle, false);
        self.arc_segments(center, [radius_x, radius_y], rotation, start_angle, sweep);
    }

    fn fill(&mut self) {
        let _ = writeln!(
            self.body,
            "<path d=\"{}\" fill=\"{}\"/>",
            self.path.trim_end(),
            xml_escape(&self.fill)
        );
    }

    fn stroke(&mut self) {
        let _ = writeln!(
            self.body,
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>",
            self.path.trim_end(),
            xml_escape(&self.stroke),
            num(self.line_width)
        );
    }

    fn set_fill_style(&mut self, color: &str) {
        self.fill = color.to_string();
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.stroke = color.to_string();
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.offset[0] += dx;
        self.offset[1] += dy;
    }
}
