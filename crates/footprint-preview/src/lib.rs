pub mod elements;
pub mod error;
pub mod layers;
pub mod palette;
pub mod parsers;
pub mod render;
pub mod types;

use elements::Module;
use error::{ParseError, PreviewError};
use log::warn;
use palette::Palette;
use parsers::footprint::{self, Diagnostic};
use parsers::sexpr;
use render::{Canvas, Scene};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub palette: Palette,
    /// Fraction of the canvas the footprint may cover.
    pub fit_margin: f64,
    /// Floor for extents and drill sizes; keeps degenerate geometry finite.
    pub min_extent: f64,
    /// Width of pad outlines in canvas units, not scaled with the model.
    pub outline_width: f64,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            fit_margin: 0.9,
            min_extent: 1e-5,
            outline_width: 1.0,
        }
    }
}

/// Result of a full parse, build and render pass.
#[derive(Debug, Clone)]
pub struct Preview {
    /// The model after fitting, in canvas units.
    pub module: Module,
    pub scene: Scene,
    pub diagnostics: Vec<Diagnostic>,
}

/// Whether `path` looks like a KiCad footprint file.
pub fn is_footprint_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("kicad_mod"))
}

/// Parse footprint text and build its model.
pub fn load(text: &str) -> Result<(Module, Vec<Diagnostic>), ParseError> {
    let tree = sexpr::parse(text)?;
    Ok(footprint::build_with_diagnostics(tree.module()))
}

/// Parse footprint text and render it onto a canvas of the given size.
pub fn preview(text: &str, canvas: Canvas, opts: &PreviewOptions) -> Result<Preview, PreviewError> {
    if !canvas.is_valid() {
        return Err(PreviewError::InvalidCanvas {
            width: canvas.width,
            height: canvas.height,
        });
    }
    let (mut module, diagnostics) = load(text)?;
    let scene = render::render(&mut module, canvas, opts);
    Ok(Preview {
        module,
        scene,
        diagnostics,
    })
}

/// Read a footprint file and render it.
pub fn preview_file(
    path: &Path,
    canvas: Canvas,
    opts: &PreviewOptions,
) -> Result<Preview, PreviewError> {
    if !is_footprint_file(path) {
        warn!("{} does not have a .kicad_mod extension", path.display());
    }
    let data = std::fs::read(path)?;
    preview(&String::from_utf8_lossy(&data), canvas, opts)
}
