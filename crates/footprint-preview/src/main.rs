use clap::Parser;
use footprint_preview::error::PreviewError;
use footprint_preview::palette::Palette;
use footprint_preview::render::svg::SvgSurface;
use footprint_preview::render::Canvas;
use footprint_preview::{preview_file, Preview, PreviewOptions};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fp-preview", about = "Render a KiCad footprint preview")]
struct Cli {
    /// Input footprint file (.kicad_mod)
    input: PathBuf,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (svg, json)
    #[arg(short, long, default_value = "svg", value_parser = parse_format)]
    format: OutputFormat,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// JSON palette overriding the default layer colors
    #[arg(long)]
    palette: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum OutputFormat {
    Svg,
    Json,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_lowercase().as_str() {
        "svg" => Ok(OutputFormat::Svg),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!("Unknown format: {s}. Use: svg, json")),
    }
}

fn load_palette(path: &Path) -> Result<Palette, PreviewError> {
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

fn to_svg(preview: &Preview) -> String {
    let canvas = preview.scene.canvas;
    let mut svg = SvgSurface::new(canvas.width, canvas.height);
    if let Some(name) = preview.module.name() {
        svg = svg.with_title(name);
    }
    preview.scene.paint(&mut svg);
    svg.finish()
}

fn run(cli: &Cli) -> Result<String, PreviewError> {
    let mut opts = PreviewOptions::default();
    if let Some(path) = &cli.palette {
        opts.palette = load_palette(path)?;
    }

    let canvas = Canvas::new(cli.width, cli.height);
    let preview = preview_file(&cli.input, canvas, &opts)?;
    for diagnostic in &preview.diagnostics {
        if diagnostic.dropped() {
            eprintln!("Skipped {diagnostic}");
        } else {
            eprintln!("Warning: {diagnostic}");
        }
    }

    Ok(match cli.format {
        OutputFormat::Svg => to_svg(&preview),
        OutputFormat::Json if cli.pretty => serde_json::to_string_pretty(&preview.scene)?,
        OutputFormat::Json => serde_json::to_string(&preview.scene)?,
    })
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let rendered = match run(&cli) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if let Some(output_path) = cli.output {
        if let Err(e) = std::fs::write(&output_path, &rendered) {
            eprintln!("Error writing {}: {e}", output_path.display());
            std::process::exit(1);
        }
        eprintln!("Written to {}", output_path.display());
    } else {
        print!("{rendered}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_defaults_to_svg() {
        let cli = Cli::try_parse_from(["fp-preview", "part.kicad_mod"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Svg);
    }

    #[test]
    fn test_format_is_case_insensitive() {
        let cli = Cli::try_parse_from(["fp-preview", "part.kicad_mod", "-f", "JSON"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_unknown_format_is_rejected_by_the_parser() {
        let err = Cli::try_parse_from(["fp-preview", "part.kicad_mod", "--format", "png"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(err.to_string().contains("Unknown format: png"));
    }
}
