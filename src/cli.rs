use crate::drawing::{DEFAULT_SVG_DIR, Drawing, FileNamer};
use crate::report::{DEFAULT_COMPANION_FILE, DEFAULT_REPORT_FILE, Report};
use crate::settings::{DEFAULT_SETTINGS_FILE, get_draw_settings, write_draw_settings};
use crate::tagging::{DEFAULT_TAGS_DIR, load_examples};
use crate::traffic_sign::{DEFAULT_ICONS_DIR, IconLibrary};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "waysvg",
    version,
    about = "Draw road cross-section tag examples as svg and collect them in an html table"
)]
pub struct Args {
    /// Directory with the example definitions (*.json)
    #[arg(short = 't', long = "tags-dir", default_value = DEFAULT_TAGS_DIR)]
    pub tags_dir: PathBuf,

    /// Directory the report and the svg directory are written to
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,

    /// Svg directory, relative to the output directory
    #[arg(long = "svg-dir", default_value = DEFAULT_SVG_DIR)]
    pub svg_dir: String,

    /// Directory with traffic sign icons named VZ_<code>.svg
    #[arg(short = 'i', long = "icons-dir", default_value = DEFAULT_ICONS_DIR)]
    pub icons_dir: PathBuf,

    /// Draw settings file; read if present and written back afterwards
    #[arg(short = 's', long = "settings", default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Html document embedded next to the generated table
    #[arg(short = 'c', long = "companion", default_value = DEFAULT_COMPANION_FILE)]
    pub companion: PathBuf,

    /// Report file, relative to the output directory
    #[arg(short = 'r', long = "report", default_value = DEFAULT_REPORT_FILE)]
    pub report: PathBuf,

    /// Also rasterize every drawing to png
    #[cfg(feature = "png")]
    #[arg(long = "png")]
    pub png: bool,

    /// Log debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = get_draw_settings(Some(&args.settings));
    write_draw_settings(&settings, &args.settings);

    let examples = load_examples(&args.tags_dir)
        .with_context(|| format!("loading examples from '{}'", args.tags_dir.display()))?;
    info!(count = examples.len(), "examples loaded");

    let mut namer = FileNamer::new(args.svg_dir.clone());
    let mut icons = IconLibrary::new(&args.icons_dir);
    let mut report = Report::new();

    for example in &examples {
        let mut drawing = Drawing::new(&mut namer);
        drawing
            .add_group(example, &settings)
            .and_then(|()| drawing.draw(&settings))
            .with_context(|| format!("drawing example '{}'", example.name))?;
        let path = drawing
            .save(&args.output_dir, &mut icons, &settings)
            .with_context(|| format!("saving example '{}'", example.name))?;
        rasterize_if_requested(&args, &path)?;
        info!(example = %example.name, path = %path.display(), "drawing written");
        report.push(&drawing);
    }

    let companion = read_companion(&args.companion);
    let report_path = args.output_dir.join(&args.report);
    report
        .write(&companion, &report_path)
        .with_context(|| format!("writing report '{}'", report_path.display()))?;
    info!(rows = report.len(), path = %report_path.display(), "report written");
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn read_companion(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(path = %path.display(), "companion document not embedded: {err}");
            String::new()
        }
    }
}

#[cfg(feature = "png")]
fn rasterize_if_requested(args: &Args, svg_path: &Path) -> Result<()> {
    if !args.png {
        return Ok(());
    }
    let svg = std::fs::read_to_string(svg_path)
        .with_context(|| format!("reading '{}'", svg_path.display()))?;
    let png_path = svg_path.with_extension("png");
    crate::render::write_output_png(&svg, &png_path)
        .with_context(|| format!("writing '{}'", png_path.display()))
}

#[cfg(not(feature = "png"))]
fn rasterize_if_requested(_args: &Args, _svg_path: &Path) -> Result<()> {
    Ok(())
}
