//! perceptualdiff CLI - Perceptual image comparison
//!
//! Decide whether two images would look the same to a human viewer.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use colored::Colorize;
use perceptualdiff::{
    compare_with_log, downsample_2x, CompareResult, Img, ImgVec, Parameters, Reason, RGBA, RGBA8,
};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Perceptual image comparison
///
/// Compares two images with a model of the human visual system. Images that
/// differ bit-for-bit still pass when too few pixels show a visible
/// difference under the given viewing conditions.
#[derive(Parser, Debug)]
#[command(name = "perceptualdiff")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Compare two images:
        perceptualdiff expected.png actual.png

    Save the failing pixels as a blue-on-black mask:
        perceptualdiff --output diff.png expected.png actual.png

    Strict check for CI, ignoring color shifts:
        perceptualdiff --threshold 1 --luminance-only expected.png actual.png

    Output JSON for scripting:
        perceptualdiff --json expected.png actual.png

EXIT CODES:
    0 - Images are binary identical or perceptually indistinguishable
    1 - Images are visibly different or their dimensions do not match
    2 - Error (file not found, invalid image, invalid parameter, etc.)")]
struct Cli {
    /// First image
    #[arg(value_name = "IMAGE_A")]
    image_a: PathBuf,

    /// Second image
    #[arg(value_name = "IMAGE_B")]
    image_b: PathBuf,

    /// Print progress and debug logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Horizontal field of view in degrees, 0.1 to 89.9
    #[arg(long, default_value = "45.0", value_name = "DEG")]
    fov: f64,

    /// Number of failed pixels at which the images count as different
    #[arg(long, default_value = "100", value_name = "PIXELS")]
    threshold: u64,

    /// Display gamma
    #[arg(long, default_value = "2.2", value_name = "G")]
    gamma: f64,

    /// Luminance of display white in cd/m^2
    #[arg(long, default_value = "100.0", value_name = "CD_M2")]
    luminance: f64,

    /// Only compare luminance; ignore color differences
    #[arg(long)]
    luminance_only: bool,

    /// Weight of the color test, 0.0 to 1.0
    #[arg(long, default_value = "1.0", value_name = "F")]
    color_factor: f64,

    /// Halve both images this many times before comparing
    #[arg(long, default_value = "0", value_name = "N")]
    down_sample: u32,

    /// Write the difference mask to a PNG file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the sum of all per-pixel errors
    #[arg(long)]
    sum_errors: bool,

    /// Output a JSON report
    #[arg(long, conflicts_with = "quiet")]
    json: bool,

    /// No output; report through the exit code only
    #[arg(short, long)]
    quiet: bool,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    image_a: String,
    image_b: String,
    width: usize,
    height: usize,
    pass: bool,
    reason: Reason,
    description: &'static str,
    num_pixels_failed: u64,
    error_sum: f64,
    params: &'a Parameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_colors(&cli);
    setup_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            if !cli.quiet {
                eprintln!("{}: {}", "error".red().bold(), e);
            }
            ExitCode::from(2)
        }
    }
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            // Disable colors if not a terminal
            if !io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn setup_tracing(verbose: bool) {
    let default = if verbose {
        "perceptualdiff=debug"
    } else {
        "perceptualdiff=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(io::stderr),
        )
        .init();
}

fn parameters(cli: &Cli) -> Result<Parameters, String> {
    let params = Parameters::new()
        .with_luminance_only(cli.luminance_only)
        .with_field_of_view(cli.fov)
        .with_gamma(cli.gamma)
        .with_luminance(cli.luminance)
        .with_threshold_pixels(cli.threshold)
        .with_color_factor(cli.color_factor);
    params.validate().map_err(|e| e.to_string())?;
    Ok(params)
}

/// Returns whether the images pass.
fn run(cli: &Cli) -> Result<bool, String> {
    let params = parameters(cli)?;

    let mut image_a = load_image(&cli.image_a)?;
    let mut image_b = load_image(&cli.image_b)?;
    for step in 0..cli.down_sample {
        match (downsample_2x(&image_a), downsample_2x(&image_b)) {
            (Some(a), Some(b)) => {
                image_a = a;
                image_b = b;
            }
            _ => {
                debug!(step, "image too small to downsample further");
                break;
            }
        }
    }

    let result = if cli.verbose && !cli.json && !cli.quiet {
        compare_with_log(&image_a, &image_b, &params, Some(&mut io::stderr()))
    } else {
        compare_with_log(&image_a, &image_b, &params, None)
    };
    info!(reason = %result.reason, failed = result.num_pixels_failed, "compared");

    if let (Some(path), Some(diff)) = (&cli.output, &result.image_difference) {
        save_difference(diff, path)?;
        if cli.verbose && !cli.quiet && !cli.json {
            eprintln!("Difference mask saved to: {}", path.display());
        }
    }

    if cli.json {
        output_json(cli, &params, &result, &image_a)?;
    } else if !cli.quiet {
        output_text(cli, &result);
    }

    Ok(result.identical)
}

fn load_image(path: &Path) -> Result<ImgVec<RGBA<u16>>, String> {
    let img = image::open(path)
        .map_err(|e| format!("failed to load '{}': {}", path.display(), e))?
        .into_rgba16();
    let (width, height) = img.dimensions();
    let pixels = img
        .as_raw()
        .chunks_exact(4)
        .map(|c| RGBA::new(c[0], c[1], c[2], c[3]))
        .collect();
    Ok(Img::new(pixels, width as usize, height as usize))
}

fn save_difference(diff: &ImgVec<RGBA8>, path: &Path) -> Result<(), String> {
    let mut bytes = Vec::with_capacity(diff.width() * diff.height() * 4);
    for row in diff.rows() {
        for px in row {
            bytes.extend_from_slice(&[px.r, px.g, px.b, px.a]);
        }
    }

    image::save_buffer_with_format(
        path,
        &bytes,
        diff.width() as u32,
        diff.height() as u32,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| format!("failed to save '{}': {}", path.display(), e))
}

fn output_text(cli: &Cli, result: &CompareResult) {
    if result.identical {
        println!("{}: {}", "PASS".green().bold(), result.reason);
    } else {
        println!("{}: {}", "FAIL".red().bold(), result.reason);
    }

    if result.image_difference.is_some() {
        let failed = result.num_pixels_failed.to_string();
        if result.num_pixels_failed > 0 {
            println!("{} pixels are different", failed.yellow());
        } else {
            println!("{failed} pixels are different");
        }
    }

    if cli.sum_errors {
        println!("{:.6} error sum", result.error_sum);
    }

    // Flush stdout
    let _ = io::stdout().flush();
}

fn output_json(
    cli: &Cli,
    params: &Parameters,
    result: &CompareResult,
    image_a: &ImgVec<RGBA<u16>>,
) -> Result<(), String> {
    let output = JsonOutput {
        image_a: cli.image_a.display().to_string(),
        image_b: cli.image_b.display().to_string(),
        width: image_a.width(),
        height: image_a.height(),
        pass: result.identical,
        reason: result.reason,
        description: result.reason.as_str(),
        num_pixels_failed: result.num_pixels_failed,
        error_sum: result.error_sum,
        params,
        output: result
            .image_difference
            .as_ref()
            .and(cli.output.as_ref())
            .map(|p| p.display().to_string()),
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| format!("failed to serialize JSON: {e}"))?;
    println!("{json}");
    Ok(())
}
