//! Integration tests for the perceptualdiff CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn perceptualdiff_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_perceptualdiff"))
}

/// Fresh scratch directory per test.
fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "perceptualdiff_cli_{}_{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Writes a solid-color RGB PNG.
fn create_solid_png(path: &Path, width: u32, height: u32, rgb: [u8; 3]) {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    img.save(path).expect("Failed to write PNG");
}

/// Writes a gray PNG with one differing pixel at (3, 3).
fn create_spot_png(path: &Path, spot: u8) {
    let mut img = image::RgbImage::from_pixel(8, 8, image::Rgb([128, 128, 128]));
    img.put_pixel(3, 3, image::Rgb([spot, spot, spot]));
    img.save(path).expect("Failed to write PNG");
}

fn run(args: &[&str], a: &Path, b: &Path) -> Output {
    Command::new(perceptualdiff_bin())
        .args(args)
        .arg(a)
        .arg(b)
        .arg("--color")
        .arg("never")
        .output()
        .expect("Failed to run perceptualdiff")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_identical_images_pass() {
    let dir = temp_dir("identical");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    create_solid_png(&a, 4, 4, [128, 128, 128]);
    create_solid_png(&b, 4, 4, [128, 128, 128]);

    let output = run(&[], &a, &b);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "PASS: Images are binary identical\n");
}

#[test]
fn test_small_difference_is_indistinguishable() {
    let dir = temp_dir("indistinguishable");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    create_spot_png(&a, 128);
    create_spot_png(&b, 200);

    let output = run(&[], &a, &b);
    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("PASS: Images are perceptually indistinguishable"), "{out}");
    assert!(out.contains("1 pixels are different"), "{out}");
}

#[test]
fn test_threshold_makes_difference_visible() {
    let dir = temp_dir("visible");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    create_spot_png(&a, 128);
    create_spot_png(&b, 200);

    let output = run(&["--threshold", "1"], &a, &b);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("FAIL: Images are visibly different"));
}

#[test]
fn test_dimension_mismatch_fails() {
    let dir = temp_dir("mismatch");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    create_solid_png(&a, 4, 4, [0, 0, 0]);
    create_solid_png(&b, 5, 4, [0, 0, 0]);

    let output = run(&[], &a, &b);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "FAIL: Image dimensions do not match\n");
}

#[test]
fn test_output_writes_difference_mask() {
    let dir = temp_dir("output");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    let diff = dir.join("diff.png");
    create_solid_png(&a, 2, 2, [255, 255, 255]);
    create_solid_png(&b, 2, 2, [0, 0, 0]);

    let output = run(&["--output", diff.to_str().expect("utf-8 path")], &a, &b);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("4 pixels are different"));

    let mask = image::open(&diff).expect("diff is a PNG").into_rgba8();
    assert_eq!(mask.dimensions(), (2, 2));
    assert!(mask.pixels().all(|p| p.0 == [0, 0, 255, 255]));
}

#[test]
fn test_sum_errors() {
    let dir = temp_dir("sum_errors");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    create_solid_png(&a, 2, 2, [255, 255, 255]);
    create_solid_png(&b, 2, 2, [0, 0, 0]);

    let output = run(&["--sum-errors"], &a, &b);
    let out = stdout(&output);
    let line = out
        .lines()
        .find(|l| l.ends_with("error sum"))
        .unwrap_or_else(|| panic!("no error sum line in {out}"));
    let sum: f64 = line
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .expect("numeric error sum");
    assert!((sum - 400.0).abs() < 0.01, "{sum}");
}

#[test]
fn test_json_output() {
    let dir = temp_dir("json");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    create_spot_png(&a, 128);
    create_spot_png(&b, 200);

    let output = run(&["--json", "--threshold", "1"], &a, &b);
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["pass"], false);
    assert_eq!(json["reason"], "visibly_different");
    assert_eq!(json["description"], "Images are visibly different");
    assert_eq!(json["num_pixels_failed"], 1);
    assert_eq!(json["width"], 8);
    assert_eq!(json["params"]["threshold_pixels"], 1);
}

#[test]
fn test_quiet_prints_nothing() {
    let dir = temp_dir("quiet");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    create_solid_png(&a, 4, 4, [10, 10, 10]);
    create_solid_png(&b, 4, 5, [10, 10, 10]);

    let output = run(&["--quiet"], &a, &b);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_verbose_logs_progress() {
    let dir = temp_dir("verbose");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    create_spot_png(&a, 128);
    create_spot_png(&b, 140);

    let output = run(&["--verbose"], &a, &b);
    assert_eq!(output.status.code(), Some(0));
    let err = String::from_utf8_lossy(&output.stderr);
    let convert = err.find("Converting RGB to XYZ").expect("convert line");
    let test = err.find("Performing test").expect("test line");
    let pyramids = err
        .find("Constructing Laplacian Pyramids")
        .expect("pyramid line");
    assert!(convert < test && test < pyramids);
}

#[test]
fn test_down_sample() {
    let dir = temp_dir("down_sample");
    let a = dir.join("a.png");
    let b = dir.join("b.png");
    create_solid_png(&a, 16, 16, [90, 90, 90]);
    create_solid_png(&b, 16, 16, [90, 90, 90]);

    let output = run(&["--down-sample", "10"], &a, &b);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_missing_file_is_error() {
    let dir = temp_dir("missing");
    let a = dir.join("a.png");
    create_solid_png(&a, 4, 4, [0, 0, 0]);

    let output = run(&[], &a, &dir.join("nope.png"));
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load"));
}

#[test]
fn test_invalid_parameter_is_error() {
    let dir = temp_dir("invalid");
    let a = dir.join("a.png");
    create_solid_png(&a, 4, 4, [0, 0, 0]);

    let output = run(&["--color-factor", "2"], &a, &a);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("color factor"));
}
