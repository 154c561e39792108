//! Compares a synthetic gradient against progressively brighter copies.
//!
//! Run with `cargo run --release --example compare -p perceptualdiff`.

use perceptualdiff::{compare, Img, Parameters, RGB8};

fn gradient(width: usize, height: usize, offset: u8) -> Img<Vec<RGB8>> {
    let pixels = (0..width * height)
        .map(|i| {
            let v = ((i % width) * 200 / width) as u8;
            let v = v.saturating_add(offset);
            RGB8::new(v, v, v)
        })
        .collect();
    Img::new(pixels, width, height)
}

fn main() {
    let (width, height) = (256, 128);
    let reference = gradient(width, height, 0);
    let params = Parameters::default();

    for offset in [0u8, 1, 2, 4, 8, 16, 32] {
        let candidate = gradient(width, height, offset);
        let result = compare(&reference, &candidate, &params);
        println!(
            "offset {offset:>2}: {:<42} {:>6} px failed, error sum {:.3}",
            result.reason.as_str(),
            result.num_pixels_failed,
            result.error_sum
        );
    }
}
