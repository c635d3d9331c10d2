use lattice_consolidation::image::GrayImageU8;
use std::f64::consts::PI;

/// Doubly periodic texture `128 + 100·sin(2πx/p)·cos(2πy/p)`.
///
/// Shifting by a full period reproduces the texture; shifting by half a
/// period along x inverts its contrast.
pub fn periodic_texture(width: usize, height: usize, period: f64) -> GrayImageU8 {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(period > 0.0, "period must be positive");

    let mut data = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let sx = (2.0 * PI * x as f64 / period).sin();
            let cy = (2.0 * PI * y as f64 / period).cos();
            data[y * width + x] = (128.0 + 100.0 * sx * cy).round().clamp(0.0, 255.0) as u8;
        }
    }
    GrayImageU8::new(width, height, data)
}
