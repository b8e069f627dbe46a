#![allow(dead_code)]

use ndarray::Array3;
use reslicenii::{AxisCalibration, Calibration, Rgb, Volume};

/// Value at (x, y, z) is `100 * z + 10 * y + x`.
pub fn ramp_f32(w: usize, h: usize, d: usize) -> Volume<f32> {
    let data = Array3::from_shape_fn((d, h, w), |(z, y, x)| (100 * z + 10 * y + x) as f32);
    Volume::new(data, Calibration::default())
}

/// Pseudo-random 8-bit volume, reproducible across runs.
pub fn noise_u8(w: usize, h: usize, d: usize) -> Volume<u8> {
    let mut state = 0x2545_f491_u32;
    let data = Array3::from_shape_fn((d, h, w), |_| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state & 0xff) as u8
    });
    Volume::new(data, Calibration::default())
}

pub fn rgb_stripes(w: usize, h: usize, d: usize) -> Volume<Rgb> {
    let data = Array3::from_shape_fn((d, h, w), |(z, y, x)| {
        Rgb::new((x * 10) as u8, (y * 10) as u8, (z * 10) as u8)
    });
    Volume::new(data, Calibration::default())
}

pub fn calibration(x: f64, y: f64, z: f64) -> Calibration {
    Calibration::new(
        AxisCalibration::new(x, 0.0, "mm"),
        AxisCalibration::new(y, 0.0, "mm"),
        AxisCalibration::new(z, 0.0, "mm"),
    )
}
