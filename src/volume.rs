//! Image volumes and the sample types they hold.
//!
//! A [`Volume`] is a stack of equally sized planes stored as an
//! `ndarray::Array3` indexed `[plane, row, column]`, together with its
//! [`Calibration`]. The element type is any [`Sample`]: 8-bit and 16-bit
//! integers, 32-bit floats, or packed [`Rgb`] triples. Interpolation is part
//! of the sample type so the samplers never need to know which kind of
//! volume they are walking.

use crate::calibration::Calibration;
use ndarray::{Array3, ArrayView2, Axis};
use std::fmt;

/// The storage kind of a volume, as the host sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Gray8,
    Gray16,
    Gray32,
    Rgb,
}

impl ElementKind {
    pub fn bit_depth(self) -> u32 {
        match self {
            ElementKind::Gray8 => 8,
            ElementKind::Gray16 => 16,
            ElementKind::Gray32 => 32,
            ElementKind::Rgb => 24,
        }
    }

    /// Bytes used per sample in memory. RGB is stored as a 32-bit word.
    pub fn bytes_per_sample(self) -> u64 {
        match self {
            ElementKind::Gray8 => 1,
            ElementKind::Gray16 => 2,
            ElementKind::Gray32 | ElementKind::Rgb => 4,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Rgb => write!(f, "RGB"),
            kind => write!(f, "{}-bit", kind.bit_depth()),
        }
    }
}

/// A value that can be stored in a volume and interpolated.
pub trait Sample: Copy + Default + PartialEq + fmt::Debug {
    const KIND: ElementKind;

    /// Bilinear blend of the corners `[p00, p10, p01, p11]` at fractional
    /// offsets `tx` (along columns) and `ty` (along rows), both in `[0, 1]`.
    fn bilinear(corners: [Self; 4], tx: f64, ty: f64) -> Self;

    /// Linear blend between `a` and `b`.
    fn lerp(a: Self, b: Self, t: f64) -> Self {
        Self::bilinear([a, b, a, b], t, 0.0)
    }
}

#[inline]
fn bilinear_f64(c: [f64; 4], tx: f64, ty: f64) -> f64 {
    let top = c[0] + tx * (c[1] - c[0]);
    let bottom = c[2] + tx * (c[3] - c[2]);
    top + ty * (bottom - top)
}

macro_rules! impl_integer_sample {
    ($t:ty, $kind:expr) => {
        impl Sample for $t {
            const KIND: ElementKind = $kind;

            #[inline]
            fn bilinear(corners: [Self; 4], tx: f64, ty: f64) -> Self {
                let v = bilinear_f64(corners.map(f64::from), tx, ty);
                v.round().clamp(<$t>::MIN as f64, <$t>::MAX as f64) as $t
            }
        }
    };
}

impl_integer_sample!(u8, ElementKind::Gray8);
impl_integer_sample!(u16, ElementKind::Gray16);

impl Sample for f32 {
    const KIND: ElementKind = ElementKind::Gray32;

    #[inline]
    fn bilinear(corners: [Self; 4], tx: f64, ty: f64) -> Self {
        bilinear_f64(corners.map(f64::from), tx, ty) as f32
    }
}

/// A 24-bit colour sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Sample for Rgb {
    const KIND: ElementKind = ElementKind::Rgb;

    #[inline]
    fn bilinear(c: [Self; 4], tx: f64, ty: f64) -> Self {
        // channels are interpolated independently
        Rgb {
            r: u8::bilinear([c[0].r, c[1].r, c[2].r, c[3].r], tx, ty),
            g: u8::bilinear([c[0].g, c[1].g, c[2].g, c[3].g], tx, ty),
            b: u8::bilinear([c[0].b, c[1].b, c[2].b, c[3].b], tx, ty),
        }
    }
}

/// A calibrated stack of planes.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume<S> {
    data: Array3<S>,
    calibration: Calibration,
}

impl<S: Sample> Volume<S> {
    /// Wraps an array indexed `[plane, row, column]`.
    pub fn new(data: Array3<S>, calibration: Calibration) -> Self {
        Self { data, calibration }
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn depth(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn kind(&self) -> ElementKind {
        S::KIND
    }

    /// Read-only view of plane `z` (zero based).
    pub fn plane(&self, z: usize) -> ArrayView2<'_, S> {
        self.data.index_axis(Axis(0), z)
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<S> {
        self.data.get((z, y, x)).copied()
    }

    pub fn data(&self) -> &Array3<S> {
        &self.data
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = calibration;
    }

    /// Size of the sample storage in bytes.
    pub fn byte_size(&self) -> u64 {
        self.data.len() as u64 * S::KIND.bytes_per_sample()
    }
}
