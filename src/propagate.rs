//! Calibration of a resliced volume.
//!
//! The output X axis runs along the cut, the output Y axis is the old stack
//! axis and the output Z axis is the direction the cut moves in. For cuts
//! that are not axis aligned the X and Z spacings are the source pixel
//! sizes weighted by the cut's direction cosines.

use crate::calibration::{AxisCalibration, Calibration};
use crate::common::Direction;
use crate::geometry::CutPath;

/// What the propagator needs to know about a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropagateParams {
    /// Distance between output planes in source pixels.
    pub step_spacing: f64,
    /// False when the caller asked to avoid interpolation; the output Z
    /// spacing is then the raw per-step spacing.
    pub interpolate: bool,
    pub rotate: bool,
}

impl Default for PropagateParams {
    fn default() -> Self {
        Self {
            step_spacing: 1.0,
            interpolate: true,
            rotate: false,
        }
    }
}

/// Spacing along a direction `(dx, dy)` for pixel size `w × h`.
///
/// Equals `w` for horizontal directions, `h` for vertical ones, and `w` for
/// any direction when the pixels are square.
pub fn directional_spacing(dx: f64, dy: f64, w: f64, h: f64) -> f64 {
    if w == h || dy == 0.0 {
        return w;
    }
    if dx == 0.0 {
        return h;
    }
    (dx * w).hypot(dy * h) / dx.hypot(dy)
}

/// Derives the output calibration from the (normalised) source calibration.
pub fn propagate(source: &Calibration, path: &CutPath, params: &PropagateParams) -> Calibration {
    let src = source.normalized();
    let (x, mut z) = match path {
        CutPath::Straight(line) => match line.direction() {
            // scan along X, step along Y
            Direction::Horizontal => (
                AxisCalibration::new(src.x.spacing, 0.0, src.x.unit.clone()),
                src.y.clone(),
            ),
            // scan along Y, step along X
            Direction::Vertical => (
                AxisCalibration::new(src.y.spacing, 0.0, src.y.unit.clone()),
                src.x.clone(),
            ),
            Direction::Oblique { dx, dy } => {
                let (w, h) = (src.x.spacing, src.y.spacing);
                (
                    AxisCalibration::new(
                        directional_spacing(dx, dy, w, h),
                        0.0,
                        src.x.unit.clone(),
                    ),
                    // the step direction is the line direction turned 90 degrees
                    AxisCalibration::new(
                        directional_spacing(dy, dx, w, h),
                        0.0,
                        src.x.unit.clone(),
                    ),
                )
            }
        },
        CutPath::Irregular(_) => {
            let x = if src.x.spacing == src.y.spacing {
                AxisCalibration::new(src.y.spacing, 0.0, src.y.unit.clone())
            } else {
                AxisCalibration::pixel()
            };
            (x, AxisCalibration::pixel())
        }
    };
    if params.interpolate && matches!(path, CutPath::Straight(_)) {
        z.spacing *= params.step_spacing;
    }
    // the stack axis becomes the vertical axis, stretched or not
    let y = src.z.clone();
    let mut cal = Calibration::new(x, y, z);
    if params.rotate {
        cal.swap_xy();
    }
    cal
}
