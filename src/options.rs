//! Per-call reslice options.
//!
//! These replace "last used" settings: the caller owns an options value,
//! passes it to every call and keeps it between calls if it wants to.

use crate::calibration::{normalize_spacing, Calibration};
use crate::common::StartEdge;

#[derive(Debug, Clone, PartialEq)]
pub struct ResliceOptions {
    /// Edge of a rectangular cut to start from. Ignored for other cuts.
    pub start_edge: StartEdge,
    /// Overrides the source plane spacing, in calibrated units.
    pub input_z_spacing: Option<f64>,
    /// Distance between output planes in calibrated units. Defaults to the
    /// (possibly overridden) input Z spacing.
    pub output_z_spacing: Option<f64>,
    /// Number of output planes for line cuts.
    pub slice_count: usize,
    /// Visit source planes last to first.
    pub flip: bool,
    /// Transpose each output plane.
    pub rotate: bool,
    /// Sample in whole-pixel steps, ignoring the calibration.
    pub avoid_interpolation: bool,
    /// Refuse output volumes above this many bytes.
    pub memory_limit: Option<u64>,
}

impl Default for ResliceOptions {
    fn default() -> Self {
        Self {
            start_edge: StartEdge::Top,
            input_z_spacing: None,
            output_z_spacing: None,
            slice_count: 1,
            flip: false,
            rotate: false,
            avoid_interpolation: false,
            memory_limit: None,
        }
    }
}

impl ResliceOptions {
    /// Source calibration as this run sees it: unset spacings are 1.0 and
    /// the input Z override is applied.
    pub fn effective_calibration(&self, source: &Calibration) -> Calibration {
        let mut cal = source.clone();
        if let Some(z) = self.input_z_spacing {
            cal.z.spacing = z;
        }
        cal.normalized()
    }

    /// Calibration the samplers work in: `cal` itself, or unit spacings
    /// when avoiding interpolation so every step is one whole pixel.
    pub fn sampling_calibration(&self, cal: &Calibration) -> Calibration {
        if self.avoid_interpolation {
            cal.unit_spacing()
        } else {
            cal.clone()
        }
    }

    /// Distance between output planes in source pixels.
    pub fn step_spacing(&self, cal: &Calibration) -> f64 {
        if self.avoid_interpolation {
            // the output spacing override only applies to interpolated runs
            return 1.0;
        }
        let out = normalize_spacing(self.output_z_spacing.unwrap_or(cal.z.spacing));
        out / cal.x.spacing_or_unit()
    }

    /// Stretch of the stack axis so planes and pixels share one scale.
    pub fn stack_scale(&self, cal: &Calibration) -> f64 {
        let cal = self.sampling_calibration(cal);
        cal.z.spacing_or_unit() / cal.x.spacing_or_unit()
    }
}
