//! Predicting the size of a reslice before running it.

use crate::calibration::Calibration;
use crate::error::ResliceResult;
use crate::geometry::{resolve, CutGeometry, CutPath};
use crate::options::ResliceOptions;
use crate::resample::stretched_len;
use crate::volume::{ElementKind, Sample, Volume};
use std::fmt;

const MB: f64 = 1_048_576.0;

/// Predicted output dimensions and storage size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEstimate {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub bytes: u64,
}

impl SizeEstimate {
    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / MB
    }

    pub fn exceeds(&self, limit_bytes: u64) -> bool {
        self.bytes > limit_bytes
    }
}

impl fmt::Display for SizeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mb = self.megabytes().round();
        if mb < 1.0 {
            write!(f, "<1MB")
        } else {
            write!(f, "{mb:.0}MB")
        }
    }
}

/// Size of the volume [`crate::reslice`] would produce.
///
/// Uses the same geometry resolution as the reslice itself, so a
/// rectangular cut is measured by its own width and height rather than the
/// full frame.
///
/// # Arguments
///
/// * `width`, `height`, `depth` - Dimensions of the source stack.
/// * `kind` - The sample type, which fixes the bytes per sample.
/// * `calibration` - Source calibration before any overrides.
/// * `cut` - The cut the reslice would follow.
/// * `options` - The options the reslice would run with.
///
/// # Returns
///
/// The output dimensions and byte size, or `InvalidGeometry` when the cut
/// cannot be resolved.
pub fn estimate(
    width: usize,
    height: usize,
    depth: usize,
    kind: ElementKind,
    calibration: &Calibration,
    cut: &CutGeometry,
    options: &ResliceOptions,
) -> ResliceResult<SizeEstimate> {
    let cal = options.effective_calibration(calibration);
    let path = resolve(
        width,
        height,
        cut,
        options.start_edge,
        options.step_spacing(&cal),
        options.slice_count,
    )?;
    Ok(path_estimate(
        &path,
        depth,
        kind,
        options.stack_scale(&cal),
        options.rotate,
    ))
}

/// Size of the output for an already resolved `path` through `depth` planes.
pub fn path_estimate(
    path: &CutPath,
    depth: usize,
    kind: ElementKind,
    stack_scale: f64,
    rotate: bool,
) -> SizeEstimate {
    let line = path.samples_per_line();
    let stack = stretched_len(depth, stack_scale);
    let (w, h) = if rotate { (stack, line) } else { (line, stack) };
    let steps = path.steps();
    let bytes = (w as u64)
        .saturating_mul(h as u64)
        .saturating_mul(steps as u64)
        .saturating_mul(kind.bytes_per_sample());
    SizeEstimate {
        width: w,
        height: h,
        depth: steps,
        bytes,
    }
}

/// [`estimate`] for an existing volume.
pub fn estimate_for<S: Sample>(
    volume: &Volume<S>,
    cut: &CutGeometry,
    options: &ResliceOptions,
) -> ResliceResult<SizeEstimate> {
    estimate(
        volume.width(),
        volume.height(),
        volume.depth(),
        volume.kind(),
        volume.calibration(),
        cut,
        options,
    )
}
