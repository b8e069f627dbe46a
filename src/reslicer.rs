//! The reslice entry point.

use crate::error::{ResliceError, ResliceResult};
use crate::estimate::path_estimate;
use crate::geometry::{resolve, CutGeometry};
use crate::options::ResliceOptions;
use crate::progress::Monitor;
use crate::propagate::{propagate, PropagateParams};
use crate::resample::{resample, ResampleParams};
use crate::volume::{Sample, Volume};
use log::info;

/// Builds a new stack by sampling `volume` along `cut`.
///
/// Each output plane is one position of the cut, with one row per source
/// plane (one column when rotating). The returned volume carries the derived
/// calibration. On any error, including cancellation through `monitor`,
/// nothing is returned.
///
/// # Arguments
///
/// * `volume` - The source stack.
/// * `cut` - The cut to follow: none (full frame), rectangle, line or polyline.
/// * `options` - Start edge, spacings, flip/rotate and the memory limit.
/// * `monitor` - Receives progress and can cancel between output steps.
///
/// # Returns
///
/// The resliced volume, or `InvalidGeometry` for cuts that resolve to no
/// steps, `OutOfMemory` when the predicted size is above
/// `options.memory_limit` or cannot be reserved, and `Cancelled`.
pub fn reslice<S, M>(
    volume: &Volume<S>,
    cut: &CutGeometry,
    options: &ResliceOptions,
    monitor: &mut M,
) -> ResliceResult<Volume<S>>
where
    S: Sample,
    M: Monitor + ?Sized,
{
    let cal = options.effective_calibration(volume.calibration());
    let step_spacing = options.step_spacing(&cal);
    let stack_scale = options.stack_scale(&cal);
    let path = resolve(
        volume.width(),
        volume.height(),
        cut,
        options.start_edge,
        step_spacing,
        options.slice_count,
    )?;
    let size = path_estimate(&path, volume.depth(), S::KIND, stack_scale, options.rotate);
    if let Some(limit) = options.memory_limit {
        if size.exceeds(limit) {
            return Err(ResliceError::OutOfMemory {
                requested_bytes: size.bytes,
            });
        }
    }
    info!(
        "Reslicing {}x{}x{} {} volume: {} steps, {:.3} pixels apart, {}",
        volume.width(),
        volume.height(),
        volume.depth(),
        volume.kind(),
        path.steps(),
        step_spacing,
        size
    );
    let params = ResampleParams {
        rotate: options.rotate,
        flip: options.flip,
        stack_scale,
        memory_limit: options.memory_limit,
    };
    let data = resample(volume, &path, &params, monitor)?;
    let calibration = propagate(
        &cal,
        &path,
        &PropagateParams {
            step_spacing,
            interpolate: !options.avoid_interpolation,
            rotate: options.rotate,
        },
    );
    Ok(Volume::new(data, calibration))
}
