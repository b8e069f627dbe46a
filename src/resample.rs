//! Assembling the output volume from sampled lines.
//!
//! For every output step the scan line (or irregular path) is sampled in
//! each source plane, giving one row per source plane (one column when
//! rotating). The resulting section is rescaled along the stack axis when
//! the planes are not as far apart as the pixels, then appended to the
//! output volume.

use crate::error::{ResliceError, ResliceResult};
use crate::geometry::CutPath;
use crate::progress::{Monitor, Progress};
use crate::sampler::{irregular_profile, sample_line};
use crate::volume::{Sample, Volume};
use log::{debug, info};
use ndarray::{Array2, Array3, ArrayView1, Axis, Zip};

/// How sections are laid out and scaled.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleParams {
    /// Source planes fill columns instead of rows.
    pub rotate: bool,
    /// Visit source planes last to first.
    pub flip: bool,
    /// Ratio of plane spacing to pixel spacing; the stack axis of every
    /// section is stretched by this factor.
    pub stack_scale: f64,
    /// Refuse output volumes larger than this many bytes.
    pub memory_limit: Option<u64>,
}

impl Default for ResampleParams {
    fn default() -> Self {
        Self {
            rotate: false,
            flip: false,
            stack_scale: 1.0,
            memory_limit: None,
        }
    }
}

/// Samples `path` through every plane of `volume` for each output step.
///
/// The output plane shape follows from the path before any sampling, so the
/// output storage is reserved at the first step, ahead of the first section.
/// Cancellation is polled once per step and drops everything built so far.
///
/// # Arguments
///
/// * `volume` - The source stack, read plane by plane.
/// * `path` - The resolved cut, moved once per output step.
/// * `params` - Layout, stack stretch and memory limit.
/// * `monitor` - Receives progress after each step and can cancel the run.
///
/// # Returns
///
/// An array indexed `[step, row, column]`, or `OutOfMemory` when the output
/// or a section cannot be reserved, `InvalidGeometry` when the cut covers no
/// pixels, and `Cancelled` when the monitor asks to stop.
pub fn resample<S, M>(
    volume: &Volume<S>,
    path: &CutPath,
    params: &ResampleParams,
    monitor: &mut M,
) -> ResliceResult<Array3<S>>
where
    S: Sample,
    M: Monitor + ?Sized,
{
    let steps = path.steps();
    let depth = volume.depth();
    if depth == 0 {
        return Err(ResliceError::geometry("volume has no planes"));
    }
    let line_len = path.samples_per_line();
    if line_len == 0 {
        return Err(ResliceError::geometry("cut does not cover any pixels"));
    }
    let stack_len = stretched_len(depth, params.stack_scale);
    let shape = if params.rotate {
        (line_len, stack_len)
    } else {
        (stack_len, line_len)
    };
    let mut storage: Option<Vec<S>> = None;
    for k in 0..steps {
        if monitor.is_cancelled() {
            info!("Reslice cancelled after {k}/{steps} steps");
            return Err(ResliceError::Cancelled);
        }
        if storage.is_none() {
            storage = Some(allocate::<S>(shape, steps, params.memory_limit)?);
        }
        let section = section(volume, path, k, line_len, params)?;
        if section.dim() != shape {
            return Err(ResliceError::geometry(format!(
                "step {k} produced a {:?} section, expected {:?}",
                section.dim(),
                shape
            )));
        }
        if let Some(buffer) = storage.as_mut() {
            buffer.extend(section.iter().copied());
        }
        debug!("Step {}/{}", k + 1, steps);
        monitor.progress(&Progress {
            done: k + 1,
            total: steps,
        });
    }
    let storage = storage.unwrap_or_default();
    Array3::from_shape_vec((steps, shape.0, shape.1), storage)
        .map_err(|e| ResliceError::geometry(e.to_string()))
}

fn requested_bytes<S: Sample>(elements: Option<usize>) -> u64 {
    elements.map_or(u64::MAX, |n| {
        (n as u64).saturating_mul(S::KIND.bytes_per_sample())
    })
}

fn allocate<S: Sample>(
    shape: (usize, usize),
    steps: usize,
    memory_limit: Option<u64>,
) -> ResliceResult<Vec<S>> {
    let elements = shape
        .0
        .checked_mul(shape.1)
        .and_then(|n| n.checked_mul(steps));
    let requested_bytes = requested_bytes::<S>(elements);
    let Some(elements) = elements else {
        return Err(ResliceError::OutOfMemory { requested_bytes });
    };
    if memory_limit.is_some_and(|limit| requested_bytes > limit) {
        return Err(ResliceError::OutOfMemory { requested_bytes });
    }
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(elements)
        .map_err(|_| ResliceError::OutOfMemory { requested_bytes })?;
    info!(
        "Reslice output {}x{}x{} ({:.1} MB)",
        shape.1,
        shape.0,
        steps,
        requested_bytes as f64 / 1_048_576.0
    );
    Ok(buffer)
}

/// A `shape` array of zero samples, reserved fallibly.
fn try_zeros<S: Sample>(shape: (usize, usize)) -> ResliceResult<Array2<S>> {
    let elements = shape.0.checked_mul(shape.1);
    let requested_bytes = requested_bytes::<S>(elements);
    let Some(elements) = elements else {
        return Err(ResliceError::OutOfMemory { requested_bytes });
    };
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(elements)
        .map_err(|_| ResliceError::OutOfMemory { requested_bytes })?;
    buffer.resize(elements, S::default());
    Array2::from_shape_vec(shape, buffer).map_err(|e| ResliceError::geometry(e.to_string()))
}

/// One output plane: the path at step `k` sampled through every source plane.
fn section<S: Sample>(
    volume: &Volume<S>,
    path: &CutPath,
    k: usize,
    line_len: usize,
    params: &ResampleParams,
) -> ResliceResult<Array2<S>> {
    let depth = volume.depth();
    let mut out = if params.rotate {
        try_zeros::<S>((line_len, depth))?
    } else {
        try_zeros::<S>((depth, line_len))?
    };
    for i in 0..depth {
        let z = if params.flip { depth - 1 - i } else { i };
        let plane = volume.plane(z);
        let line = match path {
            CutPath::Straight(scan) => {
                let (start, end) = scan.at_step(k);
                sample_line(&plane, start, end)
            }
            CutPath::Irregular(irregular) => irregular_profile(&plane, irregular),
        };
        if line.len() != line_len {
            return Err(ResliceError::geometry(format!(
                "step {k} sampled {} pixels, expected {line_len}",
                line.len()
            )));
        }
        let line = ArrayView1::from(&line[..]);
        if params.rotate {
            out.column_mut(i).assign(&line);
        } else {
            out.row_mut(i).assign(&line);
        }
    }
    let axis = if params.rotate { Axis(1) } else { Axis(0) };
    Ok(rescale_stack_axis(out, axis, params.stack_scale))
}

/// Length of a stack axis of `len` entries after stretching by `ratio`:
/// `max(1, floor(len * ratio))`, or `len` when there is nothing to stretch.
pub fn stretched_len(len: usize, ratio: f64) -> usize {
    if len == 0 || ratio == 1.0 || !ratio.is_finite() || ratio <= 0.0 {
        return len;
    }
    ((len as f64 * ratio).floor() as usize).max(1)
}

/// Stretches `section` along `axis` to [`stretched_len`] entries with
/// linear interpolation, sampling at pixel centres.
pub fn rescale_stack_axis<S: Sample>(section: Array2<S>, axis: Axis, ratio: f64) -> Array2<S> {
    let len = section.len_of(axis);
    let new_len = stretched_len(len, ratio);
    if new_len == len {
        return section;
    }
    let mut dim = section.raw_dim();
    dim[axis.index()] = new_len;
    let mut out = Array2::from_elem(dim, S::default());
    let scale = new_len as f64 / len as f64;
    for (j, mut lane) in out.axis_iter_mut(axis).enumerate() {
        let src = ((j as f64 + 0.5) / scale - 0.5).clamp(0.0, (len - 1) as f64);
        let i0 = src.floor() as usize;
        let i1 = (i0 + 1).min(len - 1);
        let t = src - i0 as f64;
        let a = section.index_axis(axis, i0);
        let b = section.index_axis(axis, i1);
        Zip::from(&mut lane)
            .and(&a)
            .and(&b)
            .for_each(|o, &a, &b| *o = S::lerp(a, b, t));
    }
    out
}
