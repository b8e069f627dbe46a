//! Reading one line of samples out of a source plane.

use crate::geometry::{is_orthogonal, IrregularPath};
use crate::volume::Sample;
use nalgebra::Point2;
use ndarray::ArrayView2;

/// Bilinear read at a fractional position.
///
/// Positions within one pixel outside the plane read the nearest edge
/// pixel; anything further out reads the zero sample.
pub fn interpolate<S: Sample>(plane: &ArrayView2<'_, S>, x: f64, y: f64) -> S {
    let (h, w) = plane.dim();
    if w == 0 || h == 0 || !x.is_finite() || !y.is_finite() {
        return S::default();
    }
    if x < -1.0 || x >= w as f64 || y < -1.0 || y >= h as f64 {
        return S::default();
    }
    let x = x.clamp(0.0, (w - 1) as f64);
    let y = y.clamp(0.0, (h - 1) as f64);
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = x - x0 as f64;
    let ty = y - y0 as f64;
    S::bilinear(
        [
            plane[(y0, x0)],
            plane[(y0, x1)],
            plane[(y1, x0)],
            plane[(y1, x1)],
        ],
        tx,
        ty,
    )
}

/// Nearest-neighbour read; outside the plane reads the zero sample.
#[inline]
fn pixel<S: Sample>(plane: &ArrayView2<'_, S>, x: i64, y: i64) -> S {
    if x < 0 || y < 0 {
        return S::default();
    }
    plane
        .get((y as usize, x as usize))
        .copied()
        .unwrap_or_default()
}

/// Samples the segment `start → end`, choosing the whole-pixel walk when the
/// segment is axis aligned on pixel boundaries and the interpolated walk
/// otherwise.
pub fn sample_line<S: Sample>(
    plane: &ArrayView2<'_, S>,
    start: Point2<f64>,
    end: Point2<f64>,
) -> Vec<S> {
    if is_orthogonal(start, end) {
        orthogonal_line(plane, start, end)
    } else {
        interpolated_line(plane, start, end)
    }
}

/// Unit steps along an axis-aligned segment, `max(|dx|, |dy|)` samples.
pub fn orthogonal_line<S: Sample>(
    plane: &ArrayView2<'_, S>,
    start: Point2<f64>,
    end: Point2<f64>,
) -> Vec<S> {
    let (x1, y1) = (start.x as i64, start.y as i64);
    let dx = end.x as i64 - x1;
    let dy = end.y as i64 - y1;
    let n = dx.abs().max(dy.abs());
    let (xinc, yinc) = (dx.signum(), dy.signum());
    (0..n)
        .map(|i| pixel(plane, x1 + i * xinc, y1 + i * yinc))
        .collect()
}

/// `round(|d|)` interpolated samples starting at `start`, spaced `d / n`.
pub fn interpolated_line<S: Sample>(
    plane: &ArrayView2<'_, S>,
    start: Point2<f64>,
    end: Point2<f64>,
) -> Vec<S> {
    let d = end - start;
    let n = d.norm().round() as usize;
    if n == 0 {
        return Vec::new();
    }
    let inc = d / n as f64;
    (0..n)
        .map(|i| {
            let p = start + inc * i as f64;
            interpolate(plane, p.x, p.y)
        })
        .collect()
}

/// Samples an irregular path at unit arc-length spacing.
///
/// The distance left over at the end of one segment is carried into the
/// next, so samples stay one pixel apart across vertices. Zero-length
/// segments are skipped.
pub fn irregular_profile<S: Sample>(plane: &ArrayView2<'_, S>, path: &IrregularPath) -> Vec<S> {
    let n = path.sample_count();
    let mut values = Vec::with_capacity(n);
    // distance from the current segment's start to the next sample
    let mut offset = 0.0;
    for seg in path.segments() {
        if seg.length == 0.0 {
            continue;
        }
        let dir = seg.delta / seg.length;
        while offset < seg.length && values.len() < n {
            let p = seg.start + dir * offset;
            values.push(interpolate(plane, p.x, p.y));
            offset += 1.0;
        }
        offset -= seg.length;
    }
    // rounding can leave the final sample just past the last vertex
    if values.len() < n {
        if let Some(last) = path.segments().iter().rev().find(|s| s.length > 0.0) {
            let end = last.start + last.delta;
            let fill = interpolate(plane, end.x, end.y);
            values.resize(n, fill);
        }
    }
    values
}
