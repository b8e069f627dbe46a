//! Cut geometries and the sampling paths they resolve to.
//!
//! A [`CutGeometry`] is what the user drew on the source plane. [`resolve`]
//! turns it into a [`CutPath`]: either a straight [`ScanLine`] that is moved
//! by a fixed increment after every output step, or a single
//! [`IrregularPath`] that is sampled once per source plane.

use crate::common::{Direction, StartEdge};
use crate::error::{ParseError, ResliceError, ResliceResult};
use nalgebra::{Point2, Vector2};
use std::str::FromStr;

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full_frame(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }
}

/// The region the user drew on the source plane.
#[derive(Debug, Clone, PartialEq)]
pub enum CutGeometry {
    /// No selection: the whole frame, treated as a rectangle.
    None,
    Rectangle(Rect),
    Line {
        start: Point2<f64>,
        end: Point2<f64>,
    },
    Polyline(Vec<Point2<f64>>),
    /// A polyline whose interior vertices are smoothed before sampling.
    Freehand(Vec<Point2<f64>>),
}

impl CutGeometry {
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        CutGeometry::Line {
            start: Point2::new(x1, y1),
            end: Point2::new(x2, y2),
        }
    }

    pub fn polyline(points: &[(f64, f64)]) -> Self {
        CutGeometry::Polyline(points.iter().map(|&(x, y)| Point2::new(x, y)).collect())
    }

    pub fn freehand(points: &[(f64, f64)]) -> Self {
        CutGeometry::Freehand(points.iter().map(|&(x, y)| Point2::new(x, y)).collect())
    }

    /// Length in source pixels: the perimeter of the drawn path for lines,
    /// zero for rectangles.
    pub fn raw_length(&self) -> f64 {
        match self {
            CutGeometry::None | CutGeometry::Rectangle(_) => 0.0,
            CutGeometry::Line { start, end } => (end - start).norm(),
            CutGeometry::Polyline(points) => path_length(points),
            CutGeometry::Freehand(points) => path_length(&smooth(points)),
        }
    }

    pub fn is_irregular(&self) -> bool {
        matches!(self, CutGeometry::Polyline(_) | CutGeometry::Freehand(_))
    }
}

impl FromStr for CutGeometry {
    type Err = ParseError;

    /// Parses `none`, `rect:x,y,w,h`, `line:x1,y1,x2,y2`,
    /// `polyline:x,y;x,y;...` and `freehand:x,y;x,y;...`.
    fn from_str(val: &str) -> Result<Self, Self::Err> {
        let val = val.trim();
        let (kind, coords) = match val.split_once(':') {
            Some((kind, coords)) => (kind.trim().to_ascii_lowercase(), coords.trim()),
            None => (val.to_ascii_lowercase(), ""),
        };
        let bad = || ParseError::Coordinates(coords.to_string());
        match kind.as_str() {
            "none" | "" => Ok(CutGeometry::None),
            "rect" | "rectangle" => {
                let n = parse_list::<usize>(coords).ok_or_else(bad)?;
                match n[..] {
                    [x, y, w, h] => Ok(CutGeometry::Rectangle(Rect::new(x, y, w, h))),
                    _ => Err(bad()),
                }
            }
            "line" => {
                let n = parse_list::<f64>(coords).ok_or_else(bad)?;
                match n[..] {
                    [x1, y1, x2, y2] => Ok(CutGeometry::line(x1, y1, x2, y2)),
                    _ => Err(bad()),
                }
            }
            "polyline" | "freehand" => {
                let mut points = Vec::new();
                for pair in coords.split(';').filter(|p| !p.trim().is_empty()) {
                    let n = parse_list::<f64>(pair).ok_or_else(bad)?;
                    match n[..] {
                        [x, y] => points.push(Point2::new(x, y)),
                        _ => return Err(bad()),
                    }
                }
                if kind == "polyline" {
                    Ok(CutGeometry::Polyline(points))
                } else {
                    Ok(CutGeometry::Freehand(points))
                }
            }
            _ => Err(ParseError::CutKind(kind.clone())),
        }
    }
}

fn parse_list<T: FromStr>(coords: &str) -> Option<Vec<T>> {
    coords
        .split(',')
        .map(|c| c.trim().parse::<T>().ok())
        .collect()
}

fn path_length(points: &[Point2<f64>]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Averages every interior vertex with its two neighbours. Neighbours are
/// taken from the unsmoothed path so the result does not depend on the
/// walking order, and collinear input stays collinear.
fn smooth(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut out = points.to_vec();
    for i in 1..points.len().saturating_sub(1) {
        let sum = points[i - 1].coords + points[i].coords + points[i + 1].coords;
        out[i] = Point2::from(sum / 3.0);
    }
    out
}

/// A straight sampling line and how it moves between output steps.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanLine {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    /// Offset applied to both endpoints after every output step.
    pub increment: Vector2<f64>,
    /// Number of output planes.
    pub steps: usize,
}

impl ScanLine {
    pub fn delta(&self) -> Vector2<f64> {
        self.end - self.start
    }

    pub fn direction(&self) -> Direction {
        let d = self.delta();
        Direction::from_delta(d.x, d.y)
    }

    /// Endpoints of the line used for output step `k`.
    pub fn at_step(&self, k: usize) -> (Point2<f64>, Point2<f64>) {
        let offset = self.increment * k as f64;
        (self.start + offset, self.end + offset)
    }
}

/// One segment of an irregular path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point2<f64>,
    pub delta: Vector2<f64>,
    pub length: f64,
}

/// A polyline sampled once per source plane at unit arc-length spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct IrregularPath {
    segments: Vec<Segment>,
    length: f64,
}

impl IrregularPath {
    /// Builds the path, smoothing interior vertices first when `freehand`.
    pub fn new(points: &[Point2<f64>], freehand: bool) -> Self {
        let points = if freehand {
            smooth(points)
        } else {
            points.to_vec()
        };
        let segments: Vec<Segment> = points
            .windows(2)
            .map(|w| {
                let delta = w[1] - w[0];
                Segment {
                    start: w[0],
                    delta,
                    length: delta.norm(),
                }
            })
            .collect();
        let length = segments.iter().map(|s| s.length).sum();
        Self { segments, length }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Cumulative Euclidean length in source pixels.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Number of samples in each profile.
    pub fn sample_count(&self) -> usize {
        self.length.floor() as usize
    }
}

/// A resolved cut.
#[derive(Debug, Clone, PartialEq)]
pub enum CutPath {
    Straight(ScanLine),
    Irregular(IrregularPath),
}

impl CutPath {
    /// Number of output planes this path produces.
    pub fn steps(&self) -> usize {
        match self {
            CutPath::Straight(line) => line.steps,
            CutPath::Irregular(_) => 1,
        }
    }

    /// Number of samples taken along the path in each source plane.
    pub fn samples_per_line(&self) -> usize {
        match self {
            CutPath::Straight(line) => {
                let d = line.delta();
                if is_orthogonal(line.start, line.end) {
                    d.x.abs().max(d.y.abs()) as usize
                } else {
                    d.norm().round() as usize
                }
            }
            CutPath::Irregular(path) => path.sample_count(),
        }
    }
}

/// True when the line is exactly horizontal or vertical and starts and ends
/// on whole pixels, so it can be read without interpolation.
pub fn is_orthogonal(start: Point2<f64>, end: Point2<f64>) -> bool {
    let integral = |v: f64| v.fract() == 0.0;
    integral(start.x)
        && integral(start.y)
        && integral(end.x)
        && integral(end.y)
        && (start.x == end.x || start.y == end.y)
}

/// Resolves `cut` on a `width × height` plane.
///
/// Rectangles (and the full frame) are swept from `edge`, lines are moved
/// along their normal and polylines give a single irregular path.
///
/// # Arguments
///
/// * `width`, `height` - Size of a source plane in pixels.
/// * `cut` - The drawn cut.
/// * `edge` - Where a rectangle sweep starts; ignored for other cuts.
/// * `step_spacing` - Distance between output planes in source pixels.
/// * `slice_count` - Number of output planes for line cuts.
///
/// # Returns
///
/// The [`CutPath`] to sample, or `InvalidGeometry` for empty or
/// out-of-plane rectangles, degenerate lines and polylines, non-positive
/// spacings and sweeps with zero steps.
pub fn resolve(
    width: usize,
    height: usize,
    cut: &CutGeometry,
    edge: StartEdge,
    step_spacing: f64,
    slice_count: usize,
) -> ResliceResult<CutPath> {
    match cut {
        CutGeometry::None => {
            let frame = Rect::full_frame(width, height);
            resolve_rectangle(width, height, frame, edge, step_spacing)
        }
        CutGeometry::Rectangle(rect) => {
            resolve_rectangle(width, height, *rect, edge, step_spacing)
        }
        CutGeometry::Line { start, end } => {
            resolve_line(*start, *end, step_spacing, slice_count)
        }
        CutGeometry::Polyline(points) => resolve_irregular(points, false),
        CutGeometry::Freehand(points) => resolve_irregular(points, true),
    }
}

fn check_spacing(step_spacing: f64) -> ResliceResult<()> {
    if step_spacing > 0.0 && step_spacing.is_finite() {
        Ok(())
    } else {
        Err(ResliceError::geometry(format!(
            "output Z spacing must be positive, got {step_spacing}"
        )))
    }
}

fn resolve_rectangle(
    width: usize,
    height: usize,
    r: Rect,
    edge: StartEdge,
    s: f64,
) -> ResliceResult<CutPath> {
    check_spacing(s)?;
    if r.width == 0 || r.height == 0 {
        return Err(ResliceError::geometry("rectangle is empty"));
    }
    let outside = |start: usize, extent: usize, limit: usize| {
        start.checked_add(extent).map_or(true, |end| end > limit)
    };
    if outside(r.x, r.width, width) || outside(r.y, r.height, height) {
        return Err(ResliceError::geometry(format!(
            "rectangle {}x{} at ({}, {}) does not fit in a {width}x{height} plane",
            r.width, r.height, r.x, r.y
        )));
    }
    let (x, y) = (r.x as f64, r.y as f64);
    let (w, h) = (r.width as f64, r.height as f64);
    let (start, end, increment, extent) = match edge {
        StartEdge::Top => (
            Point2::new(x, y),
            Point2::new(x + w, y),
            Vector2::new(0.0, s),
            h,
        ),
        StartEdge::Left => (
            Point2::new(x, y),
            Point2::new(x, y + h),
            Vector2::new(s, 0.0),
            w,
        ),
        StartEdge::Bottom => (
            Point2::new(x, y + h - 1.0),
            Point2::new(x + w, y + h - 1.0),
            Vector2::new(0.0, -s),
            h,
        ),
        StartEdge::Right => (
            Point2::new(x + w - 1.0, y),
            Point2::new(x + w - 1.0, y + h),
            Vector2::new(-s, 0.0),
            w,
        ),
    };
    let steps = (extent / s).floor() as usize;
    if steps == 0 {
        return Err(ResliceError::geometry(format!(
            "output Z spacing ({s:.0} pixels) is too large for a {extent:.0} pixel extent"
        )));
    }
    Ok(CutPath::Straight(ScanLine {
        start,
        end,
        increment,
        steps,
    }))
}

fn resolve_line(
    start: Point2<f64>,
    end: Point2<f64>,
    s: f64,
    slice_count: usize,
) -> ResliceResult<CutPath> {
    check_spacing(s)?;
    let d = end - start;
    let len = d.norm();
    if len == 0.0 || !len.is_finite() {
        return Err(ResliceError::geometry("line has zero length"));
    }
    if slice_count == 0 {
        return Err(ResliceError::geometry("slice count must be at least 1"));
    }
    // unit normal, rotated 90 degrees from the line direction
    let increment = Vector2::new(-d.y, d.x) / len * s;
    Ok(CutPath::Straight(ScanLine {
        start,
        end,
        increment,
        steps: slice_count,
    }))
}

fn resolve_irregular(points: &[Point2<f64>], freehand: bool) -> ResliceResult<CutPath> {
    if points.len() < 2 {
        return Err(ResliceError::geometry("polyline needs at least two points"));
    }
    let path = IrregularPath::new(points, freehand);
    if path.sample_count() == 0 {
        return Err(ResliceError::geometry(format!(
            "polyline is shorter than one pixel ({:.3})",
            path.length()
        )));
    }
    Ok(CutPath::Irregular(path))
}
