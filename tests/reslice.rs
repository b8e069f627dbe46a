mod common;

use approx::assert_relative_eq;
use common::{calibration, noise_u8, ramp_f32, rgb_stripes};
use ndarray::{s, Axis};
use reslicenii::{
    estimate_for, reslice, Calibration, CutGeometry, Monitor, Progress, Rect, ResliceError,
    ResliceOptions, Rgb, StartEdge,
};

/// Records progress and cancels once `cancel_after` steps are done.
#[derive(Default)]
struct Recorder {
    cancel_after: Option<usize>,
    reports: Vec<Progress>,
}

impl Monitor for Recorder {
    fn progress(&mut self, progress: &Progress) {
        self.reports.push(*progress);
    }

    fn is_cancelled(&self) -> bool {
        match (self.cancel_after, self.reports.last()) {
            (Some(n), Some(last)) => last.done >= n,
            _ => false,
        }
    }
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn top_edge_sweeps_source_rows_without_interpolation() {
    init();
    let vol = noise_u8(16, 12, 5);
    let opts = ResliceOptions {
        avoid_interpolation: true,
        ..Default::default()
    };
    let out = reslice(&vol, &CutGeometry::None, &opts, &mut ()).unwrap();
    assert_eq!((out.width(), out.height(), out.depth()), (16, 5, 12));
    for k in 0..12 {
        for z in 0..5 {
            assert_eq!(
                out.data().slice(s![k, z, ..]),
                vol.data().slice(s![z, k, ..]),
                "step {k}, source plane {z}"
            );
        }
    }
}

#[test]
fn output_spacing_skips_rows() {
    let vol = noise_u8(10, 12, 3);
    let opts = ResliceOptions {
        output_z_spacing: Some(3.0),
        ..Default::default()
    };
    let out = reslice(&vol, &CutGeometry::None, &opts, &mut ()).unwrap();
    assert_eq!(out.depth(), 4);
    for k in 0..4 {
        assert_eq!(
            out.data().slice(s![k, .., ..]),
            vol.data().slice(s![.., 3 * k, ..])
        );
    }
    assert_eq!(out.calibration().z.spacing, 3.0);
}

#[test]
fn rectangle_step_counts() {
    let vol = ramp_f32(120, 60, 2);
    let cut = CutGeometry::Rectangle(Rect::new(10, 5, 100, 50));
    let left = ResliceOptions {
        start_edge: StartEdge::Left,
        ..Default::default()
    };
    assert_eq!(reslice(&vol, &cut, &left, &mut ()).unwrap().depth(), 100);
    let top = ResliceOptions::default();
    let out = reslice(&vol, &cut, &top, &mut ()).unwrap();
    assert_eq!(out.depth(), 50);
    assert_eq!(out.width(), 100);
    // first sample of the first plane is the rectangle's top-left corner
    assert_eq!(out.get(0, 0, 0), vol.get(10, 5, 0));
}

#[test]
fn bottom_and_right_edges_walk_backwards() {
    let vol = ramp_f32(6, 4, 2);
    let bottom = ResliceOptions {
        start_edge: StartEdge::Bottom,
        ..Default::default()
    };
    let out = reslice(&vol, &CutGeometry::None, &bottom, &mut ()).unwrap();
    assert_eq!(out.get(2, 1, 0), Some(132.0));
    assert_eq!(out.get(2, 1, 3), Some(102.0));

    let right = ResliceOptions {
        start_edge: StartEdge::Right,
        ..Default::default()
    };
    let out = reslice(&vol, &CutGeometry::None, &right, &mut ()).unwrap();
    assert_eq!((out.width(), out.depth()), (4, 6));
    assert_eq!(out.get(3, 0, 0), Some(35.0));
    assert_eq!(out.get(3, 0, 5), Some(30.0));
}

#[test]
fn zero_steps_fail_before_any_work() {
    let vol = ramp_f32(10, 10, 3);
    let opts = ResliceOptions {
        output_z_spacing: Some(1000.0),
        ..Default::default()
    };
    let mut monitor = Recorder::default();
    let err = reslice(&vol, &CutGeometry::None, &opts, &mut monitor).unwrap_err();
    assert!(matches!(err, ResliceError::InvalidGeometry(_)));
    assert!(monitor.reports.is_empty());
}

#[test]
fn horizontal_and_vertical_lines_inherit_pixel_sizes() {
    let mut vol = ramp_f32(20, 20, 3);
    vol.set_calibration(calibration(0.5, 0.8, 2.0));
    let opts = ResliceOptions {
        slice_count: 2,
        avoid_interpolation: true,
        ..Default::default()
    };

    let horizontal_cut = CutGeometry::line(2.0, 3.0, 12.0, 3.0);
    let horizontal = reslice(&vol, &horizontal_cut, &opts, &mut ()).unwrap();
    assert_eq!(horizontal.calibration().z.spacing, 0.8);
    assert_eq!(horizontal.calibration().x.spacing, 0.5);

    let vertical_cut = CutGeometry::line(4.0, 1.0, 4.0, 15.0);
    let vertical = reslice(&vol, &vertical_cut, &opts, &mut ()).unwrap();
    assert_eq!(vertical.calibration().z.spacing, 0.5);
    assert_eq!(vertical.calibration().x.spacing, 0.8);

    // with interpolation, one output step of 0.5 mm is one pixel
    let interpolated = ResliceOptions {
        output_z_spacing: Some(0.5),
        avoid_interpolation: false,
        ..opts
    };
    let out = reslice(&vol, &horizontal_cut, &interpolated, &mut ()).unwrap();
    assert_eq!(out.calibration().z.spacing, 0.8);
}

#[test]
fn diagonal_line_spacing_matches_square_pixels() {
    let mut vol = ramp_f32(20, 20, 2);
    vol.set_calibration(Calibration::isotropic(0.7, "mm"));
    let cut = CutGeometry::line(0.0, 0.0, 10.0, 10.0);
    let out = reslice(&vol, &cut, &ResliceOptions::default(), &mut ()).unwrap();
    assert_eq!(out.calibration().x.spacing, 0.7);
    assert_eq!(out.width(), 14);
}

#[test]
fn rotation_transposes_planes_and_calibration() {
    let mut vol = ramp_f32(8, 6, 4);
    vol.set_calibration(calibration(0.5, 0.25, 0.5));
    let plain = reslice(&vol, &CutGeometry::None, &ResliceOptions::default(), &mut ()).unwrap();
    let rotated = reslice(
        &vol,
        &CutGeometry::None,
        &ResliceOptions {
            rotate: true,
            ..Default::default()
        },
        &mut (),
    )
    .unwrap();
    assert_eq!(rotated.depth(), plain.depth());
    for k in 0..plain.depth() {
        assert_eq!(
            rotated.data().index_axis(Axis(0), k),
            plain.data().index_axis(Axis(0), k).t()
        );
    }
    assert_eq!(rotated.calibration().swapped_xy(), *plain.calibration());
}

#[test]
fn flip_reverses_source_planes() {
    let vol = ramp_f32(5, 5, 3);
    let opts = ResliceOptions {
        flip: true,
        ..Default::default()
    };
    let out = reslice(&vol, &CutGeometry::None, &opts, &mut ()).unwrap();
    assert_eq!(out.get(1, 0, 2), Some(221.0));
    assert_eq!(out.get(1, 2, 2), Some(21.0));
}

#[test]
fn freehand_collinear_points_match_the_line() {
    let vol = ramp_f32(16, 16, 3);
    let opts = ResliceOptions::default();

    let line = reslice(&vol, &CutGeometry::line(1.0, 2.0, 9.0, 2.0), &opts, &mut ()).unwrap();
    let free = reslice(
        &vol,
        &CutGeometry::freehand(&[(1.0, 2.0), (5.0, 2.0), (9.0, 2.0)]),
        &opts,
        &mut (),
    )
    .unwrap();
    assert_eq!(free.data(), line.data());

    let line = reslice(&vol, &CutGeometry::line(0.0, 0.0, 6.0, 8.0), &opts, &mut ()).unwrap();
    let free = reslice(
        &vol,
        &CutGeometry::freehand(&[(0.0, 0.0), (3.0, 4.0), (6.0, 8.0)]),
        &opts,
        &mut (),
    )
    .unwrap();
    assert_eq!(free.data().dim(), line.data().dim());
    for (a, b) in free.data().iter().zip(line.data().iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-3);
    }
}

#[test]
fn polyline_output_is_one_plane() {
    let mut vol = ramp_f32(16, 16, 4);
    vol.set_calibration(calibration(0.5, 0.5, 1.0));
    let cut = CutGeometry::polyline(&[(1.0, 1.0), (8.0, 1.0), (8.0, 9.0)]);
    let opts = ResliceOptions {
        avoid_interpolation: true,
        ..Default::default()
    };
    let out = reslice(&vol, &cut, &opts, &mut ()).unwrap();
    assert_eq!((out.width(), out.height(), out.depth()), (15, 4, 1));
    assert_eq!(out.get(7, 0, 0), Some(18.0));
    assert_eq!(out.get(14, 3, 0), Some(388.0));
    let cal = out.calibration();
    assert_eq!(cal.x.spacing, 0.5);
    assert_eq!(cal.z.spacing, 1.0);
    assert_eq!(cal.z.unit, "pixel");
}

#[test]
fn coarse_planes_are_stretched() {
    let mut vol = ramp_f32(6, 6, 3);
    vol.set_calibration(calibration(1.0, 1.0, 2.0));
    let opts = ResliceOptions {
        output_z_spacing: Some(1.0),
        ..Default::default()
    };
    let out = reslice(&vol, &CutGeometry::None, &opts, &mut ()).unwrap();
    assert_eq!((out.width(), out.height(), out.depth()), (6, 6, 6));
    // Y keeps the source plane spacing even though the rows were stretched
    assert_eq!(out.calibration().y, vol.calibration().z);
    assert_eq!(out.calibration().y.spacing, 2.0);

    // avoiding interpolation keeps one row per plane
    let raw_opts = ResliceOptions {
        avoid_interpolation: true,
        ..Default::default()
    };
    let raw = reslice(&vol, &CutGeometry::None, &raw_opts, &mut ()).unwrap();
    assert_eq!(raw.height(), 3);
    assert_eq!(raw.calibration().y.spacing, 2.0);
}

#[test]
fn cancellation_discards_partial_output() {
    let vol = ramp_f32(12, 12, 3);
    let mut monitor = Recorder {
        cancel_after: Some(4),
        ..Default::default()
    };
    let result = reslice(&vol, &CutGeometry::None, &ResliceOptions::default(), &mut monitor);
    assert_eq!(result, Err(ResliceError::Cancelled));
    assert_eq!(monitor.reports.len(), 4);
}

#[test]
fn progress_reaches_every_step() {
    let vol = ramp_f32(7, 5, 2);
    let mut monitor = Recorder::default();
    reslice(&vol, &CutGeometry::None, &ResliceOptions::default(), &mut monitor).unwrap();
    assert_eq!(monitor.reports.len(), 5);
    let last = monitor.reports.last().unwrap();
    assert_eq!(last.percent(), 100.0);
    assert_eq!(last.to_string(), "Reslice... 5/5 (100%)");
}

#[test]
fn memory_limit_matches_estimate() {
    let vol = ramp_f32(32, 32, 4);
    let opts = ResliceOptions::default();
    let est = estimate_for(&vol, &CutGeometry::None, &opts).unwrap();
    let out = reslice(&vol, &CutGeometry::None, &opts, &mut ()).unwrap();
    assert_eq!(est.bytes, out.byte_size());

    let limited = ResliceOptions {
        memory_limit: Some(est.bytes - 1),
        ..opts
    };
    let err = reslice(&vol, &CutGeometry::None, &limited, &mut ()).unwrap_err();
    assert_eq!(
        err,
        ResliceError::OutOfMemory {
            requested_bytes: est.bytes
        }
    );
}

#[test]
fn oversized_cuts_are_refused_before_sampling() {
    let vol = ramp_f32(16, 16, 4);
    let cut = CutGeometry::line(0.0, 0.0, 1e13, 0.0);
    let opts = ResliceOptions {
        memory_limit: Some(1 << 30),
        ..Default::default()
    };
    let mut monitor = Recorder::default();
    let err = reslice(&vol, &cut, &opts, &mut monitor).unwrap_err();
    assert_eq!(
        err,
        ResliceError::OutOfMemory {
            requested_bytes: 10_000_000_000_000 * 4 * 4
        }
    );
    assert!(monitor.reports.is_empty());

    let unlimited = ResliceOptions::default();
    let cut = CutGeometry::line(0.0, 0.0, 1e30, 0.0);
    let err = reslice(&vol, &cut, &unlimited, &mut ()).unwrap_err();
    assert!(matches!(err, ResliceError::OutOfMemory { .. }));
}

#[test]
fn colour_volumes_interpolate_per_channel() {
    let vol = rgb_stripes(10, 10, 2);
    let opts = ResliceOptions::default();
    let out = reslice(&vol, &CutGeometry::line(0.5, 1.0, 4.5, 1.0), &opts, &mut ()).unwrap();
    assert_eq!(out.width(), 4);
    assert_eq!(out.get(0, 1, 0), Some(Rgb::new(5, 10, 10)));
    assert_eq!(out.get(3, 0, 0), Some(Rgb::new(35, 10, 0)));
}
