//! Reslicing of image volumes.
//!
//! Given a stack of planes and a cut drawn on them (the whole frame, a
//! rectangle, a line, or a polyline), builds a new stack whose planes are
//! cross sections through the original: one output plane per position of
//! the cut, with one row per source plane. The output carries a calibration
//! derived from the source spacing and the cut direction.
//!
//! ```
//! use ndarray::Array3;
//! use reslicenii::{reslice, Calibration, CutGeometry, ResliceOptions, StartEdge, Volume};
//!
//! let data = Array3::from_shape_fn((4, 8, 8), |(z, y, x)| (z * 64 + y * 8 + x) as f32);
//! let volume = Volume::new(data, Calibration::isotropic(1.0, "mm"));
//! let options = ResliceOptions {
//!     start_edge: StartEdge::Left,
//!     ..Default::default()
//! };
//! let resliced = reslice(&volume, &CutGeometry::None, &options, &mut ()).unwrap();
//! assert_eq!((resliced.width(), resliced.height(), resliced.depth()), (8, 4, 8));
//! ```

pub mod calibration;
pub mod common;
pub mod error;
pub mod estimate;
pub mod geometry;
pub mod nifti_io;
pub mod options;
pub mod progress;
pub mod propagate;
pub mod resample;
pub mod reslicer;
pub mod sampler;
pub mod volume;

pub use calibration::{AxisCalibration, Calibration};
pub use common::{Direction, StartEdge};
pub use error::{ParseError, ResliceError, ResliceResult};
pub use estimate::{estimate, estimate_for, SizeEstimate};
pub use geometry::{resolve, CutGeometry, CutPath, Rect};
pub use options::ResliceOptions;
pub use progress::{CancelFlag, LogMonitor, Monitor, Progress};
pub use reslicer::reslice;
pub use volume::{ElementKind, Rgb, Sample, Volume};
