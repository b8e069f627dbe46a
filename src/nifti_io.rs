//! Reading and writing volumes as NIfTI files.
//!
//! NIfTI arrays come out of the `nifti` crate indexed `[x, y, z]`; volumes
//! are indexed `[z, y, x]`, so axes are reversed on the way in and out.
//! Spacing comes from `pixdim`, the spatial unit from `xyzt_units` and the
//! origin from the translation part of the affine.

use crate::calibration::{AxisCalibration, Calibration};
use crate::error::ResliceResult;
use crate::estimate::{estimate_for, SizeEstimate};
use crate::geometry::CutGeometry;
use crate::options::ResliceOptions;
use crate::progress::Monitor;
use crate::reslicer::reslice;
use crate::volume::{ElementKind, Sample, Volume};
use anyhow::{bail, Context, Result};
use nalgebra::Matrix4;
use ndarray::{ArrayD, Axis, Ix2, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;

// NIfTI-1 datatype codes
const DT_UINT8: i16 = 2;
const DT_RGB24: i16 = 128;
const DT_UINT16: i16 = 512;

/// A volume of whichever sample type the file holds.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyVolume {
    Gray8(Volume<u8>),
    Gray16(Volume<u16>),
    Gray32(Volume<f32>),
}

impl AnyVolume {
    pub fn kind(&self) -> ElementKind {
        match self {
            AnyVolume::Gray8(v) => v.kind(),
            AnyVolume::Gray16(v) => v.kind(),
            AnyVolume::Gray32(v) => v.kind(),
        }
    }

    /// `(width, height, depth)`
    pub fn dims(&self) -> (usize, usize, usize) {
        match self {
            AnyVolume::Gray8(v) => (v.width(), v.height(), v.depth()),
            AnyVolume::Gray16(v) => (v.width(), v.height(), v.depth()),
            AnyVolume::Gray32(v) => (v.width(), v.height(), v.depth()),
        }
    }

    pub fn calibration(&self) -> &Calibration {
        match self {
            AnyVolume::Gray8(v) => v.calibration(),
            AnyVolume::Gray16(v) => v.calibration(),
            AnyVolume::Gray32(v) => v.calibration(),
        }
    }

    pub fn reslice<M: Monitor + ?Sized>(
        &self,
        cut: &CutGeometry,
        options: &ResliceOptions,
        monitor: &mut M,
    ) -> ResliceResult<AnyVolume> {
        Ok(match self {
            AnyVolume::Gray8(v) => AnyVolume::Gray8(reslice(v, cut, options, monitor)?),
            AnyVolume::Gray16(v) => AnyVolume::Gray16(reslice(v, cut, options, monitor)?),
            AnyVolume::Gray32(v) => AnyVolume::Gray32(reslice(v, cut, options, monitor)?),
        })
    }

    pub fn estimate(
        &self,
        cut: &CutGeometry,
        options: &ResliceOptions,
    ) -> ResliceResult<SizeEstimate> {
        match self {
            AnyVolume::Gray8(v) => estimate_for(v, cut, options),
            AnyVolume::Gray16(v) => estimate_for(v, cut, options),
            AnyVolume::Gray32(v) => estimate_for(v, cut, options),
        }
    }
}

/// Unit name for the spatial bits of `xyzt_units`.
pub fn spatial_unit(xyzt_units: u8) -> &'static str {
    match xyzt_units & 0x07 {
        1 => "m",
        2 => "mm",
        3 => "micron",
        _ => "pixel",
    }
}

/// Spatial bits of `xyzt_units` for a unit name; 0 when unknown.
pub fn spatial_unit_code(unit: &str) -> u8 {
    match unit {
        "m" | "meter" => 1,
        "mm" => 2,
        "micron" | "um" | "µm" => 3,
        _ => 0,
    }
}

/// Translation of the voxel-to-world transform, preferring the sform.
fn world_offset(header: &NiftiHeader) -> [f64; 3] {
    if header.sform_code > 0 {
        [
            header.srow_x[3] as f64,
            header.srow_y[3] as f64,
            header.srow_z[3] as f64,
        ]
    } else if header.qform_code > 0 {
        [
            header.quatern_x as f64,
            header.quatern_y as f64,
            header.quatern_z as f64,
        ]
    } else {
        [0.0; 3]
    }
}

/// Calibration described by a header.
pub fn calibration_from_header(header: &NiftiHeader) -> Calibration {
    let unit = spatial_unit(header.xyzt_units);
    let offset = world_offset(header);
    let axis = |i: usize| {
        let spacing = header.pixdim[i + 1] as f64;
        let origin = if spacing != 0.0 {
            -offset[i] / spacing
        } else {
            0.0
        };
        AxisCalibration::new(spacing, origin, unit)
    };
    Calibration::new(axis(0), axis(1), axis(2)).normalized()
}

/// Copy of `reference` describing data with calibration `cal`.
pub fn header_for(reference: &NiftiHeader, cal: &Calibration) -> NiftiHeader {
    let mut header = reference.clone();
    let axes = [&cal.x, &cal.y, &cal.z];
    let mut affine = Matrix4::<f64>::identity();
    for (i, a) in axes.iter().enumerate() {
        header.pixdim[i + 1] = a.spacing as f32;
        affine[(i, i)] = a.spacing;
        affine[(i, 3)] = -a.origin * a.spacing;
    }
    header.xyzt_units = (reference.xyzt_units & !0x07) | spatial_unit_code(&cal.x.unit);
    // samples are written already scaled
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;
    header.set_affine(&affine);
    // the output grid has no scanner frame, only the aligned one
    header.sform_code = 2;
    header.qform_code = 0;
    header
}

fn into_volume<S: Sample>(img: ArrayD<S>, cal: Calibration) -> Result<Volume<S>> {
    let img = match img.ndim() {
        2 => img.into_dimensionality::<Ix2>()?.insert_axis(Axis(2)),
        3 => img.into_dimensionality::<Ix3>()?,
        4 if img.shape()[3] == 1 => img
            .index_axis_move(Axis(3), 0)
            .into_dimensionality::<Ix3>()?,
        n => bail!(
            "Input nifti file must be 3D, got {n} dimensions. Tip: You can use a utility like `fslsplit` to split a 4D file into 3D files."
        ),
    };
    // [x, y, z] -> [z, y, x]
    let data = img.permuted_axes([2, 1, 0]).as_standard_layout().into_owned();
    Ok(Volume::new(data, cal))
}

/// Reads a `.nii` or `.nii.gz` file.
///
/// Unsigned 8-bit and 16-bit files keep their sample type; everything else
/// is read as 32-bit float.
pub fn load_volume(path: &Path) -> Result<(AnyVolume, NiftiHeader)> {
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let header = obj.header().clone();
    let cal = calibration_from_header(&header);
    let volume = obj.into_volume();
    let any = match header.datatype {
        DT_UINT8 => AnyVolume::Gray8(into_volume(volume.into_ndarray::<u8>()?, cal)?),
        DT_UINT16 => AnyVolume::Gray16(into_volume(volume.into_ndarray::<u16>()?, cal)?),
        DT_RGB24 => bail!("RGB nifti files are not supported"),
        _ => AnyVolume::Gray32(into_volume(volume.into_ndarray::<f32>()?, cal)?),
    };
    Ok((any, header))
}

/// Writes `volume` to `path`, taking everything but the geometry from
/// `reference`.
pub fn save_volume(path: &Path, volume: &AnyVolume, reference: &NiftiHeader) -> Result<()> {
    let header = header_for(reference, volume.calibration());
    let options = WriterOptions::new(path).reference_header(&header);
    // [z, y, x] -> [x, y, z]
    let written = match volume {
        AnyVolume::Gray8(v) => options.write_nifti(&v.data().view().permuted_axes([2, 1, 0])),
        AnyVolume::Gray16(v) => options.write_nifti(&v.data().view().permuted_axes([2, 1, 0])),
        AnyVolume::Gray32(v) => options.write_nifti(&v.data().view().permuted_axes([2, 1, 0])),
    };
    written.with_context(|| format!("Could not write {}", path.display()))
}
