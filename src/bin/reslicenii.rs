//! Commandline utility to reslice nifti volumes along a line, rectangle or polyline.
//!
//! Every output plane is a cross section through the input stack: the cut is
//! sampled in each input plane and the samples are stacked into rows (or
//! columns with `--rotate`). Rectangular cuts (including no cut at all)
//! sweep from the chosen start edge, line cuts move along their normal for
//! `--slice-count` planes, and polylines give a single curved section.

use anyhow::{bail, Context, Result};
use clap::Parser;
use glob::glob;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use sysinfo::System;

use reslicenii::nifti_io::{load_volume, save_volume};
use reslicenii::{CutGeometry, LogMonitor, ResliceError, ResliceOptions, SizeEstimate, StartEdge};

const MB: u64 = 1_048_576;

// use clap to create commandline interface
#[derive(Parser, Debug)]
#[command(author, about, version, long_about)]
struct Args {
    /// the input nifti file, or a glob pattern matching several
    #[arg(short, long)]
    input: String,

    /// an output directory for the resliced volumes
    #[arg(short, long, default_value = "./")]
    output: String,

    /// The cut to reslice along:
    ///     none, rect:x,y,w,h, line:x1,y1,x2,y2,
    ///     polyline:x,y;x,y;... or freehand:x,y;x,y;...
    #[arg(short, long, default_value = "none")]
    roi: CutGeometry,

    /// Edge of a rectangular cut to start from (top, left, bottom, right)
    #[arg(short, long, default_value = "top")]
    start: StartEdge,

    /// Spacing between input planes; defaults to the file's pixdim
    #[arg(long)]
    input_z_spacing: Option<f64>,

    /// Spacing between output planes; defaults to the input spacing
    #[arg(long)]
    output_z_spacing: Option<f64>,

    /// Number of output planes for line cuts
    #[arg(short = 'n', long, default_value_t = 1)]
    slice_count: usize,

    /// Visit the input planes last to first
    #[arg(long)]
    flip: bool,

    /// Rotate each output plane by 90 degrees
    #[arg(long)]
    rotate: bool,

    /// Step in whole pixels and ignore the spatial calibration
    #[arg(long)]
    avoid_interpolation: bool,

    /// Refuse outputs larger than this many megabytes
    #[arg(long)]
    max_memory_mb: Option<u64>,

    /// Only print the size of the output and exit
    #[arg(long)]
    estimate: bool,
}

impl Args {
    fn options(&self) -> ResliceOptions {
        ResliceOptions {
            start_edge: self.start,
            input_z_spacing: self.input_z_spacing,
            output_z_spacing: self.output_z_spacing,
            slice_count: self.slice_count,
            flip: self.flip,
            rotate: self.rotate,
            avoid_interpolation: self.avoid_interpolation,
            memory_limit: self.max_memory_mb.map(|mb| mb.saturating_mul(MB)),
        }
    }
}

/// Input file name without `.nii` or `.nii.gz`.
fn basename(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Could not parse input file name.")?;
    let name = name.strip_suffix(".gz").unwrap_or(name);
    let name = name.strip_suffix(".nii").unwrap_or(name);
    Ok(name.to_string())
}

fn input_paths(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = glob(pattern)
        .with_context(|| format!("Bad input pattern {pattern}"))?
        .filter_map(Result::ok)
        .collect();
    paths.sort();
    if paths.is_empty() {
        bail!("No nifti files match {pattern}");
    }
    Ok(paths)
}

/// Memory the system can hand out right now, if it reports it.
fn available_memory() -> Option<u64> {
    let mut sys = System::new();
    sys.refresh_memory();
    Some(sys.available_memory()).filter(|&bytes| bytes > 0)
}

/// Rejects outputs above `limit` and warns about outputs above `available`.
///
/// # Arguments
///
/// * `size` - The predicted output.
/// * `limit` - The `--max-memory-mb` limit in bytes, if any.
/// * `available` - Free system memory in bytes, if known.
///
/// # Returns
///
/// A line describing the output size and the free memory, or an
/// `OutOfMemory` error when the output is above `limit`.
fn check_memory(
    size: &SizeEstimate,
    limit: Option<u64>,
    available: Option<u64>,
) -> Result<String> {
    if limit.is_some_and(|limit| size.exceeds(limit)) {
        return Err(ResliceError::OutOfMemory {
            requested_bytes: size.bytes,
        }
        .into());
    }
    let free = match available {
        Some(bytes) => {
            if size.exceeds(bytes) {
                warn!("Output needs {size} but only {}MB are free", bytes / MB);
            }
            format!(" ({}MB free)", bytes / MB)
        }
        None => String::new(),
    };
    Ok(format!("{}x{}x{} {size}{free}", size.width, size.height, size.depth))
}

/// Reslices one file into `output_dir`.
fn reslice_file(
    input: &Path,
    output_dir: &Path,
    cut: &CutGeometry,
    options: &ResliceOptions,
    estimate_only: bool,
) -> Result<()> {
    println!("Loading: {}", input.display());
    let (volume, header) = load_volume(input)?;
    let (w, h, d) = volume.dims();
    info!("Dims: {w}x{h}x{d} ({})", volume.kind());
    if !volume.calibration().is_calibrated() {
        info!("No spatial calibration, spacings are in pixels");
    }
    if d < 2 && !matches!(cut, CutGeometry::None | CutGeometry::Rectangle(_)) {
        warn!(
            "A {:.1} pixel cut through a single plane gives a single row",
            cut.raw_length()
        );
    }
    if cut.is_irregular() && options.slice_count > 1 {
        warn!(
            "Polyline cuts give one plane, ignoring a slice count of {}",
            options.slice_count
        );
    }

    let size = volume.estimate(cut, options)?;
    let report = check_memory(&size, options.memory_limit, available_memory())?;
    println!("Output: {report}");
    if estimate_only {
        return Ok(());
    }

    let resliced = volume.reslice(cut, options, &mut LogMonitor)?;
    let output_path = output_dir.join(format!("{}_reslice.nii", basename(input)?));
    save_volume(&output_path, &resliced, &header)?;
    println!("Output: {}", output_path.display());
    Ok(())
}

fn run(cli: &Args) -> Result<()> {
    let options = cli.options();
    let output_dir = Path::new(&cli.output);
    if !cli.estimate {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Could not create {}", output_dir.display()))?;
    }
    for path in input_paths(&cli.input)? {
        reslice_file(&path, output_dir, &cli.roi, &options, cli.estimate)?;
    }
    Ok(())
}

/// Main function that parses commandline arguments and runs the program.
fn main() {
    // set RUST_LOG=debug to see every step
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Args::parse();
    run(&cli).unwrap_or_else(|e| {
        eprintln!("Error! {:#}", e);
        std::process::exit(-2);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_strips_nifti_extensions() {
        let name = basename(Path::new("/data/sub-01_T1w.nii.gz")).unwrap();
        assert_eq!(name, "sub-01_T1w");
        assert_eq!(basename(Path::new("scan.v2.nii")).unwrap(), "scan.v2");
    }

    #[test]
    fn parses_arguments() {
        let cli = Args::parse_from([
            "reslicenii",
            "-i",
            "scan.nii",
            "--roi",
            "line:0,0,10,10",
            "-n",
            "5",
            "--rotate",
            "--max-memory-mb",
            "2",
        ]);
        let opts = cli.options();
        assert_eq!(cli.roi, CutGeometry::line(0.0, 0.0, 10.0, 10.0));
        assert_eq!(opts.slice_count, 5);
        assert!(opts.rotate);
        assert_eq!(opts.memory_limit, Some(2 * 1_048_576));
        assert_eq!(opts.start_edge, StartEdge::Top);
    }

    fn size(bytes: u64) -> SizeEstimate {
        SizeEstimate {
            width: 64,
            height: 32,
            depth: 16,
            bytes,
        }
    }

    #[test]
    fn outputs_above_the_limit_are_refused() {
        let err = check_memory(&size(3 * MB), Some(2 * MB), None).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResliceError>(),
            Some(&ResliceError::OutOfMemory {
                requested_bytes: 3 * MB
            })
        );
        let report = check_memory(&size(2 * MB), Some(2 * MB), Some(512 * MB)).unwrap();
        assert_eq!(report, "64x32x16 2MB (512MB free)");
        // more than is free is only a warning
        let report = check_memory(&size(10 * MB), None, Some(MB)).unwrap();
        assert_eq!(report, "64x32x16 10MB (1MB free)");
        assert_eq!(check_memory(&size(1024), None, None).unwrap(), "64x32x16 <1MB");
    }
}
