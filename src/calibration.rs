//! Physical calibration of a volume: spacing, origin and unit per axis.

/// Spacing, origin and unit of one axis.
///
/// `origin` is expressed in pixels, so the physical coordinate of pixel `i`
/// is `(i - origin) * spacing`.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisCalibration {
    pub spacing: f64,
    pub origin: f64,
    pub unit: String,
}

impl AxisCalibration {
    pub fn new(spacing: f64, origin: f64, unit: impl Into<String>) -> Self {
        Self {
            spacing,
            origin,
            unit: unit.into(),
        }
    }

    /// One pixel per unit, zero origin.
    pub fn pixel() -> Self {
        Self::new(1.0, 0.0, "pixel")
    }

    /// Spacing with zero, negative zero or non-finite values replaced by 1.0.
    pub fn spacing_or_unit(&self) -> f64 {
        normalize_spacing(self.spacing)
    }
}

impl Default for AxisCalibration {
    fn default() -> Self {
        Self::pixel()
    }
}

/// Unset spacings count as one pixel.
pub fn normalize_spacing(spacing: f64) -> f64 {
    if spacing == 0.0 || !spacing.is_finite() {
        1.0
    } else {
        spacing
    }
}

/// Calibration of the X (columns), Y (rows) and Z (planes) axes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Calibration {
    pub x: AxisCalibration,
    pub y: AxisCalibration,
    pub z: AxisCalibration,
}

impl Calibration {
    pub fn new(x: AxisCalibration, y: AxisCalibration, z: AxisCalibration) -> Self {
        Self { x, y, z }
    }

    /// Same spacing and unit on every axis, zero origins.
    pub fn isotropic(spacing: f64, unit: &str) -> Self {
        Self {
            x: AxisCalibration::new(spacing, 0.0, unit),
            y: AxisCalibration::new(spacing, 0.0, unit),
            z: AxisCalibration::new(spacing, 0.0, unit),
        }
    }

    /// Copy with every unset spacing replaced by 1.0.
    pub fn normalized(&self) -> Self {
        let mut cal = self.clone();
        cal.x.spacing = cal.x.spacing_or_unit();
        cal.y.spacing = cal.y.spacing_or_unit();
        cal.z.spacing = cal.z.spacing_or_unit();
        cal
    }

    /// Copy with all spacings set to 1.0; origins and units are kept.
    pub fn unit_spacing(&self) -> Self {
        let mut cal = self.clone();
        cal.x.spacing = 1.0;
        cal.y.spacing = 1.0;
        cal.z.spacing = 1.0;
        cal
    }

    /// Exchange the X and Y records.
    pub fn swap_xy(&mut self) {
        std::mem::swap(&mut self.x, &mut self.y);
    }

    /// Copy with the X and Y records exchanged.
    pub fn swapped_xy(&self) -> Self {
        let mut cal = self.clone();
        cal.swap_xy();
        cal
    }

    pub fn is_calibrated(&self) -> bool {
        [&self.x, &self.y, &self.z]
            .iter()
            .any(|a| a.spacing != 1.0 || a.unit != "pixel")
    }
}
