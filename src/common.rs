use crate::error::ParseError;
use std::fmt;
use std::str::FromStr;

/// Edge of a rectangular cut where reslicing starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartEdge {
    #[default]
    Top,
    Left,
    Bottom,
    Right,
}

impl fmt::Display for StartEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartEdge::Top => write!(f, "top"),
            StartEdge::Left => write!(f, "left"),
            StartEdge::Bottom => write!(f, "bottom"),
            StartEdge::Right => write!(f, "right"),
        }
    }
}

impl FromStr for StartEdge {
    type Err = ParseError;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        match val.trim().to_ascii_lowercase().as_str() {
            "top" | "t" => Ok(StartEdge::Top),
            "left" | "l" => Ok(StartEdge::Left),
            "bottom" | "b" => Ok(StartEdge::Bottom),
            "right" | "r" => Ok(StartEdge::Right),
            _ => Err(ParseError::StartEdge(val.to_string())),
        }
    }
}

/// Orientation of a scan line in the source plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction {
    /// Runs along X; successive lines step along Y.
    Horizontal,
    /// Runs along Y; successive lines step along X.
    Vertical,
    /// Any other angle, given by its delta in source pixels.
    Oblique { dx: f64, dy: f64 },
}

impl Direction {
    pub fn from_delta(dx: f64, dy: f64) -> Self {
        if dy == 0.0 {
            Direction::Horizontal
        } else if dx == 0.0 {
            Direction::Vertical
        } else {
            Direction::Oblique { dx, dy }
        }
    }
}
