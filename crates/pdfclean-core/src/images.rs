//! Image size targets for image removal

use crate::error::PdfCleanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Intrinsic pixel size written as `"WIDTHxHEIGHT"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions within `tolerance` pixels of this size
    pub fn matches(&self, width: u32, height: u32, tolerance: u32) -> bool {
        width.abs_diff(self.width) <= tolerance && height.abs_diff(self.height) <= tolerance
    }
}

impl FromStr for ImageSize {
    type Err = PdfCleanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .trim()
            .split_once('x')
            .ok_or_else(|| PdfCleanError::Parse(format!("Missing 'x' in image size: {:?}", s)))?;
        let width = width
            .trim()
            .parse()
            .map_err(|_| PdfCleanError::Parse(format!("Invalid image width: {:?}", s)))?;
        let height = height
            .trim()
            .parse()
            .map_err(|_| PdfCleanError::Parse(format!("Invalid image height: {:?}", s)))?;
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for ImageSize {
    type Error = PdfCleanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ImageSize> for String {
    fn from(size: ImageSize) -> Self {
        size.to_string()
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parse every target, failing on the first malformed one
pub fn parse_sizes<S: AsRef<str>>(targets: &[S]) -> Result<Vec<ImageSize>, PdfCleanError> {
    targets.iter().map(|t| t.as_ref().parse()).collect()
}
