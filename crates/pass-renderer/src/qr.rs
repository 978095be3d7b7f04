//! QR code for the photo slot when no selfie is supplied

use qrcode::{Color, EcLevel, QrCode};
use std::fmt::Write;

use crate::error::{RenderError, RenderResult};

/// Modules left blank around the code, in module units.
pub const QUIET_ZONE: usize = 2;

/// Module matrix of an encoded QR symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    dark: Vec<bool>,
}

impl QrMatrix {
    pub fn encode(value: &str) -> RenderResult<Self> {
        let code = QrCode::with_error_correction_level(value.as_bytes(), EcLevel::M)
            .map_err(|e| RenderError::QrEncoding(e.to_string()))?;

        let width = code.width();
        let dark = code
            .to_colors()
            .into_iter()
            .map(|color| color == Color::Dark)
            .collect();

        Ok(Self { width, dark })
    }

    /// Modules per side, without quiet zone.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.dark[y * self.width + x]
    }

    /// Side length including the quiet zone on both edges.
    pub fn padded_width(&self) -> usize {
        self.width + 2 * QUIET_ZONE
    }

    /// SVG path data drawing every dark module as a unit square, offset by
    /// the quiet zone.
    pub fn path_data(&self) -> String {
        let mut d = String::new();
        for y in 0..self.width {
            let mut x = 0;
            while x < self.width {
                if !self.is_dark(x, y) {
                    x += 1;
                    continue;
                }
                // Merge horizontal runs to keep the path short
                let start = x;
                while x < self.width && self.is_dark(x, y) {
                    x += 1;
                }
                let _ = write!(
                    d,
                    "M{} {}h{}v1h-{}z",
                    start + QUIET_ZONE,
                    y + QUIET_ZONE,
                    x - start,
                    x - start
                );
            }
        }
        d
    }
}
