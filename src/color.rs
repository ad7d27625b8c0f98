//! Colored-content detection on rasterized pages.
//!
//! A page counts as colored when any pixel's channels diverge by more than
//! a tolerance. Neutral pixels (black text, white paper, grayscale photos)
//! have near-equal channels; highlights, logos and color photos do not.
//! The tolerance is a tuning knob: very light anti-aliasing fringes can
//! still trip it, raising it trades sensitivity for fewer false positives.

/// A rendered page: tightly packed, row-major 8-bit samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterPage {
    pub width: usize,
    pub height: usize,
    /// Samples per pixel: 1 (gray), 2 (gray + alpha), 3 (RGB) or 4 (RGBA).
    pub channels: usize,
    pub samples: Vec<u8>,
}

impl RasterPage {
    pub fn new(width: usize, height: usize, channels: usize, samples: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            samples,
        }
    }

    /// Iterates the RGB triple of every pixel, ignoring any alpha channel.
    /// Callers must have checked `channels >= 3`.
    fn rgb_pixels(&self) -> impl Iterator<Item = (u8, u8, u8)> + '_ {
        self.samples
            .chunks_exact(self.channels)
            .take(self.width * self.height)
            .map(|px| (px[0], px[1], px[2]))
    }
}

/// Returns `true` if any pixel differs by more than `tolerance` between its
/// red and green, or green and blue, channels.
///
/// Pages with fewer than three channels are grayscale by construction and
/// return `false` without examining pixel data. Alpha is dropped.
pub fn is_colored(page: &RasterPage, tolerance: u8) -> bool {
    if page.channels < 3 {
        return false;
    }
    let tolerance = i16::from(tolerance);
    page.rgb_pixels().any(|(r, g, b)| {
        let (r, g, b) = (i16::from(r), i16::from(g), i16::from(b));
        (r - g).abs() > tolerance || (g - b).abs() > tolerance
    })
}
