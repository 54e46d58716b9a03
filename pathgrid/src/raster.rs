use image::DynamicImage;

use crate::error::{Error, Result};
use crate::Grid;

/// Gray level at or below which a pixel becomes a wall
pub const DEFAULT_THRESHOLD: u8 = 128;

/// Sample layout of a flat pixel buffer
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ChannelLayout {
    Rgb,
    Rgba,
}

impl ChannelLayout {
    pub(crate) fn channels(self) -> usize {
        match self {
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }

    /// Infers the layout from the length of a `width`x`height` buffer
    pub(crate) fn detect(len: usize, width: usize, height: usize) -> Result<Self> {
        let invalid = Error::InvalidDimensions { width, height, len };

        if width == 0 || height == 0 {
            return Err(invalid);
        }
        let Some(area) = width.checked_mul(height) else {
            return Err(invalid);
        };

        if Some(len) == area.checked_mul(3) {
            Ok(ChannelLayout::Rgb)
        } else if Some(len) == area.checked_mul(4) {
            Ok(ChannelLayout::Rgba)
        } else {
            Err(invalid)
        }
    }
}

/// A pixel is passable when the plain mean of its color channels is strictly above `threshold`.
///
/// `(r + g + b) / 3 > t` is evaluated as `r + g + b > 3t`, which is exact, so no rounding rule is
/// involved: (128, 128, 129) is passable at 128 and (128, 128, 128) is not. Alpha is ignored.
#[inline]
fn is_passable(r: u8, g: u8, b: u8, threshold: u8) -> bool {
    r as u16 + g as u16 + b as u16 > 3 * threshold as u16
}

/// Converts a flat RGB or RGBA buffer into a passability grid.
///
/// The layout is taken from the buffer length, anything other than `width * height * 3` or
/// `width * height * 4` bytes is [`Error::InvalidDimensions`], as is a zero dimension.
pub fn rasterize(pixels: &[u8], width: usize, height: usize, threshold: u8) -> Result<Grid> {
    let layout = ChannelLayout::detect(pixels.len(), width, height)?;

    let cells = pixels
        .chunks_exact(layout.channels())
        .map(|p| is_passable(p[0], p[1], p[2], threshold))
        .collect();

    Ok(Grid::from_cells(width, height, cells))
}

/// Rasterizes a decoded image of any color type
pub fn rasterize_image(img: &DynamicImage, threshold: u8) -> Result<Grid> {
    let rgba = img.to_rgba8();
    rasterize(
        rgba.as_raw(),
        rgba.width() as usize,
        rgba.height() as usize,
        threshold,
    )
}
