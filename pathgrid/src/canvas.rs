use std::{ops::RangeInclusive, path::Path};

use image::{DynamicImage, Rgba, RgbImage, RgbaImage};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::{rasterize, ChannelLayout};
use crate::Grid;

pub const DEFAULT_BRUSH_SIZE: u32 = 10;
pub const BRUSH_SIZE_RANGE: RangeInclusive<u32> = 1..=50;

/// Width of a blank drawing when the viewport width is unknown
pub const DEFAULT_CANVAS_WIDTH: u32 = 600;
/// Height to width ratio of a blank drawing
pub const BLANK_CANVAS_ASPECT: f64 = 0.75;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Ink {
    #[default]
    Wall,
    Path,
}

impl Ink {
    pub fn color(self) -> Rgba<u8> {
        match self {
            Ink::Wall => Rgba([0, 0, 0, 255]),
            Ink::Path => Rgba([255, 255, 255, 255]),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Brush {
    pub ink: Ink,
    /// Diameter in bitmap pixels
    pub size: u32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            ink: Ink::default(),
            size: DEFAULT_BRUSH_SIZE,
        }
    }
}

/// The bitmap a grid is derived from
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// An all white, and therefore all passable, bitmap
    pub fn blank(width: u32, height: u32) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, Ink::Path.color()),
        })
    }

    pub fn from_image(img: &DynamicImage) -> Result<Self> {
        check_dimensions(img.width(), img.height())?;
        Ok(Self {
            image: img.to_rgba8(),
        })
    }

    /// Decodes an image file in any format the `image` crate supports
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_image(&image::open(path)?)
    }

    /// Wraps a raw RGB or RGBA buffer, the layout is inferred from its length
    pub fn from_raw(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len();
        let layout = ChannelLayout::detect(len, width as usize, height as usize)?;
        let invalid = || Error::InvalidDimensions {
            width: width as usize,
            height: height as usize,
            len,
        };

        let image = match layout {
            ChannelLayout::Rgba => RgbaImage::from_raw(width, height, bytes).ok_or_else(invalid)?,
            ChannelLayout::Rgb => DynamicImage::ImageRgb8(
                RgbImage::from_raw(width, height, bytes).ok_or_else(invalid)?,
            )
            .to_rgba8(),
        };

        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn rasterize(&self, threshold: u8) -> Result<Grid> {
        rasterize(
            self.image.as_raw(),
            self.width() as usize,
            self.height() as usize,
            threshold,
        )
    }

    /// Paints a round-capped line of `brush` from `from` to `to`, in bitmap pixel coordinates.
    ///
    /// A zero length stroke paints a disc. Returns the number of pixels painted.
    pub fn stroke(&mut self, from: (f64, f64), to: (f64, f64), brush: Brush) -> usize {
        trace!("stroke {:?} -> {:?} with {:?}", from, to, brush);
        self.paint_segment(from, to, brush.size as f64 / 2.0, brush.ink.color())
    }

    /// Sets every pixel whose center is within `radius` of the segment, plus the pixels under
    /// both endpoints so that thin strokes never vanish. Anything outside the bitmap is clipped.
    pub fn paint_segment(
        &mut self,
        from: (f64, f64),
        to: (f64, f64),
        radius: f64,
        color: Rgba<u8>,
    ) -> usize {
        let (width, height) = (self.width() as f64, self.height() as f64);

        let x0 = (from.0.min(to.0) - radius).floor().max(0.0);
        let y0 = (from.1.min(to.1) - radius).floor().max(0.0);
        let x1 = (from.0.max(to.0) + radius).ceil().min(width);
        let y1 = (from.1.max(to.1) + radius).ceil().min(height);

        let mut painted = 0;
        if x0 < x1 && y0 < y1 {
            for y in y0 as u32..y1 as u32 {
                for x in x0 as u32..x1 as u32 {
                    let center = (x as f64 + 0.5, y as f64 + 0.5);
                    if distance_squared_to_segment(center, from, to) <= radius * radius {
                        self.image.put_pixel(x, y, color);
                        painted += 1;
                    }
                }
            }
        }

        for end in [from, to] {
            if (0.0..width).contains(&end.0) && (0.0..height).contains(&end.1) {
                self.image.put_pixel(end.0 as u32, end.1 as u32, color);
            }
        }

        painted
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions {
            width: width as usize,
            height: height as usize,
            len: 0,
        });
    }
    Ok(())
}

fn distance_squared_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_squared = dx * dx + dy * dy;

    let t = if len_squared == 0.0 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_squared).clamp(0.0, 1.0)
    };

    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    (p.0 - cx) * (p.0 - cx) + (p.1 - cy) * (p.1 - cy)
}
