use thiserror::Error;

use crate::session::Mode;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid dimensions {width}x{height} for a buffer of {len} bytes")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
    #[error("cannot derive a scale factor from display width {display_width}")]
    DivisionByZero { display_width: f64 },
    #[error("no image loaded")]
    NoImage,
    #[error("cannot switch from {from:?} to {to:?}")]
    InvalidModeTransition { from: Mode, to: Mode },
    #[error("could not decode image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
