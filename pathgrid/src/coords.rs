//! Mapping between display viewport pixels and data grid cells.
//!
//! The scale factor is `data_width / display_width`, so a viewport narrower than the bitmap has a
//! scale factor above 1. Conversions towards the grid floor, conversions towards the viewport do
//! not, which makes them inverse only to within one cell.

use crate::error::{Error, Result};
use crate::Cell;

pub fn compute_scale_factor(data_width: usize, display_width: f64) -> Result<f64> {
    if !display_width.is_finite() || display_width <= 0.0 {
        return Err(Error::DivisionByZero { display_width });
    }
    Ok(data_width as f64 / display_width)
}

/// Converts a viewport position into unchecked grid coordinates
pub fn to_data(view_x: f64, view_y: f64, scale_factor: f64) -> (i64, i64) {
    (
        (view_x * scale_factor).floor() as i64,
        (view_y * scale_factor).floor() as i64,
    )
}

pub fn to_view(data_x: i64, data_y: i64, scale_factor: f64) -> (f64, f64) {
    (data_x as f64 / scale_factor, data_y as f64 / scale_factor)
}

/// The current viewport mapping, derived from the grid width and the display width
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewTransform {
    scale_factor: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self { scale_factor: 1.0 }
    }
}

impl ViewTransform {
    pub fn new(data_width: usize, display_width: f64) -> Result<Self> {
        Ok(Self {
            scale_factor: compute_scale_factor(data_width, display_width)?,
        })
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn to_data(&self, view_x: f64, view_y: f64) -> (i64, i64) {
        to_data(view_x, view_y, self.scale_factor)
    }

    /// Same as [`ViewTransform::to_data`] without flooring, for brush positions
    pub fn to_data_exact(&self, view_x: f64, view_y: f64) -> (f64, f64) {
        (view_x * self.scale_factor, view_y * self.scale_factor)
    }

    pub fn to_view(&self, data_x: i64, data_y: i64) -> (f64, f64) {
        to_view(data_x, data_y, self.scale_factor)
    }

    /// Top-left corner of `cell` in the viewport
    pub fn cell_to_view(&self, cell: Cell) -> (f64, f64) {
        self.to_view(cell.x as i64, cell.y as i64)
    }

    /// Size in viewport pixels of a `data_width`x`data_height` bitmap
    pub fn display_size(&self, data_width: usize, data_height: usize) -> (f64, f64) {
        (
            data_width as f64 / self.scale_factor,
            data_height as f64 / self.scale_factor,
        )
    }
}
