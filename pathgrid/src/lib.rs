//! Turns a bitmap into a passable/blocked grid and finds shortest paths across it.
//!
//! [`rasterize`] derives a [`Grid`] from pixels, [`solve`] runs a breadth-first search over it and
//! [`coords`] maps between a display viewport and grid cells. [`Session`] ties them together for
//! an interactive front end.

pub mod canvas;
pub mod coords;
mod error;
pub mod find;
pub mod grid;
pub mod raster;
pub mod session;

pub use canvas::{Brush, Canvas, Ink};
pub use coords::{compute_scale_factor, to_data, to_view, ViewTransform};
pub use error::{Error, Result};
pub use find::{solve, MapStorage, MapTrait, PathFinder, PathFinderState, SearchResult};
pub use grid::{Cell, Direction, Grid};
pub use raster::{rasterize, rasterize_image, DEFAULT_THRESHOLD};
pub use session::{ClickOutcome, Mode, Selection, Session, Settings, Stats};
