use std::{
    fmt::Display,
    time::{Duration, Instant},
};

use image::DynamicImage;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::canvas::{
    Brush, Canvas, Ink, BLANK_CANVAS_ASPECT, BRUSH_SIZE_RANGE, DEFAULT_BRUSH_SIZE,
    DEFAULT_CANVAS_WIDTH,
};
use crate::coords::ViewTransform;
use crate::error::{Error, Result};
use crate::find::{solve, SearchResult};
use crate::raster::DEFAULT_THRESHOLD;
use crate::{Cell, Grid};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Mode {
    /// Nothing loaded yet
    #[default]
    Idle,
    /// Clicks select endpoints
    Browsing,
    /// Pointer drags paint on the bitmap
    Editing,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub threshold: u8,
    pub brush_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            brush_size: DEFAULT_BRUSH_SIZE,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Empty,
    AwaitingEnd { start: Cell },
    Complete { start: Cell, end: Cell },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Not browsing, the click has no meaning
    Ignored,
    OutsideGrid,
    /// Walls cannot be endpoints, the selection is unchanged
    Wall(Cell),
    StartSelected(Cell),
    Solved(SearchResult),
    /// Both endpoints were already set, the old pair was dropped and this is the new start
    Restarted(Cell),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stats {
    Dimensions {
        width: usize,
        height: usize,
    },
    Solved {
        steps: usize,
        visited: usize,
        elapsed: Duration,
    },
    Unreachable {
        visited: usize,
        elapsed: Duration,
    },
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let millis = |elapsed: &Duration| (elapsed.as_secs_f64() * 1000.0).round();
        match self {
            Stats::Dimensions { width, height } => write!(f, "{width}×{height}"),
            Stats::Solved {
                steps,
                visited,
                elapsed,
            } => write!(
                f,
                "{steps} steps · {visited} visited · {}ms",
                millis(elapsed)
            ),
            Stats::Unreachable { visited, elapsed } => {
                write!(f, "{visited} visited · {}ms", millis(elapsed))
            }
        }
    }
}

#[derive(Clone, Debug)]
struct LastSolve {
    result: SearchResult,
    elapsed: Duration,
}

/// Owns the bitmap, the grid derived from it, the endpoint selection and the last search.
///
/// There is one session per running instance and it is driven by a single owner, nothing here is
/// meant to be shared between threads.
#[derive(Debug, Default)]
pub struct Session {
    settings: Settings,
    mode: Mode,
    canvas: Option<Canvas>,
    grid: Option<Grid>,
    view: ViewTransform,
    display_width: Option<f64>,
    start: Option<Cell>,
    end: Option<Cell>,
    last_solve: Option<LastSolve>,
    ink: Ink,
    // last brush position of the stroke in progress, in bitmap pixels
    stroke: Option<(f64, f64)>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Settings {
                brush_size: clamp_brush_size(settings.brush_size),
                ..settings
            },
            ..Default::default()
        }
    }

    pub fn load_image(&mut self, img: &DynamicImage) -> Result<()> {
        self.load_canvas(Canvas::from_image(img)?)
    }

    /// Replaces the bitmap and the grid, drops any selection and starts browsing
    pub fn load_canvas(&mut self, canvas: Canvas) -> Result<()> {
        let grid = canvas.rasterize(self.settings.threshold)?;
        debug!("loaded {}x{} bitmap", grid.width(), grid.height());

        if let Some(display_width) = self.display_width {
            self.view = ViewTransform::new(grid.width(), display_width)?;
        } else {
            self.view = ViewTransform::default();
        }

        self.canvas = Some(canvas);
        self.grid = Some(grid);
        self.stroke = None;
        self.reset_selection();
        self.mode = Mode::Browsing;
        Ok(())
    }

    /// Starts editing a blank bitmap as wide as the viewport
    pub fn new_drawing(&mut self, display_width: f64) -> Result<()> {
        let width = if display_width.is_finite() && display_width >= 1.0 {
            display_width.round() as u32
        } else {
            DEFAULT_CANVAS_WIDTH
        };
        let height = ((width as f64 * BLANK_CANVAS_ASPECT).round() as u32).max(1);

        self.load_canvas(Canvas::blank(width, height)?)?;
        self.set_mode(Mode::Editing)?;
        self.resize_viewport(width as f64)?;
        Ok(())
    }

    /// Switches between browsing and editing.
    ///
    /// A stroke in progress is finished first. The selection is kept. Coming back to browsing
    /// with both endpoints set and no current path, e.g. after an edit, solves again.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        if self.canvas.is_none() {
            return Err(Error::NoImage);
        }
        if mode == Mode::Idle {
            return Err(Error::InvalidModeTransition {
                from: self.mode,
                to: mode,
            });
        }

        if self.stroke.take().is_some() {
            self.resync_grid()?;
        }

        debug!("mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;

        if mode == Mode::Browsing && self.last_solve.is_none() {
            self.solve()?;
        }
        Ok(())
    }

    pub fn toggle_mode(&mut self) -> Result<Mode> {
        let next = match self.mode {
            Mode::Editing => Mode::Browsing,
            _ => Mode::Editing,
        };
        self.set_mode(next)?;
        Ok(next)
    }

    /// Recomputes the view transform for a new viewport width and returns the display size
    pub fn resize_viewport(&mut self, display_width: f64) -> Result<(f64, f64)> {
        let grid = self.grid.as_ref().ok_or(Error::NoImage)?;
        self.view = ViewTransform::new(grid.width(), display_width)?;
        self.display_width = Some(display_width);
        Ok(self.view.display_size(grid.width(), grid.height()))
    }

    /// Endpoint selection: first click sets the start, second sets the end and solves, a third
    /// click starts over with a new start.
    pub fn click(&mut self, view_x: f64, view_y: f64) -> Result<ClickOutcome> {
        let Some(grid) = self.grid.as_ref().filter(|_| self.mode == Mode::Browsing) else {
            return Ok(ClickOutcome::Ignored);
        };

        if !(view_x.is_finite() && view_y.is_finite()) {
            return Ok(ClickOutcome::OutsideGrid);
        }
        let (x, y) = self.view.to_data(view_x, view_y);
        let Ok(cell) = grid.cell_at(x, y) else {
            return Ok(ClickOutcome::OutsideGrid);
        };
        if !grid.is_passable(cell) {
            return Ok(ClickOutcome::Wall(cell));
        }

        match (self.start, self.end) {
            (None, _) => {
                self.start = Some(cell);
                Ok(ClickOutcome::StartSelected(cell))
            }
            (Some(_), None) => {
                self.end = Some(cell);
                let result = self.solve()?.cloned().ok_or(Error::NoImage)?;
                Ok(ClickOutcome::Solved(result))
            }
            (Some(_), Some(_)) => {
                self.reset_selection();
                self.start = Some(cell);
                Ok(ClickOutcome::Restarted(cell))
            }
        }
    }

    /// Runs the solver on the current endpoints, `None` unless both are set
    pub fn solve(&mut self) -> Result<Option<&SearchResult>> {
        let (Some(grid), Some(start), Some(end)) = (self.grid.as_ref(), self.start, self.end)
        else {
            return Ok(None);
        };

        let began = Instant::now();
        let result = solve(grid, start, end)?;
        self.last_solve = Some(LastSolve {
            result,
            elapsed: began.elapsed(),
        });

        Ok(self.last_solve.as_ref().map(|last| &last.result))
    }

    pub fn reset_selection(&mut self) {
        self.start = None;
        self.end = None;
        self.last_solve = None;
    }

    /// Paints a dot at the pointer and starts a stroke, returns `false` when not editing
    pub fn begin_stroke(&mut self, view_x: f64, view_y: f64) -> bool {
        if self.mode != Mode::Editing {
            return false;
        }
        let brush = self.brush();
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };

        let at = self.view.to_data_exact(view_x, view_y);
        canvas.stroke(at, at, brush);
        self.stroke = Some(at);
        true
    }

    /// Continues the stroke in progress to the pointer
    pub fn extend_stroke(&mut self, view_x: f64, view_y: f64) -> bool {
        let brush = self.brush();
        let (Some(last), Some(canvas)) = (self.stroke, self.canvas.as_mut()) else {
            return false;
        };

        let at = self.view.to_data_exact(view_x, view_y);
        canvas.stroke(last, at, brush);
        self.stroke = Some(at);
        true
    }

    /// Finishes the stroke in progress and rederives the grid from the edited bitmap
    pub fn end_stroke(&mut self) -> Result<bool> {
        if self.stroke.take().is_none() {
            return Ok(false);
        }
        self.resync_grid()?;
        Ok(true)
    }

    fn resync_grid(&mut self) -> Result<()> {
        let canvas = self.canvas.as_ref().ok_or(Error::NoImage)?;
        let grid = canvas.rasterize(self.settings.threshold)?;

        self.last_solve = None;

        let still_open = |cell: Option<Cell>| cell.map_or(true, |c| grid.is_passable(c));
        if !(still_open(self.start) && still_open(self.end)) {
            debug!("edit walled over an endpoint, selection cleared");
            self.start = None;
            self.end = None;
        }

        self.grid = Some(grid);
        Ok(())
    }

    pub fn set_threshold(&mut self, threshold: u8) -> Result<()> {
        self.settings.threshold = threshold;
        if self.canvas.is_some() {
            self.resync_grid()?;
        }
        Ok(())
    }

    pub fn set_ink(&mut self, ink: Ink) {
        self.ink = ink;
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.settings.brush_size = clamp_brush_size(size);
    }

    pub fn brush(&self) -> Brush {
        Brush {
            ink: self.ink,
            size: self.settings.brush_size,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn selection(&self) -> Selection {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Selection::Complete { start, end },
            (Some(start), None) => Selection::AwaitingEnd { start },
            _ => Selection::Empty,
        }
    }

    pub fn start(&self) -> Option<Cell> {
        self.start
    }

    pub fn end(&self) -> Option<Cell> {
        self.end
    }

    pub fn last_result(&self) -> Option<&SearchResult> {
        self.last_solve.as_ref().map(|last| &last.result)
    }

    pub fn path(&self) -> Option<&[Cell]> {
        self.last_result()?.path.as_deref()
    }

    pub fn stats(&self) -> Option<Stats> {
        let grid = self.grid.as_ref()?;

        Some(match &self.last_solve {
            Some(LastSolve {
                result:
                    SearchResult {
                        path: Some(path),
                        visited_count,
                    },
                elapsed,
            }) => Stats::Solved {
                steps: path.len(),
                visited: *visited_count,
                elapsed: *elapsed,
            },
            Some(LastSolve {
                result: SearchResult {
                    path: None,
                    visited_count,
                },
                elapsed,
            }) => Stats::Unreachable {
                visited: *visited_count,
                elapsed: *elapsed,
            },
            None => Stats::Dimensions {
                width: grid.width(),
                height: grid.height(),
            },
        })
    }
}

fn clamp_brush_size(size: u32) -> u32 {
    size.clamp(*BRUSH_SIZE_RANGE.start(), *BRUSH_SIZE_RANGE.end())
}
