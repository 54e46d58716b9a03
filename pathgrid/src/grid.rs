use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::find::{MapStorage, MapTrait, NodeReference};

/// A grid coordinate, `x` is the column and `y` the row
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// The neighboring cell in `direction`, if it lies inside a `width`x`height` grid
    pub fn step(self, direction: Direction, width: usize, height: usize) -> Option<Cell> {
        let (dx, dy) = direction.offset();
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        (x < width && y < height).then_some(Cell { x, y })
    }
}

impl NodeReference for Cell {}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Exploration order of the path finder
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }
}

/// Rectangular passability map, `true` is passable and `false` is a wall.
///
/// Always at least 1x1. A grid is never edited after construction, a changed bitmap produces a
/// new grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    // row-major, `y * width + x`
    cells: Vec<bool>,
}

impl Grid {
    /// Builds a grid from rows indexed `[y][x]`
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let len = rows.iter().map(Vec::len).sum();

        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return Err(Error::InvalidDimensions { width, height, len });
        }

        Ok(Self {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn filled(width: usize, height: usize, passable: bool) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                width,
                height,
                len: 0,
            });
        }

        Ok(Self {
            width,
            height,
            cells: vec![passable; width * height],
        })
    }

    /// Caller guarantees `cells.len() == width * height` and both dimensions are non-zero
    pub(crate) fn from_cells(width: usize, height: usize, cells: Vec<bool>) -> Self {
        debug_assert!(width > 0 && height > 0);
        debug_assert_eq!(cells.len(), width * height);
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    pub(crate) fn check(&self, cell: Cell) -> Result<()> {
        if self.contains(cell) {
            Ok(())
        } else {
            Err(self.out_of_bounds(cell.x as i64, cell.y as i64))
        }
    }

    /// Converts signed coordinates, e.g. a floored view position, into a cell of this grid
    pub fn cell_at(&self, x: i64, y: i64) -> Result<Cell> {
        match (usize::try_from(x), usize::try_from(y)) {
            (Ok(cx), Ok(cy)) if cx < self.width && cy < self.height => Ok(Cell { x: cx, y: cy }),
            _ => Err(self.out_of_bounds(x, y)),
        }
    }

    fn out_of_bounds(&self, x: i64, y: i64) -> Error {
        Error::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }

    pub fn get(&self, cell: Cell) -> Result<bool> {
        self.check(cell)?;
        Ok(self.cells[cell.y * self.width + cell.x])
    }

    /// `false` for walls and for cells outside the grid
    pub fn is_passable(&self, cell: Cell) -> bool {
        self.contains(cell) && self.cells[cell.y * self.width + cell.x]
    }

    pub fn passable_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.cells.chunks(self.width)
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            for cell in row {
                write!(f, "{}", if *cell { " " } else { "X" })?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// A MapStorage with one value per grid cell, stored row-major in a single vec
#[derive(Debug)]
pub struct CellStorage<T> {
    width: usize,
    values: Vec<T>,
}

impl<T: Copy + 'static> MapStorage<T> for CellStorage<T> {
    type Reference = Cell;

    fn get(&self, node: Self::Reference) -> T {
        self.values[node.y * self.width + node.x]
    }

    fn get_mut(&mut self, node: Self::Reference) -> &mut T {
        &mut self.values[node.y * self.width + node.x]
    }
}

impl MapTrait for Grid {
    type Reference = Cell;
    type Storage<T: Default + Copy + Clone + 'static> = CellStorage<T>;

    fn neighbors_of(&self, node: Self::Reference) -> impl Iterator<Item = Self::Reference> {
        // nothing can be reached from a wall
        let open = self.is_passable(node);

        Direction::ALL
            .into_iter()
            .filter(move |_| open)
            .filter_map(move |direction| node.step(direction, self.width, self.height))
            .filter(move |next| self.is_passable(*next))
    }

    fn create_storage<T: Default + Copy + Clone + 'static>(&self) -> Self::Storage<T> {
        CellStorage {
            width: self.width,
            values: vec![Default::default(); self.width * self.height],
        }
    }
}
