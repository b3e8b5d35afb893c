//! Flat row-major cell storage. One contiguous buffer per generation.

use crate::cell::Cell;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// All-dead grid.
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            cells: vec![Cell::DEAD; width * height],
        }
    }

    /// Wraps an existing row-major buffer; `None` if the length does not match.
    pub fn from_cells(width: usize, height: usize, cells: Vec<Cell>) -> Option<Self> {
        if cells.len() != width * height {
            return None;
        }
        Some(Grid { width, height, cells })
    }

    #[inline] pub fn width(&self) -> usize  { self.width }
    #[inline] pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn idx(&self, y: usize, x: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn contains(&self, y: usize, x: usize) -> bool {
        y < self.height && x < self.width
    }

    /// Panics when out of range, like slice indexing.
    #[inline]
    pub fn get(&self, y: usize, x: usize) -> Cell {
        self.cells[self.idx(y, x)]
    }

    pub fn try_get(&self, y: usize, x: usize) -> Option<Cell> {
        if self.contains(y, x) {
            Some(self.get(y, x))
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, y: usize, x: usize, cell: Cell) {
        let i = self.idx(y, x);
        self.cells[i] = cell;
    }

    pub fn row(&self, y: usize) -> &[Cell] {
        let start = y * self.width;
        &self.cells[start..start + self.width]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::DEAD);
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|c| c.alive()).count()
    }
}
