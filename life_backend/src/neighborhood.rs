//! 8-bit neighbour masks. Edges do not wrap: off-grid neighbours read as dead.

use arrayvec::ArrayVec;

use crate::cell::Cell;
use crate::grid::Grid;

// ============================================================================
// DIRECTIONS
// ============================================================================
//
// Mask layout, most significant bit first:
// ┌────┬───┬────┬───┬───┬────┬───┬────┐
// │ NW │ N │ NE │ W │ E │ SW │ S │ SE │
// └────┴───┴────┴───┴───┴────┴───┴────┘

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    /// Visiting order for colour synthesis.
    pub const CLOCKWISE: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    #[inline]
    pub const fn bit(self) -> u8 {
        match self {
            Direction::NW => 0x80,
            Direction::N => 0x40,
            Direction::NE => 0x20,
            Direction::W => 0x10,
            Direction::E => 0x08,
            Direction::SW => 0x04,
            Direction::S => 0x02,
            Direction::SE => 0x01,
        }
    }

    /// (dy, dx)
    #[inline]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::N => (-1, 0),
            Direction::NE => (-1, 1),
            Direction::E => (0, 1),
            Direction::SE => (1, 1),
            Direction::S => (1, 0),
            Direction::SW => (1, -1),
            Direction::W => (0, -1),
            Direction::NW => (-1, -1),
        }
    }
}

#[inline(always)]
fn alive_bit(cell: Cell, dir: Direction) -> u8 {
    if cell.alive() {
        dir.bit()
    } else {
        0
    }
}

// ============================================================================
// INTERIOR
// ============================================================================

/// Mask for a cell with all eight neighbours on the grid
/// (`1 <= y <= height-2`, `1 <= x <= width-2`).
#[inline]
pub fn interior_mask(grid: &Grid, y: usize, x: usize) -> u8 {
    let w = grid.width();
    let cells = grid.cells();
    let i = grid.idx(y, x);
    let above = i - w;
    let below = i + w;

    alive_bit(cells[above - 1], Direction::NW)
        | alive_bit(cells[above], Direction::N)
        | alive_bit(cells[above + 1], Direction::NE)
        | alive_bit(cells[i - 1], Direction::W)
        | alive_bit(cells[i + 1], Direction::E)
        | alive_bit(cells[below - 1], Direction::SW)
        | alive_bit(cells[below], Direction::S)
        | alive_bit(cells[below + 1], Direction::SE)
}

// ============================================================================
// PERIMETER
// ============================================================================

/// Position of a cell on the outer ring of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Edge {
    /// `None` for interior cells. Assumes a grid of at least 2x2.
    pub fn of(grid: &Grid, y: usize, x: usize) -> Option<Edge> {
        let top = y == 0;
        let bottom = y + 1 == grid.height();
        let left = x == 0;
        let right = x + 1 == grid.width();

        match (top, bottom, left, right) {
            (true, _, true, _) => Some(Edge::NW),
            (true, _, _, true) => Some(Edge::NE),
            (true, _, _, _) => Some(Edge::N),
            (_, true, true, _) => Some(Edge::SW),
            (_, true, _, true) => Some(Edge::SE),
            (_, true, _, _) => Some(Edge::S),
            (_, _, true, _) => Some(Edge::W),
            (_, _, _, true) => Some(Edge::E),
            _ => None,
        }
    }

    /// Directions that stay on the grid from this position.
    pub const fn valid_directions(self) -> &'static [Direction] {
        use Direction as D;
        match self {
            Edge::N => &[D::W, D::E, D::SW, D::S, D::SE],
            Edge::S => &[D::NW, D::N, D::NE, D::W, D::E],
            Edge::W => &[D::N, D::NE, D::E, D::S, D::SE],
            Edge::E => &[D::NW, D::N, D::W, D::SW, D::S],
            Edge::NW => &[D::E, D::S, D::SE],
            Edge::NE => &[D::W, D::SW, D::S],
            Edge::SW => &[D::N, D::NE, D::E],
            Edge::SE => &[D::NW, D::N, D::W],
        }
    }
}

#[inline]
fn neighbor(grid: &Grid, y: usize, x: usize, dir: Direction) -> Cell {
    let (dy, dx) = dir.offset();
    grid.get(y.wrapping_add_signed(dy), x.wrapping_add_signed(dx))
}

/// Mask for a perimeter cell; reads only the directions valid at `edge`.
pub fn perimeter_mask(grid: &Grid, edge: Edge, y: usize, x: usize) -> u8 {
    edge.valid_directions()
        .iter()
        .fold(0, |mask, &dir| mask | alive_bit(neighbor(grid, y, x, dir), dir))
}

/// Mask for any cell, choosing the interior or perimeter variant.
pub fn neighbor_mask(grid: &Grid, y: usize, x: usize) -> u8 {
    match Edge::of(grid, y, x) {
        Some(edge) => perimeter_mask(grid, edge, y, x),
        None => interior_mask(grid, y, x),
    }
}

/// Alive neighbours named by `mask`, in clockwise order starting at N.
/// Only bits produced by the encoders above may be set in `mask`.
pub fn contributors(grid: &Grid, y: usize, x: usize, mask: u8) -> ArrayVec<Cell, 8> {
    Direction::CLOCKWISE
        .iter()
        .filter(|dir| mask & dir.bit() != 0)
        .map(|&dir| neighbor(grid, y, x, dir))
        .collect()
}
