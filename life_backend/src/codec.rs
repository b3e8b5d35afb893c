//! Grid <-> `u32` stream codecs.
//!
//! Delta stream: rows are scanned left to right, top to bottom. Runs of dead
//! cells collapse into a marker `count << 1` (bit 0 clear); alive cells are
//! sent literally (bit 0 set). A marker is written before an alive cell that
//! follows dead ones, and at the end of every row, even when the count is 0.
//! Row boundaries are not marked; the decoder knows `width * height`.

use thiserror::Error;

use crate::cell::{Cell, ALIVE_BIT};
use crate::grid::Grid;
use crate::message::{Message, WorldData, WorldSnapshot};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("stream describes more than {expected} cells")]
    Overrun { expected: usize },
    #[error("stream ended after {decoded} of {expected} cells")]
    Underrun { decoded: usize, expected: usize },
    #[error("snapshot has {got} cells, expected {expected}")]
    SizeMismatch { got: usize, expected: usize },
    #[error("delta received before any snapshot")]
    NoSnapshot,
}

// ============================================================================
// DELTA
// ============================================================================

#[inline]
fn marker(dead_count: u32) -> u32 {
    dead_count << 1
}

pub fn encode_delta(grid: &Grid) -> Vec<u32> {
    let mut data = Vec::new();
    for y in 0..grid.height() {
        let mut dead_count = 0u32;
        for &cell in grid.row(y) {
            if !cell.alive() {
                dead_count += 1;
                continue;
            }
            if dead_count > 0 {
                data.push(marker(dead_count));
                dead_count = 0;
            }
            data.push(cell.raw());
        }
        data.push(marker(dead_count));
    }
    data
}

pub fn decode_delta(data: &[u32], width: usize, height: usize) -> Result<Grid, CodecError> {
    let expected = width * height;
    let mut cells = Vec::with_capacity(expected);

    for &value in data {
        if value & ALIVE_BIT != 0 {
            if cells.len() >= expected {
                return Err(CodecError::Overrun { expected });
            }
            cells.push(Cell::from_raw(value));
        } else {
            let run = (value >> 1) as usize;
            if cells.len() + run > expected {
                return Err(CodecError::Overrun { expected });
            }
            cells.resize(cells.len() + run, Cell::DEAD);
        }
    }

    if cells.len() < expected {
        return Err(CodecError::Underrun { decoded: cells.len(), expected });
    }
    Grid::from_cells(width, height, cells)
        .ok_or(CodecError::SizeMismatch { got: expected, expected })
}

// ============================================================================
// SNAPSHOT
// ============================================================================

pub fn encode_snapshot(grid: &Grid) -> Vec<u32> {
    grid.cells().iter().map(|c| c.raw()).collect()
}

pub fn decode_snapshot(data: &[u32], width: usize, height: usize) -> Result<Grid, CodecError> {
    let cells: Vec<Cell> = data.iter().copied().map(Cell::from_raw).collect();
    let got = cells.len();
    Grid::from_cells(width, height, cells)
        .ok_or(CodecError::SizeMismatch { got, expected: width * height })
}

// ============================================================================
// REPLICA
// ============================================================================

/// Observer-side copy of the world, rebuilt from snapshot + delta messages.
#[derive(Clone, Debug, Default)]
pub struct Replica {
    grid: Option<Grid>,
    tick: u64,
    paused: bool,
}

impl Replica {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn apply_snapshot(&mut self, snapshot: &WorldSnapshot) -> Result<(), CodecError> {
        let (width, height) = (snapshot.width as usize, snapshot.height as usize);
        let grid = decode_snapshot(&snapshot.data, width, height)?;
        self.grid = Some(grid);
        self.tick = snapshot.tick;
        Ok(())
    }

    /// A failed delta leaves the replica untouched.
    pub fn apply_delta(&mut self, delta: &WorldData) -> Result<(), CodecError> {
        let current = self.grid.as_ref().ok_or(CodecError::NoSnapshot)?;
        let next = decode_delta(&delta.data, current.width(), current.height())?;
        self.grid = Some(next);
        self.tick = delta.tick;
        self.paused = delta.paused;
        Ok(())
    }

    /// Applies world messages; returns `false` for any other kind.
    pub fn apply(&mut self, message: &Message) -> Result<bool, CodecError> {
        match message {
            Message::WorldSnapshot(snapshot) => self.apply_snapshot(snapshot).map(|_| true),
            Message::WorldData(delta) => self.apply_delta(delta).map(|_| true),
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn alive(color: u32) -> Cell {
        Cell::new_alive(color)
    }

    #[test]
    fn test_encode_all_dead_rows() {
        let grid = Grid::new(5, 2);
        assert_eq!(encode_delta(&grid), vec![10, 10]);
    }

    #[test]
    fn test_encode_mixed_row() {
        let mut grid = Grid::new(6, 1);
        grid.set(0, 2, alive(0xAA00_0000));
        grid.set(0, 3, alive(0xBB00_0000));
        grid.set(0, 5, alive(0));
        assert_eq!(
            encode_delta(&grid),
            vec![4, 0xAA00_00FF, 0xBB00_00FF, 2, 0x0000_00FF, 0]
        );
    }

    #[test]
    fn test_round_trip_all_dead() {
        let grid = Grid::new(17, 9);
        let data = encode_delta(&grid);
        assert_eq!(decode_delta(&data, 17, 9).unwrap(), grid);
    }

    #[test]
    fn test_round_trip_all_alive() {
        let mut grid = Grid::new(8, 8);
        for y in 0..8 {
            for x in 0..8 {
                grid.set(y, x, alive(((y * 8 + x) as u32) << 8));
            }
        }
        let data = encode_delta(&grid);
        // every literal plus one zero marker per row
        assert_eq!(data.len(), 64 + 8);
        assert_eq!(decode_delta(&data, 8, 8).unwrap(), grid);
    }

    #[test]
    fn test_round_trip_random_sparse() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
        let (w, h) = (64, 48);
        let mut grid = Grid::new(w, h);
        for y in 0..h {
            for x in 0..w {
                if rng.gen_bool(0.1) {
                    let raw = rng.gen::<u32>() | 1;
                    grid.set(y, x, Cell::from_raw(raw));
                }
            }
        }
        let data = encode_delta(&grid);
        assert!(data.len() < w * h);
        assert_eq!(decode_delta(&data, w, h).unwrap(), grid);
    }

    #[test]
    fn test_decode_overrun_and_underrun() {
        assert_eq!(decode_delta(&[8], 2, 2), Ok(Grid::new(2, 2)));
        assert_eq!(decode_delta(&[10], 2, 2), Err(CodecError::Overrun { expected: 4 }));
        assert_eq!(
            decode_delta(&[4], 2, 2),
            Err(CodecError::Underrun { decoded: 2, expected: 4 })
        );
        assert_eq!(
            decode_delta(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF], 2, 2),
            Err(CodecError::Overrun { expected: 4 })
        );
    }

    #[test]
    fn test_snapshot_is_raw() {
        let mut grid = Grid::new(3, 2);
        grid.set(1, 2, alive(0x0102_0300));
        let data = encode_snapshot(&grid);
        assert_eq!(data, vec![0, 0, 0, 0, 0, 0x0102_03FF]);
        assert_eq!(decode_snapshot(&data, 3, 2).unwrap(), grid);
        assert_eq!(
            decode_snapshot(&data, 2, 2),
            Err(CodecError::SizeMismatch { got: 6, expected: 4 })
        );
    }

    #[test]
    fn test_replica_requires_snapshot_first() {
        let mut replica = Replica::new();
        let delta = WorldData { data: vec![4, 4], tick: 3, paused: false };
        assert_eq!(replica.apply_delta(&delta), Err(CodecError::NoSnapshot));

        let snapshot = WorldSnapshot { data: vec![0; 4], tick: 2, width: 2, height: 2 };
        assert_eq!(replica.apply(&Message::WorldSnapshot(snapshot)), Ok(true));
        assert_eq!(replica.tick(), 2);

        let mut with_cell = Grid::new(2, 2);
        with_cell.set(1, 1, alive(0));
        let delta = WorldData { data: encode_delta(&with_cell), tick: 3, paused: true };
        assert_eq!(replica.apply(&Message::WorldData(delta)), Ok(true));
        assert_eq!(replica.grid(), Some(&with_cell));
        assert_eq!(replica.tick(), 3);
        assert!(replica.paused());
    }

    #[test]
    fn test_replica_keeps_state_on_bad_delta() {
        let mut replica = Replica::new();
        let snapshot = WorldSnapshot { data: vec![0xFF, 0, 0, 0], tick: 1, width: 2, height: 2 };
        replica.apply_snapshot(&snapshot).unwrap();
        let before = replica.grid().cloned();

        let bad = WorldData { data: vec![100], tick: 2, paused: false };
        assert!(replica.apply_delta(&bad).is_err());
        assert_eq!(replica.grid().cloned(), before);
        assert_eq!(replica.tick(), 1);
    }
}
