//! The simulated world: a double-buffered grid pair plus the generation counter.

use thiserror::Error;
use tracing::info;

use crate::cell::Cell;
use crate::codec;
use crate::grid::Grid;
use crate::message::{WorldData, WorldSnapshot};
use crate::pattern::Pattern;
use crate::rules::RuleTable;
use crate::scheduler;

/// Largest accepted side; keeps `dead_count << 1` markers inside a u32.
pub const MAX_DIMENSION: u32 = 1 << 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorldError {
    #[error(
        "world must be between 2x2 and {max}x{max}, got {width}x{height}",
        max = MAX_DIMENSION
    )]
    InvalidDimensions { width: u32, height: u32 },
    #[error("({x}, {y}) is outside the {width}x{height} world")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },
    #[error(
        "pattern `{name}` ({pattern_width}x{pattern_height}) at ({x}, {y}) \
         does not fit the {width}x{height} world"
    )]
    PatternOutOfBounds {
        name: String,
        x: u32,
        y: u32,
        pattern_width: usize,
        pattern_height: usize,
        width: u32,
        height: u32,
    },
}

pub struct World {
    width: u32,
    height: u32,
    current: Grid,
    buffer: Grid,
    rules: RuleTable,
    tick: u64,
}

impl World {
    pub fn new(width: u32, height: u32) -> Result<Self, WorldError> {
        let valid = |d: u32| (2..=MAX_DIMENSION).contains(&d);
        if !valid(width) || !valid(height) {
            return Err(WorldError::InvalidDimensions { width, height });
        }

        info!(width, height, "world created");
        Ok(World {
            width,
            height,
            current: Grid::new(width as usize, height as usize),
            buffer: Grid::new(width as usize, height as usize),
            rules: RuleTable::conway(),
            tick: 0,
        })
    }

    #[inline] pub fn width(&self) -> u32  { self.width }
    #[inline] pub fn height(&self) -> u32 { self.height }
    #[inline] pub fn tick(&self) -> u64   { self.tick }

    /// The generation observers currently see.
    pub fn grid(&self) -> &Grid {
        &self.current
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn cell(&self, x: u32, y: u32) -> Option<Cell> {
        self.current.try_get(y as usize, x as usize)
    }

    // ========================================================================
    // GENERATIONS
    // ========================================================================

    /// Advances one generation using `workers_sqrt² + 1` workers (fan-out
    /// clamped to the interior extent), then swaps buffers. The result does
    /// not depend on `workers_sqrt`.
    pub fn step(&mut self, workers_sqrt: u32, blend_colors: bool) {
        scheduler::advance(
            &self.current,
            &mut self.buffer,
            &self.rules,
            workers_sqrt as usize,
            blend_colors,
        );
        std::mem::swap(&mut self.current, &mut self.buffer);
        self.tick += 1;
    }

    // ========================================================================
    // EDITS
    // ========================================================================

    /// Sets one cell alive with `color` and full vitality.
    pub fn mark_alive(&mut self, x: u32, y: u32, color: u32) -> Result<(), WorldError> {
        if x >= self.width || y >= self.height {
            return Err(WorldError::OutOfBounds { x, y, width: self.width, height: self.height });
        }
        self.current.set(y as usize, x as usize, Cell::new_alive(color));
        Ok(())
    }

    /// Stamps the pattern's alive cells with its top-left corner at `(x, y)`.
    /// Dead pattern cells leave the grid as it was. Nothing is written if the
    /// pattern does not fit.
    pub fn place_pattern(
        &mut self,
        pattern: &Pattern,
        x: u32,
        y: u32,
        color: u32,
    ) -> Result<(), WorldError> {
        let fits = (x as usize) + pattern.width() <= self.width as usize
            && (y as usize) + pattern.height() <= self.height as usize;
        if !fits {
            return Err(WorldError::PatternOutOfBounds {
                name: pattern.name().to_string(),
                x,
                y,
                pattern_width: pattern.width(),
                pattern_height: pattern.height(),
                width: self.width,
                height: self.height,
            });
        }

        let cell = Cell::new_alive(color);
        for (py, px) in pattern.alive_cells() {
            self.current.set(y as usize + py, x as usize + px, cell);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.current.clear();
    }

    // ========================================================================
    // WIRE
    // ========================================================================

    pub fn delta(&self, paused: bool) -> WorldData {
        WorldData {
            data: codec::encode_delta(&self.current),
            tick: self.tick,
            paused,
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            data: codec::encode_snapshot(&self.current),
            tick: self.tick,
            width: self.width,
            height: self.height,
        }
    }
}
