//! One generation step: tile workers for the interior, one worker for the ring.
//!
//! The write buffer is carved into non-overlapping mutable slices before any
//! worker starts, so the workers need no locking. Every worker reads only
//! from the previous generation.

use tracing::trace;

use crate::cell::Cell;
use crate::color;
use crate::grid::Grid;
use crate::neighborhood::{self, Edge};
use crate::rules::RuleTable;

// ============================================================================
// PARTITIONING
// ============================================================================

/// Band boundaries over `[1, extent - 1)`: `workers_sqrt + 1` monotonic values.
/// Empty bands occur when the grid is narrower than the fan-out.
pub(crate) fn bands(extent: usize, workers_sqrt: usize) -> Vec<usize> {
    let inner_end = extent.saturating_sub(1).max(1);
    let step = extent / workers_sqrt;

    let mut bounds = Vec::with_capacity(workers_sqrt + 1);
    bounds.push(1);
    for i in 1..workers_sqrt {
        bounds.push((step * i).clamp(1, inner_end));
    }
    bounds.push(inner_end);
    bounds
}

/// Rectangular slab of interior cells. `rows[r]` holds `y0 + r`, starting at `x0`.
pub(crate) struct TileJob<'a> {
    y0: usize,
    x0: usize,
    rows: Vec<&'a mut [Cell]>,
}

/// The outer ring. Corners belong to `top` and `bottom`.
pub(crate) struct PerimeterJob<'a> {
    top: &'a mut [Cell],
    bottom: &'a mut [Cell],
    left: Vec<&'a mut Cell>,
    right: Vec<&'a mut Cell>,
}

/// Splits a `width x height` buffer (both >= 2) into `workers_sqrt²` tiles and the ring.
pub(crate) fn partition(
    buffer: &mut [Cell],
    width: usize,
    height: usize,
    workers_sqrt: usize,
) -> (Vec<TileJob<'_>>, PerimeterJob<'_>) {
    let ys = bands(height, workers_sqrt);
    let xs = bands(width, workers_sqrt);

    let mut tiles: Vec<TileJob<'_>> = (0..workers_sqrt * workers_sqrt)
        .map(|t| TileJob {
            y0: ys[t / workers_sqrt],
            x0: xs[t % workers_sqrt],
            rows: Vec::new(),
        })
        .collect();

    let (top, rest) = buffer.split_at_mut(width);
    let (interior, bottom) = rest.split_at_mut(rest.len() - width);

    let mut left = Vec::with_capacity(height - 2);
    let mut right = Vec::with_capacity(height - 2);

    for (r, row) in interior.chunks_exact_mut(width).enumerate() {
        let y = r + 1;
        let band = ys[1..].partition_point(|&bound| bound <= y);

        let Some((first, rest)) = row.split_first_mut() else {
            continue;
        };
        let Some((last, mut middle)) = rest.split_last_mut() else {
            continue;
        };
        left.push(first);
        right.push(last);

        for xb in 0..workers_sqrt {
            let len = xs[xb + 1] - xs[xb];
            let remaining = std::mem::take(&mut middle);
            let (segment, tail) = remaining.split_at_mut(len);
            tiles[band * workers_sqrt + xb].rows.push(segment);
            middle = tail;
        }
    }

    (tiles, PerimeterJob { top, bottom, left, right })
}

// ============================================================================
// WORKERS
// ============================================================================

#[inline]
fn next_cell(
    current: &Grid,
    rules: &RuleTable,
    y: usize,
    x: usize,
    mask: u8,
    blend_colors: bool,
) -> Cell {
    let cell = current.get(y, x);
    if cell.alive() {
        if !rules.survives(mask) {
            return Cell::DEAD;
        }
        if blend_colors {
            color::survivor_blend(cell, &neighborhood::contributors(current, y, x, mask))
        } else {
            color::decay(cell)
        }
    } else if rules.is_born(mask) {
        color::newborn(&neighborhood::contributors(current, y, x, mask), blend_colors)
    } else {
        Cell::DEAD
    }
}

impl TileJob<'_> {
    fn run(self, current: &Grid, rules: &RuleTable, blend_colors: bool) {
        for (r, row) in self.rows.into_iter().enumerate() {
            let y = self.y0 + r;
            for (c, out) in row.iter_mut().enumerate() {
                let x = self.x0 + c;
                let mask = neighborhood::interior_mask(current, y, x);
                *out = next_cell(current, rules, y, x, mask, blend_colors);
            }
        }
    }
}

impl PerimeterJob<'_> {
    fn run(self, current: &Grid, rules: &RuleTable, blend_colors: bool) {
        let width = current.width();
        let last_x = width - 1;
        let last_y = current.height() - 1;

        let step = |y: usize, x: usize, edge: Edge| {
            let mask = neighborhood::perimeter_mask(current, edge, y, x);
            next_cell(current, rules, y, x, mask, blend_colors)
        };

        for (x, out) in self.top.iter_mut().enumerate() {
            let edge = match x {
                0 => Edge::NW,
                x if x == last_x => Edge::NE,
                _ => Edge::N,
            };
            *out = step(0, x, edge);
        }
        for (x, out) in self.bottom.iter_mut().enumerate() {
            let edge = match x {
                0 => Edge::SW,
                x if x == last_x => Edge::SE,
                _ => Edge::S,
            };
            *out = step(last_y, x, edge);
        }
        for (r, out) in self.left.into_iter().enumerate() {
            *out = step(r + 1, 0, Edge::W);
        }
        for (r, out) in self.right.into_iter().enumerate() {
            *out = step(r + 1, last_x, Edge::E);
        }
    }
}

/// Fan-out actually used: at least 1, at most one band per interior row/column.
pub(crate) fn effective_fan_out(width: usize, height: usize, workers_sqrt: usize) -> usize {
    let interior = width.min(height).saturating_sub(2).max(1);
    workers_sqrt.clamp(1, interior)
}

/// Computes the generation after `current` into `buffer`.
/// Spawns `ws² + 1` workers, `ws` being `workers_sqrt` clamped to the
/// interior extent, and returns once all of them finished.
pub fn advance(
    current: &Grid,
    buffer: &mut Grid,
    rules: &RuleTable,
    workers_sqrt: usize,
    blend_colors: bool,
) {
    let width = current.width();
    let height = current.height();
    let workers_sqrt = effective_fan_out(width, height, workers_sqrt);

    let (tiles, perimeter) = partition(buffer.cells_mut(), width, height, workers_sqrt);
    trace!(tiles = tiles.len(), "spawning tick workers");

    rayon::scope(|s| {
        s.spawn(move |_| perimeter.run(current, rules, blend_colors));
        for tile in tiles {
            s.spawn(move |_| tile.run(current, rules, blend_colors));
        }
    });
}
