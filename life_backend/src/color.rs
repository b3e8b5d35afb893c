//! Colour synthesis for surviving and newborn cells.
//!
//! Contributor slices come from `neighborhood::contributors`, so they are
//! always in clockwise order starting at N.

use arrayvec::ArrayVec;

use crate::cell::{Cell, Rgb};

/// Birth blend weights for the 2nd and 3rd contributor.
const BIRTH_WEIGHTS: [f32; 2] = [0.5, 0.333];

// ============================================================================
// BLENDING
// ============================================================================

#[inline]
pub fn blend_channel(a: u8, b: u8, weight: f32) -> u8 {
    (a as f32 * (1.0 - weight) + b as f32 * weight) as u8
}

#[inline]
pub fn blend(a: Rgb, b: Rgb, weight: f32) -> Rgb {
    Rgb {
        r: blend_channel(a.r, b.r, weight),
        g: blend_channel(a.g, b.g, weight),
        b: blend_channel(a.b, b.b, weight),
    }
}

// ============================================================================
// SURVIVAL
// ============================================================================

/// Vitality drops by 2 per generation and bottoms out at 1 or 2.
#[inline]
pub fn decay(cell: Cell) -> Cell {
    match cell.vitality() {
        1 | 2 => cell,
        _ => Cell::from_raw(cell.raw() - 2),
    }
}

/// Running average of the contributors' colours; the k-th one is folded in
/// with weight 1/k. Vitality byte is kept from `old`.
pub fn survivor_blend(old: Cell, contributors: &[Cell]) -> Cell {
    let mut colors = contributors.iter().map(|c| c.rgb());
    let Some(first) = colors.next() else {
        return old;
    };
    let mixed = colors
        .zip(2u16..)
        .fold(first, |acc, (rgb, k)| blend(acc, rgb, 1.0 / f32::from(k)));
    old.with_rgb(mixed)
}

pub fn survivor(old: Cell, contributors: &[Cell], blend_colors: bool) -> Cell {
    if blend_colors {
        survivor_blend(old, contributors)
    } else {
        decay(old)
    }
}

// ============================================================================
// BIRTH
// ============================================================================

pub fn newborn_blend(contributors: &[Cell]) -> Cell {
    let mut colors = contributors.iter().map(|c| c.rgb());
    let first = colors.next().unwrap_or_default();
    let mixed = colors.zip(2usize..).fold(first, |acc, (rgb, k)| {
        let weight = BIRTH_WEIGHTS
            .get(k - 2)
            .copied()
            .unwrap_or(1.0 / k as f32);
        blend(acc, rgb, weight)
    });
    Cell::new_alive(mixed.to_bits())
}

/// First colour held by at least two contributors, otherwise the last one
/// visited. The fallback is an ordering artefact, kept as is so observers
/// see the same colours as before.
pub fn newborn_majority(contributors: &[Cell]) -> Cell {
    let colors: ArrayVec<u32, 8> = contributors.iter().map(|c| c.color()).collect();
    let winner = colors
        .iter()
        .find(|&&color| colors.iter().filter(|&&other| other == color).count() >= 2)
        .or_else(|| colors.last())
        .copied()
        .unwrap_or(0);
    Cell::new_alive(winner)
}

pub fn newborn(contributors: &[Cell], blend_colors: bool) -> Cell {
    if blend_colors {
        newborn_blend(contributors)
    } else {
        newborn_majority(contributors)
    }
}
