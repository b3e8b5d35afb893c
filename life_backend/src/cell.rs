//! Packed cell encoding shared by the simulation and the wire codec.

// ============================================================================
// CELL ENCODING
// ============================================================================
//
// Each cell is one u32 with three fields packed:
// ┌──────────┬──────────┬──────────┬────────────────────────┐
// │ bits 31-24│ bits 23-16│ bits 15-8│ bits 7-0               │
// │    red    │   green   │   blue   │ vitality (bit 0 alive) │
// └──────────┴──────────┴──────────┴────────────────────────┘

pub const ALIVE_BIT: u32 = 0x0000_0001;
pub const VITALITY_MASK: u32 = 0x0000_00FF;
pub const COLOR_MASK: u32 = 0xFFFF_FF00;

/// Low byte given to every freshly placed or newborn cell.
pub const ALIVE_NEW: u32 = 0x0000_00FF;

/// A single grid cell. `Cell::DEAD` is the only dead value the engine produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cell(u32);

impl Cell {
    pub const DEAD: Cell = Cell(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Cell(raw)
    }

    /// Alive with the given packed colour and full vitality.
    /// The low byte of `color` is ignored.
    #[inline]
    pub const fn new_alive(color: u32) -> Self {
        Cell((color & COLOR_MASK) | ALIVE_NEW)
    }

    #[inline] pub const fn raw(self) -> u32     { self.0 }
    #[inline] pub const fn alive(self) -> bool  { self.0 & ALIVE_BIT != 0 }
    #[inline] pub const fn vitality(self) -> u8 { (self.0 & VITALITY_MASK) as u8 }
    #[inline] pub const fn color(self) -> u32   { self.0 & COLOR_MASK }

    #[inline]
    pub const fn rgb(self) -> Rgb {
        Rgb::from_bits(self.0)
    }

    /// Same vitality byte, different colour.
    #[inline]
    pub const fn with_rgb(self, rgb: Rgb) -> Self {
        Cell(rgb.to_bits() | (self.0 & VITALITY_MASK))
    }
}

impl From<Cell> for u32 {
    fn from(cell: Cell) -> Self {
        cell.0
    }
}

/// Unpacked colour channels of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Rgb {
            r: (bits >> 24) as u8,
            g: (bits >> 16) as u8,
            b: (bits >> 8) as u8,
        }
    }

    /// Packed into bits 8-31, low byte zero.
    #[inline]
    pub const fn to_bits(self) -> u32 {
        ((self.r as u32) << 24) | ((self.g as u32) << 16) | ((self.b as u32) << 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_encoding_specific_values() {
        assert_eq!(Cell::DEAD.raw(), 0);
        assert_eq!(Cell::new_alive(0).raw(), 0xFF);
        assert_eq!(Cell::new_alive(0xAABB_CC00).raw(), 0xAABB_CCFF);
        // low byte of the colour never leaks into vitality
        assert_eq!(Cell::new_alive(0x1122_3344).raw(), 0x1122_33FF);
    }

    #[test]
    fn test_alive_flag_and_vitality() {
        let cell = Cell::from_raw(0x0000_FF05);
        assert!(cell.alive());
        assert_eq!(cell.vitality(), 5);
        assert_eq!(cell.color(), 0x0000_FF00);

        assert!(!Cell::from_raw(0xFFFF_FF00).alive());
    }

    #[test]
    fn test_rgb_byte_layout() {
        let cell = Cell::new_alive(0x1020_3000);
        assert_eq!(cell.rgb(), Rgb::new(0x10, 0x20, 0x30));
        assert_eq!(Rgb::new(0x10, 0x20, 0x30).to_bits(), 0x1020_3000);
    }

    #[test]
    fn test_with_rgb_keeps_vitality() {
        let cell = Cell::from_raw(0xFFFF_FF7B);
        let recoloured = cell.with_rgb(Rgb::new(1, 2, 3));
        assert_eq!(recoloured.raw(), 0x0102_037B);
    }
}
