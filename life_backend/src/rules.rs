//! Survive/born lookup tables keyed by the 8-bit neighbour mask.

/// Both tables are computed once per world and never change afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleTable {
    survive: [bool; 256],
    born: [bool; 256],
}

impl RuleTable {
    /// B3/S23.
    pub fn conway() -> Self {
        Self::from_counts(&[2, 3], &[3])
    }

    fn from_counts(survive_counts: &[u32], born_counts: &[u32]) -> Self {
        let mut survive = [false; 256];
        let mut born = [false; 256];
        for mask in 0..=u8::MAX {
            let neighbors = mask.count_ones();
            survive[mask as usize] = survive_counts.contains(&neighbors);
            born[mask as usize] = born_counts.contains(&neighbors);
        }
        RuleTable { survive, born }
    }

    #[inline]
    pub fn survives(&self, mask: u8) -> bool {
        self.survive[mask as usize]
    }

    #[inline]
    pub fn is_born(&self, mask: u8) -> bool {
        self.born[mask as usize]
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::conway()
    }
}
