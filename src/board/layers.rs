//! Board layer sets
//!
//! Layer ids `0..32` are copper (front to back), the rest are technical
//! layers (mask, silkscreen, ...) that never carry connectivity.

use serde::{Deserialize, Serialize};

/// Number of copper layers a board can have
pub const COPPER_LAYER_COUNT: u8 = 32;

/// Front copper
pub const F_CU: u8 = 0;
/// Back copper
pub const B_CU: u8 = COPPER_LAYER_COUNT - 1;

const COPPER_MASK: u64 = (1u64 << COPPER_LAYER_COUNT) - 1;

/// Set of layer ids, one bit per layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerSet(pub u64);

impl LayerSet {
    pub const EMPTY: LayerSet = LayerSet(0);

    /// Every copper layer
    pub const fn all_copper() -> Self {
        LayerSet(COPPER_MASK)
    }

    pub fn single(layer: u8) -> Self {
        debug_assert!(layer < 64, "layer id out of range: {}", layer);
        LayerSet(1u64 << layer)
    }

    /// Inclusive span between two layers, in either order (via barrels)
    pub fn range(a: u8, b: u8) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        (lo..=hi).fold(LayerSet::EMPTY, |set, l| set | LayerSet::single(l))
    }

    /// Copper part of the set
    pub fn copper(self) -> Self {
        LayerSet(self.0 & COPPER_MASK)
    }

    pub fn has_copper(self) -> bool {
        !self.copper().is_empty()
    }

    pub fn intersects(self, other: LayerSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn contains(self, layer: u8) -> bool {
        layer < 64 && self.0 & (1u64 << layer) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for LayerSet {
    type Output = LayerSet;

    fn bitor(self, rhs: LayerSet) -> LayerSet {
        LayerSet(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for LayerSet {
    fn bitor_assign(&mut self, rhs: LayerSet) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_range() {
        let through = LayerSet::range(B_CU, F_CU);
        assert_eq!(through, LayerSet::all_copper());

        let blind = LayerSet::range(0, 2);
        assert!(blind.contains(1));
        assert!(!blind.contains(3));
    }

    #[test]
    fn test_copper_filter() {
        let mask_only = LayerSet::single(40);
        assert!(!mask_only.has_copper());
        assert!((mask_only | LayerSet::single(F_CU)).has_copper());
        assert!(LayerSet::single(F_CU).intersects(LayerSet::all_copper()));
        assert!(!LayerSet::single(F_CU).intersects(LayerSet::single(B_CU)));
    }
}
