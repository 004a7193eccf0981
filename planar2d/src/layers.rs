//! Pairwise layer-interaction table used to derive collision filters.
//!
//! # Model
//! - There are [`LAYER_COUNT`] layers, addressed by index `0..32`.
//! - Each row of the table is a `u32` bitmask of the layers that row ignores.
//! - The table is kept symmetric: ignoring `(a, b)` also ignores `(b, a)`.
//!
//! The table is passed explicitly into baking rather than read from global state,
//! so filter derivation stays a pure function of its inputs.

use crate::constants::LAYER_COUNT;

/// Index of a collision layer.
pub type Layer = u8;

/// 32x32 symmetric "ignore collision" table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerCollisionMatrix {
    ignored: [u32; LAYER_COUNT],
}

impl LayerCollisionMatrix {
    /// Table in which every layer collides with every other layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `layer` addresses one of the [`LAYER_COUNT`] layers.
    #[inline]
    pub fn is_valid_layer(layer: Layer) -> bool {
        usize::from(layer) < LAYER_COUNT
    }

    /// Mark the pair `(a, b)` as ignored (or not). Out-of-range layers are a no-op.
    pub fn set_ignore(&mut self, a: Layer, b: Layer, ignore: bool) {
        if !Self::is_valid_layer(a) || !Self::is_valid_layer(b) {
            return;
        }

        let (ai, bi) = (usize::from(a), usize::from(b));
        if ignore {
            self.ignored[ai] |= 1 << b;
            self.ignored[bi] |= 1 << a;
        } else {
            self.ignored[ai] &= !(1 << b);
            self.ignored[bi] &= !(1 << a);
        }
    }

    /// Builder-style [`Self::set_ignore`] with `ignore = true`.
    pub fn with_ignored(mut self, a: Layer, b: Layer) -> Self {
        self.set_ignore(a, b, true);
        self
    }

    /// Is the pair `(a, b)` ignored? Out-of-range layers are never ignored.
    #[inline]
    pub fn is_ignored(&self, a: Layer, b: Layer) -> bool {
        Self::is_valid_layer(a)
            && Self::is_valid_layer(b)
            && self.ignored[usize::from(a)] & (1 << b) != 0
    }

    /// Bitmask of every layer that `layer` is allowed to collide with.
    pub fn collides_with_mask(&self, layer: Layer) -> u32 {
        (0..LAYER_COUNT as Layer)
            .filter(|&other| !self.is_ignored(layer, other))
            .fold(0u32, |mask, other| mask | (1 << other))
    }
}
