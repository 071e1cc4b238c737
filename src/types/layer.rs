//! Active-layer bounds and the dry-column sentinel.
//!
//! Each column (cell, edge, or vertex) carries an inclusive active-layer
//! range `[min_layer, max_layer]`. Bottom topography makes the range vary
//! per column; a fully dry column is encoded as `max_layer == DRY_LAYER`.
//!
//! Edge and vertex bounds are reductions over the adjoining cells. The
//! polarity of the sentinel substitution is easy to get backwards, so every
//! reduction in the crate goes through [`min_reduce`]/[`max_reduce`] here.
//! The defining property is: **a dry column never wins a min/max comparison
//! against a wet one**. Dry neighbors therefore contribute `i32::MAX` to min
//! reductions and `i32::MIN` to max reductions, and an all-dry neighborhood
//! collapses back to the dry sentinel.

/// Sentinel `max_layer` value for a column with zero active layers.
pub const DRY_LAYER: i32 = -1;

/// Whether a column with the given `max_layer` bound has any active layers.
#[inline]
pub fn is_wet(max_layer: i32) -> bool {
    max_layer > DRY_LAYER
}

/// The active-layer range of a column as an iterable index range.
///
/// Dry columns (and malformed `min > max` bounds) yield an empty range, so
/// per-column scans skip them with zero iterations.
#[inline]
pub fn active_range(min_layer: i32, max_layer: i32) -> std::ops::Range<usize> {
    if max_layer < min_layer || !is_wet(max_layer) {
        0..0
    } else {
        min_layer.max(0) as usize..(max_layer as usize + 1)
    }
}

/// Running state of a min/max reduction over a column's wet neighbors.
///
/// Seeded with the identity of each reduction; [`finish`](BoundsReduce::finish)
/// maps an untouched accumulator (all neighbors dry) back to the dry sentinel.
#[derive(Clone, Copy, Debug)]
pub struct BoundsReduce {
    min_acc: i32,
    max_acc: i32,
}

impl BoundsReduce {
    pub fn new() -> Self {
        Self {
            min_acc: i32::MAX,
            max_acc: i32::MIN,
        }
    }

    /// Fold one neighbor cell's bounds into the reduction.
    ///
    /// `value` is whichever per-cell bound is being reduced (min or max
    /// layer); `neighbor_max_layer` decides wetness. Dry neighbors are
    /// skipped entirely, which is equivalent to substituting the opposite
    /// extreme in both reductions.
    #[inline]
    pub fn fold(&mut self, value: i32, neighbor_max_layer: i32) {
        if is_wet(neighbor_max_layer) {
            self.min_acc = self.min_acc.min(value);
            self.max_acc = self.max_acc.max(value);
        }
    }

    /// Final (min, max) pair; `(0, DRY_LAYER)` if every neighbor was dry.
    #[inline]
    pub fn finish(self) -> (i32, i32) {
        if self.max_acc == i32::MIN {
            (0, DRY_LAYER)
        } else {
            (self.min_acc, self.max_acc)
        }
    }
}

impl Default for BoundsReduce {
    fn default() -> Self {
        Self::new()
    }
}

/// Min-reduce one per-cell bound over wet neighbors ("Top" variants).
pub fn min_reduce(values: impl IntoIterator<Item = (i32, i32)>) -> i32 {
    let mut r = BoundsReduce::new();
    for (value, max_layer) in values {
        r.fold(value, max_layer);
    }
    r.finish().0
}

/// Max-reduce one per-cell bound over wet neighbors ("Bot" variants).
pub fn max_reduce(values: impl IntoIterator<Item = (i32, i32)>) -> i32 {
    let mut r = BoundsReduce::new();
    for (value, max_layer) in values {
        r.fold(value, max_layer);
    }
    r.finish().1
}
