//! Vertical coordinate: active-layer bounds and per-column integrals.
//!
//! Bottom topography gives every column its own inclusive active-layer range
//! `[MinLayerCell, MaxLayerCell]`; edges and vertices carry Top/Bot bound
//! variants reduced from their adjoining cells (`Top` = min-reduce, `Bot` =
//! max-reduce, dry cells never winning). On top of the bounds sit four pure
//! per-column computations, each a sweep over cells with an inner scan whose
//! length varies per column:
//!
//! - pressure: top-down prefix sum of `g ρ₀ h`, seeded by surface pressure,
//! - z height: bottom-up prefix sum of `ρ₀ α h`, seeded by `-bottomDepth`,
//! - geopotential: pointwise `g zMid + tidal + SAL`,
//! - target thickness: reference profile plus the pressure-derived column
//!   residual redistributed by the configured movement weights.

mod bounds;
mod coord;

pub use coord::{MovementProfile, VerticalCoord};
