//! Shared index conventions, sentinel helpers, and physical constants.
//!
//! Every mesh entity kind (cell, edge, vertex) uses the same local index
//! layout on a rank:
//!
//! ```text
//! [0, n_owned)        owned entries, locally authoritative
//! [n_owned, n_all)    halo entries, refreshed by exchange
//! n_all               sentinel slot for absent neighbors
//! ```
//!
//! Connectivity entries that would point outside the local domain (a boundary
//! cell's missing neighbor, or a neighbor beyond the halo) are redirected to
//! the sentinel slot. Field arrays are allocated with `n_size = n_all + 1`
//! entries and keep the sentinel slot zeroed, so stencil sums read it safely
//! and pick up no contribution.
//!
//! Vertical dry-column handling lives in [`layer`]: a column with no active
//! layers carries `MaxLayerCell == DRY_LAYER`, and all min/max neighbor
//! reductions route through that module so a dry column can never win a
//! comparison against a wet one.

pub mod layer;

/// The three disjoint horizontal index spaces of the mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElemKind {
    Cell,
    Edge,
    Vertex,
}

impl std::fmt::Display for ElemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElemKind::Cell => write!(f, "cell"),
            ElemKind::Edge => write!(f, "edge"),
            ElemKind::Vertex => write!(f, "vertex"),
        }
    }
}

/// Marker for an absent neighbor in *global* connectivity arrays.
///
/// Local connectivity never stores this value; absent neighbors are remapped
/// to the rank-local sentinel slot during localization.
pub const INVALID_GLOBAL: usize = usize::MAX;

/// Check whether a global connectivity entry refers to a real entity.
#[inline]
pub fn is_valid_global(id: usize) -> bool {
    id != INVALID_GLOBAL
}

/// Physical constants shared by the vertical coordinate and tendency terms.
pub mod constants {
    /// Gravitational acceleration (m/s²).
    pub const GRAVITY: f64 = 9.80665;

    /// Boussinesq reference density (kg/m³).
    pub const RHO0: f64 = 1026.0;
}
