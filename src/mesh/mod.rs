//! Horizontal mesh representation.
//!
//! Two layers:
//! - [`GlobalMesh`]: the full-domain connectivity and geometry as read from a
//!   mesh file (or built by a generator), indexed by global ids.
//! - [`LocalMesh`]: one rank's view after decomposition — owned + halo
//!   entities in local order, localized connectivity with a sentinel padding
//!   slot, and the derived sign/weight arrays the operators bind to.
//!
//! The mesh follows the usual C-grid staggering on polygonal cells: scalars
//! live at cell centers, the normal velocity component lives at edges, and
//! vorticity lives at the dual-mesh vertices.

mod global;
mod local;

pub use global::GlobalMesh;
pub use local::LocalMesh;
