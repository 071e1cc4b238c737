//! Mimetic horizontal operators on the polygonal C-grid.
//!
//! Each operator is a lightweight functor bound at construction to one
//! mesh's connectivity, sign, and metric arrays; application is pure and
//! O(stencil width). Fields are flattened `[element * n_layers + layer]`
//! over the owning element kind, and consumers keep sentinel-slot values at
//! zero so halo-truncated stencils contribute nothing.
//!
//! The discrete operators satisfy the usual mimetic identities on a closed
//! mesh: the area-weighted divergence of any edge field sums to zero (every
//! edge appears twice with opposite outward signs), and likewise the
//! triangle-area-weighted curl (every edge is the tangent head at exactly
//! one endpoint). These are the invariants the operator tests pin down.
//!
//! - Divergence(c)  = (1/A_c) Σ_e  sign(e,c) u(e) dv(e)
//! - Gradient(e)    = (f(c₂) - f(c₁)) / dc(e)
//! - Curl(v)        = (1/A_v) Σ_e  sign(e,v) u(e) dc(e)
//! - TangentialRecon(e) = Σ_s w(e,s) u(eoe(e,s))

use crate::mesh::LocalMesh;

/// Divergence of an edge-normal field at cell centers.
#[derive(Clone, Copy)]
pub struct DivergenceOnCell<'a> {
    mesh: &'a LocalMesh,
}

impl<'a> DivergenceOnCell<'a> {
    pub fn new(mesh: &'a LocalMesh) -> Self {
        Self { mesh }
    }

    /// Divergence at cell `c`, layer `k`, of the flattened edge field.
    #[inline]
    pub fn apply(&self, c: usize, k: usize, n_layers: usize, edge_field: &[f64]) -> f64 {
        let mesh = self.mesh;
        let mut sum = 0.0;
        for (e, sign) in mesh.cell_edges(c) {
            sum += sign * edge_field[e * n_layers + k] * mesh.dv_edge[e];
        }
        sum / mesh.area_cell[c]
    }
}

/// Normal gradient of a cell field at edges.
#[derive(Clone, Copy)]
pub struct GradientOnEdge<'a> {
    mesh: &'a LocalMesh,
}

impl<'a> GradientOnEdge<'a> {
    pub fn new(mesh: &'a LocalMesh) -> Self {
        Self { mesh }
    }

    /// Gradient along the edge normal (which runs from the first listed
    /// cell to the second) at edge `e`, layer `k`.
    #[inline]
    pub fn apply(&self, e: usize, k: usize, n_layers: usize, cell_field: &[f64]) -> f64 {
        let mesh = self.mesh;
        let c1 = mesh.cells_on_edge[e * 2];
        let c2 = mesh.cells_on_edge[e * 2 + 1];
        (cell_field[c2 * n_layers + k] - cell_field[c1 * n_layers + k]) / mesh.dc_edge[e]
    }
}

/// Curl (relative vorticity) of an edge-normal field at vertices.
#[derive(Clone, Copy)]
pub struct CurlOnVertex<'a> {
    mesh: &'a LocalMesh,
}

impl<'a> CurlOnVertex<'a> {
    pub fn new(mesh: &'a LocalMesh) -> Self {
        Self { mesh }
    }

    /// Circulation around vertex `v` divided by its dual-triangle area.
    #[inline]
    pub fn apply(&self, v: usize, k: usize, n_layers: usize, edge_field: &[f64]) -> f64 {
        let mesh = self.mesh;
        let mut sum = 0.0;
        for (e, sign) in mesh.vertex_edges(v) {
            sum += sign * edge_field[e * n_layers + k] * mesh.dc_edge[e];
        }
        sum / mesh.area_triangle[v]
    }
}

/// Tangential velocity reconstructed from neighboring edge normals.
#[derive(Clone, Copy)]
pub struct TangentialReconOnEdge<'a> {
    mesh: &'a LocalMesh,
}

impl<'a> TangentialReconOnEdge<'a> {
    pub fn new(mesh: &'a LocalMesh) -> Self {
        Self { mesh }
    }

    /// Weighted sum of the normal components on the edges of `e`'s two
    /// adjoining cells, mapped onto the tangent at `e`.
    #[inline]
    pub fn apply(&self, e: usize, k: usize, n_layers: usize, edge_field: &[f64]) -> f64 {
        let mesh = self.mesh;
        let meoe = mesh.max_edges_on_edge;
        let mut sum = 0.0;
        for s in 0..mesh.n_edges_on_edge[e] {
            let eoe = mesh.edges_on_edge[e * meoe + s];
            sum += mesh.weights_on_edge[e * meoe + s] * edge_field[eoe * n_layers + k];
        }
        sum
    }
}
