//! Tracer-equation terms. All operate on thickness-weighted tracers, one
//! tracer-major block at a time.

use crate::aux::AuxiliaryState;
use crate::mesh::LocalMesh;
use crate::vertical::VerticalCoord;

/// `-∇·(h φ u)`: advective flux divergence for tracer block `t`.
pub(super) fn advection(
    tendency: &mut [f64],
    mesh: &LocalMesh,
    coord: &VerticalCoord,
    aux: &AuxiliaryState,
    normal_velocity: &[f64],
    t: usize,
) {
    let nl = mesh.n_layers;
    let edge_extent = mesh.n_edges_size * nl;
    let h_phi = &aux.tracer.h_tracers_edge[t * edge_extent..(t + 1) * edge_extent];
    for c in 0..mesh.n_cells_all {
        let inv_area = 1.0 / mesh.area_cell[c];
        for k in coord.cell_range(c) {
            let mut div = 0.0;
            for (e, sign) in mesh.cell_edges(c) {
                div += sign * h_phi[e * nl + k] * normal_velocity[e * nl + k] * mesh.dv_edge[e];
            }
            tendency[c * nl + k] -= div * inv_area;
        }
    }
}

/// `+κ₂ ∇·(h̄ ∇φ)`: harmonic tracer diffusion for block `t`.
pub(super) fn diffusion(
    tendency: &mut [f64],
    mesh: &LocalMesh,
    coord: &VerticalCoord,
    aux: &AuxiliaryState,
    eddy_diff2: f64,
    t: usize,
) {
    let nl = mesh.n_layers;
    let cell_extent = mesh.n_cells_size * nl;
    let del2 = &aux.tracer.del2_tracers_cell[t * cell_extent..(t + 1) * cell_extent];
    for c in 0..mesh.n_cells_all {
        for k in coord.cell_range(c) {
            tendency[c * nl + k] += eddy_diff2 * del2[c * nl + k];
        }
    }
}

/// `-κ₄ ∇⁴φ`: biharmonic tracer dissipation, the h-weighted Laplacian
/// applied to the already computed tracer Laplacian.
pub(super) fn hyper_diffusion(
    tendency: &mut [f64],
    mesh: &LocalMesh,
    coord: &VerticalCoord,
    aux: &AuxiliaryState,
    eddy_diff4: f64,
    t: usize,
) {
    let nl = mesh.n_layers;
    let cell_extent = mesh.n_cells_size * nl;
    let del2 = &aux.tracer.del2_tracers_cell[t * cell_extent..(t + 1) * cell_extent];
    let h_edge = &aux.layer_thickness.mean_layer_thick_edge;
    for c in 0..mesh.n_cells_all {
        let inv_area = 1.0 / mesh.area_cell[c];
        for k in coord.cell_range(c) {
            let mut sum = 0.0;
            for (e, sign) in mesh.cell_edges(c) {
                let c1 = mesh.cells_on_edge[e * 2];
                let c2 = mesh.cells_on_edge[e * 2 + 1];
                let grad = (del2[c2 * nl + k] - del2[c1 * nl + k]) / mesh.dc_edge[e];
                sum += sign * h_edge[e * nl + k] * grad * mesh.dv_edge[e];
            }
            tendency[c * nl + k] -= eddy_diff4 * sum * inv_area;
        }
    }
}
