//! Normal-velocity equation terms.
//!
//! All edge terms accumulate over the Top active range (both adjoining
//! cells wet); surface and bottom stresses touch only the first and last
//! layer of that range.

use crate::aux::AuxiliaryState;
use crate::mesh::LocalMesh;
use crate::operators::TangentialReconOnEdge;
use crate::types::constants::{GRAVITY, RHO0};
use crate::types::layer::active_range;
use crate::vertical::VerticalCoord;

#[inline]
fn edge_range(coord: &VerticalCoord, e: usize) -> std::ops::Range<usize> {
    active_range(coord.min_layer_edge_top[e], coord.max_layer_edge_top[e])
}

/// Potential-vorticity advection: the nonlinear Coriolis/vorticity flux
/// `q (h u)⊥` reconstructed through the edge interpolation weights, with
/// `q` averaged between the edge and each contributing neighbor.
pub(super) fn pv_advection(
    tendency: &mut [f64],
    mesh: &LocalMesh,
    coord: &VerticalCoord,
    aux: &AuxiliaryState,
    normal_velocity: &[f64],
) {
    let nl = mesh.n_layers;
    let meoe = mesh.max_edges_on_edge;
    let h_flux = &aux.layer_thickness.flux_layer_thick_edge;
    let q_rel = &aux.vorticity.norm_rel_vort_edge;
    let q_pl = &aux.vorticity.norm_planetary_vort_edge;
    for e in 0..mesh.n_edges_all {
        for k in edge_range(coord, e) {
            let q_e = q_rel[e * nl + k] + q_pl[e * nl + k];
            let mut flux = 0.0;
            for s in 0..mesh.n_edges_on_edge[e] {
                let eoe = mesh.edges_on_edge[e * meoe + s];
                let q_n = q_rel[eoe * nl + k] + q_pl[eoe * nl + k];
                flux += mesh.weights_on_edge[e * meoe + s]
                    * h_flux[eoe * nl + k]
                    * normal_velocity[eoe * nl + k]
                    * 0.5
                    * (q_e + q_n);
            }
            tendency[e * nl + k] += flux;
        }
    }
}

/// `-∇ KE`: gradient of kinetic energy along the edge normal.
pub(super) fn ke_gradient(
    tendency: &mut [f64],
    mesh: &LocalMesh,
    coord: &VerticalCoord,
    aux: &AuxiliaryState,
) {
    let nl = mesh.n_layers;
    let ke = &aux.kinetic.kinetic_energy_cell;
    for e in 0..mesh.n_edges_all {
        let c1 = mesh.cells_on_edge[e * 2];
        let c2 = mesh.cells_on_edge[e * 2 + 1];
        let inv_dc = 1.0 / mesh.dc_edge[e];
        for k in edge_range(coord, e) {
            tendency[e * nl + k] -= (ke[c2 * nl + k] - ke[c1 * nl + k]) * inv_dc;
        }
    }
}

/// `-g ∇η`: gradient of sea surface height, `η = Σ h - bottomDepth`.
pub(super) fn ssh_gradient(
    tendency: &mut [f64],
    mesh: &LocalMesh,
    coord: &VerticalCoord,
    layer_thickness: &[f64],
) {
    let nl = mesh.n_layers;
    let mut ssh = vec![0.0; mesh.n_cells_size];
    for c in 0..mesh.n_cells_all {
        let column: f64 = coord.cell_range(c).map(|k| layer_thickness[c * nl + k]).sum();
        ssh[c] = column - mesh.bottom_depth[c];
    }
    for e in 0..mesh.n_edges_all {
        let c1 = mesh.cells_on_edge[e * 2];
        let c2 = mesh.cells_on_edge[e * 2 + 1];
        let grad = GRAVITY * (ssh[c2] - ssh[c1]) / mesh.dc_edge[e];
        for k in edge_range(coord, e) {
            tendency[e * nl + k] -= grad;
        }
    }
}

/// `+ν₂ ∇²u`: harmonic momentum diffusion.
pub(super) fn diffusion(
    tendency: &mut [f64],
    mesh: &LocalMesh,
    coord: &VerticalCoord,
    aux: &AuxiliaryState,
    visc_del2: f64,
) {
    let nl = mesh.n_layers;
    let del2 = &aux.del2.del2_edge;
    for e in 0..mesh.n_edges_all {
        for k in edge_range(coord, e) {
            tendency[e * nl + k] += visc_del2 * del2[e * nl + k];
        }
    }
}

/// `-ν₄ ∇⁴u`: biharmonic momentum dissipation, assembled from the
/// divergence and curl of the Laplacian.
pub(super) fn hyper_diffusion(
    tendency: &mut [f64],
    mesh: &LocalMesh,
    coord: &VerticalCoord,
    aux: &AuxiliaryState,
    visc_del4: f64,
) {
    let nl = mesh.n_layers;
    let d2_div = &aux.del2.del2_div_cell;
    let d2_vort = &aux.del2.del2_rel_vort_vertex;
    for e in 0..mesh.n_edges_all {
        let c1 = mesh.cells_on_edge[e * 2];
        let c2 = mesh.cells_on_edge[e * 2 + 1];
        let v1 = mesh.vertices_on_edge[e * 2];
        let v2 = mesh.vertices_on_edge[e * 2 + 1];
        let inv_dc = 1.0 / mesh.dc_edge[e];
        let inv_dv = 1.0 / mesh.dv_edge[e];
        for k in edge_range(coord, e) {
            let del4 = (d2_div[c2 * nl + k] - d2_div[c1 * nl + k]) * inv_dc
                - (d2_vort[v2 * nl + k] - d2_vort[v1 * nl + k]) * inv_dv;
            tendency[e * nl + k] -= visc_del4 * del4;
        }
    }
}

/// `τ_n / (ρ₀ h)` applied to the top active layer of each edge.
pub(super) fn wind_forcing(
    tendency: &mut [f64],
    mesh: &LocalMesh,
    coord: &VerticalCoord,
    aux: &AuxiliaryState,
) {
    let nl = mesh.n_layers;
    let stress = &aux.wind.normal_stress_edge;
    let h_edge = &aux.layer_thickness.mean_layer_thick_edge;
    for e in 0..mesh.n_edges_all {
        let range = edge_range(coord, e);
        if range.is_empty() {
            continue;
        }
        let k = range.start;
        let h = h_edge[e * nl + k];
        if h > 0.0 {
            tendency[e * nl + k] += stress[e] / (RHO0 * h);
        }
    }
}

/// Quadratic bottom drag `-C_d |u| u / h` on the bottom active layer. The
/// speed includes the reconstructed tangential component.
pub(super) fn bottom_drag(
    tendency: &mut [f64],
    mesh: &LocalMesh,
    coord: &VerticalCoord,
    aux: &AuxiliaryState,
    normal_velocity: &[f64],
    drag_coeff: f64,
) {
    let nl = mesh.n_layers;
    let recon = TangentialReconOnEdge::new(mesh);
    let h_edge = &aux.layer_thickness.mean_layer_thick_edge;
    for e in 0..mesh.n_edges_all {
        let range = edge_range(coord, e);
        if range.is_empty() {
            continue;
        }
        let k = range.end - 1;
        let h = h_edge[e * nl + k];
        if h <= 0.0 {
            continue;
        }
        let u = normal_velocity[e * nl + k];
        let v = recon.apply(e, k, nl, normal_velocity);
        let speed = (u * u + v * v).sqrt();
        tendency[e * nl + k] -= drag_coeff * speed * u / h;
    }
}

/// Linear Rayleigh drag `-r u` over the whole active range.
pub(super) fn rayleigh_drag(
    tendency: &mut [f64],
    mesh: &LocalMesh,
    coord: &VerticalCoord,
    normal_velocity: &[f64],
    drag_coeff: f64,
) {
    let nl = mesh.n_layers;
    for e in 0..mesh.n_edges_all {
        for k in edge_range(coord, e) {
            tendency[e * nl + k] -= drag_coeff * normal_velocity[e * nl + k];
        }
    }
}
