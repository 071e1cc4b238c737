//! Tracer fields interpolated to edges and their horizontal Laplacian.

use crate::mesh::LocalMesh;
use crate::types::layer::active_range;
use crate::vertical::VerticalCoord;

use super::FluxInterp;

/// Per-tracer edge and Laplacian diagnostics.
///
/// `h_tracers_edge` is the thickness-weighted tracer at edges (the advective
/// flux density `h_e φ_e`); `del2_tracers_cell` is the thickness-weighted
/// horizontal Laplacian `∇·(h̄ ∇φ)` feeding both the del2 diffusion term and,
/// applied twice, the del4 hyperdiffusion term. Both arrays are tracer-major
/// blocks matching the state layout.
#[derive(Clone, Debug)]
pub struct TracerAuxVars {
    pub flux_interp: FluxInterp,
    pub n_tracers: usize,
    /// `[n_tracers * n_edges_size * n_layers]`.
    pub h_tracers_edge: Vec<f64>,
    /// `[n_tracers * n_cells_size * n_layers]`.
    pub del2_tracers_cell: Vec<f64>,
}

impl TracerAuxVars {
    pub fn new(mesh: &LocalMesh, flux_interp: FluxInterp, n_tracers: usize) -> Self {
        Self {
            flux_interp,
            n_tracers,
            h_tracers_edge: vec![0.0; n_tracers * mesh.n_edges_size * mesh.n_layers],
            del2_tracers_cell: vec![0.0; n_tracers * mesh.n_cells_size * mesh.n_layers],
        }
    }

    /// Final stage: needs the edge-interpolated thicknesses from
    /// [`LayerThicknessAuxVars`](super::LayerThicknessAuxVars).
    pub fn compute(
        &mut self,
        mesh: &LocalMesh,
        coord: &VerticalCoord,
        tracers: &[f64],
        normal_velocity: &[f64],
        flux_layer_thick_edge: &[f64],
        mean_layer_thick_edge: &[f64],
    ) {
        let nl = mesh.n_layers;
        let cell_extent = mesh.n_cells_size * nl;
        let edge_extent = mesh.n_edges_size * nl;
        for t in 0..self.n_tracers {
            let phi = &tracers[t * cell_extent..(t + 1) * cell_extent];
            let h_phi = &mut self.h_tracers_edge[t * edge_extent..(t + 1) * edge_extent];
            for e in 0..mesh.n_edges_all {
                let base = e * nl;
                h_phi[base..base + nl].fill(0.0);
                let c1 = mesh.cells_on_edge[e * 2];
                let c2 = mesh.cells_on_edge[e * 2 + 1];
                let range =
                    active_range(coord.min_layer_edge_top[e], coord.max_layer_edge_top[e]);
                for k in range {
                    let phi_edge =
                        self.flux_interp
                            .apply(normal_velocity[base + k], phi[c1 * nl + k], phi[c2 * nl + k]);
                    h_phi[base + k] = flux_layer_thick_edge[base + k] * phi_edge;
                }
            }

            let del2 = &mut self.del2_tracers_cell[t * cell_extent..(t + 1) * cell_extent];
            for c in 0..mesh.n_cells_all {
                let base = c * nl;
                del2[base..base + nl].fill(0.0);
                let inv_area = 1.0 / mesh.area_cell[c];
                for k in coord.cell_range(c) {
                    let mut sum = 0.0;
                    for (e, sign) in mesh.cell_edges(c) {
                        let c1 = mesh.cells_on_edge[e * 2];
                        let c2 = mesh.cells_on_edge[e * 2 + 1];
                        let grad = (phi[c2 * nl + k] - phi[c1 * nl + k]) / mesh.dc_edge[e];
                        sum += sign
                            * mean_layer_thick_edge[e * nl + k]
                            * grad
                            * mesh.dv_edge[e];
                    }
                    del2[base + k] = sum * inv_area;
                }
            }
        }
    }
}
