//! Thickness-equation terms.

use crate::aux::AuxiliaryState;
use crate::mesh::LocalMesh;
use crate::vertical::VerticalCoord;

/// `-∇·(h_e u)`: divergence of the thickness flux, accumulated per cell.
pub(super) fn flux_divergence(
    tendency: &mut [f64],
    mesh: &LocalMesh,
    coord: &VerticalCoord,
    aux: &AuxiliaryState,
    normal_velocity: &[f64],
) {
    let nl = mesh.n_layers;
    let h_edge = &aux.layer_thickness.flux_layer_thick_edge;
    for c in 0..mesh.n_cells_all {
        let inv_area = 1.0 / mesh.area_cell[c];
        for k in coord.cell_range(c) {
            let mut div = 0.0;
            for (e, sign) in mesh.cell_edges(c) {
                div += sign * h_edge[e * nl + k] * normal_velocity[e * nl + k] * mesh.dv_edge[e];
            }
            tendency[c * nl + k] -= div * inv_area;
        }
    }
}
