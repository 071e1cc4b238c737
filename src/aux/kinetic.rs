//! Cell kinetic energy and velocity divergence.

use crate::mesh::LocalMesh;
use crate::vertical::VerticalCoord;

/// Stage-one cell diagnostics derived directly from normal velocity.
///
/// Kinetic energy uses the C-grid quadrature `Σ (dc dv / 4) u² / A_c` over
/// the cell's edges; divergence is the mimetic operator applied in the same
/// sweep to avoid touching the edge arrays twice.
#[derive(Clone, Debug)]
pub struct KineticAuxVars {
    /// Kinetic energy per unit mass at cell centers, `[n_cells_size * n_layers]`.
    pub kinetic_energy_cell: Vec<f64>,
    /// Horizontal velocity divergence at cell centers.
    pub velocity_div_cell: Vec<f64>,
}

impl KineticAuxVars {
    pub fn new(mesh: &LocalMesh) -> Self {
        let extent = mesh.n_cells_size * mesh.n_layers;
        Self {
            kinetic_energy_cell: vec![0.0; extent],
            velocity_div_cell: vec![0.0; extent],
        }
    }

    pub fn compute(&mut self, mesh: &LocalMesh, coord: &VerticalCoord, normal_velocity: &[f64]) {
        let nl = mesh.n_layers;
        for c in 0..mesh.n_cells_all {
            let base = c * nl;
            self.kinetic_energy_cell[base..base + nl].fill(0.0);
            self.velocity_div_cell[base..base + nl].fill(0.0);
            let inv_area = 1.0 / mesh.area_cell[c];
            for k in coord.cell_range(c) {
                let mut ke = 0.0;
                let mut div = 0.0;
                for (e, sign) in mesh.cell_edges(c) {
                    let u = normal_velocity[e * nl + k];
                    ke += 0.25 * mesh.dc_edge[e] * mesh.dv_edge[e] * u * u;
                    div += sign * u * mesh.dv_edge[e];
                }
                self.kinetic_energy_cell[base + k] = ke * inv_area;
                self.velocity_div_cell[base + k] = div * inv_area;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::GlobalMesh;
    use crate::vertical::MovementProfile;

    const TOL: f64 = 1e-12;

    fn setup() -> (LocalMesh, VerticalCoord) {
        let global = GlobalMesh::periodic_quad(6, 6, 1000.0, 1000.0, 2);
        let mesh = LocalMesh::serial(&global);
        let coord = VerticalCoord::new(&mesh, MovementProfile::Uniform, vec![50.0; 2]);
        (mesh, coord)
    }

    #[test]
    fn test_uniform_flow_energy_and_zero_divergence() {
        let (mesh, coord) = setup();
        let nl = mesh.n_layers;
        let speed = 2.0;
        let mut u = vec![0.0; mesh.n_edges_size * nl];
        for e in 0..mesh.n_edges_all {
            for k in 0..nl {
                u[e * nl + k] = speed * mesh.angle_edge[e].cos();
            }
        }
        let mut aux = KineticAuxVars::new(&mesh);
        aux.compute(&mesh, &coord, &u);
        // Square cells: two edges carry the full speed, two carry zero, each
        // kite is a quarter cell, so KE = u²/2.
        for c in 0..mesh.n_cells_owned {
            for k in 0..nl {
                assert!(
                    (aux.kinetic_energy_cell[c * nl + k] - 0.5 * speed * speed).abs() < TOL,
                    "kinetic energy wrong at cell {c}"
                );
                assert!(aux.velocity_div_cell[c * nl + k].abs() < TOL);
            }
        }
    }

    #[test]
    fn test_dry_columns_stay_zero() {
        let global = {
            let mut g = GlobalMesh::periodic_quad(4, 4, 1.0, 1.0, 2);
            g.max_level_cell[3] = crate::types::layer::DRY_LAYER;
            g
        };
        let mesh = LocalMesh::serial(&global);
        let coord = VerticalCoord::new(&mesh, MovementProfile::Uniform, vec![50.0; 2]);
        let u = vec![1.0; mesh.n_edges_size * mesh.n_layers];
        let mut aux = KineticAuxVars::new(&mesh);
        aux.compute(&mesh, &coord, &u);
        for k in 0..mesh.n_layers {
            assert_eq!(aux.kinetic_energy_cell[3 * mesh.n_layers + k], 0.0);
        }
    }
}
