//! Relative and potential vorticity diagnostics.
//!
//! Relative vorticity is the curl of normal velocity at vertices. Dividing
//! by the kite-area-weighted layer thickness at the vertex gives the
//! normalized (potential) relative and planetary vorticities used by the PV
//! advection tendency; the edge variants are the arithmetic mean of the two
//! endpoint vertices.

use crate::mesh::LocalMesh;
use crate::types::layer::active_range;
use crate::vertical::VerticalCoord;

#[derive(Clone, Debug)]
pub struct VorticityAuxVars {
    /// Curl of normal velocity at vertices, `[n_vertices_size * n_layers]`.
    pub rel_vort_vertex: Vec<f64>,
    /// Kite-weighted layer thickness at vertices.
    pub layer_thick_vertex: Vec<f64>,
    /// Relative vorticity over thickness at vertices.
    pub norm_rel_vort_vertex: Vec<f64>,
    /// Coriolis parameter over thickness at vertices.
    pub norm_planetary_vort_vertex: Vec<f64>,
    /// Vertex-averaged normalized relative vorticity at edges.
    pub norm_rel_vort_edge: Vec<f64>,
    /// Vertex-averaged normalized planetary vorticity at edges.
    pub norm_planetary_vort_edge: Vec<f64>,
}

impl VorticityAuxVars {
    pub fn new(mesh: &LocalMesh) -> Self {
        let vertex_extent = mesh.n_vertices_size * mesh.n_layers;
        let edge_extent = mesh.n_edges_size * mesh.n_layers;
        Self {
            rel_vort_vertex: vec![0.0; vertex_extent],
            layer_thick_vertex: vec![0.0; vertex_extent],
            norm_rel_vort_vertex: vec![0.0; vertex_extent],
            norm_planetary_vort_vertex: vec![0.0; vertex_extent],
            norm_rel_vort_edge: vec![0.0; edge_extent],
            norm_planetary_vort_edge: vec![0.0; edge_extent],
        }
    }

    /// Stage-one vertex sweep: circulation and thickness weighting from the
    /// raw prognostic fields.
    pub fn compute_vertex(
        &mut self,
        mesh: &LocalMesh,
        coord: &VerticalCoord,
        layer_thickness: &[f64],
        normal_velocity: &[f64],
    ) {
        let nl = mesh.n_layers;
        let vd = mesh.vertex_degree;
        for v in 0..mesh.n_vertices_all {
            let base = v * nl;
            self.rel_vort_vertex[base..base + nl].fill(0.0);
            self.layer_thick_vertex[base..base + nl].fill(0.0);
            self.norm_rel_vort_vertex[base..base + nl].fill(0.0);
            self.norm_planetary_vort_vertex[base..base + nl].fill(0.0);
            let inv_area = 1.0 / mesh.area_triangle[v];
            let range = active_range(coord.min_layer_vertex_top[v], coord.max_layer_vertex_top[v]);
            for k in range {
                let mut circulation = 0.0;
                for (e, sign) in mesh.vertex_edges(v) {
                    circulation += sign * normal_velocity[e * nl + k] * mesh.dc_edge[e];
                }
                let mut h_v = 0.0;
                for s in 0..vd {
                    let c = mesh.cells_on_vertex[v * vd + s];
                    h_v += mesh.kite_areas_on_vertex[v * vd + s] * layer_thickness[c * nl + k];
                }
                h_v *= inv_area;
                let rv = circulation * inv_area;
                self.rel_vort_vertex[base + k] = rv;
                self.layer_thick_vertex[base + k] = h_v;
                if h_v > 0.0 {
                    self.norm_rel_vort_vertex[base + k] = rv / h_v;
                    self.norm_planetary_vort_vertex[base + k] = mesh.f_vertex[v] / h_v;
                }
            }
        }
    }

    /// Stage-two edge sweep: average the endpoint vertices.
    pub fn compute_edge(&mut self, mesh: &LocalMesh, coord: &VerticalCoord) {
        let nl = mesh.n_layers;
        for e in 0..mesh.n_edges_all {
            let base = e * nl;
            self.norm_rel_vort_edge[base..base + nl].fill(0.0);
            self.norm_planetary_vort_edge[base..base + nl].fill(0.0);
            let v1 = mesh.vertices_on_edge[e * 2];
            let v2 = mesh.vertices_on_edge[e * 2 + 1];
            let range = active_range(coord.min_layer_edge_top[e], coord.max_layer_edge_top[e]);
            for k in range {
                self.norm_rel_vort_edge[base + k] =
                    0.5 * (self.norm_rel_vort_vertex[v1 * nl + k] + self.norm_rel_vort_vertex[v2 * nl + k]);
                self.norm_planetary_vort_edge[base + k] = 0.5
                    * (self.norm_planetary_vort_vertex[v1 * nl + k]
                        + self.norm_planetary_vort_vertex[v2 * nl + k]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::GlobalMesh;
    use crate::vertical::MovementProfile;

    fn setup(f0: f64) -> (LocalMesh, VerticalCoord) {
        let mut global = GlobalMesh::periodic_quad(8, 8, 1.0, 1.0, 1);
        global.set_coriolis(f0);
        let mesh = LocalMesh::serial(&global);
        let coord = VerticalCoord::new(&mesh, MovementProfile::Uniform, vec![100.0]);
        (mesh, coord)
    }

    #[test]
    fn test_uniform_flow_has_zero_relative_vorticity() {
        let (mesh, coord) = setup(0.0);
        let mut u = vec![0.0; mesh.n_edges_size];
        for e in 0..mesh.n_edges_all {
            u[e] = 3.0 * mesh.angle_edge[e].cos() - 1.0 * mesh.angle_edge[e].sin();
        }
        let h = vec![100.0; mesh.n_cells_size];
        let mut aux = VorticityAuxVars::new(&mesh);
        aux.compute_vertex(&mesh, &coord, &h, &u);
        for v in 0..mesh.n_vertices_owned {
            assert!(aux.rel_vort_vertex[v].abs() < 1e-12);
        }
    }

    #[test]
    fn test_uniform_thickness_normalizes_planetary_vorticity() {
        let f0 = 1.0e-4;
        let (mesh, coord) = setup(f0);
        let u = vec![0.0; mesh.n_edges_size];
        let h = vec![100.0; mesh.n_cells_size];
        let mut aux = VorticityAuxVars::new(&mesh);
        aux.compute_vertex(&mesh, &coord, &h, &u);
        aux.compute_edge(&mesh, &coord);
        for v in 0..mesh.n_vertices_owned {
            assert!((aux.layer_thick_vertex[v] - 100.0).abs() < 1e-12);
            assert!((aux.norm_planetary_vort_vertex[v] - f0 / 100.0).abs() < 1e-16);
        }
        for e in 0..mesh.n_edges_owned {
            assert!((aux.norm_planetary_vort_edge[e] - f0 / 100.0).abs() < 1e-16);
        }
    }
}
