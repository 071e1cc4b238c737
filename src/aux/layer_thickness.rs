//! Layer thickness interpolated to edges.

use crate::config::ConfigGroup;
use crate::error::ConfigError;
use crate::mesh::LocalMesh;
use crate::types::layer::active_range;
use crate::vertical::VerticalCoord;

/// How cell quantities are interpolated to edges for flux evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FluxInterp {
    /// Arithmetic mean of the two adjoining cells.
    Center,
    /// Value of the upwind cell by the sign of the normal velocity.
    Upwind,
}

impl FluxInterp {
    const CHOICES: &'static [&'static str] = &["Center", "Upwind"];

    pub fn from_config(group: &ConfigGroup<'_>, key: &str) -> Result<Self, ConfigError> {
        Ok(match group.get_choice(key, Self::CHOICES)? {
            0 => FluxInterp::Center,
            _ => FluxInterp::Upwind,
        })
    }

    /// Interpolate between the upwind value `a` (normal velocity positive)
    /// and downwind value `b`.
    #[inline]
    pub fn apply(self, normal_velocity: f64, a: f64, b: f64) -> f64 {
        match self {
            FluxInterp::Center => 0.5 * (a + b),
            FluxInterp::Upwind => {
                if normal_velocity > 0.0 {
                    a
                } else if normal_velocity < 0.0 {
                    b
                } else {
                    0.5 * (a + b)
                }
            }
        }
    }
}

/// Edge-interpolated layer thickness: the centered mean (used by diffusion
/// and vorticity weighting) and the flux value (used by thickness and tracer
/// advection, interpolation scheme from configuration).
#[derive(Clone, Debug)]
pub struct LayerThicknessAuxVars {
    pub flux_interp: FluxInterp,
    pub mean_layer_thick_edge: Vec<f64>,
    pub flux_layer_thick_edge: Vec<f64>,
}

impl LayerThicknessAuxVars {
    pub fn new(mesh: &LocalMesh, flux_interp: FluxInterp) -> Self {
        let extent = mesh.n_edges_size * mesh.n_layers;
        Self {
            flux_interp,
            mean_layer_thick_edge: vec![0.0; extent],
            flux_layer_thick_edge: vec![0.0; extent],
        }
    }

    pub fn compute(
        &mut self,
        mesh: &LocalMesh,
        coord: &VerticalCoord,
        layer_thickness: &[f64],
        normal_velocity: &[f64],
    ) {
        let nl = mesh.n_layers;
        for e in 0..mesh.n_edges_all {
            let base = e * nl;
            self.mean_layer_thick_edge[base..base + nl].fill(0.0);
            self.flux_layer_thick_edge[base..base + nl].fill(0.0);
            let c1 = mesh.cells_on_edge[e * 2];
            let c2 = mesh.cells_on_edge[e * 2 + 1];
            let range = active_range(coord.min_layer_edge_top[e], coord.max_layer_edge_top[e]);
            for k in range {
                let h1 = layer_thickness[c1 * nl + k];
                let h2 = layer_thickness[c2 * nl + k];
                self.mean_layer_thick_edge[base + k] = 0.5 * (h1 + h2);
                self.flux_layer_thick_edge[base + k] =
                    self.flux_interp.apply(normal_velocity[base + k], h1, h2);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::GlobalMesh;
    use crate::vertical::MovementProfile;

    fn setup() -> (LocalMesh, VerticalCoord) {
        let global = GlobalMesh::periodic_quad(4, 4, 1.0, 1.0, 1);
        let mesh = LocalMesh::serial(&global);
        let coord = VerticalCoord::new(&mesh, MovementProfile::Uniform, vec![10.0]);
        (mesh, coord)
    }

    #[test]
    fn test_center_interpolation_is_the_mean() {
        let (mesh, coord) = setup();
        let mut h = vec![0.0; mesh.n_cells_size];
        for c in 0..mesh.n_cells_all {
            h[c] = 10.0 + c as f64;
        }
        let u = vec![1.0; mesh.n_edges_size];
        let mut aux = LayerThicknessAuxVars::new(&mesh, FluxInterp::Center);
        aux.compute(&mesh, &coord, &h, &u);
        for e in 0..mesh.n_edges_owned {
            let c1 = mesh.cells_on_edge[e * 2];
            let c2 = mesh.cells_on_edge[e * 2 + 1];
            assert_eq!(aux.flux_layer_thick_edge[e], 0.5 * (h[c1] + h[c2]));
            assert_eq!(aux.mean_layer_thick_edge[e], aux.flux_layer_thick_edge[e]);
        }
    }

    #[test]
    fn test_upwind_picks_by_velocity_sign() {
        let (mesh, coord) = setup();
        let mut h = vec![0.0; mesh.n_cells_size];
        for c in 0..mesh.n_cells_all {
            h[c] = 1.0 + c as f64;
        }
        for (u_sign, pick_first) in [(1.0, true), (-1.0, false)] {
            let u = vec![u_sign; mesh.n_edges_size];
            let mut aux = LayerThicknessAuxVars::new(&mesh, FluxInterp::Upwind);
            aux.compute(&mesh, &coord, &h, &u);
            for e in 0..mesh.n_edges_owned {
                let c1 = mesh.cells_on_edge[e * 2];
                let c2 = mesh.cells_on_edge[e * 2 + 1];
                let expected = if pick_first { h[c1] } else { h[c2] };
                assert_eq!(aux.flux_layer_thick_edge[e], expected);
            }
        }
    }

    #[test]
    fn test_flux_interp_config_choice() {
        use crate::config::Config;
        let config = Config::from_json_str(
            r#"{ "Advection": { "FluxThicknessType": "upwind" } }"#,
        )
        .unwrap();
        let group = config.group("Advection").unwrap();
        assert_eq!(
            FluxInterp::from_config(&group, "FluxThicknessType").unwrap(),
            FluxInterp::Upwind
        );
        assert!(matches!(
            FluxInterp::from_config(&group, "FluxTracerType"),
            Err(ConfigError::MissingKey { .. })
        ));
    }
}
