//! Surface wind stress projected onto edge normals.

use crate::config::Config;
use crate::error::ConfigError;
use crate::mesh::LocalMesh;

/// Constant surface wind stress (N/m²), rotated onto each edge's normal
/// direction through the edge angle. Read from the optional `WindStress`
/// configuration group; an absent group means an unforced run.
#[derive(Clone, Debug)]
pub struct WindForcingAuxVars {
    pub zonal_stress: f64,
    pub meridional_stress: f64,
    /// Normal component of the surface stress per edge, `[n_edges_size]`.
    pub normal_stress_edge: Vec<f64>,
}

impl WindForcingAuxVars {
    pub fn new(mesh: &LocalMesh, zonal_stress: f64, meridional_stress: f64) -> Self {
        Self {
            zonal_stress,
            meridional_stress,
            normal_stress_edge: vec![0.0; mesh.n_edges_size],
        }
    }

    pub fn from_config(mesh: &LocalMesh, config: &Config) -> Result<Self, ConfigError> {
        let (zonal, meridional) = match config.group("WindStress") {
            Ok(group) => (group.get_real("Zonal")?, group.get_real("Meridional")?),
            Err(ConfigError::MissingGroup(_)) => (0.0, 0.0),
            Err(e) => return Err(e),
        };
        Ok(Self::new(mesh, zonal, meridional))
    }

    pub fn compute(&mut self, mesh: &LocalMesh) {
        for e in 0..mesh.n_edges_all {
            self.normal_stress_edge[e] = self.zonal_stress * mesh.angle_edge[e].cos()
                + self.meridional_stress * mesh.angle_edge[e].sin();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::GlobalMesh;

    #[test]
    fn test_zonal_stress_hits_x_edges_only() {
        let global = GlobalMesh::periodic_quad(4, 4, 1.0, 1.0, 1);
        let mesh = LocalMesh::serial(&global);
        let mut wind = WindForcingAuxVars::new(&mesh, 0.1, 0.0);
        wind.compute(&mesh);
        for e in 0..mesh.n_edges_all {
            let expected = 0.1 * mesh.angle_edge[e].cos();
            assert_eq!(wind.normal_stress_edge[e], expected);
        }
    }

    #[test]
    fn test_missing_group_means_unforced() {
        let global = GlobalMesh::periodic_quad(2, 2, 1.0, 1.0, 1);
        let mesh = LocalMesh::serial(&global);
        let wind = WindForcingAuxVars::from_config(&mesh, &Config::empty()).unwrap();
        assert_eq!(wind.zonal_stress, 0.0);
        assert_eq!(wind.meridional_stress, 0.0);
    }

    #[test]
    fn test_present_group_requires_both_components() {
        let global = GlobalMesh::periodic_quad(2, 2, 1.0, 1.0, 1);
        let mesh = LocalMesh::serial(&global);
        let config = Config::from_json_str(r#"{ "WindStress": { "Zonal": 0.1 } }"#).unwrap();
        assert!(matches!(
            WindForcingAuxVars::from_config(&mesh, &config),
            Err(ConfigError::MissingKey { .. })
        ));
    }
}
