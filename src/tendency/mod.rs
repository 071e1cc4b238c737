//! Time-derivative assembly for the three coupled equations.
//!
//! Each equation's tendency is a pre-zeroed accumulation buffer that every
//! enabled term adds into, so term evaluation order does not matter — with
//! one exception: the user-injectable [`CustomTendency`] hook always runs
//! last, as an additive correction after all built-in terms. A compute call
//! is stateless given its inputs and therefore idempotent.
//!
//! Term enables and coefficients come from the `Tendencies` configuration
//! group at construction; a missing enable flag, or a missing coefficient
//! for an enabled term, is fatal.

mod thickness;
mod tracer;
mod velocity;

use std::fmt;

use crate::aux::AuxiliaryState;
use crate::config::Config;
use crate::error::{ConfigError, RegistryError};
use crate::mesh::LocalMesh;
use crate::registry::{FieldMetadata, FieldRegistry};
use crate::state::{OceanState, TimeLevel};
use crate::vertical::VerticalCoord;

/// Late-binding extension point for injected tendencies (manufactured
/// solutions, verification forcings). Every hook defaults to a no-op; each
/// receives the accumulation buffer after all built-in terms.
#[allow(unused_variables)]
pub trait CustomTendency {
    fn thickness(
        &self,
        tendency: &mut [f64],
        mesh: &LocalMesh,
        coord: &VerticalCoord,
        state: &OceanState,
        level: TimeLevel,
        time: f64,
    ) {
    }

    fn velocity(
        &self,
        tendency: &mut [f64],
        mesh: &LocalMesh,
        coord: &VerticalCoord,
        state: &OceanState,
        level: TimeLevel,
        time: f64,
    ) {
    }

    fn tracers(
        &self,
        tendency: &mut [f64],
        mesh: &LocalMesh,
        coord: &VerticalCoord,
        state: &OceanState,
        level: TimeLevel,
        time: f64,
    ) {
    }
}

/// Per-term enable flags and coefficients, fixed after construction.
#[derive(Clone, Copy, Debug)]
pub struct TendencyConfig {
    pub thickness_flux_enable: bool,
    pub pv_advection_enable: bool,
    pub ke_gradient_enable: bool,
    pub ssh_gradient_enable: bool,
    pub vel_diffusion_enable: bool,
    pub visc_del2: f64,
    pub vel_hyper_diffusion_enable: bool,
    pub visc_del4: f64,
    pub wind_forcing_enable: bool,
    pub bottom_drag_enable: bool,
    pub bottom_drag_coeff: f64,
    pub rayleigh_drag_enable: bool,
    pub rayleigh_drag_coeff: f64,
    pub tracer_advection_enable: bool,
    pub tracer_diffusion_enable: bool,
    pub eddy_diff2: f64,
    pub tracer_hyper_diffusion_enable: bool,
    pub eddy_diff4: f64,
}

impl TendencyConfig {
    /// Everything off: the baseline for tests and custom-only runs.
    pub fn disabled() -> Self {
        Self {
            thickness_flux_enable: false,
            pv_advection_enable: false,
            ke_gradient_enable: false,
            ssh_gradient_enable: false,
            vel_diffusion_enable: false,
            visc_del2: 0.0,
            vel_hyper_diffusion_enable: false,
            visc_del4: 0.0,
            wind_forcing_enable: false,
            bottom_drag_enable: false,
            bottom_drag_coeff: 0.0,
            rayleigh_drag_enable: false,
            rayleigh_drag_coeff: 0.0,
            tracer_advection_enable: false,
            tracer_diffusion_enable: false,
            eddy_diff2: 0.0,
            tracer_hyper_diffusion_enable: false,
            eddy_diff4: 0.0,
        }
    }

    /// Read the `Tendencies` group. Enable flags are required; each
    /// coefficient is required exactly when its term is enabled.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let group = config.group("Tendencies")?;
        let coeff = |key: &str, enabled: bool| -> Result<f64, ConfigError> {
            if enabled {
                group.get_real(key)
            } else {
                Ok(group.opt_real(key)?.unwrap_or(0.0))
            }
        };

        let thickness_flux_enable = group.get_bool("ThicknessFluxTendencyEnable")?;
        let pv_advection_enable = group.get_bool("PVTendencyEnable")?;
        let ke_gradient_enable = group.get_bool("KEGradTendencyEnable")?;
        let ssh_gradient_enable = group.get_bool("SSHGradTendencyEnable")?;
        let vel_diffusion_enable = group.get_bool("VelDiffTendencyEnable")?;
        let visc_del2 = coeff("ViscDel2", vel_diffusion_enable)?;
        let vel_hyper_diffusion_enable = group.get_bool("VelHyperDiffTendencyEnable")?;
        let visc_del4 = coeff("ViscDel4", vel_hyper_diffusion_enable)?;
        let wind_forcing_enable = group.get_bool("WindForcingTendencyEnable")?;
        let bottom_drag_enable = group.get_bool("BottomDragTendencyEnable")?;
        let bottom_drag_coeff = coeff("BottomDragCoeff", bottom_drag_enable)?;
        let rayleigh_drag_enable = group.get_bool("RayleighDragTendencyEnable")?;
        let rayleigh_drag_coeff = coeff("RayleighDragCoeff", rayleigh_drag_enable)?;
        let tracer_advection_enable = group.get_bool("TracerAdvTendencyEnable")?;
        let tracer_diffusion_enable = group.get_bool("TracerDiffTendencyEnable")?;
        let eddy_diff2 = coeff("EddyDiff2", tracer_diffusion_enable)?;
        let tracer_hyper_diffusion_enable = group.get_bool("TracerHyperDiffTendencyEnable")?;
        let eddy_diff4 = coeff("EddyDiff4", tracer_hyper_diffusion_enable)?;

        Ok(Self {
            thickness_flux_enable,
            pv_advection_enable,
            ke_gradient_enable,
            ssh_gradient_enable,
            vel_diffusion_enable,
            visc_del2,
            vel_hyper_diffusion_enable,
            visc_del4,
            wind_forcing_enable,
            bottom_drag_enable,
            bottom_drag_coeff,
            rayleigh_drag_enable,
            rayleigh_drag_coeff,
            tracer_advection_enable,
            tracer_diffusion_enable,
            eddy_diff2,
            tracer_hyper_diffusion_enable,
            eddy_diff4,
        })
    }

    /// Cell-neighbor rings the decomposition must keep for the enabled
    /// terms to be exact at owned entities. Potential-vorticity advection
    /// and the biharmonic terms read auxiliary fields on halo edges whose
    /// own stencils span a further ring of cells; every other term closes
    /// within one ring.
    pub fn min_halo_width(&self) -> usize {
        if self.pv_advection_enable
            || self.vel_hyper_diffusion_enable
            || self.tracer_hyper_diffusion_enable
        {
            2
        } else {
            1
        }
    }
}

/// The tendency bundle: term configuration plus the three accumulation
/// buffers, sized to one mesh.
pub struct Tendencies {
    pub config: TendencyConfig,
    /// `d(h)/dt`, `[n_cells_size * n_layers]`.
    pub layer_thickness_tend: Vec<f64>,
    /// `d(u)/dt`, `[n_edges_size * n_layers]`.
    pub normal_velocity_tend: Vec<f64>,
    /// `d(hφ)/dt` per tracer block, `[n_tracers * n_cells_size * n_layers]`.
    pub tracer_tend: Vec<f64>,
    custom: Option<Box<dyn CustomTendency + Send>>,
}

impl fmt::Debug for Tendencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tendencies")
            .field("config", &self.config)
            .field("has_custom", &self.custom.is_some())
            .finish()
    }
}

impl Tendencies {
    pub fn new(mesh: &LocalMesh, config: TendencyConfig, n_tracers: usize) -> Self {
        let nl = mesh.n_layers;
        Self {
            config,
            layer_thickness_tend: vec![0.0; mesh.n_cells_size * nl],
            normal_velocity_tend: vec![0.0; mesh.n_edges_size * nl],
            tracer_tend: vec![0.0; n_tracers * mesh.n_cells_size * nl],
            custom: None,
        }
    }

    pub fn from_config(
        mesh: &LocalMesh,
        config: &Config,
        n_tracers: usize,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(mesh, TendencyConfig::from_config(config)?, n_tracers))
    }

    /// Install (or replace) the custom-tendency hook.
    pub fn set_custom(&mut self, custom: Box<dyn CustomTendency + Send>) {
        self.custom = Some(custom);
    }

    /// Thickness tendency only: zero, accumulate enabled terms, custom last.
    pub fn compute_thickness_tendency(
        &mut self,
        mesh: &LocalMesh,
        coord: &VerticalCoord,
        aux: &AuxiliaryState,
        state: &OceanState,
        vel_level: TimeLevel,
        time: f64,
    ) {
        self.layer_thickness_tend.fill(0.0);
        if self.config.thickness_flux_enable {
            thickness::flux_divergence(
                &mut self.layer_thickness_tend,
                mesh,
                coord,
                aux,
                state.normal_velocity(vel_level),
            );
        }
        if let Some(custom) = &self.custom {
            custom.thickness(
                &mut self.layer_thickness_tend,
                mesh,
                coord,
                state,
                vel_level,
                time,
            );
        }
    }

    /// Velocity tendency only.
    pub fn compute_velocity_tendency(
        &mut self,
        mesh: &LocalMesh,
        coord: &VerticalCoord,
        aux: &AuxiliaryState,
        state: &OceanState,
        thick_level: TimeLevel,
        vel_level: TimeLevel,
        time: f64,
    ) {
        let tend = &mut self.normal_velocity_tend;
        tend.fill(0.0);
        let u = state.normal_velocity(vel_level);
        let cfg = &self.config;
        if cfg.pv_advection_enable {
            velocity::pv_advection(tend, mesh, coord, aux, u);
        }
        if cfg.ke_gradient_enable {
            velocity::ke_gradient(tend, mesh, coord, aux);
        }
        if cfg.ssh_gradient_enable {
            velocity::ssh_gradient(tend, mesh, coord, state.layer_thickness(thick_level));
        }
        if cfg.vel_diffusion_enable {
            velocity::diffusion(tend, mesh, coord, aux, cfg.visc_del2);
        }
        if cfg.vel_hyper_diffusion_enable {
            velocity::hyper_diffusion(tend, mesh, coord, aux, cfg.visc_del4);
        }
        if cfg.wind_forcing_enable {
            velocity::wind_forcing(tend, mesh, coord, aux);
        }
        if cfg.bottom_drag_enable {
            velocity::bottom_drag(tend, mesh, coord, aux, u, cfg.bottom_drag_coeff);
        }
        if cfg.rayleigh_drag_enable {
            velocity::rayleigh_drag(tend, mesh, coord, u, cfg.rayleigh_drag_coeff);
        }
        if let Some(custom) = &self.custom {
            custom.velocity(tend, mesh, coord, state, vel_level, time);
        }
    }

    /// Tracer tendencies only, one block per tracer.
    pub fn compute_tracer_tendency(
        &mut self,
        mesh: &LocalMesh,
        coord: &VerticalCoord,
        aux: &AuxiliaryState,
        state: &OceanState,
        thick_level: TimeLevel,
        vel_level: TimeLevel,
        time: f64,
    ) {
        self.tracer_tend.fill(0.0);
        let nl = mesh.n_layers;
        let cell_extent = mesh.n_cells_size * nl;
        let u = state.normal_velocity(vel_level);
        let cfg = self.config;
        for t in 0..state.n_tracers() {
            let block = &mut self.tracer_tend[t * cell_extent..(t + 1) * cell_extent];
            if cfg.tracer_advection_enable {
                tracer::advection(block, mesh, coord, aux, u, t);
            }
            if cfg.tracer_diffusion_enable {
                tracer::diffusion(block, mesh, coord, aux, cfg.eddy_diff2, t);
            }
            if cfg.tracer_hyper_diffusion_enable {
                tracer::hyper_diffusion(block, mesh, coord, aux, cfg.eddy_diff4, t);
            }
        }
        if let Some(custom) = &self.custom {
            custom.tracers(&mut self.tracer_tend, mesh, coord, state, thick_level, time);
        }
    }

    /// All three equations, in thickness/velocity/tracer order.
    pub fn compute_all_tendencies(
        &mut self,
        mesh: &LocalMesh,
        coord: &VerticalCoord,
        aux: &AuxiliaryState,
        state: &OceanState,
        thick_level: TimeLevel,
        vel_level: TimeLevel,
        time: f64,
    ) {
        self.compute_thickness_tendency(mesh, coord, aux, state, vel_level, time);
        self.compute_velocity_tendency(mesh, coord, aux, state, thick_level, vel_level, time);
        self.compute_tracer_tendency(mesh, coord, aux, state, thick_level, vel_level, time);
    }

    const FIELDS: &'static [(&'static str, &'static str, &'static str)] = &[
        ("LayerThicknessTend", "layer thickness tendency", "m s^-1"),
        ("NormalVelocityTend", "normal velocity tendency", "m s^-2"),
        ("TracerTend", "thickness-weighted tracer tendency", "m s^-1"),
    ];

    /// Register the tendency buffers with the metadata registry.
    pub fn register_fields(&self, registry: &mut FieldRegistry) -> Result<(), RegistryError> {
        for &(name, description, units) in Self::FIELDS {
            registry.define(FieldMetadata::new(name, description, units))?;
        }
        Ok(())
    }

    /// Remove this bundle's field definitions (teardown path).
    pub fn unregister_fields(&self, registry: &mut FieldRegistry) -> Result<(), RegistryError> {
        for &(name, _, _) in Self::FIELDS {
            registry.remove(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::GlobalMesh;
    use crate::vertical::MovementProfile;

    fn setup() -> (LocalMesh, VerticalCoord, AuxiliaryState, OceanState) {
        let global = GlobalMesh::periodic_quad(6, 6, 1000.0, 1000.0, 2);
        let mesh = LocalMesh::serial(&global);
        let coord = VerticalCoord::new(&mesh, MovementProfile::Uniform, vec![50.0; 2]);
        let aux = AuxiliaryState::new(&mesh, &Config::empty(), 1).unwrap();
        let mut state = OceanState::new(&mesh, &["Temperature"]);
        state.layer_thickness_mut(TimeLevel::Cur).fill(50.0);
        (mesh, coord, aux, state)
    }

    #[test]
    fn test_all_terms_disabled_gives_zero_tendencies() {
        let (mesh, coord, mut aux, mut state) = setup();
        let nl = mesh.n_layers;
        let u = state.normal_velocity_mut(TimeLevel::Cur);
        for e in 0..mesh.n_edges_all {
            for k in 0..nl {
                u[e * nl + k] = (e % 5) as f64 - 2.0;
            }
        }
        aux.compute_all(&mesh, &coord, &state, TimeLevel::Cur, TimeLevel::Cur);
        let mut tend = Tendencies::new(&mesh, TendencyConfig::disabled(), 1);
        tend.compute_all_tendencies(
            &mesh,
            &coord,
            &aux,
            &state,
            TimeLevel::Cur,
            TimeLevel::Cur,
            0.0,
        );
        assert!(tend.layer_thickness_tend.iter().all(|&x| x == 0.0));
        assert!(tend.normal_velocity_tend.iter().all(|&x| x == 0.0));
        assert!(tend.tracer_tend.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_thickness_flux_conserves_volume() {
        let (mesh, coord, mut aux, mut state) = setup();
        let nl = mesh.n_layers;
        let u = state.normal_velocity_mut(TimeLevel::Cur);
        for e in 0..mesh.n_edges_all {
            for k in 0..nl {
                u[e * nl + k] = ((e * 31 + k) % 7) as f64 * 0.1 - 0.3;
            }
        }
        aux.compute_all(&mesh, &coord, &state, TimeLevel::Cur, TimeLevel::Cur);
        let mut config = TendencyConfig::disabled();
        config.thickness_flux_enable = true;
        let mut tend = Tendencies::new(&mesh, config, 1);
        tend.compute_thickness_tendency(&mesh, &coord, &aux, &state, TimeLevel::Cur, 0.0);
        // The flux-divergence form telescopes over the closed mesh.
        for k in 0..nl {
            let total: f64 = (0..mesh.n_cells_owned)
                .map(|c| mesh.area_cell[c] * tend.layer_thickness_tend[c * nl + k])
                .sum();
            assert!(total.abs() < 1e-7, "volume drift {total} in layer {k}");
        }
    }

    #[test]
    fn test_rayleigh_drag_is_linear_decay() {
        let (mesh, coord, mut aux, mut state) = setup();
        let nl = mesh.n_layers;
        state.normal_velocity_mut(TimeLevel::Cur).fill(0.25);
        aux.compute_all(&mesh, &coord, &state, TimeLevel::Cur, TimeLevel::Cur);
        let mut config = TendencyConfig::disabled();
        config.rayleigh_drag_enable = true;
        config.rayleigh_drag_coeff = 2.0;
        let mut tend = Tendencies::new(&mesh, config, 1);
        tend.compute_velocity_tendency(
            &mesh,
            &coord,
            &aux,
            &state,
            TimeLevel::Cur,
            TimeLevel::Cur,
            0.0,
        );
        for e in 0..mesh.n_edges_owned {
            for k in 0..nl {
                assert!((tend.normal_velocity_tend[e * nl + k] + 0.5).abs() < 1e-14);
            }
        }
    }

    #[test]
    fn test_custom_hook_runs_after_builtin_terms() {
        struct Shift;
        impl CustomTendency for Shift {
            fn velocity(
                &self,
                tendency: &mut [f64],
                _mesh: &LocalMesh,
                _coord: &VerticalCoord,
                _state: &OceanState,
                _level: TimeLevel,
                _time: f64,
            ) {
                for v in tendency.iter_mut() {
                    *v += 1.0;
                }
            }
        }

        let (mesh, coord, mut aux, mut state) = setup();
        state.normal_velocity_mut(TimeLevel::Cur).fill(0.5);
        aux.compute_all(&mesh, &coord, &state, TimeLevel::Cur, TimeLevel::Cur);
        let mut config = TendencyConfig::disabled();
        config.rayleigh_drag_enable = true;
        config.rayleigh_drag_coeff = 1.0;
        let mut tend = Tendencies::new(&mesh, config, 1);
        tend.set_custom(Box::new(Shift));
        tend.compute_velocity_tendency(
            &mesh,
            &coord,
            &aux,
            &state,
            TimeLevel::Cur,
            TimeLevel::Cur,
            0.0,
        );
        let nl = mesh.n_layers;
        for e in 0..mesh.n_edges_owned {
            assert!((tend.normal_velocity_tend[e * nl] - 0.5).abs() < 1e-14);
        }
    }

    #[test]
    fn test_field_registration_round_trip() {
        let (mesh, _, _, _) = setup();
        let tend = Tendencies::new(&mesh, TendencyConfig::disabled(), 1);
        let mut registry = crate::registry::FieldRegistry::new();
        tend.register_fields(&mut registry).unwrap();
        assert!(registry.contains("NormalVelocityTend"));
        tend.unregister_fields(&mut registry).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_min_halo_width_tracks_stencil_depth() {
        let mut config = TendencyConfig::disabled();
        assert_eq!(config.min_halo_width(), 1);
        config.ssh_gradient_enable = true;
        config.vel_diffusion_enable = true;
        config.tracer_diffusion_enable = true;
        assert_eq!(config.min_halo_width(), 1);
        config.pv_advection_enable = true;
        assert_eq!(config.min_halo_width(), 2);
        config.pv_advection_enable = false;
        config.vel_hyper_diffusion_enable = true;
        assert_eq!(config.min_halo_width(), 2);
    }

    #[test]
    fn test_missing_enable_flag_is_fatal() {
        let config = Config::from_json_str(
            r#"{ "Tendencies": { "ThicknessFluxTendencyEnable": true } }"#,
        )
        .unwrap();
        assert!(matches!(
            TendencyConfig::from_config(&config),
            Err(ConfigError::MissingKey { .. })
        ));
    }

    #[test]
    fn test_enabled_term_requires_its_coefficient() {
        let config = Config::from_json_str(
            r#"{ "Tendencies": {
                "ThicknessFluxTendencyEnable": false,
                "PVTendencyEnable": false,
                "KEGradTendencyEnable": false,
                "SSHGradTendencyEnable": false,
                "VelDiffTendencyEnable": true,
                "VelHyperDiffTendencyEnable": false,
                "WindForcingTendencyEnable": false,
                "BottomDragTendencyEnable": false,
                "RayleighDragTendencyEnable": false,
                "TracerAdvTendencyEnable": false,
                "TracerDiffTendencyEnable": false,
                "TracerHyperDiffTendencyEnable": false
            } }"#,
        )
        .unwrap();
        let err = TendencyConfig::from_config(&config).unwrap_err();
        match err {
            ConfigError::MissingKey { key, .. } => assert_eq!(key, "ViscDel2"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
