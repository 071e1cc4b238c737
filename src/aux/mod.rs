//! Auxiliary (diagnostic) state computed from the prognostic fields.
//!
//! Six sub-aggregates, each owning its output arrays, chained in a fixed
//! stage order that flattens the dependency DAG into sequential sweeps:
//!
//! 1. vertex vorticity and cell kinetic-energy/divergence (raw state only),
//! 2. edge aggregates: thickness-on-edge, vorticity-on-edge, wind stress,
//! 3. the velocity Laplacian at edges (needs stage-1 cell/vertex results),
//! 4. divergence and curl of the Laplacian (needs stage 3),
//! 5. tracer edge/Laplacian fields (needs stage 2).
//!
//! The ordering is a correctness contract: reordering stages silently feeds
//! stale or zero inputs downstream. Output arrays are written only by their
//! owning aggregate's compute calls; input state is never mutated.

mod del2;
mod kinetic;
mod layer_thickness;
mod tracer;
mod vorticity;
mod wind;

pub use del2::VelocityDel2AuxVars;
pub use kinetic::KineticAuxVars;
pub use layer_thickness::{FluxInterp, LayerThicknessAuxVars};
pub use tracer::TracerAuxVars;
pub use vorticity::VorticityAuxVars;
pub use wind::WindForcingAuxVars;

use crate::config::Config;
use crate::error::{ConfigError, RegistryError};
use crate::mesh::LocalMesh;
use crate::registry::{FieldMetadata, FieldRegistry};
use crate::state::{OceanState, TimeLevel};
use crate::vertical::VerticalCoord;

/// The full auxiliary-state bundle for one mesh.
#[derive(Clone, Debug)]
pub struct AuxiliaryState {
    pub kinetic: KineticAuxVars,
    pub layer_thickness: LayerThicknessAuxVars,
    pub vorticity: VorticityAuxVars,
    pub del2: VelocityDel2AuxVars,
    pub wind: WindForcingAuxVars,
    pub tracer: TracerAuxVars,
}

fn flux_interp_or_center(config: &Config, key: &str) -> Result<FluxInterp, ConfigError> {
    let group = match config.group("Advection") {
        Ok(group) => group,
        Err(ConfigError::MissingGroup(_)) => return Ok(FluxInterp::Center),
        Err(e) => return Err(e),
    };
    match FluxInterp::from_config(&group, key) {
        Ok(interp) => Ok(interp),
        Err(ConfigError::MissingKey { .. }) => Ok(FluxInterp::Center),
        Err(e) => Err(e),
    }
}

impl AuxiliaryState {
    /// Allocate all sub-aggregates; interpolation schemes come from the
    /// `Advection` group (defaulting to centered), wind stress from the
    /// optional `WindStress` group.
    pub fn new(mesh: &LocalMesh, config: &Config, n_tracers: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            kinetic: KineticAuxVars::new(mesh),
            layer_thickness: LayerThicknessAuxVars::new(
                mesh,
                flux_interp_or_center(config, "FluxThicknessType")?,
            ),
            vorticity: VorticityAuxVars::new(mesh),
            del2: VelocityDel2AuxVars::new(mesh),
            wind: WindForcingAuxVars::from_config(mesh, config)?,
            tracer: TracerAuxVars::new(
                mesh,
                flux_interp_or_center(config, "FluxTracerType")?,
                n_tracers,
            ),
        })
    }

    /// Momentum-side sweeps (stages 1 through 4).
    pub fn compute_mom_aux(
        &mut self,
        mesh: &LocalMesh,
        coord: &VerticalCoord,
        state: &OceanState,
        thick_level: TimeLevel,
        vel_level: TimeLevel,
    ) {
        let h = state.layer_thickness(thick_level);
        let u = state.normal_velocity(vel_level);

        // Stage 1: depends only on raw state.
        self.kinetic.compute(mesh, coord, u);
        self.vorticity.compute_vertex(mesh, coord, h, u);

        // Stage 2: edge aggregates over stage-1 and raw inputs.
        self.layer_thickness.compute(mesh, coord, h, u);
        self.vorticity.compute_edge(mesh, coord);
        self.wind.compute(mesh);

        // Stages 3 and 4: the Laplacian and its derivatives.
        self.del2.compute_edge(
            mesh,
            coord,
            &self.kinetic.velocity_div_cell,
            &self.vorticity.rel_vort_vertex,
        );
        self.del2.compute_cell_vertex(mesh, coord);
    }

    /// All sweeps, tracers included (stage 5 after the momentum stages).
    pub fn compute_all(
        &mut self,
        mesh: &LocalMesh,
        coord: &VerticalCoord,
        state: &OceanState,
        thick_level: TimeLevel,
        vel_level: TimeLevel,
    ) {
        self.compute_mom_aux(mesh, coord, state, thick_level, vel_level);
        self.tracer.compute(
            mesh,
            coord,
            state.tracers(thick_level),
            state.normal_velocity(vel_level),
            &self.layer_thickness.flux_layer_thick_edge,
            &self.layer_thickness.mean_layer_thick_edge,
        );
    }

    const FIELDS: &'static [(&'static str, &'static str, &'static str)] = &[
        ("KineticEnergyCell", "kinetic energy per unit mass at cell centers", "m^2 s^-2"),
        ("VelocityDivCell", "horizontal velocity divergence", "s^-1"),
        ("MeanLayerThickEdge", "centered layer thickness at edges", "m"),
        ("FluxLayerThickEdge", "flux layer thickness at edges", "m"),
        ("RelVortVertex", "relative vorticity at vertices", "s^-1"),
        ("LayerThickVertex", "layer thickness at vertices", "m"),
        ("NormRelVortVertex", "normalized relative vorticity at vertices", "m^-1 s^-1"),
        ("NormPlanetVortVertex", "normalized planetary vorticity at vertices", "m^-1 s^-1"),
        ("NormRelVortEdge", "normalized relative vorticity at edges", "m^-1 s^-1"),
        ("NormPlanetVortEdge", "normalized planetary vorticity at edges", "m^-1 s^-1"),
        ("Del2Edge", "Laplacian of normal velocity", "m^-1 s^-1"),
        ("Del2DivCell", "divergence of the velocity Laplacian", "m^-2 s^-1"),
        ("Del2RelVortVertex", "curl of the velocity Laplacian", "m^-2 s^-1"),
        ("NormalStressEdge", "normal surface wind stress at edges", "N m^-2"),
        ("HTracersEdge", "thickness-weighted tracers at edges", "m"),
        ("Del2TracersCell", "thickness-weighted tracer Laplacian", "m^-1"),
    ];

    /// Register every output field with the metadata registry. Numerical
    /// results do not depend on this; the I/O layer does.
    pub fn register_fields(&self, registry: &mut FieldRegistry) -> Result<(), RegistryError> {
        for &(name, description, units) in Self::FIELDS {
            registry.define(FieldMetadata::new(name, description, units))?;
        }
        Ok(())
    }

    /// Remove this aggregate's field definitions (teardown path).
    pub fn unregister_fields(&self, registry: &mut FieldRegistry) -> Result<(), RegistryError> {
        for &(name, _, _) in Self::FIELDS {
            registry.remove(name)?;
        }
        Ok(())
    }
}
