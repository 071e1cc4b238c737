//! Prognostic ocean state.
//!
//! The model advances layer thickness (cells), normal velocity (edges), and
//! a set of named tracers (cells) through time. Each prognostic field keeps
//! two time levels: `Cur` is the level tendencies are evaluated from and
//! `New` is the level a stepper writes into; [`swap_time_levels`]
//! (OceanState::swap_time_levels) rotates them at the end of a step without
//! copying.
//!
//! Arrays are flattened `[element * n_layers + layer]` over the sentinel-
//! padded local extent; sentinel-slot values are kept at zero so operator
//! stencils that run into a truncated halo pick up nothing. Tracers are
//! stored concatenated, one cell-extent block per tracer.

use crate::error::HaloError;
use crate::halo::{Halo, Transport};
use crate::mesh::LocalMesh;
use crate::types::ElemKind;

/// Number of stored time levels per prognostic field.
pub const N_TIME_LEVELS: usize = 2;

/// Which stored time level to address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeLevel {
    /// The level tendencies read from.
    Cur,
    /// The level the active step writes into.
    New,
}

/// Layered prognostic state on one rank's partition.
#[derive(Clone, Debug)]
pub struct OceanState {
    pub n_layers: usize,
    pub n_cells_size: usize,
    pub n_edges_size: usize,
    pub tracer_names: Vec<String>,

    layer_thickness: [Vec<f64>; N_TIME_LEVELS],
    normal_velocity: [Vec<f64>; N_TIME_LEVELS],
    tracers: [Vec<f64>; N_TIME_LEVELS],
    cur: usize,
}

impl OceanState {
    /// Allocate a zeroed state sized to `mesh`, with one cell-anchored
    /// field per tracer name.
    pub fn new(mesh: &LocalMesh, tracer_names: &[&str]) -> Self {
        let nl = mesh.n_layers;
        let cell_extent = mesh.n_cells_size * nl;
        let edge_extent = mesh.n_edges_size * nl;
        let tracer_extent = tracer_names.len() * cell_extent;
        Self {
            n_layers: nl,
            n_cells_size: mesh.n_cells_size,
            n_edges_size: mesh.n_edges_size,
            tracer_names: tracer_names.iter().map(|s| s.to_string()).collect(),
            layer_thickness: [vec![0.0; cell_extent], vec![0.0; cell_extent]],
            normal_velocity: [vec![0.0; edge_extent], vec![0.0; edge_extent]],
            tracers: [vec![0.0; tracer_extent], vec![0.0; tracer_extent]],
            cur: 0,
        }
    }

    #[inline]
    fn slot(&self, level: TimeLevel) -> usize {
        match level {
            TimeLevel::Cur => self.cur,
            TimeLevel::New => 1 - self.cur,
        }
    }

    #[inline]
    pub fn n_tracers(&self) -> usize {
        self.tracer_names.len()
    }

    #[inline]
    pub fn layer_thickness(&self, level: TimeLevel) -> &[f64] {
        &self.layer_thickness[self.slot(level)]
    }

    #[inline]
    pub fn layer_thickness_mut(&mut self, level: TimeLevel) -> &mut [f64] {
        let slot = self.slot(level);
        &mut self.layer_thickness[slot]
    }

    #[inline]
    pub fn normal_velocity(&self, level: TimeLevel) -> &[f64] {
        &self.normal_velocity[self.slot(level)]
    }

    #[inline]
    pub fn normal_velocity_mut(&mut self, level: TimeLevel) -> &mut [f64] {
        let slot = self.slot(level);
        &mut self.normal_velocity[slot]
    }

    /// All tracers at `level`, concatenated tracer-major.
    #[inline]
    pub fn tracers(&self, level: TimeLevel) -> &[f64] {
        &self.tracers[self.slot(level)]
    }

    #[inline]
    pub fn tracers_mut(&mut self, level: TimeLevel) -> &mut [f64] {
        let slot = self.slot(level);
        &mut self.tracers[slot]
    }

    /// One tracer's cell-anchored block.
    #[inline]
    pub fn tracer(&self, level: TimeLevel, index: usize) -> &[f64] {
        let extent = self.n_cells_size * self.n_layers;
        &self.tracers(level)[index * extent..(index + 1) * extent]
    }

    #[inline]
    pub fn tracer_mut(&mut self, level: TimeLevel, index: usize) -> &mut [f64] {
        let extent = self.n_cells_size * self.n_layers;
        let slot = self.slot(level);
        &mut self.tracers[slot][index * extent..(index + 1) * extent]
    }

    /// Rotate time levels: the freshly written `New` level becomes `Cur`.
    pub fn swap_time_levels(&mut self) {
        self.cur = 1 - self.cur;
    }

    /// Synchronize the halo entries of every prognostic field at `level`.
    pub fn exchange_halos(
        &mut self,
        halo: &Halo,
        transport: &dyn Transport,
        level: TimeLevel,
    ) -> Result<(), HaloError> {
        let nl = self.n_layers;
        let slot = self.slot(level);
        halo.exchange(transport, ElemKind::Cell, nl, &mut self.layer_thickness[slot])?;
        halo.exchange(transport, ElemKind::Edge, nl, &mut self.normal_velocity[slot])?;
        let extent = self.n_cells_size * nl;
        for t in 0..self.n_tracers() {
            let block = &mut self.tracers[slot][t * extent..(t + 1) * extent];
            halo.exchange(transport, ElemKind::Cell, nl, block)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::GlobalMesh;

    fn state() -> OceanState {
        let global = GlobalMesh::periodic_quad(4, 4, 1.0, 1.0, 3);
        let mesh = LocalMesh::serial(&global);
        OceanState::new(&mesh, &["Temperature", "Salinity"])
    }

    #[test]
    fn test_extents_and_tracer_blocks() {
        let s = state();
        assert_eq!(s.layer_thickness(TimeLevel::Cur).len(), 17 * 3);
        assert_eq!(s.normal_velocity(TimeLevel::Cur).len(), 33 * 3);
        assert_eq!(s.n_tracers(), 2);
        assert_eq!(s.tracer(TimeLevel::Cur, 1).len(), 17 * 3);
    }

    #[test]
    fn test_swap_rotates_without_copying() {
        let mut s = state();
        s.layer_thickness_mut(TimeLevel::Cur)[0] = 1.0;
        s.layer_thickness_mut(TimeLevel::New)[0] = 2.0;
        s.swap_time_levels();
        assert_eq!(s.layer_thickness(TimeLevel::Cur)[0], 2.0);
        assert_eq!(s.layer_thickness(TimeLevel::New)[0], 1.0);
        s.swap_time_levels();
        assert_eq!(s.layer_thickness(TimeLevel::Cur)[0], 1.0);
    }

    #[test]
    fn test_tracer_blocks_are_disjoint() {
        let mut s = state();
        s.tracer_mut(TimeLevel::Cur, 0).fill(4.0);
        s.tracer_mut(TimeLevel::Cur, 1).fill(35.0);
        assert!(s.tracer(TimeLevel::Cur, 0).iter().all(|&v| v == 4.0));
        assert!(s.tracer(TimeLevel::Cur, 1).iter().all(|&v| v == 35.0));
    }
}
