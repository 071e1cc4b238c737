//! The vertical coordinate: bounds plus the four per-column computations.

use crate::config::Config;
use crate::error::ConfigError;
use crate::mesh::LocalMesh;
use crate::types::constants::{GRAVITY, RHO0};
use crate::types::layer::active_range;

use super::bounds;

/// How the layer interfaces move in response to column expansion and
/// contraction: the per-layer weight profile that redistributes the
/// pressure-derived thickness residual.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementProfile {
    /// All movement absorbed by the top layer; interior interfaces stay on
    /// the reference profile (a z-star-like coordinate).
    Fixed,
    /// Movement spread evenly over the column's active layers.
    Uniform,
}

impl MovementProfile {
    const CHOICES: &'static [&'static str] = &["Fixed", "Uniform"];

    fn weights(self, n_layers: usize) -> Vec<f64> {
        match self {
            MovementProfile::Fixed => {
                let mut w = vec![0.0; n_layers];
                w[0] = 1.0;
                w
            }
            MovementProfile::Uniform => vec![1.0; n_layers],
        }
    }
}

/// Per-column active-layer bounds and the vertically-integrated fields
/// recomputed from state every step.
///
/// The per-(cell, layer) arrays are flattened `[n_cells_size * n_layers]`,
/// layer fastest. `pressure_interface[c][k]` holds the pressure at the lower
/// interface of layer `k` (the surface value is the forcing input, not
/// stored); `z_interface[c][k]` holds the height of the upper interface of
/// layer `k`. Entries outside a column's active range are left at zero.
#[derive(Clone, Debug)]
pub struct VerticalCoord {
    pub n_layers: usize,

    // Per-cell bounds, copied from the mesh at construction.
    pub min_layer_cell: Vec<i32>,
    pub max_layer_cell: Vec<i32>,

    // Derived per-edge and per-vertex bounds (Top = min-reduce, Bot =
    // max-reduce over wet adjoining cells).
    pub min_layer_edge_top: Vec<i32>,
    pub min_layer_edge_bot: Vec<i32>,
    pub max_layer_edge_top: Vec<i32>,
    pub max_layer_edge_bot: Vec<i32>,
    pub min_layer_vertex_top: Vec<i32>,
    pub min_layer_vertex_bot: Vec<i32>,
    pub max_layer_vertex_top: Vec<i32>,
    pub max_layer_vertex_bot: Vec<i32>,

    // Configuration-derived profiles, fixed after construction.
    pub ref_layer_thickness: Vec<f64>,
    pub movement_weights: Vec<f64>,

    // Recomputed every step.
    pub pressure_interface: Vec<f64>,
    pub pressure_mid: Vec<f64>,
    pub z_interface: Vec<f64>,
    pub z_mid: Vec<f64>,
    pub geopotential_mid: Vec<f64>,
    pub layer_thickness_target: Vec<f64>,
}

impl VerticalCoord {
    /// Build the coordinate from the `VertCoord` configuration group
    /// (`MovementWeights` choice and `RefLayerThickness` profile).
    pub fn from_config(mesh: &LocalMesh, config: &Config) -> Result<Self, ConfigError> {
        let group = config.group("VertCoord")?;
        let profile = match group.get_choice("MovementWeights", MovementProfile::CHOICES)? {
            0 => MovementProfile::Fixed,
            _ => MovementProfile::Uniform,
        };
        let ref_thickness = group.get_real_list("RefLayerThickness")?;
        if ref_thickness.len() != mesh.n_layers {
            return Err(ConfigError::WrongType {
                group: group.name().to_string(),
                key: "RefLayerThickness".to_string(),
                expected: "array with one entry per vertical layer",
            });
        }
        Ok(Self::new(mesh, profile, ref_thickness))
    }

    /// Build the coordinate from an explicit profile (tests, drivers).
    pub fn new(mesh: &LocalMesh, profile: MovementProfile, ref_layer_thickness: Vec<f64>) -> Self {
        assert_eq!(
            ref_layer_thickness.len(),
            mesh.n_layers,
            "reference thickness profile must have one entry per layer"
        );
        let nl = mesh.n_layers;
        let field = vec![0.0; mesh.n_cells_size * nl];
        let eb = bounds::edge_bounds(mesh);
        let vb = bounds::vertex_bounds(mesh);
        Self {
            n_layers: nl,
            min_layer_cell: mesh.min_level_cell.clone(),
            max_layer_cell: mesh.max_level_cell.clone(),
            min_layer_edge_top: eb.min_top,
            min_layer_edge_bot: eb.min_bot,
            max_layer_edge_top: eb.max_top,
            max_layer_edge_bot: eb.max_bot,
            min_layer_vertex_top: vb.min_top,
            min_layer_vertex_bot: vb.min_bot,
            max_layer_vertex_top: vb.max_top,
            max_layer_vertex_bot: vb.max_bot,
            movement_weights: profile.weights(nl),
            ref_layer_thickness,
            pressure_interface: field.clone(),
            pressure_mid: field.clone(),
            z_interface: field.clone(),
            z_mid: field.clone(),
            geopotential_mid: field.clone(),
            layer_thickness_target: field,
        }
    }

    /// Active layers of cell `c` as an index range (empty for dry columns).
    #[inline]
    pub fn cell_range(&self, c: usize) -> std::ops::Range<usize> {
        active_range(self.min_layer_cell[c], self.max_layer_cell[c])
    }

    /// Hydrostatic pressure: a top-down prefix sum of `g ρ₀ h` per column,
    /// seeded by the surface pressure at the top interface. Midpoint values
    /// are the interface value minus half the local increment.
    pub fn compute_pressure(&mut self, layer_thickness: &[f64], surface_pressure: &[f64]) {
        let nl = self.n_layers;
        debug_assert_eq!(layer_thickness.len(), self.pressure_interface.len());
        debug_assert_eq!(
            surface_pressure.len() * nl,
            self.pressure_interface.len(),
            "one surface pressure entry per cell"
        );
        let (min, max) = (&self.min_layer_cell, &self.max_layer_cell);
        self.pressure_interface
            .chunks_mut(nl)
            .zip(self.pressure_mid.chunks_mut(nl))
            .zip(layer_thickness.chunks(nl))
            .enumerate()
            .for_each(|(c, ((p_int, p_mid), h))| {
                column_pressure(min[c], max[c], h, surface_pressure[c], p_int, p_mid);
            });
    }

    /// Parallel version of [`compute_pressure`](Self::compute_pressure):
    /// columns are independent, so the outer sweep maps over cells.
    #[cfg(feature = "parallel")]
    pub fn compute_pressure_parallel(&mut self, layer_thickness: &[f64], surface_pressure: &[f64]) {
        use rayon::prelude::*;
        let nl = self.n_layers;
        debug_assert_eq!(layer_thickness.len(), self.pressure_interface.len());
        debug_assert_eq!(
            surface_pressure.len() * nl,
            self.pressure_interface.len(),
            "one surface pressure entry per cell"
        );
        let (min, max) = (&self.min_layer_cell, &self.max_layer_cell);
        self.pressure_interface
            .par_chunks_mut(nl)
            .zip(self.pressure_mid.par_chunks_mut(nl))
            .zip(layer_thickness.par_chunks(nl))
            .enumerate()
            .for_each(|(c, ((p_int, p_mid), h))| {
                column_pressure(min[c], max[c], h, surface_pressure[c], p_int, p_mid);
            });
    }

    /// Geometric height: a bottom-up prefix sum of `ρ₀ α h` per column,
    /// seeded by `-bottomDepth` at the bottom interface. `specific_volume`
    /// is `α = 1/ρ` per (cell, layer).
    pub fn compute_z_height(
        &mut self,
        mesh: &LocalMesh,
        layer_thickness: &[f64],
        specific_volume: &[f64],
    ) {
        let nl = self.n_layers;
        debug_assert_eq!(layer_thickness.len(), self.z_interface.len());
        debug_assert_eq!(specific_volume.len(), self.z_interface.len());
        let (min, max) = (&self.min_layer_cell, &self.max_layer_cell);
        self.z_interface
            .chunks_mut(nl)
            .zip(self.z_mid.chunks_mut(nl))
            .zip(layer_thickness.chunks(nl).zip(specific_volume.chunks(nl)))
            .enumerate()
            .for_each(|(c, ((z_int, z_mid), (h, alpha)))| {
                column_z_height(min[c], max[c], h, alpha, mesh.bottom_depth[c], z_int, z_mid);
            });
    }

    /// Parallel version of [`compute_z_height`](Self::compute_z_height).
    #[cfg(feature = "parallel")]
    pub fn compute_z_height_parallel(
        &mut self,
        mesh: &LocalMesh,
        layer_thickness: &[f64],
        specific_volume: &[f64],
    ) {
        use rayon::prelude::*;
        let nl = self.n_layers;
        debug_assert_eq!(layer_thickness.len(), self.z_interface.len());
        let (min, max) = (&self.min_layer_cell, &self.max_layer_cell);
        let bottom_depth = &mesh.bottom_depth;
        self.z_interface
            .par_chunks_mut(nl)
            .zip(self.z_mid.par_chunks_mut(nl))
            .zip(
                layer_thickness
                    .par_chunks(nl)
                    .zip(specific_volume.par_chunks(nl)),
            )
            .enumerate()
            .for_each(|(c, ((z_int, z_mid), (h, alpha)))| {
                column_z_height(min[c], max[c], h, alpha, bottom_depth[c], z_int, z_mid);
            });
    }

    /// Geopotential at layer midpoints: pointwise `g zMid + tidal + SAL`
    /// per active layer. The tidal potential and self-attraction/loading
    /// inputs are per-cell surface fields applied to the whole column.
    pub fn compute_geopotential(&mut self, tidal_potential: &[f64], self_attraction: &[f64]) {
        let nl = self.n_layers;
        debug_assert_eq!(
            tidal_potential.len() * nl,
            self.geopotential_mid.len(),
            "one tidal potential entry per cell"
        );
        debug_assert_eq!(
            self_attraction.len(),
            tidal_potential.len(),
            "one self-attraction entry per cell"
        );
        let (min, max) = (&self.min_layer_cell, &self.max_layer_cell);
        self.geopotential_mid
            .chunks_mut(nl)
            .zip(self.z_mid.chunks(nl))
            .enumerate()
            .for_each(|(c, (phi, z_mid))| {
                for k in active_range(min[c], max[c]) {
                    phi[k] = GRAVITY * z_mid[k] + tidal_potential[c] + self_attraction[c];
                }
            });
    }

    /// Target layer thickness: the reference profile plus the column's
    /// pressure-derived thickness residual redistributed by the movement
    /// weights. Requires [`compute_pressure`](Self::compute_pressure) to
    /// have run with the same `surface_pressure`.
    ///
    /// The residual is `(p_bottom - p_surface)/(g ρ₀) - Σ refThickness` over
    /// the active range; layer `k` receives the share `w(k) / Σ w` of it. A
    /// column whose active range has zero total weight puts the whole
    /// residual in its top active layer, so the column total is conserved
    /// for every profile.
    pub fn compute_target_thickness(&mut self, surface_pressure: &[f64]) {
        let nl = self.n_layers;
        debug_assert_eq!(
            surface_pressure.len() * nl,
            self.pressure_interface.len(),
            "one surface pressure entry per cell"
        );
        let (min, max) = (&self.min_layer_cell, &self.max_layer_cell);
        let refs = &self.ref_layer_thickness;
        let weights = &self.movement_weights;
        self.layer_thickness_target
            .chunks_mut(nl)
            .zip(self.pressure_interface.chunks(nl))
            .enumerate()
            .for_each(|(c, (target, p_int))| {
                let range = active_range(min[c], max[c]);
                if range.is_empty() {
                    return;
                }
                let p_bottom = p_int[range.end - 1];
                let column = (p_bottom - surface_pressure[c]) / (GRAVITY * RHO0);
                let ref_sum: f64 = range.clone().map(|k| refs[k]).sum();
                let w_sum: f64 = range.clone().map(|k| weights[k]).sum();
                let residual = column - ref_sum;
                let top = range.start;
                for k in range {
                    target[k] = refs[k]
                        + if w_sum > 0.0 {
                            residual * weights[k] / w_sum
                        } else {
                            0.0
                        };
                }
                if w_sum <= 0.0 {
                    target[top] += residual;
                }
            });
    }
}

#[inline]
fn column_pressure(
    min_layer: i32,
    max_layer: i32,
    layer_thickness: &[f64],
    surface_pressure: f64,
    p_interface: &mut [f64],
    p_mid: &mut [f64],
) {
    let mut p = surface_pressure;
    for k in active_range(min_layer, max_layer) {
        let inc = GRAVITY * RHO0 * layer_thickness[k];
        p += inc;
        p_interface[k] = p;
        p_mid[k] = p - 0.5 * inc;
    }
}

#[inline]
fn column_z_height(
    min_layer: i32,
    max_layer: i32,
    layer_thickness: &[f64],
    specific_volume: &[f64],
    bottom_depth: f64,
    z_interface: &mut [f64],
    z_mid: &mut [f64],
) {
    let mut z = -bottom_depth;
    for k in active_range(min_layer, max_layer).rev() {
        let dz = RHO0 * specific_volume[k] * layer_thickness[k];
        z += dz;
        z_interface[k] = z;
        z_mid[k] = z - 0.5 * dz;
    }
}
