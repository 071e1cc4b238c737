//! Derived edge/vertex active-layer bounds.
//!
//! Edges and vertices touch several columns whose bottoms differ, so each
//! carries two variants of each bound: `Top` is the min-reduction over the
//! wet adjoining cells (the shallowest view, where every neighbor is still
//! active) and `Bot` is the max-reduction (the deepest view, where at least
//! one neighbor is active). All reductions go through
//! [`BoundsReduce`](crate::types::layer::BoundsReduce), so dry cells —
//! including the sentinel slot — never win a comparison.

use crate::mesh::LocalMesh;
use crate::types::layer::{BoundsReduce, DRY_LAYER};

/// The Top/Bot bound variants for one element kind, sentinel slot included.
#[derive(Clone, Debug)]
pub(crate) struct DerivedBounds {
    pub min_top: Vec<i32>,
    pub min_bot: Vec<i32>,
    pub max_top: Vec<i32>,
    pub max_bot: Vec<i32>,
}

impl DerivedBounds {
    fn dry(n_size: usize) -> Self {
        Self {
            min_top: vec![0; n_size],
            min_bot: vec![DRY_LAYER; n_size],
            max_top: vec![0; n_size],
            max_bot: vec![DRY_LAYER; n_size],
        }
    }

    fn set(&mut self, i: usize, min: BoundsReduce, max: BoundsReduce) {
        (self.min_top[i], self.min_bot[i]) = min.finish();
        (self.max_top[i], self.max_bot[i]) = max.finish();
    }
}

pub(crate) fn edge_bounds(mesh: &LocalMesh) -> DerivedBounds {
    let mut bounds = DerivedBounds::dry(mesh.n_edges_size);
    for e in 0..mesh.n_edges_all {
        let mut min = BoundsReduce::new();
        let mut max = BoundsReduce::new();
        for s in 0..2 {
            let c = mesh.cells_on_edge[e * 2 + s];
            min.fold(mesh.min_level_cell[c], mesh.max_level_cell[c]);
            max.fold(mesh.max_level_cell[c], mesh.max_level_cell[c]);
        }
        bounds.set(e, min, max);
    }
    bounds
}

pub(crate) fn vertex_bounds(mesh: &LocalMesh) -> DerivedBounds {
    let mut bounds = DerivedBounds::dry(mesh.n_vertices_size);
    for v in 0..mesh.n_vertices_all {
        let mut min = BoundsReduce::new();
        let mut max = BoundsReduce::new();
        for s in 0..mesh.vertex_degree {
            let c = mesh.cells_on_vertex[v * mesh.vertex_degree + s];
            min.fold(mesh.min_level_cell[c], mesh.max_level_cell[c]);
            max.fold(mesh.max_level_cell[c], mesh.max_level_cell[c]);
        }
        bounds.set(v, min, max);
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::GlobalMesh;
    use crate::types::layer::is_wet;

    #[test]
    fn test_edge_bounds_reduce_adjoining_cells() {
        let mut global = GlobalMesh::periodic_quad(4, 4, 1.0, 1.0, 8);
        // Staggered bounds so min and max differ across every edge.
        for c in 0..16 {
            global.min_level_cell[c] = (c % 3) as i32;
            global.max_level_cell[c] = 4 + (c % 4) as i32;
        }
        let mesh = crate::mesh::LocalMesh::serial(&global);

        let bounds = edge_bounds(&mesh);
        for e in 0..mesh.n_edges_all {
            let c1 = mesh.cells_on_edge[e * 2];
            let c2 = mesh.cells_on_edge[e * 2 + 1];
            assert_eq!(
                bounds.min_top[e],
                mesh.min_level_cell[c1].min(mesh.min_level_cell[c2])
            );
            assert_eq!(
                bounds.min_bot[e],
                mesh.min_level_cell[c1].max(mesh.min_level_cell[c2])
            );
            assert_eq!(
                bounds.max_top[e],
                mesh.max_level_cell[c1].min(mesh.max_level_cell[c2])
            );
            assert_eq!(
                bounds.max_bot[e],
                mesh.max_level_cell[c1].max(mesh.max_level_cell[c2])
            );
        }
    }

    #[test]
    fn test_dry_cell_never_wins_at_edges_or_vertices() {
        let mut global = GlobalMesh::periodic_quad(4, 4, 1.0, 1.0, 8);
        global.max_level_cell[5] = DRY_LAYER;
        global.min_level_cell[5] = 0;
        let mesh = crate::mesh::LocalMesh::serial(&global);

        let eb = edge_bounds(&mesh);
        for e in 0..mesh.n_edges_all {
            let wet: Vec<usize> = (0..2)
                .map(|s| mesh.cells_on_edge[e * 2 + s])
                .filter(|&c| is_wet(mesh.max_level_cell[c]))
                .collect();
            // All edges of cell 5 have exactly one wet neighbor; its bounds
            // pass through unchanged.
            if wet.len() == 1 {
                assert_eq!(eb.max_top[e], mesh.max_level_cell[wet[0]]);
                assert_eq!(eb.max_bot[e], mesh.max_level_cell[wet[0]]);
            }
        }

        let vb = vertex_bounds(&mesh);
        for v in 0..mesh.n_vertices_all {
            let wet_max: Vec<i32> = (0..mesh.vertex_degree)
                .map(|s| mesh.cells_on_vertex[v * mesh.vertex_degree + s])
                .filter(|&c| is_wet(mesh.max_level_cell[c]))
                .map(|c| mesh.max_level_cell[c])
                .collect();
            if !wet_max.is_empty() {
                assert_eq!(vb.max_bot[v], *wet_max.iter().max().unwrap());
                assert_eq!(vb.max_top[v], *wet_max.iter().min().unwrap());
            } else {
                assert_eq!(vb.max_bot[v], DRY_LAYER);
            }
        }
    }

    #[test]
    fn test_sentinel_slots_stay_dry() {
        let global = GlobalMesh::periodic_quad(4, 4, 1.0, 1.0, 3);
        let mesh = crate::mesh::LocalMesh::serial(&global);
        let eb = edge_bounds(&mesh);
        let vb = vertex_bounds(&mesh);
        assert_eq!(eb.max_bot[mesh.sentinel_edge], DRY_LAYER);
        assert_eq!(vb.max_bot[mesh.sentinel_vertex], DRY_LAYER);
    }
}
