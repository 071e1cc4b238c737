//! One rank's localized mesh.
//!
//! All connectivity is in local indices. Entries that would leave the local
//! domain are redirected to the per-kind sentinel slot (`n_all`), whose
//! geometry is padded with harmless values (unit lengths and areas, dry
//! column) and whose field values every consumer keeps at zero. Stencil
//! loops therefore never branch on "is this neighbor present".
//!
//! The localized mesh also carries the two derived sign arrays the operators
//! bind to:
//! - `edge_sign_on_cell[c][s]`: +1 where the normal of edge `s` points out
//!   of cell `c` (the normal runs from `cells_on_edge[0]` to
//!   `cells_on_edge[1]`).
//! - `edge_sign_on_vertex[v][s]`: +1 where the normal of edge `s` is
//!   counter-clockwise around vertex `v` (the edge tangent, `vertices_on_edge`
//!   entry 0 to entry 1, is the normal rotated +90°, so this is +1 exactly
//!   when `v` is the tangent's head).

use crate::decomp::Decomp;
use crate::mesh::GlobalMesh;
use crate::types::{is_valid_global, layer::DRY_LAYER};

/// Rank-local mesh: counts, localized connectivity, geometry, and sign
/// arrays. Construction goes through [`Decomp::local_mesh`].
#[derive(Clone, Debug)]
pub struct LocalMesh {
    pub n_cells_owned: usize,
    pub n_cells_all: usize,
    pub n_cells_size: usize,
    pub n_edges_owned: usize,
    pub n_edges_all: usize,
    pub n_edges_size: usize,
    pub n_vertices_owned: usize,
    pub n_vertices_all: usize,
    pub n_vertices_size: usize,

    pub n_layers: usize,
    pub max_edges: usize,
    pub vertex_degree: usize,
    pub max_edges_on_edge: usize,

    /// Sentinel indices (`n_all` of each kind).
    pub sentinel_cell: usize,
    pub sentinel_edge: usize,
    pub sentinel_vertex: usize,

    // Localized connectivity; sentinel-padded, sized over `n_*_all` entities.
    pub cells_on_cell: Vec<usize>,
    pub edges_on_cell: Vec<usize>,
    pub vertices_on_cell: Vec<usize>,
    pub n_edges_on_cell: Vec<usize>,
    pub cells_on_edge: Vec<usize>,
    pub vertices_on_edge: Vec<usize>,
    pub cells_on_vertex: Vec<usize>,
    pub edges_on_vertex: Vec<usize>,
    pub edges_on_edge: Vec<usize>,
    pub n_edges_on_edge: Vec<usize>,
    pub weights_on_edge: Vec<f64>,

    // Geometry, sized over `n_*_size` with a padded sentinel slot.
    pub x_cell: Vec<f64>,
    pub y_cell: Vec<f64>,
    pub x_edge: Vec<f64>,
    pub y_edge: Vec<f64>,
    pub x_vertex: Vec<f64>,
    pub y_vertex: Vec<f64>,
    pub dc_edge: Vec<f64>,
    pub dv_edge: Vec<f64>,
    pub area_cell: Vec<f64>,
    pub area_triangle: Vec<f64>,
    pub kite_areas_on_vertex: Vec<f64>,
    pub angle_edge: Vec<f64>,
    pub f_vertex: Vec<f64>,
    pub f_edge: Vec<f64>,
    pub bottom_depth: Vec<f64>,

    /// Per-column vertical bounds (sentinel cell is dry).
    pub max_level_cell: Vec<i32>,
    pub min_level_cell: Vec<i32>,

    /// Outward-normal signs, `[n_cells_all * max_edges]`.
    pub edge_sign_on_cell: Vec<f64>,
    /// Counter-clockwise circulation signs, `[n_vertices_all * vertex_degree]`.
    pub edge_sign_on_vertex: Vec<f64>,
}

impl LocalMesh {
    /// Localize `global` onto the rank described by `decomp`.
    pub(crate) fn localize(decomp: &Decomp, global: &GlobalMesh) -> Self {
        let cells = decomp.cells;
        let edges = decomp.edges;
        let vertices = decomp.vertices;

        let map_cell = |g: usize| -> usize {
            if is_valid_global(g) {
                *decomp.cell_g2l.get(&g).unwrap_or(&cells.sentinel())
            } else {
                cells.sentinel()
            }
        };
        let map_edge = |g: usize| -> usize {
            if is_valid_global(g) {
                *decomp.edge_g2l.get(&g).unwrap_or(&edges.sentinel())
            } else {
                edges.sentinel()
            }
        };
        let map_vertex = |g: usize| -> usize {
            if is_valid_global(g) {
                *decomp.vertex_g2l.get(&g).unwrap_or(&vertices.sentinel())
            } else {
                vertices.sentinel()
            }
        };

        let me = global.max_edges;
        let vd = global.vertex_degree;
        let meoe = global.max_edges_on_edge;

        let mut mesh = Self {
            n_cells_owned: cells.n_owned,
            n_cells_all: cells.n_all,
            n_cells_size: cells.n_size(),
            n_edges_owned: edges.n_owned,
            n_edges_all: edges.n_all,
            n_edges_size: edges.n_size(),
            n_vertices_owned: vertices.n_owned,
            n_vertices_all: vertices.n_all,
            n_vertices_size: vertices.n_size(),
            n_layers: global.n_layers,
            max_edges: me,
            vertex_degree: vd,
            max_edges_on_edge: meoe,
            sentinel_cell: cells.sentinel(),
            sentinel_edge: edges.sentinel(),
            sentinel_vertex: vertices.sentinel(),
            cells_on_cell: vec![cells.sentinel(); cells.n_all * me],
            edges_on_cell: vec![edges.sentinel(); cells.n_all * me],
            vertices_on_cell: vec![vertices.sentinel(); cells.n_all * me],
            n_edges_on_cell: vec![0; cells.n_all],
            cells_on_edge: vec![cells.sentinel(); edges.n_all * 2],
            vertices_on_edge: vec![vertices.sentinel(); edges.n_all * 2],
            cells_on_vertex: vec![cells.sentinel(); vertices.n_all * vd],
            edges_on_vertex: vec![edges.sentinel(); vertices.n_all * vd],
            edges_on_edge: vec![edges.sentinel(); edges.n_all * meoe],
            n_edges_on_edge: vec![0; edges.n_all],
            weights_on_edge: vec![0.0; edges.n_all * meoe],
            x_cell: vec![0.0; cells.n_size()],
            y_cell: vec![0.0; cells.n_size()],
            x_edge: vec![0.0; edges.n_size()],
            y_edge: vec![0.0; edges.n_size()],
            x_vertex: vec![0.0; vertices.n_size()],
            y_vertex: vec![0.0; vertices.n_size()],
            dc_edge: vec![1.0; edges.n_size()],
            dv_edge: vec![1.0; edges.n_size()],
            area_cell: vec![1.0; cells.n_size()],
            area_triangle: vec![1.0; vertices.n_size()],
            kite_areas_on_vertex: vec![0.0; vertices.n_all * vd],
            angle_edge: vec![0.0; edges.n_size()],
            f_vertex: vec![0.0; vertices.n_size()],
            f_edge: vec![0.0; edges.n_size()],
            bottom_depth: vec![0.0; cells.n_size()],
            max_level_cell: vec![DRY_LAYER; cells.n_size()],
            min_level_cell: vec![0; cells.n_size()],
            edge_sign_on_cell: vec![0.0; cells.n_all * me],
            edge_sign_on_vertex: vec![0.0; vertices.n_all * vd],
        };

        for (lc, &g) in decomp.cell_l2g.iter().enumerate() {
            mesh.n_edges_on_cell[lc] = global.n_edges_on_cell[g];
            for s in 0..global.n_edges_on_cell[g] {
                mesh.cells_on_cell[lc * me + s] = map_cell(global.cells_on_cell[g * me + s]);
                mesh.edges_on_cell[lc * me + s] = map_edge(global.edges_on_cell[g * me + s]);
                mesh.vertices_on_cell[lc * me + s] =
                    map_vertex(global.vertices_on_cell[g * me + s]);
            }
            mesh.x_cell[lc] = global.x_cell[g];
            mesh.y_cell[lc] = global.y_cell[g];
            mesh.area_cell[lc] = global.area_cell[g];
            mesh.bottom_depth[lc] = global.bottom_depth[g];
            mesh.max_level_cell[lc] = global.max_level_cell[g];
            mesh.min_level_cell[lc] = global.min_level_cell[g];
        }

        for (le, &g) in decomp.edge_l2g.iter().enumerate() {
            for s in 0..2 {
                mesh.cells_on_edge[le * 2 + s] = map_cell(global.cells_on_edge[g * 2 + s]);
                mesh.vertices_on_edge[le * 2 + s] =
                    map_vertex(global.vertices_on_edge[g * 2 + s]);
            }
            mesh.n_edges_on_edge[le] = global.n_edges_on_edge[g];
            for s in 0..global.n_edges_on_edge[g] {
                mesh.edges_on_edge[le * meoe + s] = map_edge(global.edges_on_edge[g * meoe + s]);
                mesh.weights_on_edge[le * meoe + s] = global.weights_on_edge[g * meoe + s];
            }
            mesh.x_edge[le] = global.x_edge[g];
            mesh.y_edge[le] = global.y_edge[g];
            mesh.dc_edge[le] = global.dc_edge[g];
            mesh.dv_edge[le] = global.dv_edge[g];
            mesh.angle_edge[le] = global.angle_edge[g];
            mesh.f_edge[le] = global.f_edge[g];
        }

        for (lv, &g) in decomp.vertex_l2g.iter().enumerate() {
            for s in 0..vd {
                mesh.cells_on_vertex[lv * vd + s] = map_cell(global.cells_on_vertex[g * vd + s]);
                mesh.edges_on_vertex[lv * vd + s] = map_edge(global.edges_on_vertex[g * vd + s]);
                mesh.kite_areas_on_vertex[lv * vd + s] = global.kite_areas_on_vertex[g * vd + s];
            }
            mesh.x_vertex[lv] = global.x_vertex[g];
            mesh.y_vertex[lv] = global.y_vertex[g];
            mesh.area_triangle[lv] = global.area_triangle[g];
            mesh.f_vertex[lv] = global.f_vertex[g];
        }

        mesh.compute_edge_signs();
        mesh
    }

    /// Localize a global mesh onto a single rank (tests and serial runs).
    pub fn serial(global: &GlobalMesh) -> Self {
        use crate::decomp::{ContiguousPartitioner, Decomp};
        let decomps = Decomp::build_all(global, &ContiguousPartitioner, 1, 1)
            .expect("serial decomposition of a validated mesh cannot fail");
        decomps[0].local_mesh(global)
    }

    fn compute_edge_signs(&mut self) {
        for c in 0..self.n_cells_all {
            for s in 0..self.n_edges_on_cell[c] {
                let e = self.edges_on_cell[c * self.max_edges + s];
                if e == self.sentinel_edge {
                    continue;
                }
                self.edge_sign_on_cell[c * self.max_edges + s] =
                    if self.cells_on_edge[e * 2] == c { 1.0 } else { -1.0 };
            }
        }
        for v in 0..self.n_vertices_all {
            for s in 0..self.vertex_degree {
                let e = self.edges_on_vertex[v * self.vertex_degree + s];
                if e == self.sentinel_edge {
                    continue;
                }
                self.edge_sign_on_vertex[v * self.vertex_degree + s] =
                    if self.vertices_on_edge[e * 2 + 1] == v {
                        1.0
                    } else {
                        -1.0
                    };
            }
        }
    }

    /// Edges of cell `c` with their outward signs.
    #[inline]
    pub fn cell_edges(&self, c: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        (0..self.n_edges_on_cell[c]).map(move |s| {
            (
                self.edges_on_cell[c * self.max_edges + s],
                self.edge_sign_on_cell[c * self.max_edges + s],
            )
        })
    }

    /// Edges at vertex `v` with their circulation signs.
    #[inline]
    pub fn vertex_edges(&self, v: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        (0..self.vertex_degree).map(move |s| {
            (
                self.edges_on_vertex[v * self.vertex_degree + s],
                self.edge_sign_on_vertex[v * self.vertex_degree + s],
            )
        })
    }
}
