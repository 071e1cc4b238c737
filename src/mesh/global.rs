//! Global (undecomposed) mesh connectivity and geometry.
//!
//! Connectivity arrays use global 0-based ids with [`INVALID_GLOBAL`] marking
//! absent neighbors (e.g. the missing second cell of a boundary edge).
//! Variable-degree arrays (`edges_on_cell` etc.) are dimensioned by the
//! maximum cell degree and padded with `INVALID_GLOBAL`.
//!
//! The doubly periodic planar quad mesh generator is the crate's refinement
//! and unit-test workhorse: it produces a closed domain on which the mimetic
//! operator identities hold exactly, with `vertex_degree = 4` and every
//! connectivity entry valid.

use log::warn;

use crate::error::MeshError;
use crate::types::{is_valid_global, INVALID_GLOBAL};

/// Full-domain mesh: counts, connectivity, geometry, and per-column vertical
/// bounds. All connectivity is by global id.
#[derive(Clone, Debug)]
pub struct GlobalMesh {
    /// Number of cells.
    pub n_cells: usize,
    /// Number of edges.
    pub n_edges: usize,
    /// Number of vertices.
    pub n_vertices: usize,
    /// Number of vertical layers allocated per column.
    pub n_layers: usize,
    /// Maximum number of edges (and vertices) on any cell.
    pub max_edges: usize,
    /// Number of cells/edges meeting at each vertex.
    pub vertex_degree: usize,
    /// Maximum entries in the tangential-reconstruction stencil of an edge.
    pub max_edges_on_edge: usize,

    /// Cell neighbors of each cell: `[n_cells * max_edges]`.
    pub cells_on_cell: Vec<usize>,
    /// Edges bounding each cell: `[n_cells * max_edges]`.
    pub edges_on_cell: Vec<usize>,
    /// Corner vertices of each cell: `[n_cells * max_edges]`.
    pub vertices_on_cell: Vec<usize>,
    /// Actual degree of each cell.
    pub n_edges_on_cell: Vec<usize>,
    /// The two cells adjoining each edge: `[n_edges * 2]`. The edge normal
    /// points from entry 0 toward entry 1.
    pub cells_on_edge: Vec<usize>,
    /// The two endpoint vertices of each edge: `[n_edges * 2]`, ordered so
    /// the tangent (entry 0 → entry 1) is the edge normal rotated +90°.
    pub vertices_on_edge: Vec<usize>,
    /// Cells around each vertex: `[n_vertices * vertex_degree]`.
    pub cells_on_vertex: Vec<usize>,
    /// Edges meeting at each vertex: `[n_vertices * vertex_degree]`.
    pub edges_on_vertex: Vec<usize>,
    /// Tangential-reconstruction stencil: `[n_edges * max_edges_on_edge]`.
    pub edges_on_edge: Vec<usize>,
    /// Actual stencil length per edge.
    pub n_edges_on_edge: Vec<usize>,
    /// Reconstruction weights matching `edges_on_edge`.
    pub weights_on_edge: Vec<f64>,

    /// Cell center coordinates.
    pub x_cell: Vec<f64>,
    pub y_cell: Vec<f64>,
    /// Edge midpoint coordinates.
    pub x_edge: Vec<f64>,
    pub y_edge: Vec<f64>,
    /// Vertex coordinates.
    pub x_vertex: Vec<f64>,
    pub y_vertex: Vec<f64>,
    /// Distance between the two cell centers across each edge.
    pub dc_edge: Vec<f64>,
    /// Length of each edge (distance between its vertices).
    pub dv_edge: Vec<f64>,
    /// Primal cell areas.
    pub area_cell: Vec<f64>,
    /// Dual cell (vertex) areas.
    pub area_triangle: Vec<f64>,
    /// Kite areas: the overlap of each cell with the dual cell of each of its
    /// vertices, `[n_vertices * vertex_degree]`, matching `cells_on_vertex`.
    pub kite_areas_on_vertex: Vec<f64>,
    /// Angle of the edge normal measured from east.
    pub angle_edge: Vec<f64>,
    /// Coriolis parameter at vertices and edges.
    pub f_vertex: Vec<f64>,
    pub f_edge: Vec<f64>,
    /// Resting depth of the sea floor below each cell (positive down).
    pub bottom_depth: Vec<f64>,

    /// Deepest active layer per cell, 0-based inclusive; `-1` for dry.
    pub max_level_cell: Vec<i32>,
    /// Shallowest active layer per cell, 0-based inclusive.
    pub min_level_cell: Vec<i32>,
}

impl GlobalMesh {
    /// Build a doubly periodic planar mesh of `nx * ny` square cells with
    /// spacing `dx`, `dy` and `n_layers` vertical layers.
    ///
    /// All columns start fully wet over a flat bottom at depth
    /// `n_layers * 100 m`; callers adjust `bottom_depth`,
    /// `max_level_cell`/`min_level_cell`, or the Coriolis arrays directly for
    /// specific experiments.
    pub fn periodic_quad(nx: usize, ny: usize, dx: f64, dy: f64, n_layers: usize) -> Self {
        assert!(nx >= 2 && ny >= 2, "periodic mesh needs at least 2x2 cells");
        assert!(dx > 0.0 && dy > 0.0, "cell spacing must be positive");

        let n_cells = nx * ny;
        let n_edges = 2 * n_cells;
        let n_vertices = n_cells;
        let max_edges = 4;
        let vertex_degree = 4;
        let max_eoe = 4;

        let cell = |i: usize, j: usize| (j % ny) * nx + (i % nx);
        // u-edge: the +x-normal edge on the west face of cell (i, j).
        let u_edge = |i: usize, j: usize| 2 * cell(i, j);
        // v-edge: the +y-normal edge on the south face of cell (i, j).
        let v_edge = |i: usize, j: usize| 2 * cell(i, j) + 1;
        let vertex = |i: usize, j: usize| (j % ny) * nx + (i % nx);

        let mut mesh = Self {
            n_cells,
            n_edges,
            n_vertices,
            n_layers,
            max_edges,
            vertex_degree,
            max_edges_on_edge: max_eoe,
            cells_on_cell: vec![INVALID_GLOBAL; n_cells * max_edges],
            edges_on_cell: vec![INVALID_GLOBAL; n_cells * max_edges],
            vertices_on_cell: vec![INVALID_GLOBAL; n_cells * max_edges],
            n_edges_on_cell: vec![4; n_cells],
            cells_on_edge: vec![INVALID_GLOBAL; n_edges * 2],
            vertices_on_edge: vec![INVALID_GLOBAL; n_edges * 2],
            cells_on_vertex: vec![INVALID_GLOBAL; n_vertices * vertex_degree],
            edges_on_vertex: vec![INVALID_GLOBAL; n_vertices * vertex_degree],
            edges_on_edge: vec![INVALID_GLOBAL; n_edges * max_eoe],
            n_edges_on_edge: vec![4; n_edges],
            weights_on_edge: vec![0.0; n_edges * max_eoe],
            x_cell: vec![0.0; n_cells],
            y_cell: vec![0.0; n_cells],
            x_edge: vec![0.0; n_edges],
            y_edge: vec![0.0; n_edges],
            x_vertex: vec![0.0; n_vertices],
            y_vertex: vec![0.0; n_vertices],
            dc_edge: vec![0.0; n_edges],
            dv_edge: vec![0.0; n_edges],
            area_cell: vec![dx * dy; n_cells],
            area_triangle: vec![dx * dy; n_vertices],
            kite_areas_on_vertex: vec![0.25 * dx * dy; n_vertices * vertex_degree],
            angle_edge: vec![0.0; n_edges],
            f_vertex: vec![0.0; n_vertices],
            f_edge: vec![0.0; n_edges],
            bottom_depth: vec![n_layers as f64 * 100.0; n_cells],
            max_level_cell: vec![n_layers as i32 - 1; n_cells],
            min_level_cell: vec![0; n_cells],
        };

        for j in 0..ny {
            for i in 0..nx {
                let c = cell(i, j);
                mesh.x_cell[c] = (i as f64 + 0.5) * dx;
                mesh.y_cell[c] = (j as f64 + 0.5) * dy;

                // west, east, south, north
                mesh.cells_on_cell[c * 4] = cell(i + nx - 1, j);
                mesh.cells_on_cell[c * 4 + 1] = cell(i + 1, j);
                mesh.cells_on_cell[c * 4 + 2] = cell(i, j + ny - 1);
                mesh.cells_on_cell[c * 4 + 3] = cell(i, j + 1);

                mesh.edges_on_cell[c * 4] = u_edge(i, j);
                mesh.edges_on_cell[c * 4 + 1] = u_edge(i + 1, j);
                mesh.edges_on_cell[c * 4 + 2] = v_edge(i, j);
                mesh.edges_on_cell[c * 4 + 3] = v_edge(i, j + 1);

                // counter-clockwise from the southwest corner
                mesh.vertices_on_cell[c * 4] = vertex(i, j);
                mesh.vertices_on_cell[c * 4 + 1] = vertex(i + 1, j);
                mesh.vertices_on_cell[c * 4 + 2] = vertex(i + 1, j + 1);
                mesh.vertices_on_cell[c * 4 + 3] = vertex(i, j + 1);

                // u-edge on the west face: normal +x, tangent +y
                let eu = u_edge(i, j);
                mesh.cells_on_edge[eu * 2] = cell(i + nx - 1, j);
                mesh.cells_on_edge[eu * 2 + 1] = c;
                mesh.vertices_on_edge[eu * 2] = vertex(i, j);
                mesh.vertices_on_edge[eu * 2 + 1] = vertex(i, j + 1);
                mesh.x_edge[eu] = i as f64 * dx;
                mesh.y_edge[eu] = (j as f64 + 0.5) * dy;
                mesh.dc_edge[eu] = dx;
                mesh.dv_edge[eu] = dy;
                mesh.angle_edge[eu] = 0.0;

                // v-edge on the south face: normal +y, tangent -x
                let ev = v_edge(i, j);
                mesh.cells_on_edge[ev * 2] = cell(i, j + ny - 1);
                mesh.cells_on_edge[ev * 2 + 1] = c;
                mesh.vertices_on_edge[ev * 2] = vertex(i + 1, j);
                mesh.vertices_on_edge[ev * 2 + 1] = vertex(i, j);
                mesh.x_edge[ev] = (i as f64 + 0.5) * dx;
                mesh.y_edge[ev] = j as f64 * dy;
                mesh.dc_edge[ev] = dy;
                mesh.dv_edge[ev] = dx;
                mesh.angle_edge[ev] = std::f64::consts::FRAC_PI_2;

                // vertex at the cell's southwest corner
                let v = vertex(i, j);
                mesh.x_vertex[v] = i as f64 * dx;
                mesh.y_vertex[v] = j as f64 * dy;
                mesh.cells_on_vertex[v * 4] = cell(i + nx - 1, j + ny - 1);
                mesh.cells_on_vertex[v * 4 + 1] = cell(i, j + ny - 1);
                mesh.cells_on_vertex[v * 4 + 2] = c;
                mesh.cells_on_vertex[v * 4 + 3] = cell(i + nx - 1, j);
                mesh.edges_on_vertex[v * 4] = u_edge(i, j + ny - 1);
                mesh.edges_on_vertex[v * 4 + 1] = v_edge(i, j);
                mesh.edges_on_vertex[v * 4 + 2] = u_edge(i, j);
                mesh.edges_on_vertex[v * 4 + 3] = v_edge(i + nx - 1, j);

                // Tangential reconstruction: the four perpendicular edges of
                // the two adjoining cells, projected onto this edge's tangent.
                let eoe_u = [
                    v_edge(i + nx - 1, j),
                    v_edge(i + nx - 1, j + 1),
                    v_edge(i, j),
                    v_edge(i, j + 1),
                ];
                for (slot, &e) in eoe_u.iter().enumerate() {
                    mesh.edges_on_edge[eu * 4 + slot] = e;
                    mesh.weights_on_edge[eu * 4 + slot] = 0.25;
                }
                let eoe_v = [
                    u_edge(i, j + ny - 1),
                    u_edge(i + 1, j + ny - 1),
                    u_edge(i, j),
                    u_edge(i + 1, j),
                ];
                for (slot, &e) in eoe_v.iter().enumerate() {
                    mesh.edges_on_edge[ev * 4 + slot] = e;
                    mesh.weights_on_edge[ev * 4 + slot] = -0.25;
                }
            }
        }

        mesh
    }

    /// Set a constant Coriolis parameter everywhere (f-plane).
    pub fn set_coriolis(&mut self, f0: f64) {
        self.f_vertex.fill(f0);
        self.f_edge.fill(f0);
    }

    /// Apply per-column active-layer bounds as read from a mesh file.
    ///
    /// File conventions are 1-based inclusive (`maxLevelCell`,
    /// `minLevelCell`); they are converted to the crate's 0-based bounds
    /// here. A missing array is not an error: the fallback is a full-depth
    /// column (max) or a surface-starting column (min), with a warning.
    pub fn apply_level_bounds(
        &mut self,
        min_level_one_based: Option<&[i32]>,
        max_level_one_based: Option<&[i32]>,
    ) -> Result<(), MeshError> {
        match max_level_one_based {
            Some(max) => {
                if max.len() != self.n_cells {
                    return Err(MeshError::BadExtent {
                        name: "maxLevelCell",
                        got: max.len(),
                        expected: self.n_cells,
                    });
                }
                for (dst, &v) in self.max_level_cell.iter_mut().zip(max) {
                    *dst = v - 1;
                }
            }
            None => {
                warn!("mesh has no maxLevelCell; defaulting all columns to full depth");
                self.max_level_cell.fill(self.n_layers as i32 - 1);
            }
        }
        match min_level_one_based {
            Some(min) => {
                if min.len() != self.n_cells {
                    return Err(MeshError::BadExtent {
                        name: "minLevelCell",
                        got: min.len(),
                        expected: self.n_cells,
                    });
                }
                for (dst, &v) in self.min_level_cell.iter_mut().zip(min) {
                    *dst = v - 1;
                }
            }
            None => {
                warn!("mesh has no minLevelCell; defaulting all columns to start at the surface");
                self.min_level_cell.fill(0);
            }
        }
        Ok(())
    }

    /// Check array extents and the no-orphan topology invariants.
    pub fn validate(&self) -> Result<(), MeshError> {
        let checks: [(&'static str, usize, usize); 10] = [
            ("cellsOnCell", self.cells_on_cell.len(), self.n_cells * self.max_edges),
            ("edgesOnCell", self.edges_on_cell.len(), self.n_cells * self.max_edges),
            ("verticesOnCell", self.vertices_on_cell.len(), self.n_cells * self.max_edges),
            ("nEdgesOnCell", self.n_edges_on_cell.len(), self.n_cells),
            ("cellsOnEdge", self.cells_on_edge.len(), self.n_edges * 2),
            ("verticesOnEdge", self.vertices_on_edge.len(), self.n_edges * 2),
            ("cellsOnVertex", self.cells_on_vertex.len(), self.n_vertices * self.vertex_degree),
            ("edgesOnVertex", self.edges_on_vertex.len(), self.n_vertices * self.vertex_degree),
            ("areaCell", self.area_cell.len(), self.n_cells),
            ("maxLevelCell", self.max_level_cell.len(), self.n_cells),
        ];
        for (name, got, expected) in checks {
            if got != expected {
                return Err(MeshError::BadExtent { name, got, expected });
            }
        }

        for c in 0..self.n_cells {
            for s in 0..self.n_edges_on_cell[c] {
                let n = self.cells_on_cell[c * self.max_edges + s];
                if is_valid_global(n) && n >= self.n_cells {
                    return Err(MeshError::BadConnectivity { cell: c, neighbor: n });
                }
            }
        }
        for e in 0..self.n_edges {
            if self.edge_owner_cell(e).is_none() {
                return Err(MeshError::ZeroAdjacencyEdge { edge: e });
            }
        }
        for v in 0..self.n_vertices {
            if self.vertex_owner_cell(v).is_none() {
                return Err(MeshError::ZeroAdjacencyVertex { vertex: v });
            }
        }
        Ok(())
    }

    /// First valid cell adjoining an edge: the cell whose partition owns the
    /// edge under the decomposition ownership rule.
    pub fn edge_owner_cell(&self, edge: usize) -> Option<usize> {
        self.cells_on_edge[edge * 2..edge * 2 + 2]
            .iter()
            .copied()
            .find(|&c| is_valid_global(c))
    }

    /// First valid cell adjoining a vertex.
    pub fn vertex_owner_cell(&self, vertex: usize) -> Option<usize> {
        let d = self.vertex_degree;
        self.cells_on_vertex[vertex * d..(vertex + 1) * d]
            .iter()
            .copied()
            .find(|&c| is_valid_global(c))
    }

    /// The dual graph of cells in CSR form (nodes = cells, arcs = shared
    /// edges), as consumed by the graph-partitioner interface.
    pub fn dual_graph_csr(&self) -> (Vec<usize>, Vec<usize>) {
        let mut xadj = Vec::with_capacity(self.n_cells + 1);
        let mut adjncy = Vec::new();
        xadj.push(0);
        for c in 0..self.n_cells {
            for s in 0..self.n_edges_on_cell[c] {
                let n = self.cells_on_cell[c * self.max_edges + s];
                if is_valid_global(n) && n != c {
                    adjncy.push(n);
                }
            }
            xadj.push(adjncy.len());
        }
        (xadj, adjncy)
    }
}
