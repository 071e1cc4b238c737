//! Construction of per-rank index ranges and id maps.

use std::collections::HashMap;

use crate::error::{DecompError, MeshError};
use crate::mesh::{GlobalMesh, LocalMesh};
use crate::types::{is_valid_global, ElemKind};

use super::Partitioner;

/// Owned/all counts for one entity kind. The allocated capacity is
/// `n_size = n_all + 1`; the extra trailing slot is the sentinel for absent
/// neighbors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityRange {
    pub n_owned: usize,
    pub n_all: usize,
}

impl EntityRange {
    /// Allocated capacity including the sentinel slot.
    #[inline]
    pub fn n_size(&self) -> usize {
        self.n_all + 1
    }

    /// The sentinel index.
    #[inline]
    pub fn sentinel(&self) -> usize {
        self.n_all
    }

    /// Halo index range.
    #[inline]
    pub fn halo(&self) -> std::ops::Range<usize> {
        self.n_owned..self.n_all
    }
}

/// One rank's decomposition: index ranges, id maps, and per-entity owner
/// ranks for cells, edges, and vertices. Immutable after construction.
#[derive(Clone, Debug)]
pub struct Decomp {
    pub rank: usize,
    pub n_ranks: usize,
    pub halo_width: usize,

    pub cells: EntityRange,
    pub edges: EntityRange,
    pub vertices: EntityRange,

    /// Local-to-global id maps, length `n_all` per kind.
    pub cell_l2g: Vec<usize>,
    pub edge_l2g: Vec<usize>,
    pub vertex_l2g: Vec<usize>,

    /// Global-to-local id maps over the local set.
    pub cell_g2l: HashMap<usize, usize>,
    pub edge_g2l: HashMap<usize, usize>,
    pub vertex_g2l: HashMap<usize, usize>,

    /// Owning rank of each local entity, length `n_all` per kind.
    pub cell_owner: Vec<usize>,
    pub edge_owner: Vec<usize>,
    pub vertex_owner: Vec<usize>,
}

impl Decomp {
    /// Build the decomposition of `rank` from a per-cell part assignment.
    ///
    /// `halo_width` is the number of cell-neighbor rings kept beyond the
    /// owned set, together with their incident edges and vertices. One ring
    /// closes the single-cell and single-edge stencils; terms that read
    /// auxiliary fields on halo edges (potential-vorticity advection and
    /// the biharmonic chains) also need those edges' stencils closed,
    /// which takes a second ring. Size it with
    /// [`TendencyConfig::min_halo_width`](crate::tendency::TendencyConfig::min_halo_width).
    pub fn build(
        global: &GlobalMesh,
        assignment: &[usize],
        rank: usize,
        n_ranks: usize,
        halo_width: usize,
    ) -> Result<Self, DecompError> {
        if assignment.len() != global.n_cells {
            return Err(DecompError::BadAssignment {
                got: assignment.len(),
                expected: global.n_cells,
            });
        }
        if let Some((cell, &part)) = assignment.iter().enumerate().find(|(_, &p)| p >= n_ranks) {
            return Err(DecompError::BadPart {
                cell,
                part,
                parts: n_ranks,
            });
        }

        // Owned cells, then halo rings of neighbors-of-neighbors.
        let mut in_local = vec![false; global.n_cells];
        let mut cell_l2g: Vec<usize> =
            (0..global.n_cells).filter(|&c| assignment[c] == rank).collect();
        let n_cells_owned = cell_l2g.len();
        for &c in &cell_l2g {
            in_local[c] = true;
        }

        let mut ring_start = 0;
        for _ in 0..halo_width {
            let ring_end = cell_l2g.len();
            let mut next_ring = Vec::new();
            for &c in &cell_l2g[ring_start..ring_end] {
                for s in 0..global.n_edges_on_cell[c] {
                    let n = global.cells_on_cell[c * global.max_edges + s];
                    if is_valid_global(n) && !in_local[n] {
                        in_local[n] = true;
                        next_ring.push(n);
                    }
                }
            }
            next_ring.sort_unstable();
            cell_l2g.extend(next_ring);
            ring_start = ring_end;
        }

        let cells = EntityRange {
            n_owned: n_cells_owned,
            n_all: cell_l2g.len(),
        };
        let cell_owner: Vec<usize> = cell_l2g.iter().map(|&g| assignment[g]).collect();

        // Edges and vertices incident to any local cell, split into owned
        // (first-valid-cell rule) and halo, each sorted by global id.
        let (edge_l2g, edges) = gather_incident(
            &cell_l2g,
            global.n_edges,
            |c, out| {
                for s in 0..global.n_edges_on_cell[c] {
                    let e = global.edges_on_cell[c * global.max_edges + s];
                    if is_valid_global(e) {
                        out.push(e);
                    }
                }
            },
            |e| edge_owner_rank(global, assignment, e),
            rank,
        )?;
        let (vertex_l2g, vertices) = gather_incident(
            &cell_l2g,
            global.n_vertices,
            |c, out| {
                for s in 0..global.n_edges_on_cell[c] {
                    let v = global.vertices_on_cell[c * global.max_edges + s];
                    if is_valid_global(v) {
                        out.push(v);
                    }
                }
            },
            |v| vertex_owner_rank(global, assignment, v),
            rank,
        )?;

        let edge_owner: Vec<usize> = edge_l2g
            .iter()
            .map(|&e| edge_owner_rank(global, assignment, e))
            .collect::<Result<_, _>>()?;
        let vertex_owner: Vec<usize> = vertex_l2g
            .iter()
            .map(|&v| vertex_owner_rank(global, assignment, v))
            .collect::<Result<_, _>>()?;

        let to_map = |l2g: &[usize]| -> HashMap<usize, usize> {
            l2g.iter().enumerate().map(|(l, &g)| (g, l)).collect()
        };

        Ok(Self {
            rank,
            n_ranks,
            halo_width,
            cells,
            edges,
            vertices,
            cell_g2l: to_map(&cell_l2g),
            edge_g2l: to_map(&edge_l2g),
            vertex_g2l: to_map(&vertex_l2g),
            cell_l2g,
            edge_l2g,
            vertex_l2g,
            cell_owner,
            edge_owner,
            vertex_owner,
        })
    }

    /// Partition the dual graph and build every rank's decomposition.
    ///
    /// The serial partitioner runs once on the full graph, exactly as the
    /// external library would; each rank's build then only keeps its own
    /// view. Used by the driver at initialization and by multi-rank tests.
    pub fn build_all(
        global: &GlobalMesh,
        partitioner: &dyn Partitioner,
        n_ranks: usize,
        halo_width: usize,
    ) -> Result<Vec<Self>, DecompError> {
        global.validate()?;
        let (xadj, adjncy) = global.dual_graph_csr();
        let assignment = partitioner.partition(global.n_cells, &xadj, &adjncy, n_ranks)?;
        (0..n_ranks)
            .map(|rank| Self::build(global, &assignment, rank, n_ranks, halo_width))
            .collect()
    }

    /// Localize the global mesh onto this rank.
    pub fn local_mesh(&self, global: &GlobalMesh) -> LocalMesh {
        LocalMesh::localize(self, global)
    }

    /// Index range for one entity kind.
    pub fn range(&self, kind: ElemKind) -> EntityRange {
        match kind {
            ElemKind::Cell => self.cells,
            ElemKind::Edge => self.edges,
            ElemKind::Vertex => self.vertices,
        }
    }

    /// Local-to-global map for one entity kind.
    pub fn l2g(&self, kind: ElemKind) -> &[usize] {
        match kind {
            ElemKind::Cell => &self.cell_l2g,
            ElemKind::Edge => &self.edge_l2g,
            ElemKind::Vertex => &self.vertex_l2g,
        }
    }

    /// Owner ranks for one entity kind.
    pub fn owner(&self, kind: ElemKind) -> &[usize] {
        match kind {
            ElemKind::Cell => &self.cell_owner,
            ElemKind::Edge => &self.edge_owner,
            ElemKind::Vertex => &self.vertex_owner,
        }
    }
}

fn edge_owner_rank(
    global: &GlobalMesh,
    assignment: &[usize],
    edge: usize,
) -> Result<usize, DecompError> {
    global
        .edge_owner_cell(edge)
        .map(|c| assignment[c])
        .ok_or(DecompError::Mesh(MeshError::ZeroAdjacencyEdge { edge }))
}

fn vertex_owner_rank(
    global: &GlobalMesh,
    assignment: &[usize],
    vertex: usize,
) -> Result<usize, DecompError> {
    global
        .vertex_owner_cell(vertex)
        .map(|c| assignment[c])
        .ok_or(DecompError::Mesh(MeshError::ZeroAdjacencyVertex { vertex }))
}

/// Collect the entities incident to the local cell set, owned first.
fn gather_incident(
    cell_l2g: &[usize],
    n_global: usize,
    mut incident: impl FnMut(usize, &mut Vec<usize>),
    owner: impl Fn(usize) -> Result<usize, DecompError>,
    rank: usize,
) -> Result<(Vec<usize>, EntityRange), DecompError> {
    let mut seen = vec![false; n_global];
    let mut candidates = Vec::new();
    let mut scratch = Vec::new();
    for &c in cell_l2g {
        scratch.clear();
        incident(c, &mut scratch);
        for &g in &scratch {
            if !seen[g] {
                seen[g] = true;
                candidates.push(g);
            }
        }
    }
    let mut owned = Vec::new();
    let mut halo = Vec::new();
    for g in candidates {
        if owner(g)? == rank {
            owned.push(g);
        } else {
            halo.push(g);
        }
    }
    owned.sort_unstable();
    halo.sort_unstable();
    let range = EntityRange {
        n_owned: owned.len(),
        n_all: owned.len() + halo.len(),
    };
    owned.extend(halo);
    Ok((owned, range))
}
