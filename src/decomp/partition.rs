//! Graph-partitioner interface and built-in implementations.
//!
//! The external partitioner (METIS-class) is a black box to this core: a
//! pure function from the cell dual graph to a part assignment. The trait
//! below is that narrow seam; the two built-ins are deterministic so
//! decomposition tests are exactly reproducible.

use crate::error::DecompError;

/// Black-box graph partitioner: assign each of `n_vertices` graph nodes
/// (mesh cells) to one of `n_parts` parts.
///
/// The graph arrives in CSR form: node `v`'s neighbors are
/// `adjncy[xadj[v]..xadj[v + 1]]`.
pub trait Partitioner {
    fn partition(
        &self,
        n_vertices: usize,
        xadj: &[usize],
        adjncy: &[usize],
        n_parts: usize,
    ) -> Result<Vec<usize>, DecompError>;
}

fn check_sizes(n_vertices: usize, n_parts: usize) -> Result<(), DecompError> {
    if n_parts == 0 || n_parts > n_vertices {
        return Err(DecompError::TooManyParts {
            parts: n_parts,
            cells: n_vertices,
        });
    }
    Ok(())
}

/// Trivial contiguous block partition by global id. This is the same
/// assignment used for the initial parallel mesh read, before the real
/// partitioner improves it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContiguousPartitioner;

impl Partitioner for ContiguousPartitioner {
    fn partition(
        &self,
        n_vertices: usize,
        _xadj: &[usize],
        _adjncy: &[usize],
        n_parts: usize,
    ) -> Result<Vec<usize>, DecompError> {
        check_sizes(n_vertices, n_parts)?;
        let base = n_vertices / n_parts;
        let rem = n_vertices % n_parts;
        let mut assignment = Vec::with_capacity(n_vertices);
        for part in 0..n_parts {
            let count = base + usize::from(part < rem);
            assignment.extend(std::iter::repeat(part).take(count));
        }
        Ok(assignment)
    }
}

/// Balanced multi-seed breadth-first region growing.
///
/// Seeds are spread evenly through the id space; parts grow their frontiers
/// round-robin under a capacity of `ceil(n / n_parts)`, which keeps parts
/// connected and balanced on well-behaved meshes. Serial, like the external
/// partitioner it stands in for.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegionGrowingPartitioner;

impl Partitioner for RegionGrowingPartitioner {
    fn partition(
        &self,
        n_vertices: usize,
        xadj: &[usize],
        adjncy: &[usize],
        n_parts: usize,
    ) -> Result<Vec<usize>, DecompError> {
        check_sizes(n_vertices, n_parts)?;
        let capacity = n_vertices.div_ceil(n_parts);
        let mut assignment = vec![usize::MAX; n_vertices];
        let mut counts = vec![0usize; n_parts];
        let mut frontiers: Vec<std::collections::VecDeque<usize>> =
            vec![Default::default(); n_parts];

        for part in 0..n_parts {
            let seed = part * n_vertices / n_parts;
            // Seeds computed this way are distinct because n_parts <= n.
            frontiers[part].push_back(seed);
        }

        let mut assigned = 0;
        while assigned < n_vertices {
            let mut progressed = false;
            for part in 0..n_parts {
                if counts[part] >= capacity {
                    continue;
                }
                while let Some(v) = frontiers[part].pop_front() {
                    if assignment[v] != usize::MAX {
                        continue;
                    }
                    assignment[v] = part;
                    counts[part] += 1;
                    assigned += 1;
                    progressed = true;
                    for &n in &adjncy[xadj[v]..xadj[v + 1]] {
                        if assignment[n] == usize::MAX {
                            frontiers[part].push_back(n);
                        }
                    }
                    break;
                }
            }
            if !progressed {
                // Disconnected remainder or exhausted frontiers: sweep the
                // stragglers into the least-loaded parts.
                for v in 0..n_vertices {
                    if assignment[v] == usize::MAX {
                        let part = (0..n_parts).min_by_key(|&p| counts[p]).unwrap();
                        assignment[v] = part;
                        counts[part] += 1;
                        assigned += 1;
                    }
                }
            }
        }
        Ok(assignment)
    }
}
