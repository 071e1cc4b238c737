//! Multi-rank decomposition and halo-exchange tests.
//!
//! Runs a real decomposition across several ranks on the in-process
//! transport (one thread per rank) and checks that ownership partitions
//! every entity kind exactly once and that exchanged halos reproduce the
//! owner's values.

use std::thread;

use fvom_rs::decomp::RegionGrowingPartitioner;
use fvom_rs::{Decomp, ElemKind, GlobalMesh, Halo, LocalTransport, Transport};

const N_RANKS: usize = 3;
const KINDS: [ElemKind; 3] = [ElemKind::Cell, ElemKind::Edge, ElemKind::Vertex];

/// Decompose `global` and run `f` once per rank, each on its own thread.
fn on_cluster<R: Send>(
    global: &GlobalMesh,
    halo_width: usize,
    f: impl Fn(Decomp, &LocalTransport) -> R + Sync,
) -> Vec<R> {
    let decomps =
        Decomp::build_all(global, &RegionGrowingPartitioner, N_RANKS, halo_width).unwrap();
    let cluster = LocalTransport::cluster(N_RANKS);
    thread::scope(|scope| {
        let handles: Vec<_> = decomps
            .into_iter()
            .zip(cluster)
            .map(|(decomp, transport)| {
                let f = &f;
                scope.spawn(move || f(decomp, &transport))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

#[test]
fn test_ownership_partitions_every_entity_kind() {
    let global = GlobalMesh::periodic_quad(8, 6, 1000.0, 1000.0, 1);
    let totals = [global.n_cells, global.n_edges, global.n_vertices];

    let results = on_cluster(&global, 1, |decomp, transport| {
        KINDS.map(|kind| {
            let range = decomp.range(kind);
            let l2g = decomp.l2g(kind);
            // Sum of (global id + 1) over owned entities; across ranks this
            // partitions 1..=n exactly once iff the reduced sum telescopes.
            let id_sum: f64 = l2g[..range.n_owned].iter().map(|&g| (g + 1) as f64).sum();
            let count = range.n_owned as f64;
            (
                transport.all_reduce_sum(id_sum).unwrap(),
                transport.all_reduce_sum(count).unwrap(),
            )
        })
    });

    for result in results {
        for ((kind, n), (id_sum, count)) in KINDS.iter().zip(totals).zip(result) {
            let expected = (n * (n + 1) / 2) as f64;
            assert_eq!(id_sum, expected, "{kind:?} ids not partitioned exactly once");
            assert_eq!(count, n as f64, "{kind:?} owned counts do not cover the mesh");
        }
    }
}

#[test]
fn test_halo_exchange_reproduces_owner_values() {
    let global = GlobalMesh::periodic_quad(8, 6, 1000.0, 1000.0, 1);

    on_cluster(&global, 2, |decomp, transport| {
        let halo = Halo::build(&decomp, transport).unwrap();
        for kind in KINDS {
            let range = decomp.range(kind);
            let l2g = decomp.l2g(kind);
            let mut data = vec![-1.0f64; range.n_size()];
            for i in 0..range.n_owned {
                data[i] = l2g[i] as f64;
            }
            data[range.sentinel()] = 0.0;

            halo.exchange(transport, kind, 1, &mut data).unwrap();

            for i in 0..range.n_all {
                assert_eq!(
                    data[i], l2g[i] as f64,
                    "{kind:?} slot {i} does not carry its owner's value"
                );
            }
            assert_eq!(data[range.sentinel()], 0.0, "sentinel slot was touched");
        }
    });
}

#[test]
fn test_repeated_exchange_is_idempotent() {
    let global = GlobalMesh::periodic_quad(6, 6, 1000.0, 1000.0, 3);
    let nl = global.n_layers;

    on_cluster(&global, 1, |decomp, transport| {
        let halo = Halo::build(&decomp, transport).unwrap();
        let range = decomp.range(ElemKind::Cell);
        let mut data = vec![0.0f64; range.n_size() * nl];
        for (i, &g) in decomp.l2g(ElemKind::Cell)[..range.n_owned].iter().enumerate() {
            for k in 0..nl {
                data[i * nl + k] = (g * nl + k) as f64;
            }
        }

        halo.exchange(transport, ElemKind::Cell, nl, &mut data).unwrap();
        let first = data.clone();
        halo.exchange(transport, ElemKind::Cell, nl, &mut data).unwrap();
        assert_eq!(data, first, "a second exchange changed already-synced data");
    });
}
