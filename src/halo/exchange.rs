//! Ghost-region exchange plans and the pack/exchange/unpack cycle.

use bytemuck::Pod;

use crate::decomp::Decomp;
use crate::error::HaloError;
use crate::types::ElemKind;

use super::Transport;

/// Cached exchange lists for one element kind, indexed by peer rank.
#[derive(Clone, Debug, Default)]
struct ExchangePlan {
    n_all: usize,
    /// Local owned indices to pack for each peer.
    send: Vec<Vec<usize>>,
    /// Local halo indices filled from each peer, in the peer's send order.
    recv: Vec<Vec<usize>>,
}

impl ExchangePlan {
    fn n_size(&self) -> usize {
        self.n_all + 1
    }
}

/// Precomputed halo-exchange state for one decomposition.
///
/// Construction performs a one-time handshake through the transport: each
/// rank tells every owner which global ids it needs, and the owner builds
/// its send lists from the requests. Message sizes and neighbor lists are
/// invariant afterwards, so each [`exchange`](Halo::exchange) call pays no
/// reconnection cost.
pub struct Halo {
    rank: usize,
    n_ranks: usize,
    cell_plan: ExchangePlan,
    edge_plan: ExchangePlan,
    vertex_plan: ExchangePlan,
}

impl Halo {
    /// Build exchange plans for all three element kinds.
    pub fn build(decomp: &Decomp, transport: &dyn Transport) -> Result<Self, HaloError> {
        let n_ranks = transport.n_ranks();
        debug_assert_eq!(decomp.rank, transport.rank());
        debug_assert_eq!(decomp.n_ranks, n_ranks);

        let mut plans = [
            ExchangePlan::default(),
            ExchangePlan::default(),
            ExchangePlan::default(),
        ];
        for (slot, kind) in [ElemKind::Cell, ElemKind::Edge, ElemKind::Vertex]
            .into_iter()
            .enumerate()
        {
            plans[slot] = Self::build_plan(decomp, transport, kind)?;
        }
        let [cell_plan, edge_plan, vertex_plan] = plans;

        Ok(Self {
            rank: decomp.rank,
            n_ranks,
            cell_plan,
            edge_plan,
            vertex_plan,
        })
    }

    fn build_plan(
        decomp: &Decomp,
        transport: &dyn Transport,
        kind: ElemKind,
    ) -> Result<ExchangePlan, HaloError> {
        let n_ranks = transport.n_ranks();
        let range = decomp.range(kind);
        let l2g = decomp.l2g(kind);
        let owner = decomp.owner(kind);

        // Group halo entries by owning rank; the local index lists are in
        // ascending local order, and the request lists mirror them.
        let mut recv: Vec<Vec<usize>> = vec![Vec::new(); n_ranks];
        let mut requests: Vec<Vec<u64>> = vec![Vec::new(); n_ranks];
        for local in range.halo() {
            recv[owner[local]].push(local);
            requests[owner[local]].push(l2g[local] as u64);
        }

        let messages: Vec<Vec<u8>> = requests
            .iter()
            .map(|ids| bytemuck::cast_slice(ids).to_vec())
            .collect();
        let received = transport.all_to_all(messages)?;

        let g2l = match kind {
            ElemKind::Cell => &decomp.cell_g2l,
            ElemKind::Edge => &decomp.edge_g2l,
            ElemKind::Vertex => &decomp.vertex_g2l,
        };
        let mut send: Vec<Vec<usize>> = vec![Vec::new(); n_ranks];
        for (src, bytes) in received.into_iter().enumerate() {
            if src == decomp.rank {
                continue;
            }
            let wanted: Vec<u64> = bytemuck::pod_collect_to_vec(&bytes);
            let mut list = Vec::with_capacity(wanted.len());
            for global in wanted {
                let local = g2l.get(&(global as usize)).copied().filter(|&l| {
                    l < range.n_owned
                });
                match local {
                    Some(l) => list.push(l),
                    None => {
                        return Err(HaloError::NotOwned {
                            kind,
                            from: src,
                            global: global as usize,
                        })
                    }
                }
            }
            send[src] = list;
        }

        Ok(ExchangePlan {
            n_all: range.n_all,
            send,
            recv,
        })
    }

    fn plan(&self, kind: ElemKind) -> &ExchangePlan {
        match kind {
            ElemKind::Cell => &self.cell_plan,
            ElemKind::Edge => &self.edge_plan,
            ElemKind::Vertex => &self.vertex_plan,
        }
    }

    /// Fill the halo entries of `data` with the owners' current values.
    ///
    /// `data` is a flattened array whose leading dimension is the entity
    /// index (`n_all` or `n_size` entries) and whose trailing dimensions
    /// multiply to `n_inner`; any scalar type supported by the transport
    /// (`f64`, `i32`, ...) works. Owned entries are never written. The call
    /// blocks until all neighbor messages have arrived.
    pub fn exchange<T: Pod>(
        &self,
        transport: &dyn Transport,
        kind: ElemKind,
        n_inner: usize,
        data: &mut [T],
    ) -> Result<(), HaloError> {
        assert!(n_inner > 0, "inner extent must be nonzero");
        let plan = self.plan(kind);
        let len = data.len();
        if len != plan.n_all * n_inner && len != plan.n_size() * n_inner {
            return Err(HaloError::ExtentMismatch {
                kind,
                got: len,
                expected_all: plan.n_all * n_inner,
                expected_size: plan.n_size() * n_inner,
            });
        }

        let mut messages: Vec<Vec<u8>> = Vec::with_capacity(self.n_ranks);
        for dst in 0..self.n_ranks {
            let list = &plan.send[dst];
            let mut buffer: Vec<T> = Vec::with_capacity(list.len() * n_inner);
            for &local in list {
                buffer.extend_from_slice(&data[local * n_inner..(local + 1) * n_inner]);
            }
            messages.push(bytemuck::cast_slice(&buffer).to_vec());
        }

        let received = transport.all_to_all(messages)?;

        for (src, bytes) in received.into_iter().enumerate() {
            if src == self.rank {
                continue;
            }
            let list = &plan.recv[src];
            let values: Vec<T> = bytemuck::pod_collect_to_vec(&bytes);
            if values.len() != list.len() * n_inner {
                return Err(HaloError::Transport(format!(
                    "rank {src} sent {} values for a {} {kind} halo",
                    values.len(),
                    list.len() * n_inner,
                )));
            }
            for (slot, &local) in list.iter().enumerate() {
                data[local * n_inner..(local + 1) * n_inner]
                    .copy_from_slice(&values[slot * n_inner..(slot + 1) * n_inner]);
            }
        }
        Ok(())
    }
}
