//! Message-passing abstraction.
//!
//! The model core never talks to MPI directly; it goes through [`Transport`],
//! which provides exactly the collective shapes the core needs: a sparse
//! all-to-all of byte messages (halo exchange, list handshakes) and the
//! sum/max reductions used by diagnostics. A production build would back
//! this with rsmpi; [`LocalTransport`] backs it with in-process channels so
//! multi-rank semantics run (and are tested) inside one process, one thread
//! per rank.
//!
//! Failures at this layer are fatal to the run: a corrupted or lost halo
//! message leaves the numerical state inconsistent, and the time loop has no
//! tolerance for that, so no retry path exists.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::error::HaloError;

/// The message-passing seam. One instance per rank.
///
/// `all_to_all` is bulk-synchronous: every rank sends one (possibly empty)
/// message to every rank per call, and the returned vector holds the message
/// received from each rank, indexed by source. The rank's own message is
/// returned as-is in its slot.
pub trait Transport {
    fn rank(&self) -> usize;
    fn n_ranks(&self) -> usize;

    /// Exchange one message with every rank. `messages[r]` goes to rank `r`;
    /// the result holds the message received from each rank.
    fn all_to_all(&self, messages: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, HaloError>;

    /// Global sum across ranks (blocking).
    fn all_reduce_sum(&self, value: f64) -> Result<f64, HaloError> {
        let received = self.broadcast_f64(value)?;
        Ok(received.into_iter().sum())
    }

    /// Global max across ranks (blocking).
    fn all_reduce_max(&self, value: f64) -> Result<f64, HaloError> {
        let received = self.broadcast_f64(value)?;
        Ok(received.into_iter().fold(f64::NEG_INFINITY, f64::max))
    }

    /// Broadcast one f64 to all ranks and collect everyone's value.
    fn broadcast_f64(&self, value: f64) -> Result<Vec<f64>, HaloError> {
        let frame = value.to_le_bytes().to_vec();
        let messages = vec![frame; self.n_ranks()];
        let received = self.all_to_all(messages)?;
        received
            .into_iter()
            .enumerate()
            .map(|(src, bytes)| {
                let arr: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    HaloError::Transport(format!("rank {src} sent a malformed reduction frame"))
                })?;
                Ok(f64::from_le_bytes(arr))
            })
            .collect()
    }
}

/// Single-rank transport: every collective is a local no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialTransport;

impl Transport for SerialTransport {
    fn rank(&self) -> usize {
        0
    }

    fn n_ranks(&self) -> usize {
        1
    }

    fn all_to_all(&self, messages: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, HaloError> {
        if messages.len() != 1 {
            return Err(HaloError::Transport(format!(
                "serial transport got {} messages, expected 1",
                messages.len()
            )));
        }
        Ok(messages)
    }
}

/// In-process multi-rank transport over `std::sync::mpsc` channels.
///
/// Ranks may drift by a phase (a fast rank can start its next all-to-all
/// before a slow one finishes the current), so messages arriving early for a
/// future phase are parked per source until that phase begins. Per-sender
/// channel ordering then guarantees deterministic matching.
pub struct LocalTransport {
    rank: usize,
    senders: Vec<Sender<(usize, Vec<u8>)>>,
    receiver: Receiver<(usize, Vec<u8>)>,
    parked: RefCell<Vec<VecDeque<Vec<u8>>>>,
}

impl LocalTransport {
    /// Create a connected cluster of `n_ranks` transports. Each entry is
    /// moved onto its own rank thread by the caller.
    pub fn cluster(n_ranks: usize) -> Vec<LocalTransport> {
        assert!(n_ranks > 0, "cluster needs at least one rank");
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..n_ranks).map(|_| channel()).unzip();
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| LocalTransport {
                rank,
                senders: senders.clone(),
                receiver,
                parked: RefCell::new(vec![VecDeque::new(); n_ranks]),
            })
            .collect()
    }
}

impl Transport for LocalTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn n_ranks(&self) -> usize {
        self.senders.len()
    }

    fn all_to_all(&self, messages: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, HaloError> {
        let n = self.senders.len();
        if messages.len() != n {
            return Err(HaloError::Transport(format!(
                "all_to_all got {} messages for {} ranks",
                messages.len(),
                n
            )));
        }

        let mut received: Vec<Option<Vec<u8>>> = vec![None; n];
        let mut outstanding = n - 1;

        for (dst, message) in messages.into_iter().enumerate() {
            if dst == self.rank {
                received[dst] = Some(message);
            } else {
                self.senders[dst]
                    .send((self.rank, message))
                    .map_err(|_| HaloError::Transport(format!("rank {dst} hung up")))?;
            }
        }

        // Drain anything parked from earlier calls first.
        {
            let mut parked = self.parked.borrow_mut();
            for (src, queue) in parked.iter_mut().enumerate() {
                if outstanding > 0 && received[src].is_none() {
                    if let Some(message) = queue.pop_front() {
                        received[src] = Some(message);
                        outstanding -= 1;
                    }
                }
            }
        }

        while outstanding > 0 {
            let (src, message) = self
                .receiver
                .recv()
                .map_err(|_| HaloError::Transport("all peers hung up".into()))?;
            if received[src].is_none() {
                received[src] = Some(message);
                outstanding -= 1;
            } else {
                // A peer raced ahead into its next phase.
                self.parked.borrow_mut()[src].push_back(message);
            }
        }

        Ok(received.into_iter().map(|m| m.unwrap()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_all_to_all_loopback() {
        let t = SerialTransport;
        let out = t.all_to_all(vec![vec![1, 2, 3]]).unwrap();
        assert_eq!(out, vec![vec![1, 2, 3]]);
        assert_eq!(t.all_reduce_sum(2.5).unwrap(), 2.5);
    }

    #[test]
    fn test_local_cluster_all_to_all() {
        let cluster = LocalTransport::cluster(3);
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = cluster
                .into_iter()
                .map(|t| {
                    scope.spawn(move || {
                        let messages: Vec<Vec<u8>> =
                            (0..3).map(|dst| vec![t.rank() as u8, dst as u8]).collect();
                        t.all_to_all(messages).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for (rank, received) in results.iter().enumerate() {
            for (src, message) in received.iter().enumerate() {
                assert_eq!(message, &vec![src as u8, rank as u8]);
            }
        }
    }

    #[test]
    fn test_local_cluster_reductions() {
        let cluster = LocalTransport::cluster(4);
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = cluster
                .into_iter()
                .map(|t| {
                    scope.spawn(move || {
                        let v = (t.rank() + 1) as f64;
                        (t.all_reduce_sum(v).unwrap(), t.all_reduce_max(v).unwrap())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for (sum, max) in results {
            assert_eq!(sum, 10.0);
            assert_eq!(max, 4.0);
        }
    }

    #[test]
    fn test_phase_skew_is_buffered() {
        // Rank 0 performs two exchanges back to back while rank 1 lags; the
        // parked queue must keep the phases separated.
        let cluster = LocalTransport::cluster(2);
        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = cluster
                .into_iter()
                .map(|t| {
                    scope.spawn(move || {
                        if t.rank() == 1 {
                            std::thread::sleep(std::time::Duration::from_millis(20));
                        }
                        let a = t.all_to_all(vec![vec![10], vec![10]]).unwrap();
                        let b = t.all_to_all(vec![vec![20], vec![20]]).unwrap();
                        (a, b)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for (a, b) in results {
            assert!(a.iter().all(|m| m == &vec![10]));
            assert!(b.iter().all(|m| m == &vec![20]));
        }
    }
}
