//! Halo exchange: ghost-region synchronization between ranks.
//!
//! [`Transport`] is the narrow seam over the message-passing layer (MPI in a
//! production build). [`Halo`] precomputes, once per decomposition, the
//! per-neighbor send/receive index lists for each mesh element kind; every
//! [`Halo::exchange`] call then packs owned values, performs one sparse
//! all-to-all, and unpacks into the halo slots. Calls are blocking and
//! idempotent: owned entries are never written, and repeating an exchange
//! leaves every array unchanged.

mod exchange;
mod transport;

pub use exchange::Halo;
pub use transport::{LocalTransport, SerialTransport, Transport};
