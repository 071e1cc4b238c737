//! # fvom-rs
//!
//! The computational core of a layered finite-volume ocean model on
//! unstructured polygonal meshes.
//!
//! This crate provides the building blocks for a C-grid ocean solver:
//! - Mesh representation (global description and sentinel-padded local
//!   partitions)
//! - Domain decomposition with layered halos and a pluggable transport
//! - Vertical coordinate: layer bounds, pressure/height scans, target
//!   thickness redistribution
//! - Mimetic horizontal operators (divergence, gradient, curl, tangential
//!   reconstruction)
//! - Prognostic state with two time levels and halo synchronization
//! - Auxiliary (diagnostic) field groups and the tendency terms of the
//!   thickness, momentum, and tracer equations
//! - Explicit time integrators (forward-backward, RK2, RK4)

pub mod aux;
pub mod config;
pub mod decomp;
pub mod eos;
pub mod error;
pub mod halo;
pub mod mesh;
pub mod operators;
pub mod registry;
pub mod state;
pub mod tendency;
pub mod time;
pub mod types;
pub mod vertical;

// Re-export main types for convenience
pub use aux::{AuxiliaryState, FluxInterp};
pub use config::Config;
pub use decomp::{Decomp, Partitioner};
pub use eos::{LinearEos, SpecificVolume};
pub use error::{ConfigError, DecompError, Error, HaloError, MeshError, RegistryError};
pub use halo::{Halo, LocalTransport, SerialTransport, Transport};
pub use mesh::{GlobalMesh, LocalMesh};
pub use operators::{CurlOnVertex, DivergenceOnCell, GradientOnEdge, TangentialReconOnEdge};
pub use registry::{FieldMetadata, FieldRegistry, ModelContext, DEFAULT_NAME};
pub use state::{OceanState, TimeLevel};
pub use tendency::{CustomTendency, Tendencies, TendencyConfig};
pub use time::{forward_backward_step, rk2_step, rk4_step};
pub use types::ElemKind;
pub use vertical::{MovementProfile, VerticalCoord};
