//! Wire types for the remote display console protocol.
//!
//! This crate contains the serde-serializable types used for communication
//! with a remote display gateway. These types represent the "protocol layer" -
//! the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization and
//!   trivial derivations (geometry scaling, query assembly)
//! - **1:1 with the gateway protocol**: Match the instruction and
//!   notification shapes the gateway speaks
//! - **Stable**: Changes only when the wire protocol changes
//!
//! Session lifecycle and capability composition are built on top of these
//! types in `rdc-rs`.

pub mod geometry;
pub mod input;
pub mod options;
pub mod params;
pub mod types;

pub use geometry::*;
pub use input::*;
pub use options::*;
pub use params::*;
pub use types::*;
