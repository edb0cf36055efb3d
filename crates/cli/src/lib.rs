//! `rdc` - diagnostic command-line client for remote display console
//! sessions.
//!
//! Opens a console session against a gateway endpoint and holds it while
//! reporting state transitions and remote clipboard pushes. Useful for
//! verifying tickets, gateway reachability, and geometry negotiation
//! without a full display client.

pub mod cli;
pub mod commands;
pub mod logging;
