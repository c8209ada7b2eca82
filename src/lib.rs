//! SwarmGuard - proactive self-healing control plane for a
//! container-orchestrated cluster.
//!
//! Three cooperating subsystems, each its own binary sharing this library:
//! - [`application::agent`]: per-node sampling & classification
//! - [`application::engine`]: the central recovery decision loop
//! - [`application::router`]: the intelligent request router
//!
//! The orchestrator, the TSDB, and the application's own health endpoint
//! are external collaborators reached only through the trait ports in
//! [`domain::ports`].

pub mod application;
pub mod domain;
pub mod infrastructure;
