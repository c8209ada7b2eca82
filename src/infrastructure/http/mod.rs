//! HTTP servers for all three binaries: an `AppState`-behind-`Arc` +
//! `TraceLayer` + graceful-shutdown pattern shared across agent, engine,
//! and router.

pub mod agent_server;
pub mod engine_server;
pub mod router_server;
