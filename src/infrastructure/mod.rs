//! Adapters for every domain port, plus the ambient stack: config,
//! logging, shared transport.

pub mod agent_metrics;
pub mod config;
pub mod http;
pub mod logging;
pub mod orchestrator;
pub mod self_monitor;
pub mod stats_source;
pub mod transport;
pub mod tsdb;
