//! Adapters for the `AgentMetricsClient` port.

pub mod http;
pub mod mock;

pub use http::HttpAgentMetricsClient;
pub use mock::MockAgentMetricsClient;
