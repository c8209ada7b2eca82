//! Adapters for the `OrchestratorClient` port.

pub mod http;
pub mod mock;

pub use http::HttpOrchestratorClient;
pub use mock::MockOrchestratorClient;
