//! `TsdbSink` adapters.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::error::TransportError;
use crate::domain::models::SampleBatch;
use crate::domain::ports::TsdbSink;
use crate::infrastructure::transport::SharedHttpClient;

/// Writes each batch as a line-protocol POST to an InfluxDB-compatible
/// write endpoint, over the shared 2s-timeout transport. Failure is
/// logged by the caller and never propagated as fatal.
pub struct HttpTsdbSink {
    write_url: String,
    transport: SharedHttpClient,
}

impl HttpTsdbSink {
    #[must_use]
    pub fn new(write_url: impl Into<String>, transport: SharedHttpClient) -> Self {
        Self {
            write_url: write_url.into(),
            transport,
        }
    }

    fn to_line_protocol(batch: &SampleBatch) -> String {
        batch
            .samples
            .iter()
            .map(|s| {
                format!(
                    "container_stats,node={},container_id={},service={} cpu_percent={},memory_percent={},network_percent={} {}",
                    s.node,
                    s.container_id,
                    s.service_name,
                    s.cpu_percent,
                    s.memory_percent,
                    s.network_percent,
                    s.timestamp.timestamp_nanos_opt().unwrap_or_default(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl TsdbSink for HttpTsdbSink {
    async fn write_batch(&self, batch: &SampleBatch) -> Result<(), TransportError> {
        if batch.samples.is_empty() {
            return Ok(());
        }
        let body = Self::to_line_protocol(batch);
        let response = self
            .transport
            .raw()
            .post(&self.write_url)
            .timeout(crate::infrastructure::transport::DEFAULT_TIMEOUT)
            .body(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// No-op sink used when `tsdb_url` is unset; sampling still proceeds (the
/// TSDB is an optional external collaborator ).
#[derive(Default)]
pub struct NoopTsdbSink;

#[async_trait]
impl TsdbSink for NoopTsdbSink {
    async fn write_batch(&self, batch: &SampleBatch) -> Result<(), TransportError> {
        debug!(samples = batch.samples.len(), "no TSDB configured, dropping batch");
        Ok(())
    }
}
