//! Request proxy lifecycle: select a replica, acquire a
//! lease, forward the request, release the lease on every exit path.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use tracing::warn;

use crate::domain::error::RouterError;
use crate::domain::models::Replica;
use crate::infrastructure::transport::SharedHttpClient;

use super::lease_ledger::LeaseLedger;

/// Upper bound on one proxied request's wall-clock duration.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection-specific headers that must not be forwarded verbatim
/// between hops (RFC 7230 §6.1), plus the request's own `Host`, which
/// must be recomputed for the upstream replica rather than carried over.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut stripped = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !HOP_BY_HOP.iter().any(|h| name.as_str().eq_ignore_ascii_case(h)) {
            stripped.insert(name.clone(), value.clone());
        }
    }
    stripped
}

pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Forwards one request to `replica`, holding a lease for its duration
/// when `acquire_lease` is set (only the `lease` and `hybrid` policies
/// ever consult lease counts). The lease, if acquired, is released
/// before returning along every path, including transport failure.
pub async fn forward(
    transport: &SharedHttpClient,
    ledger: &LeaseLedger,
    acquire_lease: bool,
    lease_duration: std::time::Duration,
    replica: &Replica,
    method: Method,
    path_and_query: &str,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ProxyResponse, RouterError> {
    let lease_id = if acquire_lease {
        Some(ledger.acquire(replica.id.clone(), lease_duration).await)
    } else {
        None
    };

    let result = send(transport, replica, method, path_and_query, headers, body).await;

    if let Some(lease_id) = lease_id {
        ledger.release(lease_id).await;
    }

    result
}

async fn send(
    transport: &SharedHttpClient,
    replica: &Replica,
    method: Method,
    path_and_query: &str,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ProxyResponse, RouterError> {
    let url = format!("{}{path_and_query}", replica.address);
    let mut request = transport.raw().request(method, &url).timeout(UPSTREAM_TIMEOUT);
    for (name, value) in &strip_hop_by_hop(&headers) {
        request = request.header(name, value);
    }
    request = request.body(body);

    let response = request.send().await.map_err(|e| {
        warn!(replica = %replica.id, error = %e, "proxy: upstream request failed");
        RouterError::UpstreamUnreachable {
            replica: replica.id.to_string(),
        }
    })?;

    let status = response.status();
    let headers = strip_hop_by_hop(response.headers());
    let body = response.bytes().await.map_err(|e| {
        warn!(replica = %replica.id, error = %e, "proxy: failed reading upstream body");
        RouterError::UpstreamUnreachable {
            replica: replica.id.to_string(),
        }
    })?;

    Ok(ProxyResponse { status, headers, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn strips_connection_and_host_but_keeps_ordinary_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("host", HeaderValue::from_static("original-host"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("x-request-id", HeaderValue::from_static("abc123"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let stripped = strip_hop_by_hop(&headers);

        assert!(!stripped.contains_key("connection"));
        assert!(!stripped.contains_key("host"));
        assert!(!stripped.contains_key("transfer-encoding"));
        assert_eq!(stripped.get("x-request-id").unwrap(), "abc123");
        assert_eq!(stripped.get("content-type").unwrap(), "application/json");
    }
}
