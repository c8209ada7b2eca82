//! Alert delivery: a single HTTP POST to the engine with a 1s timeout and
//! one retry at 100ms backoff; failure after retry is logged and dropped
//!.

use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::models::{Alert, AlertResponse};
use crate::infrastructure::transport::{send_with_one_retry, SharedHttpClient};

const ALERT_TIMEOUT: Duration = Duration::from_secs(1);
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Posts one alert to the engine, retrying exactly once on transport
/// failure. A failure after the retry is logged and the alert is dropped;
/// the engine tolerates missed/duplicate alerts.
pub async fn send_alert(client: &SharedHttpClient, engine_url: &str, alert: &Alert) {
    let url = format!("{engine_url}/alert");
    let result = send_with_one_retry(RETRY_BACKOFF, || async {
        client
            .post_json::<Alert, AlertResponse>(&url, alert, ALERT_TIMEOUT)
            .await
    })
    .await;

    match result {
        Ok(response) => debug!(
            container = %alert.container_id,
            scenario = ?alert.scenario,
            status = ?response.status,
            "alert delivered"
        ),
        Err(e) => warn!(
            container = %alert.container_id,
            scenario = ?alert.scenario,
            error = %e,
            "alert delivery failed after retry, dropping"
        ),
    }
}
