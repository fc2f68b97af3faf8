// HTTP transport for the availability endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Proxy;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::query::{SearchQuery, TripType};

/// Total attempts are `max_retries + 1`.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

// Error types for the transport layer
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to reach availability API after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },

    #[error("Availability API responded with an error: status {status}")]
    Status { status: u16, body: String },

    #[error("Invalid JSON received from availability API: {0}")]
    Decode(String),

    #[error("Request to availability API failed: {0}")]
    Request(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Seam between the orchestrator and the wire; lets tests substitute a
/// canned transport.
#[async_trait]
pub trait AvailabilityClient: Send + Sync {
    async fn fetch(&self, query: &SearchQuery) -> Result<Value, TransportError>;
}

pub struct HttpAvailabilityClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl HttpAvailabilityClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        proxy: Option<Proxy>,
        max_retries: u32,
    ) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|err| TransportError::Client(err.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
        })
    }

    // Fixed wire mapping; connecting flights and flexible-date windows are
    // always disabled.
    fn build_params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let round_trip = query.trip_type == TripType::RoundTrip;
        let mut params = vec![
            ("Origin", query.origin.clone()),
            ("Destination", query.destination.clone()),
            ("DateOut", query.date_from.clone()),
            ("ADT", query.adults.to_string()),
            ("TEEN", query.teens.to_string()),
            ("CHD", query.children.to_string()),
            ("INF", query.infants.to_string()),
            ("ToUs", "AGREED".to_string()),
            ("IncludeConnectingFlights", "false".to_string()),
            ("FlexDaysBeforeOut", "0".to_string()),
            ("FlexDaysOut", "0".to_string()),
            ("RoundTrip", round_trip.to_string()),
            ("Currency", query.currency.clone()),
        ];
        if round_trip {
            if let Some(date_to) = &query.date_to {
                params.push(("DateIn", date_to.clone()));
                params.push(("FlexDaysBeforeIn", "0".to_string()));
                params.push(("FlexDaysIn", "0".to_string()));
            }
        }
        params
    }
}

#[async_trait]
impl AvailabilityClient for HttpAvailabilityClient {
    /// Issues the availability request. Connection and timeout errors are
    /// retried immediately up to the retry budget; error statuses and
    /// undecodable bodies fail without retry.
    async fn fetch(&self, query: &SearchQuery) -> Result<Value, TransportError> {
        let params = self.build_params(query);
        let total_attempts = self.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=total_attempts {
            debug!(attempt, "requesting availability");
            let response = match self.http.get(&self.base_url).query(&params).send().await {
                Ok(response) => response,
                Err(err) if err.is_timeout() || err.is_connect() => {
                    warn!(
                        attempt,
                        total_attempts,
                        error = %err,
                        "network error while calling availability API"
                    );
                    last_error = err.to_string();
                    continue;
                }
                Err(err) => return Err(TransportError::Request(err.to_string())),
            };

            let status = response.status();
            debug!(status = status.as_u16(), "availability API status code");
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let snippet: String = body.chars().take(500).collect();
                error!(status = status.as_u16(), body = %snippet, "HTTP error from availability API");
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body: snippet,
                });
            }

            return response.json::<Value>().await.map_err(|err| {
                error!(error = %err, "failed to decode availability API JSON");
                TransportError::Decode(err.to_string())
            });
        }

        Err(TransportError::Exhausted {
            attempts: total_attempts,
            message: last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn one_way_query() -> SearchQuery {
        SearchQuery::from_value(&json!({
            "origin": "VIE",
            "destination": "BCN",
            "dateFrom": "2021-05-02",
            "tripType": "ONE_WAY",
            "adults": 1
        }))
        .unwrap()
    }

    fn round_trip_query() -> SearchQuery {
        SearchQuery::from_value(&json!({
            "origin": "VIE",
            "destination": "BCN",
            "dateFrom": "2021-05-02",
            "dateTo": "2021-05-09",
            "tripType": "ROUND_TRIP",
            "adults": 2,
            "children": 1
        }))
        .unwrap()
    }

    fn client(base_url: &str, max_retries: u32) -> HttpAvailabilityClient {
        HttpAvailabilityClient::new(base_url, Duration::from_secs(2), None, max_retries).unwrap()
    }

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    // Minimal HTTP responder: reads one request per connection, writes the
    // canned response and counts hits.
    async fn serve(response: &'static str) -> (SocketAddr, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(_) => return,
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        (addr, hits)
    }

    #[test]
    fn test_one_way_param_mapping() {
        let client = client("http://localhost", 0);
        let params = client.build_params(&one_way_query());

        assert_eq!(param(&params, "Origin"), Some("VIE"));
        assert_eq!(param(&params, "Destination"), Some("BCN"));
        assert_eq!(param(&params, "DateOut"), Some("2021-05-02"));
        assert_eq!(param(&params, "ADT"), Some("1"));
        assert_eq!(param(&params, "TEEN"), Some("0"));
        assert_eq!(param(&params, "CHD"), Some("0"));
        assert_eq!(param(&params, "INF"), Some("0"));
        assert_eq!(param(&params, "ToUs"), Some("AGREED"));
        assert_eq!(param(&params, "IncludeConnectingFlights"), Some("false"));
        assert_eq!(param(&params, "FlexDaysBeforeOut"), Some("0"));
        assert_eq!(param(&params, "FlexDaysOut"), Some("0"));
        assert_eq!(param(&params, "RoundTrip"), Some("false"));
        assert_eq!(param(&params, "Currency"), Some("EUR"));
        assert_eq!(param(&params, "DateIn"), None);
    }

    #[test]
    fn test_round_trip_adds_return_params() {
        let client = client("http://localhost", 0);
        let params = client.build_params(&round_trip_query());

        assert_eq!(param(&params, "RoundTrip"), Some("true"));
        assert_eq!(param(&params, "DateIn"), Some("2021-05-09"));
        assert_eq!(param(&params, "FlexDaysBeforeIn"), Some("0"));
        assert_eq!(param(&params, "FlexDaysIn"), Some("0"));
        assert_eq!(param(&params, "ADT"), Some("2"));
        assert_eq!(param(&params, "CHD"), Some("1"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = client("http://localhost/api/", 0);
        assert_eq!(client.base_url, "http://localhost/api");
    }

    #[tokio::test]
    async fn test_successful_fetch_decodes_json() {
        let (addr, hits) = serve(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 12\r\nConnection: close\r\n\r\n{\"trips\":[]}",
        )
        .await;
        let client = client(&format!("http://{addr}"), 2);

        let body = client.fetch(&one_way_query()).await.unwrap();
        assert_eq!(body, json!({ "trips": [] }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_status_fails_without_retry() {
        let (addr, hits) = serve(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 4\r\nConnection: close\r\n\r\noops",
        )
        .await;
        let client = client(&format!("http://{addr}"), 2);

        let err = client.fetch(&one_way_query()).await.unwrap_err();
        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_undecodable_body_fails_without_retry() {
        let (addr, hits) = serve(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 8\r\nConnection: close\r\n\r\nnot json",
        )
        .await;
        let client = client(&format!("http://{addr}"), 2);

        let err = client.fetch(&one_way_query()).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)), "got: {err}");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connection_errors_exhaust_retry_budget() {
        // Bind then drop to obtain a port nothing is listening on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = client(&format!("http://{addr}"), 2);

        let err = client.fetch(&one_way_query()).await.unwrap_err();
        match err {
            TransportError::Exhausted { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}
