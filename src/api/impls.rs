// Standard library
use std::sync::Arc;
use std::time::Duration;

// 3rd party crates
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

// Project imports
use crate::metrics::{DispatchMetrics, HealthChecker, MetricsManager};
use crate::models::Document;
use crate::utility::rate_limiter::{RateLimitConfig, RateLimiter};

// Current module imports
use super::errors::{ClientError, DispatchError, EncodingError, TransportError};
use super::functions::{build_headers, create_reqwest_client};
use super::traits::{Encoder, Sender};
use super::types::{
    CrptApi, DispatchReport, Dispatcher, HttpSender, JsonEncoder, OutboundRequest, Outcome,
    SenderResponse, Submission,
};

impl<R> Submission<R> {
    pub fn new(payload: R, signature: impl Into<String>) -> Self {
        Self {
            payload,
            signature: signature.into(),
        }
    }
}

impl Outcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Outcome::Sent { .. })
    }

    /// Status code of the response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Sent { status, .. } => Some(*status),
            Outcome::SendFailed(DispatchError::NonSuccessStatus { status, .. }) => Some(*status),
            Outcome::SendFailed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&DispatchError> {
        match self {
            Outcome::Sent { .. } => None,
            Outcome::SendFailed(error) => Some(error),
        }
    }
}

impl<R: Serialize> Encoder<R> for JsonEncoder {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, payload: &R) -> Result<Vec<u8>, EncodingError> {
        Ok(serde_json::to_vec(payload)?)
    }
}

impl HttpSender {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            client: create_reqwest_client(timeout)?,
            timeout,
        })
    }

    /// The client timeout covers the whole exchange, including reading the body.
    fn transport_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Http(error)
        }
    }
}

#[async_trait]
impl Sender for HttpSender {
    async fn send(&self, request: OutboundRequest) -> Result<SenderResponse, TransportError> {
        let headers = build_headers(&request)?;

        debug!(url = %request.url, bytes = request.body.len(), "Sending request");

        let response = self
            .client
            .post(request.url.as_str())
            .headers(headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        Ok(SenderResponse { status, body })
    }
}

impl CrptApi {
    /// Creates a client sending over HTTP with the given settings.
    ///
    /// Returns the client together with the channel its dispatch reports are
    /// delivered on. Must be called from within a tokio runtime.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        rate_limit: RateLimitConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<DispatchReport>), ClientError> {
        let sender = HttpSender::new(timeout)?;
        Self::with_sender(endpoint, rate_limit, sender)
    }

    /// Creates a client around an arbitrary [`Sender`].
    pub fn with_sender<S>(
        endpoint: impl Into<String>,
        rate_limit: RateLimitConfig,
        sender: S,
    ) -> Result<(Self, mpsc::UnboundedReceiver<DispatchReport>), ClientError>
    where
        S: Sender + 'static,
    {
        let endpoint: String = endpoint.into();
        let metrics = Arc::new(MetricsManager::new());
        let health = Arc::new(HealthChecker::new());
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();

        let dispatcher = Dispatcher::new(endpoint.clone(), sender, JsonEncoder)
            .with_metrics(Arc::clone(&metrics), Arc::clone(&health))
            .with_reports(reports_tx);

        let limiter = RateLimiter::new(rate_limit, dispatcher)?;
        info!(endpoint = %endpoint, "Document API client ready");

        Ok((
            Self {
                limiter,
                metrics,
                health,
            },
            reports_rx,
        ))
    }

    /// Queues `document` for submission and returns its ticket.
    ///
    /// Never blocks; the outcome arrives later on the report channel.
    pub fn create_document(&self, document: Document, signature: impl Into<String>) -> u64 {
        let doc_id = document.doc_id.clone();
        let ticket = self.limiter.submit(Submission::new(document, signature));
        debug!(ticket, doc_id = %doc_id, "Document queued for submission");
        ticket
    }

    /// Number of documents waiting for their turn.
    pub fn queued(&self) -> usize {
        self.limiter.queued()
    }

    pub async fn metrics(&self) -> DispatchMetrics {
        self.metrics.get_snapshot().await
    }

    pub async fn is_healthy(&self) -> bool {
        self.health.is_healthy().await
    }

    /// Submits everything still queued, then stops.
    pub async fn finish(self) {
        self.limiter.finish().await;
    }

    /// Stops after the in-flight submission; queued documents are discarded.
    pub async fn shutdown(self) {
        self.limiter.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;
    use tokio::time::Instant;

    use super::*;
    use crate::models::{Description, Product};

    /// Reads one HTTP/1.1 request: headers plus a `content-length` body.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8(buf).unwrap()
    }

    /// Accepts one connection, answers with `response` and keeps the socket
    /// open for `hold` afterwards. Resolves to the raw request.
    async fn serve_once(response: &'static str, hold: Duration) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/v3/lk/documents/create", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            stream.write_all(response.as_bytes()).await.unwrap();
            tokio::time::sleep(hold).await;
            request
        });

        (url, server)
    }

    fn local_sender(timeout: Duration) -> HttpSender {
        HttpSender {
            client: reqwest::Client::builder()
                .no_proxy()
                .http1_only()
                .timeout(timeout)
                .build()
                .unwrap(),
            timeout,
        }
    }

    fn outbound(url: String) -> OutboundRequest {
        OutboundRequest {
            url,
            content_type: "application/json",
            signature: "test_signature".into(),
            body: b"{\"doc_id\":\"1\"}".to_vec(),
        }
    }

    #[tokio::test]
    async fn http_sender_posts_and_returns_any_status() {
        let (url, server) = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 4\r\nconnection: close\r\n\r\nbusy",
            Duration::ZERO,
        )
        .await;

        let response = local_sender(Duration::from_secs(5))
            .send(outbound(url))
            .await
            .unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.body, "busy");

        let request = server.await.unwrap();
        let lowered = request.to_lowercase();
        assert!(request.starts_with("POST /api/v3/lk/documents/create HTTP/1.1\r\n"));
        assert!(lowered.contains("content-type: application/json\r\n"));
        assert!(lowered.contains("signature: test_signature\r\n"));
        assert!(request.ends_with("\r\n\r\n{\"doc_id\":\"1\"}"));
    }

    #[tokio::test]
    async fn unanswered_request_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/create", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_request(&mut stream).await;
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let result = local_sender(Duration::from_millis(200))
            .send(outbound(url))
            .await;
        assert!(matches!(result, Err(TransportError::Timeout(t)) if t == Duration::from_millis(200)));

        server.abort();
    }

    #[tokio::test]
    async fn stalled_response_body_times_out() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-length: 64\r\n\r\n{\"value\":",
            Duration::from_secs(30),
        )
        .await;

        let result = local_sender(Duration::from_millis(200))
            .send(outbound(url))
            .await;
        assert!(matches!(result, Err(TransportError::Timeout(_))));

        server.abort();
    }

    struct StatusSender {
        status: u16,
        sent: Arc<Mutex<Vec<(Instant, OutboundRequest)>>>,
    }

    #[async_trait]
    impl Sender for StatusSender {
        async fn send(&self, request: OutboundRequest) -> Result<SenderResponse, TransportError> {
            self.sent.lock().unwrap().push((Instant::now(), request));
            Ok(SenderResponse {
                status: self.status,
                body: "{\"value\":\"ok\"}".into(),
            })
        }
    }

    fn document(doc_id: &str) -> Document {
        Document {
            description: Description {
                participant_inn: "123456789".into(),
            },
            doc_id: doc_id.into(),
            doc_status: "testStatus".into(),
            doc_type: "testDocType".into(),
            import_request: true,
            owner_inn: "123456789".into(),
            participant_inn: "123456789".into(),
            producer_inn: "123456789".into(),
            production_date: "2020-01-23".into(),
            production_type: "testProductionType".into(),
            products: vec![Product {
                certificate_document: "testCert".into(),
                certificate_document_date: "2020-01-23".into(),
                certificate_document_number: "123".into(),
                owner_inn: "123456789".into(),
                producer_inn: "123456789".into(),
                production_date: "2020-01-23".into(),
                tnved_code: "testTnvedCode".into(),
                uit_code: "testUnitCode".into(),
                uitu_code: "testUituCode".into(),
            }],
            reg_date: "2020-01-23".into(),
            reg_number: "123456789".into(),
        }
    }

    #[test]
    fn json_encoder_reports_unserializable_payloads() {
        let mut payload: HashMap<(u8, u8), u8> = HashMap::new();
        payload.insert((1, 2), 3);

        let result = JsonEncoder.encode(&payload);
        assert!(matches!(result, Err(EncodingError::Json(_))));
    }

    #[test]
    fn outcome_accessors() {
        let sent = Outcome::Sent {
            status: 200,
            body: String::new(),
        };
        assert!(sent.is_sent());
        assert_eq!(sent.status(), Some(200));
        assert!(sent.error().is_none());

        let rejected = Outcome::SendFailed(DispatchError::NonSuccessStatus {
            status: 403,
            body: "forbidden".into(),
        });
        assert!(!rejected.is_sent());
        assert_eq!(rejected.status(), Some(403));

        let timed_out =
            Outcome::SendFailed(TransportError::Timeout(Duration::from_secs(1)).into());
        assert_eq!(timed_out.status(), None);
        assert!(timed_out.error().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn documents_are_submitted_at_the_configured_rate() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sender = StatusSender {
            status: 200,
            sent: Arc::clone(&sent),
        };
        let start = Instant::now();
        let (api, mut reports) = CrptApi::with_sender(
            "https://example.invalid/documents",
            RateLimitConfig::new(5, Duration::from_secs(1)),
            sender,
        )
        .unwrap();

        for i in 1..=10 {
            api.create_document(document(&i.to_string()), "test_signature");
        }
        api.finish().await;

        let mut tickets = Vec::new();
        while let Some(report) = reports.recv().await {
            assert!(report.outcome.is_sent());
            tickets.push(report.ticket);
        }
        assert_eq!(tickets, (0..10).collect::<Vec<u64>>());

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 10);
        let within_first_window = sent
            .iter()
            .filter(|(at, _)| at.duration_since(start) < Duration::from_secs(1))
            .count();
        assert_eq!(within_first_window, 5);

        let (_, first) = &sent[0];
        assert_eq!(first.url, "https://example.invalid/documents");
        assert_eq!(first.signature, "test_signature");
        let body: serde_json::Value = serde_json::from_slice(&first.body).unwrap();
        assert_eq!(body["doc_id"], "1");
    }

    #[tokio::test(start_paused = true)]
    async fn metrics_and_health_follow_outcomes() {
        let sender = StatusSender {
            status: 500,
            sent: Arc::new(Mutex::new(Vec::new())),
        };
        let (api, _reports) = CrptApi::with_sender(
            "https://example.invalid/documents",
            RateLimitConfig::new(10, Duration::from_secs(1)),
            sender,
        )
        .unwrap();

        for i in 0..3 {
            api.create_document(document(&i.to_string()), "sig");
        }
        while api.metrics().await.attempts < 3 {
            tokio::task::yield_now().await;
        }

        let metrics = api.metrics().await;
        assert_eq!(metrics.non_success_statuses, 3);
        assert_eq!(metrics.successes, 0);
        assert!(!api.is_healthy().await);

        api.finish().await;
    }
}
