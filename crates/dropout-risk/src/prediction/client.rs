use super::encoder::EncodedPayload;
use super::response::{PredictionReply, ProtocolViolation};
use crate::config::PredictionConfig;
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// Boundary to the remote scoring model so the assessor can run without a network.
pub trait PredictionService: Send + Sync {
    fn predict(
        &self,
        payload: &EncodedPayload,
    ) -> impl Future<Output = Result<PredictionReply, TransportError>> + Send;
}

/// Failure to obtain any interpretable answer from the prediction service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("prediction service unreachable: {0}")]
    Unreachable(String),
    #[error("prediction service timed out after {0:?}")]
    TimedOut(Duration),
    #[error("prediction service sent an unusable response (HTTP {status}): {violation}")]
    Protocol {
        status: u16,
        violation: ProtocolViolation,
    },
}

/// JSON-over-HTTP client for the scoring endpoint. No retries.
#[derive(Debug, Clone)]
pub struct HttpPredictionService {
    endpoint: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

impl HttpPredictionService {
    pub fn new(config: &PredictionConfig) -> Result<Self, ClientBuildError> {
        let timeout = config.timeout();
        let url = reqwest::Url::parse(&config.endpoint)
            .map_err(|err| ClientBuildError(format!("{}: {err}", config.endpoint)))?;

        let mut builder = reqwest::Client::builder().timeout(timeout);
        // A locally hosted model must not be routed through a system proxy.
        if is_loopback(&url) {
            builder = builder.no_proxy();
        }
        let http_client = builder
            .build()
            .map_err(|err| ClientBuildError(err.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            timeout,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PredictionService for HttpPredictionService {
    async fn predict(&self, payload: &EncodedPayload) -> Result<PredictionReply, TransportError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(err))?;
        debug!(status, bytes = body.len(), "prediction service responded");

        PredictionReply::from_slice(&body)
            .map_err(|violation| TransportError::Protocol { status, violation })
    }
}

impl HttpPredictionService {
    fn transport_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::TimedOut(self.timeout)
        } else {
            TransportError::Unreachable(err.to_string())
        }
    }
}

fn is_loopback(url: &reqwest::Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    host.eq_ignore_ascii_case("localhost")
        || host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unable to build HTTP client: {0}")]
pub struct ClientBuildError(pub String);
