//! Production implementation of SimulationService using reqwest.

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::service::SimulationService;
use crate::types::{Domain, HealthStatus, SimulationRequest, SimulationResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// HTTP client for the remote computation service.
///
/// Every call carries the configured timeout (30 s by default). Non-2xx
/// responses become `ServiceError::Rejected` with the server's `detail`
/// message when one can be extracted from the body.
pub struct HttpService {
    client: reqwest::Client,
    config: ServiceConfig,
}

/// The algorithm listing comes back either bare or wrapped with descriptions.
#[derive(Deserialize)]
#[serde(untagged)]
enum AlgorithmListing {
    Plain(Vec<String>),
    Described { algorithms: Vec<String> },
}

impl From<AlgorithmListing> for Vec<String> {
    fn from(listing: AlgorithmListing) -> Self {
        match listing {
            AlgorithmListing::Plain(ids) => ids,
            AlgorithmListing::Described { algorithms } => algorithms,
        }
    }
}

impl HttpService {
    /// Creates a client for the given endpoint configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ServiceError::transport(e.to_string()))?;

        info!(
            "Service client ready: {} (timeout {}ms)",
            config.base_url,
            config.timeout_ms()
        );

        Ok(Self { client, config })
    }

    /// Returns the endpoint configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn map_transport(&self, err: reqwest::Error) -> ServiceError {
        if err.is_timeout() {
            ServiceError::Timeout(self.config.timeout_ms())
        } else {
            ServiceError::transport(err.to_string())
        }
    }

    /// Reads a JSON body, turning non-2xx statuses into rejections.
    async fn read_json(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<Value, ServiceError> {
        let status = response.status();

        if !status.is_success() {
            let body: Option<Value> = response.json().await.ok();
            let detail = body.as_ref().and_then(detail_message);
            warn!(
                "{} -> {} ({})",
                url,
                status.as_u16(),
                detail.as_deref().unwrap_or("no detail")
            );
            return Err(ServiceError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        debug!("{} -> {}", url, status.as_u16());
        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Timeout(self.config.timeout_ms())
            } else {
                ServiceError::decode(e.to_string())
            }
        })
    }

    async fn get_json(&self, path: &str) -> Result<Value, ServiceError> {
        let url = self.config.endpoint(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        self.read_json(&url, response).await
    }
}

#[async_trait]
impl SimulationService for HttpService {
    async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResult, ServiceError> {
        let url = self.config.endpoint(&request.path());
        debug!("POST {} (algorithm={})", url, request.algorithm());

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let payload = self.read_json(&url, response).await?;
        SimulationResult::from_payload(request.domain(), request.algorithm(), payload)
    }

    async fn algorithms(&self, domain: Domain) -> Result<Vec<String>, ServiceError> {
        let body = self.get_json(&domain.algorithms_path()).await?;
        let listing: AlgorithmListing = serde_json::from_value(body)
            .map_err(|e| ServiceError::decode(format!("invalid algorithm listing: {}", e)))?;
        Ok(listing.into())
    }

    async fn health(&self) -> Result<HealthStatus, ServiceError> {
        let body = self.get_json("/health").await?;
        serde_json::from_value(body)
            .map_err(|e| ServiceError::decode(format!("invalid health response: {}", e)))
    }
}

/// Extracts a user-facing message from an error body.
///
/// `detail` is either a plain string or a list of validation errors whose
/// `msg` fields are joined.
pub(crate) fn detail_message(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .filter(|msg| !msg.is_empty())
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}
