//! Scripted in-process service with fault injection.

use crate::error::ServiceError;
use crate::service::SimulationService;
use crate::types::{Domain, HealthStatus, SimulationRequest, SimulationResult};
use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Deterministic stand-in for the computation service.
///
/// Answers each `(domain, algorithm)` pair with a canned payload, fails the
/// pairs it was told to fail, and records every request it receives, so the
/// orchestration logic can be exercised without a network.
///
/// # Fault Injection
///
/// - `with_failure`: a specific algorithm always fails with a given error
/// - `with_failure_rate`: any call fails with a seeded probability
/// - `with_latency`: every call is delayed before it settles
pub struct ScriptedService {
    /// Canned payloads in registration order
    responses: Vec<(Domain, String, Value)>,

    /// Forced failures per (domain, algorithm)
    failures: Vec<(Domain, String, ServiceError)>,

    /// Probability (0.0 - 1.0) that any call fails with a transport error
    failure_rate: f64,

    /// Delay applied to every call
    latency: Duration,

    /// Seeded RNG for `failure_rate`
    rng: Mutex<ChaCha8Rng>,

    /// Every request received, in arrival order
    calls: Mutex<Vec<SimulationRequest>>,
}

impl ScriptedService {
    /// Creates an empty script (every simulate call is rejected).
    pub fn new() -> Self {
        Self::seeded(0)
    }

    /// Creates an empty script whose random faults derive from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            responses: Vec::new(),
            failures: Vec::new(),
            failure_rate: 0.0,
            latency: Duration::ZERO,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Registers the payload returned for `(domain, algorithm)`.
    pub fn with_response(mut self, domain: Domain, algorithm: &str, payload: Value) -> Self {
        self.responses.retain(|(d, a, _)| !(*d == domain && a == algorithm));
        self.responses.push((domain, algorithm.to_string(), payload));
        self
    }

    /// Makes `(domain, algorithm)` always fail with `error`.
    pub fn with_failure(mut self, domain: Domain, algorithm: &str, error: ServiceError) -> Self {
        self.failures.push((domain, algorithm.to_string(), error));
        self
    }

    /// Sets the probability that any call fails with a transport error.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Delays every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns a copy of every request received so far.
    pub fn calls(&self) -> Vec<SimulationRequest> {
        lock(&self.calls).clone()
    }

    /// Returns the number of simulate calls received so far.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns the algorithms that received a call, in call order.
    pub fn called_algorithms(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .map(|r| r.algorithm().to_string())
            .collect()
    }

    fn forced_failure(&self, domain: Domain, algorithm: &str) -> Option<ServiceError> {
        self.failures
            .iter()
            .find(|(d, a, _)| *d == domain && a == algorithm)
            .map(|(_, _, err)| err.clone())
    }

    fn random_failure(&self) -> bool {
        self.failure_rate > 0.0 && lock(&self.rng).gen::<f64>() < self.failure_rate
    }
}

impl Default for ScriptedService {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl SimulationService for ScriptedService {
    async fn simulate(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResult, ServiceError> {
        let domain = request.domain();
        let algorithm = request.algorithm();
        lock(&self.calls).push(request.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(err) = self.forced_failure(domain, algorithm) {
            debug!("scripted failure for {}/{}: {}", domain, algorithm, err);
            return Err(err);
        }

        if self.random_failure() {
            debug!("injected fault for {}/{}", domain, algorithm);
            return Err(ServiceError::transport("injected fault"));
        }

        let payload = self
            .responses
            .iter()
            .find(|(d, a, _)| *d == domain && a == algorithm)
            .map(|(_, _, payload)| payload.clone())
            .ok_or_else(|| {
                ServiceError::rejected(422, format!("Unknown algorithm: {}", algorithm))
            })?;

        SimulationResult::from_payload(domain, algorithm, payload)
    }

    async fn algorithms(&self, domain: Domain) -> Result<Vec<String>, ServiceError> {
        Ok(self
            .responses
            .iter()
            .filter(|(d, _, _)| *d == domain)
            .map(|(_, a, _)| a.clone())
            .collect())
    }

    async fn health(&self) -> Result<HealthStatus, ServiceError> {
        let mut algorithms: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (domain, algorithm, _) in &self.responses {
            algorithms
                .entry(domain.as_str().to_string())
                .or_default()
                .push(algorithm.clone());
        }

        Ok(HealthStatus {
            status: "healthy".to_string(),
            version: "scripted".to_string(),
            algorithms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CpuRequest, PageRequest, ProcessSpec};
    use serde_json::json;

    fn page_request(algorithm: &str) -> SimulationRequest {
        SimulationRequest::Page(PageRequest {
            algorithm: algorithm.to_string(),
            page_sequence: vec![7, 0, 1],
            frame_count: 3,
        })
    }

    fn page_payload(faults: u32) -> Value {
        json!({
            "metrics": {"page_faults": faults, "page_hits": 3 - faults},
            "trace": []
        })
    }

    #[tokio::test]
    async fn test_scripted_response_and_call_log() {
        let service = ScriptedService::new().with_response(Domain::Page, "LRU", page_payload(3));

        let result = service.simulate(&page_request("LRU")).await.unwrap();
        assert_eq!(result.metrics().get("page_faults"), Some(3.0));
        assert_eq!(result.algorithm(), "LRU");
        assert_eq!(service.call_count(), 1);
        assert_eq!(service.calls()[0], page_request("LRU"));
    }

    #[tokio::test]
    async fn test_unknown_algorithm_rejected() {
        let service = ScriptedService::new();
        let err = service.simulate(&page_request("MRU")).await.unwrap_err();
        assert_eq!(err.user_message(Domain::Page), "Unknown algorithm: MRU");
        // Rejected calls are still recorded
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_forced_failure_wins_over_response() {
        let service = ScriptedService::new()
            .with_response(Domain::Page, "FIFO", page_payload(2))
            .with_failure(Domain::Page, "FIFO", ServiceError::Timeout(30_000));

        let err = service.simulate(&page_request("FIFO")).await.unwrap_err();
        assert_eq!(err, ServiceError::Timeout(30_000));
    }

    #[tokio::test]
    async fn test_failure_rate_deterministic() {
        async fn outcomes(seed: u64) -> Vec<bool> {
            let service = ScriptedService::seeded(seed)
                .with_response(Domain::Page, "LRU", page_payload(1))
                .with_failure_rate(0.5);
            let mut out = Vec::new();
            for _ in 0..32 {
                out.push(service.simulate(&page_request("LRU")).await.is_ok());
            }
            out
        }

        let a = outcomes(7).await;
        let b = outcomes(7).await;
        assert_eq!(a, b);
        assert!(a.iter().any(|ok| *ok));
        assert!(a.iter().any(|ok| !*ok));
    }

    #[tokio::test]
    async fn test_listing_and_health() {
        let service = ScriptedService::new()
            .with_response(Domain::Page, "FIFO", page_payload(1))
            .with_response(Domain::Page, "LRU", page_payload(1))
            .with_response(
                Domain::Cpu,
                "FCFS",
                json!({"metrics": {}, "timeline": []}),
            );

        assert_eq!(service.algorithms(Domain::Page).await.unwrap(), vec!["FIFO", "LRU"]);
        assert!(service.algorithms(Domain::Disk).await.unwrap().is_empty());

        let health = service.health().await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.algorithms["cpu"], vec!["FCFS"]);
    }

    #[tokio::test]
    async fn test_domain_mismatch_is_decode_error() {
        // A CPU call answered with a page-shaped payload has no timeline.
        let service =
            ScriptedService::new().with_response(Domain::Cpu, "FCFS", page_payload(1));
        let request = SimulationRequest::Cpu(CpuRequest {
            algorithm: "FCFS".into(),
            processes: vec![ProcessSpec {
                pid: 1,
                arrival: 0,
                burst: 1,
                priority: 0,
            }],
            time_quantum: None,
        });
        assert!(matches!(
            service.simulate(&request).await,
            Err(ServiceError::Decode(_))
        ));
    }
}
