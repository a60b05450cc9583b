//! Wire types shared by the client core and the service implementations.

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One of the three scheduling domains the service computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// CPU process scheduling
    Cpu,
    /// Page replacement
    Page,
    /// Disk head scheduling
    Disk,
}

impl Domain {
    /// Returns all domains in tab order.
    pub fn all() -> [Domain; 3] {
        [Domain::Cpu, Domain::Page, Domain::Disk]
    }

    /// Returns the path segment / file-name form (`cpu`, `page`, `disk`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Cpu => "cpu",
            Domain::Page => "page",
            Domain::Disk => "disk",
        }
    }

    /// Returns the human label used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            Domain::Cpu => "CPU",
            Domain::Page => "Page",
            Domain::Disk => "Disk",
        }
    }

    /// Returns the payload key holding this domain's step records.
    pub fn steps_key(&self) -> &'static str {
        match self {
            Domain::Cpu => "timeline",
            Domain::Page | Domain::Disk => "trace",
        }
    }

    /// Returns the simulate endpoint path.
    pub fn simulate_path(&self) -> String {
        format!("/api/simulate/{}/", self.as_str())
    }

    /// Returns the algorithm listing endpoint path.
    pub fn algorithms_path(&self) -> String {
        format!("/api/simulate/{}/algorithms", self.as_str())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Domain::Cpu),
            "page" => Ok(Domain::Page),
            "disk" => Ok(Domain::Disk),
            other => Err(format!("unknown domain '{}' (expected cpu, page or disk)", other)),
        }
    }
}

/// Initial head direction for the sweeping disk algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    #[default]
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => f.write_str("left"),
            Direction::Right => f.write_str("right"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(format!("unknown direction '{}' (expected left or right)", other)),
        }
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// A validated process row as sent to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub pid: u32,
    pub arrival: u32,
    pub burst: u32,
    pub priority: u32,
}

/// Body of `POST /api/simulate/cpu/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuRequest {
    pub algorithm: String,
    pub processes: Vec<ProcessSpec>,
    /// Serialized as `null` unless the algorithm is Round Robin
    pub time_quantum: Option<u32>,
}

/// Body of `POST /api/simulate/page/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub algorithm: String,
    pub page_sequence: Vec<u32>,
    pub frame_count: u32,
}

/// Body of `POST /api/simulate/disk/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskRequest {
    pub algorithm: String,
    pub request_queue: Vec<u32>,
    pub initial_head: u32,
    pub disk_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

/// An immutable simulation request, one variant per domain.
///
/// Serializes to the bare domain body (no tag); the domain selects the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SimulationRequest {
    Cpu(CpuRequest),
    Page(PageRequest),
    Disk(DiskRequest),
}

impl SimulationRequest {
    /// Returns the domain this request targets.
    pub fn domain(&self) -> Domain {
        match self {
            SimulationRequest::Cpu(_) => Domain::Cpu,
            SimulationRequest::Page(_) => Domain::Page,
            SimulationRequest::Disk(_) => Domain::Disk,
        }
    }

    /// Returns the requested algorithm identifier.
    pub fn algorithm(&self) -> &str {
        match self {
            SimulationRequest::Cpu(r) => &r.algorithm,
            SimulationRequest::Page(r) => &r.algorithm,
            SimulationRequest::Disk(r) => &r.algorithm,
        }
    }

    /// Returns the endpoint path for this request.
    pub fn path(&self) -> String {
        self.domain().simulate_path()
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// The `metrics` object of a result payload.
///
/// Kept as loosely-typed JSON so that a missing or non-numeric key surfaces
/// as "no value" at presentation time instead of failing the decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metrics(BTreeMap<String, Value>);

impl Metrics {
    /// Creates an empty metrics object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a numeric metric, or `None` if absent or not a number.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// Inserts a numeric metric.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), Value::from(value));
    }

    /// Returns true if the key is present (numeric or not).
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the metric names in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Metrics {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut metrics = Metrics::new();
        for (key, value) in iter {
            metrics.insert(key, value);
        }
        metrics
    }
}

/// A decoded simulation result.
///
/// The raw payload is retained verbatim (including fields this client does
/// not interpret, such as rendered images) so it can be exported unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    domain: Domain,
    algorithm: String,
    metrics: Metrics,
    payload: Value,
}

impl SimulationResult {
    /// Decodes a response payload for the given domain.
    ///
    /// # Errors
    /// `ServiceError::Decode` if the payload has no `metrics` object or no
    /// step-record array under the domain's key.
    pub fn from_payload(
        domain: Domain,
        algorithm: impl Into<String>,
        payload: Value,
    ) -> Result<Self, ServiceError> {
        let metrics_value = payload
            .get("metrics")
            .ok_or_else(|| ServiceError::decode("response has no `metrics` object"))?;
        let metrics = Metrics::deserialize(metrics_value)
            .map_err(|e| ServiceError::decode(format!("invalid `metrics`: {}", e)))?;

        let steps_key = domain.steps_key();
        if !payload.get(steps_key).map_or(false, Value::is_array) {
            return Err(ServiceError::decode(format!(
                "response has no `{}` array",
                steps_key
            )));
        }

        Ok(Self {
            domain,
            algorithm: algorithm.into(),
            metrics,
            payload,
        })
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Returns the raw step records (`timeline` for CPU, `trace` otherwise).
    pub fn steps(&self) -> &[Value] {
        self.payload
            .get(self.domain.steps_key())
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the disk service order, if the payload carries one.
    ///
    /// Non-integer entries are skipped.
    pub fn sequence(&self) -> Vec<i64> {
        self.payload
            .get("sequence")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default()
    }

    /// Returns the payload exactly as received.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    #[serde(default)]
    pub algorithms: BTreeMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_paths() {
        assert_eq!(Domain::Cpu.simulate_path(), "/api/simulate/cpu/");
        assert_eq!(Domain::Disk.algorithms_path(), "/api/simulate/disk/algorithms");
        assert_eq!("PAGE".parse::<Domain>(), Ok(Domain::Page));
        assert!("gpu".parse::<Domain>().is_err());
    }

    #[test]
    fn test_cpu_request_serializes_null_quantum() {
        let request = SimulationRequest::Cpu(CpuRequest {
            algorithm: "FCFS".into(),
            processes: vec![ProcessSpec {
                pid: 1,
                arrival: 0,
                burst: 5,
                priority: 0,
            }],
            time_quantum: None,
        });

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "algorithm": "FCFS",
                "processes": [{"pid": 1, "arrival": 0, "burst": 5, "priority": 0}],
                "time_quantum": null
            })
        );
        assert_eq!(request.path(), "/api/simulate/cpu/");
    }

    #[test]
    fn test_disk_request_omits_direction() {
        let request = DiskRequest {
            algorithm: "FCFS".into(),
            request_queue: vec![98, 183],
            initial_head: 53,
            disk_size: 200,
            direction: None,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("direction").is_none());

        let sweeping = DiskRequest {
            direction: Some(Direction::Left),
            ..request
        };
        let body = serde_json::to_value(&sweeping).unwrap();
        assert_eq!(body["direction"], "left");
    }

    #[test]
    fn test_result_from_payload() {
        let payload = json!({
            "metrics": {"total_seek": 236, "avg_seek": 29.5, "note": "n/a"},
            "sequence": [65, 67, 37],
            "trace": [],
            "visualization": "iVBORw0..."
        });

        let result = SimulationResult::from_payload(Domain::Disk, "SSTF", payload.clone()).unwrap();
        assert_eq!(result.metrics().get("total_seek"), Some(236.0));
        assert_eq!(result.metrics().get("note"), None);
        assert!(result.metrics().contains_key("note"));
        assert_eq!(result.sequence(), vec![65, 67, 37]);
        assert!(result.steps().is_empty());
        assert_eq!(result.payload(), &payload);
    }

    #[test]
    fn test_result_requires_metrics_and_steps() {
        let no_metrics = json!({"timeline": []});
        assert!(matches!(
            SimulationResult::from_payload(Domain::Cpu, "FCFS", no_metrics),
            Err(ServiceError::Decode(_))
        ));

        let no_timeline = json!({"metrics": {}, "trace": []});
        assert!(matches!(
            SimulationResult::from_payload(Domain::Cpu, "FCFS", no_timeline),
            Err(ServiceError::Decode(_))
        ));

        let bad_metrics = json!({"metrics": [1, 2], "trace": []});
        assert!(SimulationResult::from_payload(Domain::Page, "LRU", bad_metrics).is_err());
    }
}
