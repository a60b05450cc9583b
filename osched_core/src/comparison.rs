//! Comparison - sequential fan-out of one workload over several algorithms.
//!
//! Each algorithm is submitted on its own, one outstanding request at a
//! time. A failing algorithm is recorded as an error entry and never stops
//! the remaining ones; the caller only sees the mapping once every call has
//! settled.

use crate::workload::{CpuWorkload, DiskWorkload, PageWorkload, ValidationError, Workload};
use osched_env::{Domain, Metrics, SimulationService};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Minimum number of algorithms in a comparison.
pub const MIN_SELECTION: usize = 2;

// =============================================================================
// SELECTION
// =============================================================================

/// The ordered set of algorithms chosen for comparison.
///
/// Never shrinks below [`MIN_SELECTION`] through `toggle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmSelection {
    ids: Vec<String>,
}

impl AlgorithmSelection {
    /// Builds a selection from identifiers, dropping repeats.
    pub fn from_ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut selection = Self { ids: Vec::new() };
        for id in ids {
            let id = id.into();
            if !selection.contains(&id) {
                selection.ids.push(id);
            }
        }
        selection
    }

    /// The default selection for a workload's domain.
    pub fn for_workload<W: Workload>() -> Self {
        Self::from_ids(W::DEFAULT_COMPARISON.iter().copied())
    }

    /// Adds or removes `id`.
    ///
    /// Returns false (and changes nothing) when removing would leave fewer
    /// than [`MIN_SELECTION`] algorithms.
    pub fn toggle(&mut self, id: &str) -> bool {
        match self.ids.iter().position(|existing| existing == id) {
            Some(_) if self.ids.len() <= MIN_SELECTION => false,
            Some(index) => {
                self.ids.remove(index);
                true
            }
            None => {
                self.ids.push(id.to_string());
                true
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// =============================================================================
// RESULT
// =============================================================================

/// One algorithm's slot in a comparison.
///
/// A failed entry carries only the error marker, never metric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComparisonEntry {
    Failed { error: String },
    Metrics(Metrics),
}

impl ComparisonEntry {
    pub fn metrics(&self) -> Option<&Metrics> {
        match self {
            ComparisonEntry::Metrics(metrics) => Some(metrics),
            ComparisonEntry::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ComparisonEntry::Failed { error } => Some(error),
            ComparisonEntry::Metrics(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ComparisonEntry::Failed { .. })
    }
}

/// Algorithm identifier to entry, in request order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    domain: Domain,
    entries: Vec<(String, ComparisonEntry)>,
}

impl ComparisonResult {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            entries: Vec::new(),
        }
    }

    /// Appends an entry. A repeated identifier replaces the earlier one in place.
    pub fn push(&mut self, algorithm: impl Into<String>, entry: ComparisonEntry) {
        let algorithm = algorithm.into();
        match self.entries.iter_mut().find(|(id, _)| *id == algorithm) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((algorithm, entry)),
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn get(&self, algorithm: &str) -> Option<&ComparisonEntry> {
        self.entries
            .iter()
            .find(|(id, _)| id == algorithm)
            .map(|(_, entry)| entry)
    }

    pub fn entries(&self) -> &[(String, ComparisonEntry)] {
        &self.entries
    }

    pub fn algorithms(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn successes(&self) -> usize {
        self.entries.iter().filter(|(_, e)| !e.is_failed()).count()
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|(_, e)| e.is_failed()).count()
    }

    /// One metric across all entries; `None` for failed entries or missing keys.
    pub fn metric_series(&self, key: &str) -> Vec<(&str, Option<f64>)> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.as_str(), entry.metrics().and_then(|m| m.get(key))))
            .collect()
    }
}

impl Serialize for ComparisonResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (algorithm, entry) in &self.entries {
            map.serialize_entry(algorithm, entry)?;
        }
        map.end()
    }
}

/// Metric keys kept for `domain` in a comparison.
pub fn comparison_keys(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::Cpu => CpuWorkload::COMPARISON_KEYS,
        Domain::Page => PageWorkload::COMPARISON_KEYS,
        Domain::Disk => DiskWorkload::COMPARISON_KEYS,
    }
}

/// Keeps only the comparison keys that carry a number.
pub fn reduce_metrics(metrics: &Metrics, keys: &[&str]) -> Metrics {
    keys.iter()
        .filter_map(|key| metrics.get(key).map(|value| (*key, value)))
        .collect()
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Runs one workload against a list of algorithms.
pub struct ComparisonOrchestrator<S: ?Sized> {
    service: Arc<S>,
}

impl<S: SimulationService + ?Sized> ComparisonOrchestrator<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Compares `algorithms` over `workload`.
    ///
    /// Repeated identifiers collapse to their first occurrence. Returns
    /// `Ok(None)` without any call when fewer than two remain.
    ///
    /// # Errors
    /// A `ValidationError` if the workload is invalid for any of the
    /// algorithms; in that case no request has been sent.
    pub async fn compare<W: Workload>(
        &self,
        algorithms: &[String],
        workload: &W,
    ) -> Result<Option<ComparisonResult>, ValidationError> {
        let selection = AlgorithmSelection::from_ids(algorithms.iter().map(String::as_str));
        if selection.len() < MIN_SELECTION {
            debug!(
                "Comparison skipped: {} algorithm(s) selected",
                selection.len()
            );
            return Ok(None);
        }

        // Validate everything before the first call goes out.
        let tasks = selection
            .ids()
            .iter()
            .map(|id| workload.build_request(id).map(|request| (id.clone(), request)))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Comparing {} {} algorithms: {}",
            tasks.len(),
            W::DOMAIN.label(),
            selection.ids().join(", ")
        );

        let mut result = ComparisonResult::new(W::DOMAIN);
        for (algorithm, request) in tasks {
            let entry = match self.service.simulate(&request).await {
                Ok(outcome) => {
                    debug!("{} settled", algorithm);
                    ComparisonEntry::Metrics(reduce_metrics(outcome.metrics(), W::COMPARISON_KEYS))
                }
                Err(err) => {
                    warn!("{} failed during comparison: {}", algorithm, err);
                    ComparisonEntry::Failed {
                        error: err.user_message(W::DOMAIN),
                    }
                }
            };
            result.push(algorithm, entry);
        }

        info!(
            "Comparison finished: {} ok, {} failed",
            result.successes(),
            result.failures()
        );
        Ok(Some(result))
    }
}
