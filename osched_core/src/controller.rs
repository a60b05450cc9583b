//! Per-domain simulation state machine.
//!
//! A controller owns one domain's input, algorithm choice, comparison
//! selection and the single live outcome. Transitions are explicit methods;
//! nothing else mutates the state.

use crate::comparison::{AlgorithmSelection, ComparisonOrchestrator, ComparisonResult};
use crate::workload::{ValidationError, Workload};
use osched_env::{SimulationResult, SimulationService};
use std::mem;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the controller currently holds.
///
/// At most one of result / comparison / error / in-progress is live.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Outcome {
    #[default]
    Idle,
    Running,
    Completed(SimulationResult),
    Compared(ComparisonResult),
    /// User-facing error line
    Failed(String),
}

/// Controller for one scheduling domain.
pub struct SimulationController<W: Workload, S: ?Sized> {
    service: Arc<S>,
    workload: W,
    algorithm: String,
    selection: AlgorithmSelection,
    comparison_mode: bool,
    outcome: Outcome,
}

impl<W: Workload, S: SimulationService + ?Sized> SimulationController<W, S> {
    /// Creates a controller holding the built-in defaults.
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            workload: W::default(),
            algorithm: W::DEFAULT_ALGORITHM.to_string(),
            selection: AlgorithmSelection::for_workload::<W>(),
            comparison_mode: false,
            outcome: Outcome::Idle,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn workload(&self) -> &W {
        &self.workload
    }

    /// Mutable access for field-level edits (process table, free text).
    pub fn workload_mut(&mut self) -> &mut W {
        &mut self.workload
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn selection(&self) -> &AlgorithmSelection {
        &self.selection
    }

    pub fn comparison_mode(&self) -> bool {
        self.comparison_mode
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn result(&self) -> Option<&SimulationResult> {
        match &self.outcome {
            Outcome::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn comparison(&self) -> Option<&ComparisonResult> {
        match &self.outcome {
            Outcome::Compared(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.outcome, Outcome::Running)
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Stores new input and returns its validation verdict.
    ///
    /// The input is kept even when invalid; it only blocks dispatch.
    pub fn configure(&mut self, workload: W, algorithm: &str) -> Result<(), ValidationError> {
        self.workload = workload;
        self.algorithm = algorithm.to_string();
        let verdict = self.workload.validate(&self.algorithm);
        if let Err(err) = &verdict {
            debug!("{} input stored but invalid: {}", W::DOMAIN.label(), err);
        }
        verdict
    }

    /// Chooses the algorithm for single runs.
    pub fn select_algorithm(&mut self, algorithm: &str) {
        self.algorithm = algorithm.to_string();
    }

    /// Adds or removes an algorithm from the comparison selection.
    pub fn toggle_compare_algorithm(&mut self, algorithm: &str) -> bool {
        self.selection.toggle(algorithm)
    }

    /// Replaces the comparison selection wholesale.
    pub fn set_comparison_selection(&mut self, selection: AlgorithmSelection) {
        self.selection = selection;
    }

    /// Flips comparison mode, discarding whatever outcome is live.
    pub fn toggle_comparison_mode(&mut self) -> bool {
        self.comparison_mode = !self.comparison_mode;
        self.outcome = Outcome::Idle;
        self.comparison_mode
    }

    /// Runs the stored input through the selected algorithm.
    ///
    /// Invalid input fails locally without any service call. Every run sends
    /// a fresh request; nothing is cached.
    pub async fn run(&mut self) -> &Outcome {
        let request = match self.workload.build_request(&self.algorithm) {
            Ok(request) => request,
            Err(err) => {
                warn!("{} input rejected: {}", W::DOMAIN.label(), err);
                self.outcome = Outcome::Failed(err.to_string());
                return &self.outcome;
            }
        };

        info!("Running {} {}", W::DOMAIN.label(), self.algorithm);
        self.outcome = Outcome::Running;

        self.outcome = match self.service.simulate(&request).await {
            Ok(result) => Outcome::Completed(result),
            Err(err) => {
                warn!("{} {} failed: {}", W::DOMAIN.label(), self.algorithm, err);
                Outcome::Failed(err.user_message(W::DOMAIN))
            }
        };
        &self.outcome
    }

    /// Compares the stored input across the selected algorithms.
    ///
    /// A selection smaller than two leaves the previous outcome untouched.
    pub async fn compare(&mut self) -> &Outcome {
        let orchestrator = ComparisonOrchestrator::new(Arc::clone(&self.service));
        let previous = mem::replace(&mut self.outcome, Outcome::Running);

        self.outcome = match orchestrator
            .compare(self.selection.ids(), &self.workload)
            .await
        {
            Ok(Some(result)) => Outcome::Compared(result),
            Ok(None) => previous,
            Err(err) => {
                warn!("{} comparison rejected: {}", W::DOMAIN.label(), err);
                Outcome::Failed(err.to_string())
            }
        };
        &self.outcome
    }

    /// Runs or compares depending on the current mode.
    pub async fn execute(&mut self) -> &Outcome {
        if self.comparison_mode {
            self.compare().await
        } else {
            self.run().await
        }
    }

    /// Discards the live outcome, keeping input and selections.
    pub fn clear_outcome(&mut self) {
        self.outcome = Outcome::Idle;
    }

    /// Restores every default and drops the live outcome.
    pub fn reset(&mut self) {
        debug!("{} controller reset", W::DOMAIN.label());
        self.workload = W::default();
        self.algorithm = W::DEFAULT_ALGORITHM.to_string();
        self.selection = AlgorithmSelection::for_workload::<W>();
        self.comparison_mode = false;
        self.outcome = Outcome::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::{CpuWorkload, DiskWorkload, PageWorkload, ProcessField, ROUND_ROBIN};
    use osched_env::{Domain, ScriptedService, ServiceError, SimulationRequest};
    use serde_json::json;

    fn page_payload(faults: u32) -> serde_json::Value {
        json!({
            "metrics": {"page_faults": faults, "page_hits": 10 - faults, "hit_ratio": 40.0, "fault_ratio": 60.0},
            "trace": [{"step": 1, "page": 7, "status": "FAULT", "frames_state": [7, -1, -1]}],
            "visualization": "iVBORw0KGgo="
        })
    }

    fn cpu_payload() -> serde_json::Value {
        json!({
            "metrics": {"avg_waiting_time": 4.0, "avg_turnaround_time": 9.33, "cpu_utilization": 100.0, "throughput": 0.1875},
            "timeline": [{"pid": 1, "start": 0, "end": 5, "duration": 5}],
            "processes": []
        })
    }

    fn page_service() -> Arc<ScriptedService> {
        Arc::new(
            ScriptedService::new()
                .with_response(Domain::Page, "FIFO", page_payload(9))
                .with_response(Domain::Page, "LRU", page_payload(8))
                .with_response(Domain::Page, "Optimal", page_payload(6)),
        )
    }

    #[tokio::test]
    async fn test_run_success() {
        let service = page_service();
        let mut controller: SimulationController<PageWorkload, _> =
            SimulationController::new(Arc::clone(&service));

        controller.run().await;
        let result = controller.result().unwrap();
        assert_eq!(result.metrics().get("page_faults"), Some(9.0));
        assert!(controller.error().is_none());
        assert!(!controller.is_running());
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_service() {
        let service = Arc::new(
            ScriptedService::new().with_response(Domain::Cpu, "FCFS", cpu_payload()),
        );
        let mut controller: SimulationController<CpuWorkload, _> =
            SimulationController::new(Arc::clone(&service));

        let mut workload = CpuWorkload::default();
        workload.processes[1].pid = 1;
        assert!(controller.configure(workload.clone(), "FCFS").is_err());
        // Stored anyway
        assert_eq!(controller.workload(), &workload);

        controller.run().await;
        assert_eq!(controller.error(), Some("Duplicate process ID P1"));
        assert_eq!(service.call_count(), 0);

        let mut workload = CpuWorkload::default();
        workload.update_process(0, ProcessField::Burst, 0);
        controller.configure(workload, "FCFS").unwrap_err();
        controller.run().await;
        assert!(controller.error().is_some());
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_replaces_prior_result() {
        let service = Arc::new(
            ScriptedService::new()
                .with_response(Domain::Page, "FIFO", page_payload(9))
                .with_failure(Domain::Page, "LRU", ServiceError::transport("connection reset")),
        );
        let mut controller: SimulationController<PageWorkload, _> =
            SimulationController::new(service);

        controller.run().await;
        assert!(controller.result().is_some());

        controller.select_algorithm("LRU");
        controller.run().await;
        assert!(controller.result().is_none());
        assert_eq!(controller.error(), Some("Page simulation failed"));
        // Input untouched
        assert_eq!(controller.workload(), &PageWorkload::default());
    }

    #[tokio::test]
    async fn test_run_is_repeatable() {
        let service = Arc::new(
            ScriptedService::new().with_response(Domain::Cpu, ROUND_ROBIN, cpu_payload()),
        );
        let mut controller: SimulationController<CpuWorkload, _> =
            SimulationController::new(Arc::clone(&service));
        controller.select_algorithm(ROUND_ROBIN);

        controller.run().await;
        controller.run().await;

        let calls = service.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
        let SimulationRequest::Cpu(body) = &calls[0] else {
            panic!("expected a CPU request");
        };
        assert_eq!(body.time_quantum, Some(2));
    }

    #[tokio::test]
    async fn test_compare_clears_single_result() {
        let service = page_service();
        let mut controller: SimulationController<PageWorkload, _> =
            SimulationController::new(Arc::clone(&service));

        controller.run().await;
        assert!(controller.result().is_some());

        controller.compare().await;
        assert!(controller.result().is_none());
        let comparison = controller.comparison().unwrap();
        assert_eq!(comparison.algorithms().collect::<Vec<_>>(), ["FIFO", "LRU", "Optimal"]);
        assert_eq!(
            comparison.get("Optimal").unwrap().metrics().unwrap().get("page_faults"),
            Some(6.0)
        );
        assert_eq!(service.call_count(), 4);

        // A single run afterwards drops the comparison
        controller.run().await;
        assert!(controller.comparison().is_none());
        assert!(controller.result().is_some());
    }

    #[tokio::test]
    async fn test_execute_follows_mode() {
        let service = page_service();
        let mut controller: SimulationController<PageWorkload, _> =
            SimulationController::new(Arc::clone(&service));

        assert!(controller.toggle_comparison_mode());
        controller.execute().await;
        assert!(controller.comparison().is_some());

        // Leaving comparison mode discards the mapping
        assert!(!controller.toggle_comparison_mode());
        assert_eq!(controller.outcome(), &Outcome::Idle);

        controller.execute().await;
        assert!(controller.result().is_some());
    }

    #[tokio::test]
    async fn test_reset_restores_everything() {
        let service = Arc::new(
            ScriptedService::new().with_response(
                Domain::Disk,
                "SCAN",
                json!({"metrics": {"total_seek": 331}, "sequence": [], "trace": []}),
            ),
        );
        let mut controller: SimulationController<DiskWorkload, _> =
            SimulationController::new(service);

        let edited = DiskWorkload {
            queue: "10 20".into(),
            initial_head: 5,
            ..DiskWorkload::default()
        };
        controller.configure(edited, "SCAN").unwrap();
        controller.toggle_compare_algorithm("LOOK");
        controller.toggle_comparison_mode();
        controller.toggle_comparison_mode();
        controller.run().await;
        assert!(controller.result().is_some());

        controller.reset();
        assert_eq!(controller.workload(), &DiskWorkload::default());
        assert_eq!(controller.algorithm(), "FCFS");
        assert_eq!(controller.selection().ids(), ["FCFS", "SSTF", "SCAN"]);
        assert!(!controller.comparison_mode());
        assert_eq!(controller.outcome(), &Outcome::Idle);
    }
}
