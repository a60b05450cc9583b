//! The three domain controllers behind a single active tab.

use crate::controller::{Outcome, SimulationController};
use crate::workload::{CpuWorkload, DiskWorkload, PageWorkload};
use osched_env::{Domain, SimulationService};
use std::sync::Arc;
use tracing::debug;

/// One controller per domain sharing a service handle.
///
/// Switching tabs discards the live outcome of the tab being left; its input
/// is kept.
pub struct Workbench<S: ?Sized> {
    active: Domain,
    cpu: SimulationController<CpuWorkload, S>,
    page: SimulationController<PageWorkload, S>,
    disk: SimulationController<DiskWorkload, S>,
}

impl<S: SimulationService + ?Sized> Workbench<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            active: Domain::Cpu,
            cpu: SimulationController::new(Arc::clone(&service)),
            page: SimulationController::new(Arc::clone(&service)),
            disk: SimulationController::new(service),
        }
    }

    pub fn active(&self) -> Domain {
        self.active
    }

    /// Makes `domain` the active tab. Returns false if it already was.
    pub fn switch_to(&mut self, domain: Domain) -> bool {
        if domain == self.active {
            return false;
        }
        debug!("Switching tab {} -> {}", self.active, domain);
        match self.active {
            Domain::Cpu => self.cpu.clear_outcome(),
            Domain::Page => self.page.clear_outcome(),
            Domain::Disk => self.disk.clear_outcome(),
        }
        self.active = domain;
        true
    }

    /// Live outcome of any tab.
    pub fn outcome(&self, domain: Domain) -> &Outcome {
        match domain {
            Domain::Cpu => self.cpu.outcome(),
            Domain::Page => self.page.outcome(),
            Domain::Disk => self.disk.outcome(),
        }
    }

    pub fn cpu(&mut self) -> &mut SimulationController<CpuWorkload, S> {
        &mut self.cpu
    }

    pub fn page(&mut self) -> &mut SimulationController<PageWorkload, S> {
        &mut self.page
    }

    pub fn disk(&mut self) -> &mut SimulationController<DiskWorkload, S> {
        &mut self.disk
    }

    /// Runs or compares on the active tab.
    pub async fn execute_active(&mut self) -> &Outcome {
        match self.active {
            Domain::Cpu => self.cpu.execute().await,
            Domain::Page => self.page.execute().await,
            Domain::Disk => self.disk.execute().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osched_env::ScriptedService;
    use serde_json::json;

    fn service() -> Arc<ScriptedService> {
        Arc::new(
            ScriptedService::new()
                .with_response(
                    Domain::Cpu,
                    "FCFS",
                    json!({"metrics": {"avg_waiting_time": 4.0}, "timeline": []}),
                )
                .with_response(
                    Domain::Disk,
                    "FCFS",
                    json!({"metrics": {"total_seek": 640}, "sequence": [], "trace": []}),
                ),
        )
    }

    #[tokio::test]
    async fn test_switch_discards_outcome_keeps_input() {
        let mut bench = Workbench::new(service());
        assert_eq!(bench.active(), Domain::Cpu);

        bench.cpu().workload_mut().add_process();
        bench.execute_active().await;
        assert!(bench.cpu().result().is_some());

        assert!(bench.switch_to(Domain::Disk));
        assert_eq!(bench.outcome(Domain::Cpu), &Outcome::Idle);
        assert_eq!(bench.cpu().workload().processes.len(), 4);

        bench.execute_active().await;
        assert!(bench.disk().result().is_some());
        assert!(!bench.switch_to(Domain::Disk));
        assert!(bench.disk().result().is_some());
    }

    #[tokio::test]
    async fn test_tabs_are_independent() {
        let mut bench = Workbench::new(service());
        bench.switch_to(Domain::Page);
        // No page responses are scripted
        bench.execute_active().await;
        assert_eq!(bench.page().error(), Some("Unknown algorithm: FIFO"));
        assert_eq!(bench.outcome(Domain::Disk), &Outcome::Idle);
    }
}
