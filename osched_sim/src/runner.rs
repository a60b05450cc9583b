//! Session runner - drives a controller for one CLI invocation.

use crate::cli::{Command, InputArgs};
use crate::{exporter, render};
use osched_core::comparison::{AlgorithmSelection, MIN_SELECTION};
use osched_core::layout::{self, FaultPoint, PageStep, ProcessStats};
use osched_core::workload::{self as workloads, AlgorithmInfo};
use osched_core::{
    present, ComparisonResult, CpuWorkload, DiskWorkload, FrameGrid, GanttLayout, HeadMovement,
    LayoutError, MetricDescriptor, Outcome, PageWorkload, SimulationController, ValidationError,
    Workload,
};
use osched_env::{Domain, HealthStatus, ServiceError, SimulationResult, SimulationService};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a session produced no report.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// User-facing message from a failed run
    #[error("{0}")]
    Failed(String),

    #[error("Select at least {} algorithms to compare", MIN_SELECTION)]
    TooFewAlgorithms,

    #[error("Cannot lay out result: {0}")]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Export failed: {0}")]
    Export(#[from] std::io::Error),

    #[error("Cannot encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Chart data for a single result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Cpu {
        gantt: GanttLayout,
        processes: Vec<ProcessStats>,
    },
    Page {
        grid: FrameGrid,
        faults: Vec<FaultPoint>,
    },
    Disk {
        movement: HeadMovement,
        sequence: Vec<i64>,
        /// Set when the trace disagrees with `total_seek`
        inconsistency: Option<String>,
    },
}

/// What a session produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionReport {
    Single {
        result: SimulationResult,
        metrics: Vec<MetricDescriptor>,
        view: ResultView,
    },
    Comparison(ComparisonResult),
}

impl SessionReport {
    pub fn domain(&self) -> Domain {
        match self {
            SessionReport::Single { result, .. } => result.domain(),
            SessionReport::Comparison(result) => result.domain(),
        }
    }
}

/// A workload the CLI can build from flags and visualize.
pub trait SessionWorkload: Workload {
    fn from_args(args: &InputArgs) -> Self;

    fn view(&self, result: &SimulationResult) -> Result<ResultView, LayoutError>;
}

impl SessionWorkload for CpuWorkload {
    fn from_args(args: &InputArgs) -> Self {
        args.cpu_workload()
    }

    fn view(&self, result: &SimulationResult) -> Result<ResultView, LayoutError> {
        Ok(ResultView::Cpu {
            gantt: GanttLayout::from_result(result)?,
            processes: layout::process_stats(result)?,
        })
    }
}

impl SessionWorkload for PageWorkload {
    fn from_args(args: &InputArgs) -> Self {
        args.page_workload()
    }

    fn view(&self, result: &SimulationResult) -> Result<ResultView, LayoutError> {
        let trace: Vec<PageStep> = layout::decode_steps("trace", result.steps())?;
        let frame_count = usize::try_from(self.frame_count).unwrap_or(0);
        Ok(ResultView::Page {
            grid: layout::frame_grid(&trace, frame_count),
            faults: layout::fault_series(&trace),
        })
    }
}

impl SessionWorkload for DiskWorkload {
    fn from_args(args: &InputArgs) -> Self {
        args.disk_workload()
    }

    fn view(&self, result: &SimulationResult) -> Result<ResultView, LayoutError> {
        let movement = HeadMovement::from_result(result, self.initial_head)?;
        let inconsistency = match movement.verify(result.metrics().get("total_seek")) {
            Ok(()) => None,
            Err(err) => {
                warn!("Disk trace inconsistent: {}", err);
                Some(err.to_string())
            }
        };
        Ok(ResultView::Disk {
            movement,
            sequence: result.sequence(),
            inconsistency,
        })
    }
}

/// One algorithm as listed by the service, with catalog details when known.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmEntry {
    pub id: String,
    pub info: Option<&'static AlgorithmInfo>,
}

/// Runs sessions against a service.
pub struct SessionRunner<S: ?Sized> {
    service: Arc<S>,
}

impl<S: SimulationService + ?Sized> SessionRunner<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Runs one algorithm over the flags' workload.
    pub async fn run<W: SessionWorkload>(
        &self,
        args: &InputArgs,
        algorithm: Option<&str>,
    ) -> Result<SessionReport, SessionError> {
        let mut controller: SimulationController<W, S> =
            SimulationController::new(Arc::clone(&self.service));
        let algorithm = algorithm.unwrap_or(W::DEFAULT_ALGORITHM);
        controller.configure(W::from_args(args), algorithm)?;

        info!("Starting {} run: {}", W::DOMAIN.label(), algorithm);
        controller.run().await;
        match controller.outcome() {
            Outcome::Completed(result) => {
                let view = controller.workload().view(result)?;
                Ok(SessionReport::Single {
                    metrics: present(W::DOMAIN, result.metrics()),
                    result: result.clone(),
                    view,
                })
            }
            Outcome::Failed(message) => Err(SessionError::Failed(message.clone())),
            other => Err(SessionError::Failed(format!(
                "{} run ended without a result ({:?})",
                W::DOMAIN.label(),
                other
            ))),
        }
    }

    /// Compares `algorithms` (or the domain default selection) over the flags' workload.
    pub async fn compare<W: SessionWorkload>(
        &self,
        args: &InputArgs,
        algorithms: &[String],
    ) -> Result<SessionReport, SessionError> {
        let mut controller: SimulationController<W, S> =
            SimulationController::new(Arc::clone(&self.service));
        *controller.workload_mut() = W::from_args(args);

        if !algorithms.is_empty() {
            let selection = AlgorithmSelection::from_ids(algorithms.iter().map(String::as_str));
            if selection.len() < MIN_SELECTION {
                return Err(SessionError::TooFewAlgorithms);
            }
            controller.set_comparison_selection(selection);
        }
        controller.toggle_comparison_mode();

        debug!(
            "Comparison selection: {}",
            controller.selection().ids().join(", ")
        );
        controller.execute().await;
        match controller.outcome() {
            Outcome::Compared(result) => Ok(SessionReport::Comparison(result.clone())),
            Outcome::Failed(message) => Err(SessionError::Failed(message.clone())),
            _ => Err(SessionError::TooFewAlgorithms),
        }
    }

    /// Lists a domain's algorithms, from the service or the built-in catalog.
    pub async fn algorithms(
        &self,
        domain: Domain,
        offline: bool,
    ) -> Result<Vec<AlgorithmEntry>, SessionError> {
        let ids: Vec<String> = if offline {
            workloads::catalog(domain)
                .iter()
                .map(|info| info.id.to_string())
                .collect()
        } else {
            self.service.algorithms(domain).await?
        };

        Ok(ids
            .into_iter()
            .map(|id| AlgorithmEntry {
                info: workloads::find_algorithm(domain, &id),
                id,
            })
            .collect())
    }

    pub async fn health(&self) -> Result<HealthStatus, SessionError> {
        Ok(self.service.health().await?)
    }

    /// Executes a parsed command and returns what should be printed.
    ///
    /// With `json` set the output is machine-readable: the raw payload for a
    /// run, the ordered mapping for a comparison.
    pub async fn dispatch(&self, command: &Command, json: bool) -> Result<String, SessionError> {
        match command {
            Command::Run {
                domain,
                algorithm,
                input,
                export,
            } => {
                let algorithm = algorithm.as_deref();
                let report = match domain {
                    Domain::Cpu => self.run::<CpuWorkload>(input, algorithm).await?,
                    Domain::Page => self.run::<PageWorkload>(input, algorithm).await?,
                    Domain::Disk => self.run::<DiskWorkload>(input, algorithm).await?,
                };
                self.finish(report, export.as_deref(), json)
            }
            Command::Compare {
                domain,
                algorithms,
                input,
                export,
            } => {
                let report = match domain {
                    Domain::Cpu => self.compare::<CpuWorkload>(input, algorithms).await?,
                    Domain::Page => self.compare::<PageWorkload>(input, algorithms).await?,
                    Domain::Disk => self.compare::<DiskWorkload>(input, algorithms).await?,
                };
                self.finish(report, export.as_deref(), json)
            }
            Command::Algorithms { domain, offline } => {
                let entries = self.algorithms(*domain, *offline).await?;
                if json {
                    let listing: Vec<Value> = entries
                        .iter()
                        .map(|entry| {
                            serde_json::json!({
                                "id": entry.id,
                                "name": entry.info.map(|i| i.name),
                                "description": entry.info.map(|i| i.description),
                            })
                        })
                        .collect();
                    Ok(serde_json::to_string_pretty(&listing)?)
                } else {
                    Ok(render::render_algorithms(*domain, &entries))
                }
            }
            Command::Health => {
                let health = self.health().await?;
                if json {
                    Ok(serde_json::to_string_pretty(&health)?)
                } else {
                    Ok(render::render_health(&health))
                }
            }
        }
    }

    fn finish(
        &self,
        report: SessionReport,
        export: Option<&Path>,
        json: bool,
    ) -> Result<String, SessionError> {
        if let Some(dir) = export {
            exporter::export_report(dir, &report, exporter::unix_millis())?;
        }

        if !json {
            return Ok(render::render_report(&report));
        }
        let text = match &report {
            SessionReport::Single { result, .. } => serde_json::to_string_pretty(result.payload())?,
            SessionReport::Comparison(result) => serde_json::to_string_pretty(result)?,
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osched_env::ScriptedService;
    use serde_json::json;

    fn disk_payload(total: f64) -> serde_json::Value {
        json!({
            "metrics": {"total_seek": total, "avg_seek": 45.0, "max_seek": 85, "min_seek": 45},
            "sequence": [98, 183],
            "trace": [
                {"step": 1, "from_cylinder": 53, "to_cylinder": 98, "seek_distance": 45, "cumulative_seek": 45},
                {"step": 2, "from_cylinder": 98, "to_cylinder": 183, "seek_distance": 85, "cumulative_seek": 130}
            ]
        })
    }

    fn args_with_queue(queue: &str) -> InputArgs {
        InputArgs {
            queue: Some(queue.to_string()),
            ..InputArgs::default()
        }
    }

    #[tokio::test]
    async fn test_run_disk_builds_view() {
        let service = Arc::new(
            ScriptedService::new().with_response(Domain::Disk, "FCFS", disk_payload(130.0)),
        );
        let runner = SessionRunner::new(service);

        let report = runner
            .run::<DiskWorkload>(&args_with_queue("98 183"), None)
            .await
            .unwrap();

        let SessionReport::Single { metrics, view, .. } = report else {
            panic!("expected a single report");
        };
        assert_eq!(metrics[0].display(), "130.00 cyl");
        let ResultView::Disk {
            movement,
            inconsistency,
            sequence,
        } = view
        else {
            panic!("expected a disk view");
        };
        assert_eq!(movement.positions.len(), 3);
        assert_eq!(sequence, vec![98, 183]);
        assert!(inconsistency.is_none());
    }

    #[tokio::test]
    async fn test_run_flags_inconsistent_trace() {
        let service = Arc::new(
            ScriptedService::new().with_response(Domain::Disk, "SSTF", disk_payload(500.0)),
        );
        let runner = SessionRunner::new(service);

        let report = runner
            .run::<DiskWorkload>(&args_with_queue("98 183"), Some("SSTF"))
            .await
            .unwrap();
        let SessionReport::Single {
            view: ResultView::Disk { inconsistency, .. },
            ..
        } = report
        else {
            panic!("expected a disk report");
        };
        assert!(inconsistency.is_some());
    }

    #[tokio::test]
    async fn test_run_validation_error_skips_service() {
        let service = Arc::new(ScriptedService::new());
        let runner = SessionRunner::new(Arc::clone(&service));

        let args = InputArgs {
            frames: Some(0),
            ..InputArgs::default()
        };
        let err = runner.run::<PageWorkload>(&args, Some("LRU")).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::FrameCount { value: 0, .. })
        ));
        assert_eq!(service.call_count(), 0);
    }

    #[tokio::test]
    async fn test_run_service_failure_message() {
        let service = Arc::new(ScriptedService::new().with_failure(
            Domain::Cpu,
            "FCFS",
            ServiceError::Timeout(30_000),
        ));
        let runner = SessionRunner::new(service);

        let err = runner.run::<CpuWorkload>(&InputArgs::default(), None).await.unwrap_err();
        assert_eq!(err.to_string(), "CPU simulation failed");
    }

    #[tokio::test]
    async fn test_compare_uses_requested_order() {
        let service = Arc::new(
            ScriptedService::new()
                .with_response(Domain::Disk, "FCFS", disk_payload(130.0))
                .with_response(Domain::Disk, "LOOK", disk_payload(130.0)),
        );
        let runner = SessionRunner::new(Arc::clone(&service));

        let algorithms = vec!["LOOK".to_string(), "FCFS".to_string(), "CLOOK".to_string()];
        let report = runner
            .compare::<DiskWorkload>(&args_with_queue("98 183"), &algorithms)
            .await
            .unwrap();

        let SessionReport::Comparison(result) = report else {
            panic!("expected a comparison");
        };
        assert_eq!(result.algorithms().collect::<Vec<_>>(), ["LOOK", "FCFS", "CLOOK"]);
        assert_eq!(result.failures(), 1);
        assert_eq!(service.called_algorithms(), ["LOOK", "FCFS", "CLOOK"]);
    }

    #[tokio::test]
    async fn test_compare_needs_two() {
        let runner = SessionRunner::new(Arc::new(ScriptedService::new()));
        let err = runner
            .compare::<PageWorkload>(&InputArgs::default(), &["LRU".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::TooFewAlgorithms));
    }

    #[tokio::test]
    async fn test_offline_listing_uses_catalog() {
        let runner = SessionRunner::new(Arc::new(ScriptedService::new()));
        let entries = runner.algorithms(Domain::Page, true).await.unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[2].info.map(|i| i.description), Some("Belady's Algorithm"));

        let online = runner.algorithms(Domain::Page, false).await.unwrap();
        assert!(online.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_json_prints_raw_payload() {
        let service = Arc::new(
            ScriptedService::new().with_response(Domain::Disk, "FCFS", disk_payload(130.0)),
        );
        let runner = SessionRunner::new(service);

        let command = Command::Run {
            domain: Domain::Disk,
            algorithm: None,
            input: args_with_queue("98 183"),
            export: None,
        };
        let text = runner.dispatch(&command, true).await.unwrap();
        let printed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(printed, disk_payload(130.0));

        let text = runner.dispatch(&command, false).await.unwrap();
        assert!(text.starts_with("Disk Scheduling - FCFS"));
        assert!(text.contains("Service order: 98 -> 183"));
    }

    #[tokio::test]
    async fn test_dispatch_health_and_listing() {
        let service = Arc::new(
            ScriptedService::new().with_response(Domain::Disk, "FCFS", disk_payload(1.0)),
        );
        let runner = SessionRunner::new(service);

        let text = runner.dispatch(&Command::Health, false).await.unwrap();
        assert!(text.starts_with("Service healthy"));

        let command = Command::Algorithms {
            domain: Domain::Disk,
            offline: false,
        };
        let listing = runner.dispatch(&command, true).await.unwrap();
        let listing: Value = serde_json::from_str(&listing).unwrap();
        assert_eq!(listing[0]["name"], "FCFS");
        assert_eq!(listing[0]["description"], "First Come First Serve");
    }
}
