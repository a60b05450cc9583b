//! OS Scheduling Workbench Core - Simulation Orchestration and Chart Layout
//!
//! The scheduling algorithms themselves run on a remote service. This library
//! is everything the client decides on its own:
//! 1. **Input state**: per-domain workloads with validation before dispatch
//! 2. **Orchestration**: single runs and sequential, failure-isolated comparisons
//! 3. **Layout**: pure, deterministic geometry for Gantt bars, head movement
//!    and frame-state grids, plus the metric descriptors shown beside them

pub mod comparison;
pub mod controller;
pub mod layout;
pub mod metrics;
pub mod workbench;
pub mod workload;

// Re-export key types for convenience
pub use comparison::{AlgorithmSelection, ComparisonEntry, ComparisonOrchestrator, ComparisonResult};
pub use controller::{Outcome, SimulationController};
pub use layout::{FrameGrid, GanttLayout, HeadMovement, LayoutError};
pub use metrics::{present, MetricDescriptor};
pub use workbench::Workbench;
pub use workload::{
    AlgorithmInfo, CpuWorkload, DiskWorkload, PageWorkload, Process, ProcessField, ValidationError,
    Workload,
};
