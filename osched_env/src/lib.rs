//! OS Scheduling Workbench - Service Abstraction Layer
//!
//! The scheduling computations (CPU, page replacement, disk head) run on an
//! external service. This crate is the only seam between the client core and
//! that service, so the controllers can run against either:
//! - **Production**: [`HttpService`] - JSON over HTTP with a 30 s ceiling
//! - **Scripted**: [`ScriptedService`] - canned payloads with fault injection
//!
//! # Request Flow
//!
//! ```text
//! Controller                 SimulationService               Remote
//!   |                               |                          |
//!   |-- simulate(request) --------->|                          |
//!   |                               |-- POST /api/simulate/* ->|
//!   |                               |<-- payload | error ------|
//!   |<-- SimulationResult | Err ----|                          |
//! ```
//!
//! # Example
//!
//! ```ignore
//! use osched_env::{HttpService, ServiceConfig, SimulationService};
//!
//! let service = HttpService::new(ServiceConfig::from_env())?;
//! let result = service.simulate(&request).await?;
//! println!("{:?}", result.metrics().get("avg_waiting_time"));
//! ```

mod config;
mod error;
mod http_impl;
mod scripted;
mod service;
mod types;

pub use config::{ServiceConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::ServiceError;
pub use http_impl::HttpService;
pub use scripted::ScriptedService;
pub use service::SimulationService;
pub use types::{
    CpuRequest, Direction, DiskRequest, Domain, HealthStatus, Metrics, PageRequest, ProcessSpec,
    SimulationRequest, SimulationResult,
};
