//! Computation service abstraction.

use crate::error::ServiceError;
use crate::types::{Domain, HealthStatus, SimulationRequest, SimulationResult};
use async_trait::async_trait;

/// Abstraction over the external scheduling computation service.
///
/// # Implementations
///
/// - **Production**: `HttpService` - JSON over HTTP
/// - **Scripted**: `ScriptedService` - canned payloads with fault injection
///
/// # Failure Model
///
/// Every call settles exactly once with either a payload or a
/// `ServiceError`. There is no retry and no cancellation: callers that need
/// to stop waiting must drop the future.
#[async_trait]
pub trait SimulationService: Send + Sync + 'static {
    /// Runs one simulation.
    ///
    /// # Returns
    /// * `Ok(result)` - The decoded result payload
    /// * `Err(ServiceError::Timeout)` - The 30 s ceiling elapsed
    /// * `Err(ServiceError::Rejected)` - Non-2xx with an optional detail
    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResult, ServiceError>;

    /// Lists the algorithm identifiers the service supports for a domain.
    async fn algorithms(&self, domain: Domain) -> Result<Vec<String>, ServiceError>;

    /// Queries service health and version.
    async fn health(&self) -> Result<HealthStatus, ServiceError>;
}
