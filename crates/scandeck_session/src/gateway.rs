//! Boundary to the hardware scan engine.

use async_trait::async_trait;
use scandeck_protocol::GatewayError;

/// Method-call side of the scan engine. Events flow back through the
/// [`EventBridge`](crate::bridge::EventBridge).
///
/// Every call may suspend until the hardware answers.
#[async_trait]
pub trait ScanEngineGateway: Send + Sync {
    /// Acquire the reader. Fails when the hardware is unavailable or stuck.
    async fn initialize(&self) -> Result<(), GatewayError>;

    /// Arm the trigger. Fails before a successful `initialize`.
    async fn enable(&self) -> Result<(), GatewayError>;

    /// Release the reader. Best effort.
    async fn disable(&self) -> Result<(), GatewayError>;
}
