use std::fmt::Debug;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::kernel::error::Result;

/// A unit of long-running work started and stopped by the host.
#[async_trait]
pub trait HostedService: Send + Sync + Debug + 'static {
    fn name(&self) -> &'static str;

    /// Start the unit. The host awaits the returned future before it
    /// considers the start sequence finished.
    async fn start(&self, cancellation: CancellationToken) -> Result<()>;

    async fn stop(&self) -> Result<()>;
}
