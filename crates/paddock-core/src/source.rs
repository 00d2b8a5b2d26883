use futures::future::BoxFuture;

use crate::error::GameError;
use crate::snapshot::RaceSnapshot;

/// Yields point-in-time race snapshots on demand.
///
/// Implementations may take tens of seconds and must be idempotent. Any
/// failure, including a sample with no drivers in it, is reported as
/// [`GameError::SourceUnavailable`].
pub trait SnapshotSource: Send + Sync {
    /// Sample the race. With `detect_dnf` the source also looks for retired
    /// drivers; without it every driver found is classified.
    fn fetch_snapshot(&self, detect_dnf: bool) -> BoxFuture<'_, Result<RaceSnapshot, GameError>>;

    /// Short label used in logs.
    fn name(&self) -> &str {
        "snapshot-source"
    }
}
