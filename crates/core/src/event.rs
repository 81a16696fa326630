use crate::sample::Sample;

/// All messages (events) that can flow through the daemon event loop.
///
/// Sources:
/// - Feed socket task      → `Sample`
/// - Update-interval timer → `UpdateCycle`
/// - Config watcher task   → `ConfigReloaded`
/// - Signal handler        → `Shutdown`
#[derive(Debug, Clone)]
pub enum Message {
    /// An accepted reading from the state feed.
    Sample(Sample),
    /// Periodic timer fired — recompute the prediction.
    UpdateCycle,
    /// Config file changed on disk — triggers a live reload.
    ConfigReloaded,
    /// Graceful shutdown requested.
    Shutdown,
}
