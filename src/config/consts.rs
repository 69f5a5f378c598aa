/// Default grace period for `shutdown` (5 seconds)
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5_000;
/// Maximum allowed grace period (1 hour)
pub const MAX_SHUTDOWN_GRACE_MS: u64 = 3_600_000;
/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "SIGNALFLOW_";
/// Prefix used by the sequential id generator when none is configured
pub const DEFAULT_ID_PREFIX: &str = "node";

/// Default cap on concurrently running asynchronous handlers: one per core.
pub fn default_max_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
