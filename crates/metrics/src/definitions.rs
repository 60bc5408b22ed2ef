//! Metric name and label definitions.
//!
//! Centralizing the names keeps the poller, the dispatcher and any exporter
//! dashboards in agreement about what is recorded.

/// Update fetching (producer side)
pub mod polling {
    /// Total number of fetch calls made to the remote API
    pub const FETCHES_TOTAL: &str = "updraft_polling_fetches_total";
    /// Total number of fetch calls that failed with a transient error
    pub const FETCH_ERRORS_TOTAL: &str = "updraft_polling_fetch_errors_total";
    /// Total number of updates received and enqueued
    pub const UPDATES_RECEIVED_TOTAL: &str = "updraft_polling_updates_received_total";
    /// Current offset (next update id to request)
    pub const OFFSET: &str = "updraft_polling_offset";
    /// Delay applied before the next fetch after a failure, in seconds
    pub const BACKOFF_SECONDS: &str = "updraft_polling_backoff_seconds";
}

/// Update queue
pub mod queue {
    /// Number of updates waiting to be dispatched
    pub const DEPTH: &str = "updraft_queue_depth";
}

/// Handler dispatch (consumer side)
pub mod dispatch {
    /// Total number of handler invocations started
    pub const DISPATCHED_TOTAL: &str = "updraft_dispatch_dispatched_total";
    /// Total number of handler invocations that returned an error
    pub const HANDLER_ERRORS_TOTAL: &str = "updraft_dispatch_handler_errors_total";
    /// Number of handler invocations currently running
    pub const IN_FLIGHT: &str = "updraft_dispatch_in_flight";
    /// Handler invocation duration in seconds
    pub const HANDLER_DURATION_SECONDS: &str = "updraft_dispatch_handler_duration_seconds";
}

/// Common label keys
pub mod labels {
    /// How a failed handler invocation ended: `error` or `panic`
    pub const OUTCOME: &str = "outcome";
    pub const ERROR_KIND: &str = "error_kind";
}

/// Standard histogram buckets
pub mod buckets {
    /// Handler duration buckets (in seconds)
    /// Covers 1ms to 2 minutes
    pub const HANDLER_DURATION: &[f64] = &[
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0,
    ];
}
