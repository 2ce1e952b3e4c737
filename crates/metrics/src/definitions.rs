//! Metric name definitions.

/// Sync engine metrics
pub mod mirror {
    /// Inbound events handled, labelled by `kind`
    pub const EVENTS_RECEIVED_TOTAL: &str = "dmbridge_events_received_total";
    /// Time to settle one event, labelled by `kind`
    pub const EVENT_DURATION_SECONDS: &str = "dmbridge_event_duration_seconds";
    /// Settled creates, labelled by `outcome`
    pub const CREATES_TOTAL: &str = "dmbridge_mirror_creates_total";
    /// Settled edits, labelled by `outcome`
    pub const EDITS_TOTAL: &str = "dmbridge_mirror_edits_total";
    /// Settled deletes, labelled by `outcome`
    pub const DELETES_TOTAL: &str = "dmbridge_mirror_deletes_total";
    /// Partial failures that left a mirror and its record out of sync
    pub const INCONSISTENCIES_TOTAL: &str = "dmbridge_mirror_inconsistencies_total";
    /// Notices that could not be delivered to the sender
    pub const NOTIFY_FAILURES_TOTAL: &str = "dmbridge_notify_failures_total";
    /// Per-message lanes currently queued or running
    pub const ACTIVE_LANES: &str = "dmbridge_dispatch_active_lanes";
}

/// Common label keys
pub mod labels {
    pub const KIND: &str = "kind";
    pub const OUTCOME: &str = "outcome";
}
