//! Timeline event vocabulary.
//!
//! Timeline entries are append-only and per-incident; the event type names
//! what happened. These must match the values stored in the
//! `incident_timeline.event_type` column.

pub mod event_types {
    pub const CREATE: &str = "CREATE";
    pub const ASSIGNMENT: &str = "ASSIGNMENT";
    pub const STATUS_CHANGE: &str = "STATUS_CHANGE";
    pub const COMMENT: &str = "COMMENT";
    pub const AI_RECOMMENDATION: &str = "AI_RECOMMENDATION";
}
