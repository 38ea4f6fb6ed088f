//! Canonical schema constants for structured logging
//!
//! Every analysis event carries the same keys so downstream log
//! processors can group by component and operation.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_RUN_ID: &str = "run_id";

// Analysis facts
pub const FIELD_FINGERPRINT: &str = "fingerprint";
pub const FIELD_STACK_COUNT: &str = "stack_count";
pub const FIELD_CHANGE_COUNT: &str = "change_count";
pub const FIELD_RISK_LEVEL: &str = "risk_level";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
