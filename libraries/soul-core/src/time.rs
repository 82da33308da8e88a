//! Timestamp helpers
//!
//! Timestamps are persisted with microsecond precision. Taking "now" through
//! [`now`] keeps in-memory values equal to what a later read returns.

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to microseconds
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
