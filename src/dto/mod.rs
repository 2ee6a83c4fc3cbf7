//! Wire-facing payload types for the REST and SSE surfaces.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod actions;
pub mod common;
pub mod health;
pub mod match_view;
pub mod phase;
pub mod sets;
pub mod sse;
pub mod stats;
pub mod validation;

pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
