//! Domain models for batch-window bookkeeping and send outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One successful window claim, as persisted in the batch history table.
/// `start_time` and `previous_start_time` each carry a unique index; together
/// they make concurrent claims reduce to at-most-one winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchHistory {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub previous_start_time: DateTime<Utc>,
    pub version: i32,
}

/// A claimed half-open interval `[previous_start_time, start_time)` of
/// `ready_to_send_timestamp` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchWindow {
    pub previous_start_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
}

impl BatchWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.previous_start_time <= instant && instant < self.start_time
    }
}

/// Terminal status of a send attempt that claimed its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    Success,
    Error,
    Empty,
}

/// Outcome of one send attempt, reported back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub processed: usize,
    pub file_name: String,
    pub status: SendStatus,
    pub message: String,
}

impl SendResult {
    /// The window was claimed and recorded but covered no allocations.
    pub fn empty() -> Self {
        Self {
            processed: 0,
            file_name: String::new(),
            status: SendStatus::Empty,
            message: "no allocations in window".to_string(),
        }
    }

    pub fn success(processed: usize, file_name: String) -> Self {
        Self {
            processed,
            file_name,
            status: SendStatus::Success,
            message: "portfolio accounting CLI executed successfully".to_string(),
        }
    }

    pub fn cli_error(processed: usize, file_name: String, message: String) -> Self {
        Self {
            processed,
            file_name,
            status: SendStatus::Error,
            message,
        }
    }
}
