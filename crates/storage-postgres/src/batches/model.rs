//! Database models for batch-window bookkeeping.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use allocation_core::batches::BatchHistory;

#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::batch_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BatchHistoryDB {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub previous_start_time: DateTime<Utc>,
    pub version: i32,
}

/// Insertable model. `start_time` stays with the database (`DEFAULT now()`)
/// so the claim is stamped on the store's clock inside the claim transaction.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::batch_history)]
pub struct NewBatchHistoryDB {
    pub previous_start_time: DateTime<Utc>,
    pub version: i32,
}

impl From<BatchHistoryDB> for BatchHistory {
    fn from(row: BatchHistoryDB) -> Self {
        BatchHistory {
            id: row.id,
            start_time: row.start_time,
            previous_start_time: row.previous_start_time,
            version: row.version,
        }
    }
}
