use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::info;
use std::sync::Arc;

use allocation_core::batches::{BatchError, BatchHistoryRepositoryTrait, BatchWindow};
use allocation_core::{Error, Result};

use super::model::{BatchHistoryDB, NewBatchHistoryDB};
use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;
use crate::schema::batch_history;

/// Repository for batch-history rows. The claim path is the service's only
/// mutual-exclusion mechanism: the unique indexes on `start_time` and
/// `previous_start_time` reduce concurrent claims to at-most-one winner.
pub struct BatchHistoryRepository {
    pool: Arc<DbPool>,
}

impl BatchHistoryRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BatchHistoryRepositoryTrait for BatchHistoryRepository {
    async fn try_claim_window(&self) -> Result<BatchWindow> {
        let mut conn = get_connection(&self.pool)?;

        // The previous-start read and the insert share one transaction, and
        // `start_time` defaults to clock_timestamp() so the stamp postdates
        // every row the read observed.
        let claimed: BatchHistoryDB = conn
            .transaction::<BatchHistoryDB, DieselError, _>(|conn| {
                let previous: Option<DateTime<Utc>> = batch_history::table
                    .select(max(batch_history::start_time))
                    .first(conn)?;
                let previous_start_time = previous.unwrap_or(DateTime::UNIX_EPOCH);

                diesel::insert_into(batch_history::table)
                    .values(NewBatchHistoryDB {
                        previous_start_time,
                        version: 1,
                    })
                    .returning(BatchHistoryDB::as_returning())
                    .get_result(conn)
            })
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                    Error::from(BatchError::WindowContended(info.message().to_string()))
                }
                other => StorageError::from(other).into(),
            })?;

        info!(
            "claimed batch window id={} [{}, {})",
            claimed.id, claimed.previous_start_time, claimed.start_time
        );

        Ok(BatchWindow {
            previous_start_time: claimed.previous_start_time,
            start_time: claimed.start_time,
        })
    }

    fn get_max_start_time(&self) -> Result<Option<DateTime<Utc>>> {
        let mut conn = get_connection(&self.pool)?;
        let max_start: Option<DateTime<Utc>> = batch_history::table
            .select(max(batch_history::start_time))
            .first(&mut conn)
            .map_err(StorageError::from)?;
        Ok(max_start)
    }
}
