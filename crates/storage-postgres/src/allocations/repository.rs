use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::info;
use std::sync::Arc;

use allocation_core::allocations::{
    Allocation, AllocationError, AllocationRepositoryTrait, AllocationUpdate, NewAllocation,
};
use allocation_core::{Error, Result};

use super::model::{AllocationChangesDB, AllocationDB, NewAllocationDB};
use crate::db::{get_connection, DbPool};
use crate::errors::StorageError;
use crate::schema::allocations;

/// Repository for allocation rows. Sole owner of the allocation uniqueness
/// and optimistic-version invariants.
pub struct AllocationRepository {
    pool: Arc<DbPool>,
}

impl AllocationRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AllocationRepositoryTrait for AllocationRepository {
    async fn try_insert(&self, new_allocation: NewAllocation) -> Result<Allocation> {
        let external_execution_id = new_allocation.external_execution_id;
        let mut conn = get_connection(&self.pool)?;

        let row: AllocationDB = diesel::insert_into(allocations::table)
            .values(NewAllocationDB::from(new_allocation))
            .returning(AllocationDB::as_returning())
            .get_result(&mut conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    Error::from(AllocationError::AlreadyExists(external_execution_id))
                }
                other => StorageError::from(other).into(),
            })?;

        info!(
            "created allocation {} for external execution {}",
            row.id, row.external_execution_id
        );
        Ok(Allocation::from(row))
    }

    fn find_by_id(&self, allocation_id: i64) -> Result<Allocation> {
        let mut conn = get_connection(&self.pool)?;
        let row = allocations::table
            .find(allocation_id)
            .select(AllocationDB::as_select())
            .first::<AllocationDB>(&mut conn)
            .map_err(|err| match err {
                DieselError::NotFound => {
                    Error::from(AllocationError::NotFound(format!(
                        "allocation {}",
                        allocation_id
                    )))
                }
                other => StorageError::from(other).into(),
            })?;
        Ok(Allocation::from(row))
    }

    fn find_by_external_execution_id(&self, external_execution_id: i64) -> Result<Allocation> {
        let mut conn = get_connection(&self.pool)?;
        let row = allocations::table
            .filter(allocations::external_execution_id.eq(external_execution_id))
            .select(AllocationDB::as_select())
            .first::<AllocationDB>(&mut conn)
            .map_err(|err| match err {
                DieselError::NotFound => Error::from(AllocationError::NotFound(format!(
                    "external execution {}",
                    external_execution_id
                ))),
                other => StorageError::from(other).into(),
            })?;
        Ok(Allocation::from(row))
    }

    fn list_paged(&self, limit: i64, offset: i64) -> Result<(Vec<Allocation>, i64)> {
        let mut conn = get_connection(&self.pool)?;

        let total = allocations::table
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(StorageError::from)?;

        let rows = allocations::table
            .select(AllocationDB::as_select())
            .order(allocations::id.desc())
            .limit(limit)
            .offset(offset)
            .load::<AllocationDB>(&mut conn)
            .map_err(StorageError::from)?;

        Ok((rows.into_iter().map(Allocation::from).collect(), total))
    }

    fn select_for_window(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Allocation>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = allocations::table
            .filter(allocations::ready_to_send_timestamp.ge(window_start))
            .filter(allocations::ready_to_send_timestamp.lt(window_end))
            .select(AllocationDB::as_select())
            .order((
                allocations::ready_to_send_timestamp.asc(),
                allocations::id.asc(),
            ))
            .load::<AllocationDB>(&mut conn)
            .map_err(StorageError::from)?;

        info!(
            "selected {} allocations for window [{}, {})",
            rows.len(),
            window_start,
            window_end
        );

        Ok(rows.into_iter().map(Allocation::from).collect())
    }

    async fn update(&self, update: AllocationUpdate) -> Result<Allocation> {
        let allocation_id = update.id;
        let current_version = update.version;
        let mut conn = get_connection(&self.pool)?;

        let row: AllocationDB = diesel::update(
            allocations::table
                .filter(allocations::id.eq(allocation_id))
                .filter(allocations::version.eq(current_version)),
        )
        .set(AllocationChangesDB::from(update))
        .returning(AllocationDB::as_returning())
        .get_result(&mut conn)
        .map_err(|err| match err {
            // Zero matched rows: the id is unknown or the version is stale.
            DieselError::NotFound => Error::from(AllocationError::VersionConflict(allocation_id)),
            other => StorageError::from(other).into(),
        })?;

        info!(
            "updated allocation {} to version {}",
            row.id, row.version
        );
        Ok(Allocation::from(row))
    }

    async fn delete(&self, allocation_id: i64) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        let deleted = diesel::delete(allocations::table.find(allocation_id))
            .execute(&mut conn)
            .map_err(StorageError::from)?;

        if deleted == 0 {
            return Err(
                AllocationError::NotFound(format!("allocation {}", allocation_id)).into(),
            );
        }

        info!("deleted allocation {}", allocation_id);
        Ok(())
    }
}
