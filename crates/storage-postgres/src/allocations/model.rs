//! Database models for allocation records.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use allocation_core::allocations::{Allocation, AllocationUpdate, NewAllocation, TradeSide};

/// Parses a stored trade side, falling back to BUY on unknown values so a
/// corrupt row cannot poison a whole window selection.
fn parse_side_tolerant(value: &str) -> TradeSide {
    TradeSide::from_str(value).unwrap_or_else(|_| {
        log::error!("unknown trade side '{}' in storage row; defaulting to BUY", value);
        TradeSide::Buy
    })
}

/// Database model for allocation rows.
#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::allocations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AllocationDB {
    pub id: i64,
    pub external_execution_id: i64,
    pub is_open: bool,
    pub status: String,
    pub side: String,
    pub destination: String,
    pub security_id: String,
    pub ticker: String,
    pub portfolio_id: String,
    pub trade_date: NaiveDate,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub quantity_filled: Decimal,
    pub total_amount: Decimal,
    pub average_price: Decimal,
    pub received_timestamp: DateTime<Utc>,
    pub sent_timestamp: DateTime<Utc>,
    pub last_fill_timestamp: Option<DateTime<Utc>>,
    pub ready_to_send_timestamp: DateTime<Utc>,
    pub version: i32,
}

/// Insertable model. `id` and `ready_to_send_timestamp` stay with the
/// database: the serial assigns the id and `DEFAULT now()` stamps the
/// ready-to-send instant on the store's clock.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::allocations)]
pub struct NewAllocationDB {
    pub external_execution_id: i64,
    pub is_open: bool,
    pub status: String,
    pub side: String,
    pub destination: String,
    pub security_id: String,
    pub ticker: String,
    pub portfolio_id: String,
    pub trade_date: NaiveDate,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub quantity_filled: Decimal,
    pub total_amount: Decimal,
    pub average_price: Decimal,
    pub received_timestamp: DateTime<Utc>,
    pub sent_timestamp: DateTime<Utc>,
    pub last_fill_timestamp: Option<DateTime<Utc>>,
    pub version: i32,
}

/// Changeset for the optimistic update path; carries the incremented version.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::allocations)]
pub struct AllocationChangesDB {
    pub status: String,
    pub side: String,
    pub destination: String,
    pub security_id: String,
    pub ticker: String,
    pub portfolio_id: String,
    pub trade_date: NaiveDate,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub quantity_filled: Decimal,
    pub total_amount: Decimal,
    pub average_price: Decimal,
    pub version: i32,
}

impl From<AllocationDB> for Allocation {
    fn from(row: AllocationDB) -> Self {
        Allocation {
            id: row.id,
            external_execution_id: row.external_execution_id,
            is_open: row.is_open,
            status: row.status,
            side: parse_side_tolerant(&row.side),
            destination: row.destination,
            security_id: row.security_id,
            ticker: row.ticker,
            portfolio_id: row.portfolio_id,
            trade_date: row.trade_date,
            quantity: row.quantity,
            limit_price: row.limit_price,
            quantity_filled: row.quantity_filled,
            total_amount: row.total_amount,
            average_price: row.average_price,
            received_timestamp: row.received_timestamp,
            sent_timestamp: row.sent_timestamp,
            last_fill_timestamp: row.last_fill_timestamp,
            ready_to_send_timestamp: row.ready_to_send_timestamp,
            version: row.version,
        }
    }
}

impl From<NewAllocation> for NewAllocationDB {
    fn from(new_allocation: NewAllocation) -> Self {
        NewAllocationDB {
            external_execution_id: new_allocation.external_execution_id,
            // Only closed executions are persisted.
            is_open: false,
            status: new_allocation.status,
            side: new_allocation.side.to_string(),
            destination: new_allocation.destination,
            security_id: new_allocation.security_id,
            ticker: new_allocation.ticker,
            portfolio_id: new_allocation.portfolio_id,
            trade_date: new_allocation.trade_date,
            quantity: new_allocation.quantity,
            limit_price: new_allocation.limit_price,
            quantity_filled: new_allocation.quantity_filled,
            total_amount: new_allocation.total_amount,
            average_price: new_allocation.average_price,
            received_timestamp: new_allocation.received_timestamp,
            sent_timestamp: new_allocation.sent_timestamp,
            last_fill_timestamp: new_allocation.last_fill_timestamp,
            version: 1,
        }
    }
}

impl From<AllocationUpdate> for AllocationChangesDB {
    fn from(update: AllocationUpdate) -> Self {
        AllocationChangesDB {
            status: update.status,
            side: update.side.to_string(),
            destination: update.destination,
            security_id: update.security_id,
            ticker: update.ticker,
            portfolio_id: update.portfolio_id,
            trade_date: update.trade_date,
            quantity: update.quantity,
            limit_price: update.limit_price,
            quantity_filled: update.quantity_filled,
            total_amount: update.total_amount,
            average_price: update.average_price,
            version: update.version + 1,
        }
    }
}
