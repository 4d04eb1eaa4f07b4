//! Domain models for allocation records and the ingestion batch protocol.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::utils::time_utils;

/// Side of the upstream trade execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for TradeSide {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "BUY" => Ok(TradeSide::Buy),
            "SELL" => Ok(TradeSide::Sell),
            other => Err(ValidationError::InvalidInput(format!(
                "side must be BUY or SELL, got '{}'",
                other
            ))),
        }
    }
}

/// One normalized, portfolio-enriched trade execution persisted by the store.
///
/// `ready_to_send_timestamp` and `id` are assigned by the store on insert;
/// `ready_to_send_timestamp` is the ordering key for batch windowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub id: i64,
    pub external_execution_id: i64,
    pub is_open: bool,
    pub status: String,
    pub side: TradeSide,
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

/// Payload for inserting a new allocation. The store assigns `id` and
/// `ready_to_send_timestamp`; `is_open` is always false and `version` starts
/// at 1 for persisted rows.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAllocation {
    pub external_execution_id: i64,
    pub status: String,
    pub side: TradeSide,
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
}

/// Payload for the optimistic update path. `version` must match the current
/// stored version; the store increments it on success.
#[derive(Debug, Clone)]
pub struct AllocationUpdate {
    pub id: i64,
    pub status: String,
    pub side: TradeSide,
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

/// Candidate record reported by the upstream trade service.
///
/// All required fields are optional at the wire level so that one malformed
/// record yields a per-record validation error instead of failing the whole
/// batch decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAllocationRequest {
    pub external_execution_id: Option<i64>,
    #[serde(default)]
    pub is_open: bool,
    pub status: Option<String>,
    pub side: Option<String>,
    pub destination: Option<String>,
    pub security_id: Option<String>,
    pub ticker: Option<String>,
    pub quantity: Option<Decimal>,
    pub limit_price: Option<Decimal>,
    pub received_timestamp: Option<DateTime<Utc>>,
    pub sent_timestamp: Option<DateTime<Utc>>,
    pub last_fill_timestamp: Option<DateTime<Utc>>,
    pub quantity_filled: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub average_price: Option<Decimal>,
}

impl NewAllocationRequest {
    /// Checks the declared field constraints without touching any collaborator.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.require_positive_id()?;
        Self::require_text("status", self.status.as_deref())?;
        let side = Self::require_text("side", self.side.as_deref())?;
        TradeSide::from_str(side)?;
        Self::require_text("destination", self.destination.as_deref())?;
        Self::require_text("securityId", self.security_id.as_deref())?;
        Self::require_text("ticker", self.ticker.as_deref())?;

        let quantity = self
            .quantity
            .ok_or_else(|| ValidationError::MissingField("quantity".to_string()))?;
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(
                "quantity must be greater than zero".to_string(),
            ));
        }

        let quantity_filled = self
            .quantity_filled
            .ok_or_else(|| ValidationError::MissingField("quantityFilled".to_string()))?;
        if quantity_filled < Decimal::ZERO {
            return Err(ValidationError::InvalidInput(
                "quantityFilled must not be negative".to_string(),
            ));
        }

        let total_amount = self
            .total_amount
            .ok_or_else(|| ValidationError::MissingField("totalAmount".to_string()))?;
        if total_amount < Decimal::ZERO {
            return Err(ValidationError::InvalidInput(
                "totalAmount must not be negative".to_string(),
            ));
        }

        let average_price = self
            .average_price
            .ok_or_else(|| ValidationError::MissingField("averagePrice".to_string()))?;
        if average_price <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(
                "averagePrice must be greater than zero".to_string(),
            ));
        }

        if self.received_timestamp.is_none() {
            return Err(ValidationError::MissingField(
                "receivedTimestamp".to_string(),
            ));
        }
        if self.sent_timestamp.is_none() {
            return Err(ValidationError::MissingField("sentTimestamp".to_string()));
        }

        Ok(())
    }

    /// Builds the persistable record once the portfolio id has been resolved.
    ///
    /// Timestamps are kept in UTC verbatim; the trade date is the sent
    /// timestamp projected into the exchange timezone.
    pub fn to_new_allocation(
        &self,
        portfolio_id: String,
    ) -> Result<NewAllocation, ValidationError> {
        let sent_timestamp = self
            .sent_timestamp
            .ok_or_else(|| ValidationError::MissingField("sentTimestamp".to_string()))?;
        let side = TradeSide::from_str(
            Self::require_text("side", self.side.as_deref())?,
        )?;

        Ok(NewAllocation {
            external_execution_id: self.require_positive_id()?,
            status: Self::require_text("status", self.status.as_deref())?.to_string(),
            side,
            destination: Self::require_text("destination", self.destination.as_deref())?
                .to_string(),
            security_id: Self::require_text("securityId", self.security_id.as_deref())?
                .to_string(),
            ticker: Self::require_text("ticker", self.ticker.as_deref())?.to_string(),
            portfolio_id,
            trade_date: time_utils::trade_date_from_sent(sent_timestamp),
            quantity: self
                .quantity
                .ok_or_else(|| ValidationError::MissingField("quantity".to_string()))?,
            limit_price: self.limit_price,
            quantity_filled: self
                .quantity_filled
                .ok_or_else(|| ValidationError::MissingField("quantityFilled".to_string()))?,
            total_amount: self
                .total_amount
                .ok_or_else(|| ValidationError::MissingField("totalAmount".to_string()))?,
            average_price: self
                .average_price
                .ok_or_else(|| ValidationError::MissingField("averagePrice".to_string()))?,
            received_timestamp: self
                .received_timestamp
                .ok_or_else(|| ValidationError::MissingField("receivedTimestamp".to_string()))?,
            sent_timestamp,
            last_fill_timestamp: self.last_fill_timestamp,
        })
    }

    fn require_positive_id(&self) -> Result<i64, ValidationError> {
        match self.external_execution_id {
            Some(id) if id > 0 => Ok(id),
            Some(_) => Err(ValidationError::InvalidInput(
                "externalExecutionId must be positive".to_string(),
            )),
            None => Err(ValidationError::MissingField(
                "externalExecutionId".to_string(),
            )),
        }
    }

    fn require_text<'a>(
        field: &str,
        value: Option<&'a str>,
    ) -> Result<&'a str, ValidationError> {
        match value {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ValidationError::MissingField(field.to_string())),
        }
    }
}

/// Outcome of one record within an ingestion batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    Created,
    Skipped,
    Error,
}

/// Per-record result reported back to the caller, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationIngestResult {
    pub external_execution_id: i64,
    pub status: IngestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AllocationIngestResult {
    pub fn created(external_execution_id: i64, allocation_id: i64) -> Self {
        Self {
            external_execution_id,
            status: IngestStatus::Created,
            allocation_id: Some(allocation_id),
            error: None,
        }
    }

    pub fn skipped(
        external_execution_id: i64,
        allocation_id: Option<i64>,
        reason: &str,
    ) -> Self {
        Self {
            external_execution_id,
            status: IngestStatus::Skipped,
            allocation_id,
            error: Some(reason.to_string()),
        }
    }

    pub fn error(external_execution_id: i64, message: String) -> Self {
        Self {
            external_execution_id,
            status: IngestStatus::Error,
            allocation_id: None,
            error: Some(message),
        }
    }
}

/// Aggregate outcome of an ingestion batch. The batch never fails atomically;
/// every record lands in exactly one of the three buckets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestBatchResult {
    pub processed: usize,
    pub skipped: usize,
    pub errored: usize,
    pub results: Vec<AllocationIngestResult>,
}

impl IngestBatchResult {
    pub fn push(&mut self, result: AllocationIngestResult) {
        match result.status {
            IngestStatus::Created => self.processed += 1,
            IngestStatus::Skipped => self.skipped += 1,
            IngestStatus::Error => self.errored += 1,
        }
        self.results.push(result);
    }
}

/// Pagination metadata for paged allocation listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub total_elements: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub page_size: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationInfo {
    pub fn new(total_elements: i64, limit: i64, offset: i64) -> Self {
        let total_pages = if limit > 0 {
            (total_elements + limit - 1) / limit
        } else {
            0
        };
        Self {
            total_elements,
            total_pages,
            current_page: if limit > 0 { offset / limit } else { 0 },
            page_size: limit,
            has_next: offset + limit < total_elements,
            has_previous: offset > 0,
        }
    }
}
