//! Trade lookup module - bounded-retry resolver for portfolio ids.

mod trade_lookup_client;
mod trade_lookup_errors;
mod trade_lookup_model;

pub use trade_lookup_client::{TradeLookupClient, TradeLookupConfig, TradeLookupTrait};
pub use trade_lookup_errors::TradeLookupError;
pub use trade_lookup_model::{
    TradeServiceExecution, TradeServiceExecutionResponse, TradeServicePortfolio,
    TradeServiceTradeOrder,
};
