//! Wire models for the trade service lookup response.
//!
//! Only the nested portfolio id of the first execution is consumed; the rest
//! of the payload is ignored on decode.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeServiceExecutionResponse {
    #[serde(default)]
    pub executions: Vec<TradeServiceExecution>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeServiceExecution {
    #[serde(default)]
    pub execution_service_id: i64,
    #[serde(default)]
    pub trade_order: TradeServiceTradeOrder,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeServiceTradeOrder {
    #[serde(default)]
    pub portfolio: TradeServicePortfolio,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeServicePortfolio {
    #[serde(default)]
    pub portfolio_id: String,
}
