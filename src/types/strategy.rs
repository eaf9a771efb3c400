use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverReferencePrice {
    #[default]
    AverageHolding,
    LastBuyPrice,
    InitialPrice,
}

impl CoverReferencePrice {
    pub fn all() -> [CoverReferencePrice; 3] {
        [
            CoverReferencePrice::AverageHolding,
            CoverReferencePrice::LastBuyPrice,
            CoverReferencePrice::InitialPrice,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoverReferencePrice::AverageHolding => "average_holding",
            CoverReferencePrice::LastBuyPrice => "last_buy_price",
            CoverReferencePrice::InitialPrice => "initial_price",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CoverReferencePrice::AverageHolding => "Average holding price",
            CoverReferencePrice::LastBuyPrice => "Last buy price",
            CoverReferencePrice::InitialPrice => "Initial price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Market,
    Limit,
}

impl OrderType {
    pub fn all() -> [OrderType; 2] {
        [OrderType::Market, OrderType::Limit]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "Market"),
            OrderType::Limit => write!(f, "Limit"),
        }
    }
}

/// A configured strategy as returned by the backend.
///
/// Only the identity fields are required; the trading parameters fall back
/// to their defaults when an older backend leaves them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub id: Uuid,
    pub api_id: Uuid,
    pub strategy_name: String,
    pub trading_pair: String,
    #[serde(default)]
    pub initial_order_amount_usdt: Decimal,
    #[serde(default)]
    pub buy_trigger_fall_percentage: Decimal,
    #[serde(default)]
    pub buy_confirm_callback_percentage: Decimal,
    #[serde(default)]
    pub sell_trigger_rise_percentage: Decimal,
    #[serde(default)]
    pub sell_callback_percentage: Decimal,
    #[serde(default)]
    pub max_cover_count: u32,
    #[serde(default = "default_cover_multiplier")]
    pub cover_multiplier: Decimal,
    #[serde(default)]
    pub cover_trigger_fall_percentage: Decimal,
    #[serde(default)]
    pub cover_confirm_callback_percentage: Decimal,
    #[serde(default)]
    pub cover_reference_price: CoverReferencePrice,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default = "default_true")]
    pub cyclic_execution: bool,
    #[serde(default)]
    pub cover_orders_participate_in_profit_taking: bool,
    #[serde(default)]
    pub enable_order_timeout: bool,
    #[serde(default = "default_order_timeout")]
    pub order_timeout_seconds: u32,
}

fn default_cover_multiplier() -> Decimal {
    Decimal::ONE
}

fn default_true() -> bool {
    true
}

fn default_order_timeout() -> u32 {
    60
}

/// Run/pause/stop transitions exposed by the control endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyAction {
    Start,
    Pause,
    Stop,
}

impl StrategyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyAction::Start => "start",
            StrategyAction::Pause => "pause",
            StrategyAction::Stop => "stop",
        }
    }
}

impl fmt::Display for StrategyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
