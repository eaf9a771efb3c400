use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

use super::StrategyConfig;

/// Live runtime snapshot of a strategy as last known by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveState {
    #[serde(default)]
    pub strategy_id: Option<Uuid>,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub current_position_quantity: Decimal,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub average_entry_price: Decimal,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub realized_pnl_usdt: Decimal,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub total_invested_usdt: Decimal,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub unrealized_pnl_usdt: Decimal,
    #[serde(default)]
    pub cover_orders_count: u32,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl ActiveState {
    pub fn has_position(&self) -> bool {
        self.current_position_quantity > Decimal::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardItem {
    pub strategy_config: StrategyConfig,
    #[serde(default)]
    pub active_state: Option<ActiveState>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub current_market_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub strategies_data: Vec<DashboardItem>,
}

fn parse_amount(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Null => return None,
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => {
            warn!("Ignoring non-numeric amount {}", other);
            return None;
        }
    };

    let parsed = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok();
    if parsed.is_none() {
        warn!("Ignoring amount outside the decimal range: {}", raw);
    }
    parsed
}

/// Amounts the backend reports as JSON floats. A value that does not fit a
/// `Decimal` is dropped instead of failing the whole payload.
fn optional_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_amount))
}

fn amount_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_amount(deserializer)?.unwrap_or(Decimal::ZERO))
}
