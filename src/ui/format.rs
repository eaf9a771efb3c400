use rust_decimal::{Decimal, RoundingStrategy};

pub const NOT_AVAILABLE: &str = "N/A";

/// Fixed-point rendering, rounding half away from zero.
pub fn fixed(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

/// Prices and quantities.
pub fn fixed4(value: Decimal) -> String {
    fixed(value, 4)
}

/// USDT amounts and percentages.
pub fn fixed2(value: Decimal) -> String {
    fixed(value, 2)
}

pub fn fixed4_or_na(value: Option<Decimal>) -> String {
    value.map(fixed4).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Missing money renders as a literal zero amount, never an error.
pub fn fixed2_or_zero(value: Option<Decimal>) -> String {
    fixed2(value.unwrap_or(Decimal::ZERO))
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
