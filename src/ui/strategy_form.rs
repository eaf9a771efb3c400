use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::format::escape_html;
use super::{FormError, Region, Surface};
use crate::backend::Backend;
use crate::types::{ApiKeyRecord, CoverReferencePrice, OrderType};

pub const DASHBOARD_PATH: &str = "/";

/// Any field whose name contains one of these is sent as a number.
pub const NUMERIC_MARKERS: [&str; 5] = ["percentage", "amount", "multiplier", "count", "seconds"];

/// Read from the checkbox state, never from the generic field list.
pub const BOOLEAN_FIELDS: [&str; 3] = [
    "cyclic_execution",
    "cover_orders_participate_in_profit_taking",
    "enable_order_timeout",
];

pub const ORDER_TIMEOUT_FLAG: &str = "enable_order_timeout";
pub const ORDER_TIMEOUT_FIELD: &str = "order_timeout_seconds";
const API_FIELD: &str = "api_id";

pub fn is_numeric_field(name: &str) -> bool {
    NUMERIC_MARKERS.iter().any(|marker| name.contains(marker))
}

/// Submitted form fields in document order. Unchecked checkboxes are
/// simply absent, as with any url-encoded form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyFormInput {
    pub fields: Vec<(String, String)>,
}

impl StrategyFormInput {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_checked(&self, name: &str) -> bool {
        self.fields.iter().any(|(key, value)| {
            key == name
                && matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "on" | "true" | "1" | "yes" | "checked"
                )
        })
    }
}

fn parse_number(field: &str, raw: &str) -> Result<Option<f64>, FormError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(FormError::InvalidNumber {
            field: field.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Builds the JSON strategy definition from the submitted fields.
///
/// Numeric fields are coerced to floats (blank ones are left out so the
/// backend defaults apply), booleans come from checkbox state, everything
/// else passes through as a string. The order timeout is only present when
/// its checkbox is ticked.
pub fn build_payload(input: &StrategyFormInput) -> Result<Value, FormError> {
    let mut payload = Map::new();

    for (key, raw) in &input.fields {
        if BOOLEAN_FIELDS.contains(&key.as_str()) || key == ORDER_TIMEOUT_FIELD {
            continue;
        }
        if is_numeric_field(key) {
            match parse_number(key, raw)? {
                Some(n) => {
                    payload.insert(key.clone(), Value::from(n));
                }
                None => {
                    payload.remove(key);
                }
            }
        } else {
            payload.insert(key.clone(), Value::String(raw.clone()));
        }
    }

    for flag in BOOLEAN_FIELDS {
        payload.insert(flag.to_string(), Value::Bool(input.is_checked(flag)));
    }

    if input.is_checked(ORDER_TIMEOUT_FLAG) {
        if let Some(raw) = input.get(ORDER_TIMEOUT_FIELD) {
            if let Some(n) = parse_number(ORDER_TIMEOUT_FIELD, raw)? {
                payload.insert(ORDER_TIMEOUT_FIELD.to_string(), Value::from(n));
            }
        }
    }

    Ok(Value::Object(payload))
}

/// Credential picker contents; only connected records are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CredentialOptions {
    #[default]
    Loading,
    Loaded(Vec<ApiKeyRecord>),
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyFormState {
    pub credentials: CredentialOptions,
    /// Values echoed back into the form; empty means a fresh form
    pub values: StrategyFormInput,
}

enum FieldKind {
    Text,
    Number(&'static str),
    Checkbox(bool),
    CoverReference,
    OrderType,
}

struct FieldSpec {
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    default: &'static str,
    required: bool,
}

const fn field(
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    default: &'static str,
    required: bool,
) -> FieldSpec {
    FieldSpec { name, label, kind, default, required }
}

const FIELDS: [FieldSpec; 17] = [
    field("strategy_name", "Strategy Name", FieldKind::Text, "", true),
    field("trading_pair", "Trading Pair", FieldKind::Text, "", true),
    field("initial_order_amount_usdt", "Initial Order Amount (USDT)", FieldKind::Number("0.01"), "", true),
    field("buy_trigger_fall_percentage", "Buy Trigger Fall %", FieldKind::Number("0.01"), "0", false),
    field("buy_confirm_callback_percentage", "Buy Confirm Callback %", FieldKind::Number("0.01"), "0", false),
    field("sell_trigger_rise_percentage", "Sell Trigger Rise %", FieldKind::Number("0.01"), "", true),
    field("sell_callback_percentage", "Sell Callback %", FieldKind::Number("0.01"), "0", false),
    field("max_cover_count", "Max Cover Count", FieldKind::Number("1"), "0", true),
    field("cover_multiplier", "Cover Multiplier", FieldKind::Number("0.01"), "1", false),
    field("cover_trigger_fall_percentage", "Cover Trigger Fall %", FieldKind::Number("0.01"), "", true),
    field("cover_confirm_callback_percentage", "Cover Confirm Callback %", FieldKind::Number("0.01"), "0", false),
    field("cover_reference_price", "Cover Reference Price", FieldKind::CoverReference, "average_holding", false),
    field("order_type", "Order Type", FieldKind::OrderType, "market", false),
    field("cyclic_execution", "Cyclic Execution", FieldKind::Checkbox(true), "", false),
    field(
        "cover_orders_participate_in_profit_taking",
        "Sell Cover Orders Individually",
        FieldKind::Checkbox(false),
        "",
        false,
    ),
    field("enable_order_timeout", "Enable Order Timeout", FieldKind::Checkbox(false), "", false),
    field("order_timeout_seconds", "Order Timeout (seconds)", FieldKind::Number("1"), "60", false),
];

fn render_credential_options(state: &StrategyFormState) -> String {
    match &state.credentials {
        CredentialOptions::Loading => {
            r#"<option value="" disabled selected>Loading API keys...</option>"#.to_string()
        }
        CredentialOptions::Failed(msg) => format!(
            r#"<option value="" disabled selected>Error loading API keys: {}</option>"#,
            escape_html(msg)
        ),
        CredentialOptions::Loaded(records) if records.is_empty() => {
            r#"<option value="" disabled selected>No connected API keys available. Add or check your API keys first.</option>"#
                .to_string()
        }
        CredentialOptions::Loaded(records) => {
            let chosen = state.values.get(API_FIELD).unwrap_or_default();
            let mut html = String::from(r#"<option value="">Select an API key</option>"#);
            for record in records {
                let id = record.id.to_string();
                let selected = if id == chosen { " selected" } else { "" };
                html.push_str(&format!(
                    r#"<option value="{}"{}>{} ({})</option>"#,
                    id,
                    selected,
                    escape_html(&record.alias),
                    record.mode
                ));
            }
            html
        }
    }
}

fn render_select(name: &str, current: &str, options: &[(&str, String)]) -> String {
    let mut html = format!(r#"<select name="{}">"#, name);
    for (value, label) in options {
        let selected = if *value == current { " selected" } else { "" };
        html.push_str(&format!(r#"<option value="{}"{}>{}</option>"#, value, selected, label));
    }
    html.push_str("</select>");
    html
}

pub fn render_form(state: &StrategyFormState) -> String {
    let fresh = state.values.fields.is_empty();
    let mut html = String::from(
        r#"<form method="post" action="/add-strategy-page" class="card form" id="add-strategy-form">"#,
    );

    html.push_str(&format!(
        r#"<label>API Key<select name="{}" required>{}</select></label>"#,
        API_FIELD,
        render_credential_options(state)
    ));

    for spec in FIELDS.iter() {
        let value = if fresh {
            spec.default.to_string()
        } else {
            state.values.get(spec.name).unwrap_or_default().to_string()
        };
        let required = if spec.required { " required" } else { "" };

        let control = match spec.kind {
            FieldKind::Text => format!(
                r#"<input type="text" name="{}" value="{}"{}>"#,
                spec.name,
                escape_html(&value),
                required
            ),
            FieldKind::Number(step) => format!(
                r#"<input type="number" step="{}" name="{}" value="{}"{}>"#,
                step,
                spec.name,
                escape_html(&value),
                required
            ),
            FieldKind::Checkbox(default_checked) => {
                let checked = if fresh {
                    default_checked
                } else {
                    state.values.is_checked(spec.name)
                };
                format!(
                    r#"<input type="checkbox" name="{}"{}>"#,
                    spec.name,
                    if checked { " checked" } else { "" }
                )
            }
            FieldKind::CoverReference => {
                let options: Vec<(&str, String)> = CoverReferencePrice::all()
                    .iter()
                    .map(|c| (c.as_str(), c.label().to_string()))
                    .collect();
                render_select(spec.name, &value, &options)
            }
            FieldKind::OrderType => {
                let options: Vec<(&str, String)> = OrderType::all()
                    .iter()
                    .map(|o| (o.as_str(), o.to_string()))
                    .collect();
                render_select(spec.name, &value, &options)
            }
        };

        html.push_str(&format!("<label>{}{}</label>", spec.label, control));
    }

    html.push_str(
        r#"<div class="form-actions"><button type="submit" class="btn">Create Strategy</button> <a class="btn btn-secondary" href="/">Cancel</a></div></form>"#,
    );
    html
}

pub struct StrategyFormController {
    backend: Arc<dyn Backend>,
}

impl StrategyFormController {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub async fn populate_credentials(&self, state: &mut StrategyFormState, surface: &mut dyn Surface) {
        state.credentials = match self.backend.list_api_keys().await {
            Ok(records) => CredentialOptions::Loaded(
                records.into_iter().filter(ApiKeyRecord::is_connected).collect(),
            ),
            Err(e) => {
                warn!("Failed to load API keys for strategy form: {}", e);
                CredentialOptions::Failed(e.user_message("server error"))
            }
        };
        surface.replace(Region::StrategyForm, render_form(state));
    }

    /// Validates and submits a new strategy. On success the form is reset,
    /// the credential list reloaded and the user sent back to the dashboard.
    pub async fn submit(
        &self,
        state: &mut StrategyFormState,
        input: StrategyFormInput,
        surface: &mut dyn Surface,
    ) -> bool {
        state.values = input;

        let payload = match self.validate(&state.values) {
            Ok(payload) => payload,
            Err(e) => {
                surface.alert(&e.to_string());
                surface.replace(Region::StrategyForm, render_form(state));
                return false;
            }
        };

        match self.backend.create_strategy(payload).await {
            Ok(created) => {
                info!("Strategy '{}' created ({})", created.strategy_name, created.id);
                surface.alert(&format!(
                    "Strategy '{}' created successfully!",
                    created.strategy_name
                ));
                state.values = StrategyFormInput::default();
                self.populate_credentials(state, surface).await;
                surface.navigate(DASHBOARD_PATH);
                true
            }
            Err(e) => {
                warn!("Failed to create strategy: {}", e);
                surface.alert(&format!(
                    "Failed to create strategy: {}",
                    e.user_message("Unknown error")
                ));
                surface.replace(Region::StrategyForm, render_form(state));
                false
            }
        }
    }

    fn validate(&self, input: &StrategyFormInput) -> Result<Value, FormError> {
        let api_id = input.get(API_FIELD).unwrap_or_default().trim();
        if api_id.is_empty() {
            return Err(FormError::MissingField("An API key selection"));
        }
        if Uuid::parse_str(api_id).is_err() {
            return Err(FormError::InvalidChoice {
                field: "API key",
                value: api_id.to_string(),
            });
        }
        build_payload(input)
    }
}
