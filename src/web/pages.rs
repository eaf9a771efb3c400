use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use super::server::{render_confirmation, render_page, NavTab};
use super::AppState;
use crate::ui::{
    ApiKeyController, ApiKeyFormInput, ApiKeyFormState, DashboardController, PageSurface, Region,
    StrategyFormController, StrategyFormInput, StrategyFormState, Surface, API_KEYS_PATH,
    DASHBOARD_PATH,
};

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub confirmed: Option<String>,
}

impl ConfirmForm {
    pub fn surface(&self) -> PageSurface {
        match self.confirmed.as_deref() {
            Some("true") => PageSurface::confirmed(),
            _ => PageSurface::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysQuery {
    #[serde(default)]
    pub edit: Option<Uuid>,
    #[serde(default)]
    pub add: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiKeySaveForm {
    #[serde(default)]
    pub edit_id: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub mode: String,
}

fn region_html(surface: &PageSurface, region: Region) -> &str {
    surface.region(region).unwrap_or_default()
}

/// Ends an action: pending confirmation gets its own page, anything else
/// redirects with the action's alerts queued for the next render.
async fn finish_action(
    state: &AppState,
    mut surface: PageSurface,
    action_path: &str,
    back_to: &str,
    tab: NavTab,
) -> Response {
    if let Some(prompt) = surface.pending_confirmation() {
        let body = render_confirmation(prompt, action_path, back_to);
        return Html(render_page("Please confirm", tab, &[], &body, None)).into_response();
    }

    let target = surface.redirect().unwrap_or(back_to).to_string();
    state.flash.push_all(surface.take_alerts()).await;
    Redirect::to(&target).into_response()
}

// === Dashboard ===

pub async fn dashboard_page(State(state): State<AppState>) -> impl IntoResponse {
    let alerts = state.flash.drain().await;
    let view = state.dashboard.snapshot().await;

    let body = format!(
        r#"<div id="dashboard-status">{}</div><div id="strategies-list">{}</div>"#,
        region_html(&view.surface, Region::DashboardStatus),
        region_html(&view.surface, Region::StrategyList),
    );

    Html(render_page(
        "Dashboard",
        NavTab::Dashboard,
        &alerts,
        &body,
        Some(state.poll_interval_secs),
    ))
}

pub async fn toggle_strategy(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let controller = DashboardController::new(state.backend.clone());
    let mut surface = PageSurface::new();
    controller.toggle(&state.dashboard, id, &mut surface).await;
    finish_action(&state, surface, "", DASHBOARD_PATH, NavTab::Dashboard).await
}

pub async fn stop_strategy(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let controller = DashboardController::new(state.backend.clone());
    let mut surface = PageSurface::new();
    controller.stop(&state.dashboard, id, &mut surface).await;
    finish_action(&state, surface, "", DASHBOARD_PATH, NavTab::Dashboard).await
}

pub async fn modify_strategy(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let controller = DashboardController::new(state.backend.clone());
    let mut surface = PageSurface::new();
    controller.modify(id, &mut surface);
    finish_action(&state, surface, "", DASHBOARD_PATH, NavTab::Dashboard).await
}

pub async fn delete_strategy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<ConfirmForm>,
) -> Response {
    let controller = DashboardController::new(state.backend.clone());
    let mut surface = form.surface();
    controller.delete(&state.dashboard, id, &mut surface).await;

    let action = format!("/dashboard/strategies/{}/delete", id);
    finish_action(&state, surface, &action, DASHBOARD_PATH, NavTab::Dashboard).await
}

// === API keys ===

fn render_api_keys_page(surface: &PageSurface, alerts: &[String]) -> String {
    let body = format!(
        concat!(
            r#"<p><a class="btn" href="{path}?add=1">Add API Key</a></p>"#,
            r#"<div id="api-key-form-container">{form}</div>"#,
            r#"<table><thead><tr><th>Alias</th><th>API Key</th><th>Mode</th><th>Connection</th><th>Actions</th></tr></thead>"#,
            r#"<tbody id="api-keys-table-body">{rows}</tbody></table>"#
        ),
        path = API_KEYS_PATH,
        form = region_html(surface, Region::ApiKeyForm),
        rows = region_html(surface, Region::ApiKeyRows),
    );
    render_page("API Key Management", NavTab::ApiKeys, alerts, &body, None)
}

/// Renders the outcome of a save or delete in place. A successful action has
/// already reloaded the table; only a failed one still needs the rows.
async fn render_api_keys_result(controller: &ApiKeyController, mut surface: PageSurface) -> Response {
    if surface.region(Region::ApiKeyRows).is_none() {
        controller.refresh(&mut surface).await;
    }
    let alerts = surface.take_alerts();
    Html(render_api_keys_page(&surface, &alerts)).into_response()
}

pub async fn api_keys_page(
    State(state): State<AppState>,
    Query(query): Query<ApiKeysQuery>,
) -> impl IntoResponse {
    let controller = ApiKeyController::new(state.backend.clone());
    let mut surface = PageSurface::new();
    let mut form = ApiKeyFormState::default();

    controller.refresh(&mut surface).await;
    match (query.edit, query.add) {
        (Some(id), _) => controller.show_edit_form(&mut form, id, &mut surface).await,
        (None, Some(_)) => controller.show_add_form(&mut form, &mut surface),
        (None, None) => controller.hide_form(&mut form, &mut surface),
    }

    let mut alerts = state.flash.drain().await;
    alerts.extend(surface.take_alerts());
    Html(render_api_keys_page(&surface, &alerts))
}

pub async fn save_api_key(
    State(state): State<AppState>,
    Form(input): Form<ApiKeySaveForm>,
) -> Response {
    let controller = ApiKeyController::new(state.backend.clone());
    let mut surface = PageSurface::new();

    let edit_id = input.edit_id.trim();
    let current_edit_id = if edit_id.is_empty() {
        None
    } else {
        match Uuid::parse_str(edit_id) {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("Rejecting API key save with malformed id '{}'", edit_id);
                return (StatusCode::BAD_REQUEST, "Malformed API key id").into_response();
            }
        }
    };

    let mut form = ApiKeyFormState {
        visible: true,
        current_edit_id,
        ..ApiKeyFormState::default()
    };
    let submitted = ApiKeyFormInput {
        alias: input.alias,
        api_key: input.api_key,
        secret_key: input.secret_key,
        mode: input.mode,
    };

    controller.submit(&mut form, submitted, &mut surface).await;
    render_api_keys_result(&controller, surface).await
}

pub async fn delete_api_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<ConfirmForm>,
) -> Response {
    let controller = ApiKeyController::new(state.backend.clone());
    let mut surface = form.surface();
    controller.delete(id, &mut surface).await;

    if let Some(prompt) = surface.pending_confirmation() {
        let action = format!("{}/{}/delete", API_KEYS_PATH, id);
        let body = render_confirmation(prompt, &action, API_KEYS_PATH);
        return Html(render_page("Please confirm", NavTab::ApiKeys, &[], &body, None)).into_response();
    }
    render_api_keys_result(&controller, surface).await
}

// === Strategy creation ===

fn render_strategy_page(surface: &PageSurface, alerts: &[String]) -> String {
    render_page(
        "Add Strategy",
        NavTab::AddStrategy,
        alerts,
        region_html(surface, Region::StrategyForm),
        None,
    )
}

pub async fn add_strategy_page(State(state): State<AppState>) -> impl IntoResponse {
    let controller = StrategyFormController::new(state.backend.clone());
    let mut surface = PageSurface::new();
    let mut form = StrategyFormState::default();
    controller.populate_credentials(&mut form, &mut surface).await;

    let alerts = state.flash.drain().await;
    Html(render_strategy_page(&surface, &alerts))
}

pub async fn create_strategy(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let controller = StrategyFormController::new(state.backend.clone());
    let mut surface = PageSurface::new();
    let mut form = StrategyFormState::default();

    let input = StrategyFormInput::new(fields);
    if controller.submit(&mut form, input, &mut surface).await {
        return finish_action(&state, surface, "", DASHBOARD_PATH, NavTab::AddStrategy).await;
    }

    // Shown again with the submitted values, so the picker needs its options
    controller.populate_credentials(&mut form, &mut surface).await;
    let alerts = surface.take_alerts();
    Html(render_strategy_page(&surface, &alerts)).into_response()
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.dashboard.snapshot().await;
    Json(json!({
        "status": "ok",
        "strategies": view.state.card_count(),
        "last_dashboard_refresh": view.state.last_updated(),
    }))
}
