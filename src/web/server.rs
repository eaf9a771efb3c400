use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{pages, AppState};
use crate::ui::format::escape_html;
use crate::ui::{ADD_STRATEGY_PATH, API_KEYS_PATH};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Dashboard
        .route("/", get(pages::dashboard_page))
        .route("/dashboard/strategies/:id/toggle", post(pages::toggle_strategy))
        .route("/dashboard/strategies/:id/stop", post(pages::stop_strategy))
        .route("/dashboard/strategies/:id/modify", post(pages::modify_strategy))
        .route("/dashboard/strategies/:id/delete", post(pages::delete_strategy))
        // API key management
        .route(API_KEYS_PATH, get(pages::api_keys_page))
        .route("/api-management-page/save", post(pages::save_api_key))
        .route("/api-management-page/:id/delete", post(pages::delete_api_key))
        // Strategy creation
        .route(ADD_STRATEGY_PATH, get(pages::add_strategy_page).post(pages::create_strategy))
        .route("/health", get(pages::health_check))
        .layer(cors)
        .with_state(state)
}

pub async fn start_console_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Console server starting on http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTab {
    Dashboard,
    ApiKeys,
    AddStrategy,
}

/// Wraps a page body in the shared layout: navigation, alert banner and,
/// for the dashboard, a periodic self-refresh.
pub fn render_page(
    title: &str,
    active: NavTab,
    alerts: &[String],
    body: &str,
    refresh_secs: Option<u64>,
) -> String {
    let refresh = refresh_secs
        .map(|secs| format!(r#"<meta http-equiv="refresh" content="{}">"#, secs))
        .unwrap_or_default();

    let tab = |tab: NavTab, href: &str, label: &str| {
        let class = if tab == active { "view-tab active" } else { "view-tab" };
        format!(r#"<a class="{}" href="{}">{}</a>"#, class, href, label)
    };

    let alert_html: String = alerts
        .iter()
        .map(|a| format!(r#"<div class="alert" role="alert">{}</div>"#, escape_html(a)))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    {refresh}
    <title>{title} - Strategy Console</title>
    <style>{css}</style>
</head>
<body>
    <div class="header"><h1>Strategy Console</h1></div>
    <nav class="view-nav">{dashboard}{api_keys}{add_strategy}</nav>
    <div class="container">
        {alerts}
        <h2 class="section-title">{title}</h2>
        {body}
    </div>
</body>
</html>"#,
        refresh = refresh,
        title = escape_html(title),
        css = CONSOLE_CSS,
        dashboard = tab(NavTab::Dashboard, "/", "Dashboard"),
        api_keys = tab(NavTab::ApiKeys, API_KEYS_PATH, "API Keys"),
        add_strategy = tab(NavTab::AddStrategy, ADD_STRATEGY_PATH, "Add Strategy"),
        alerts = alert_html,
        body = body,
    )
}

/// Stand-in for an interactive confirm dialog: re-posts the action with
/// `confirmed=true`.
pub fn render_confirmation(prompt: &str, action: &str, cancel_href: &str) -> String {
    format!(
        concat!(
            r#"<div class="card confirm"><p>{prompt}</p>"#,
            r#"<form method="post" action="{action}" class="inline-form">"#,
            r#"<input type="hidden" name="confirmed" value="true">"#,
            r#"<button type="submit" class="btn btn-danger">Confirm</button></form> "#,
            r#"<a class="btn btn-secondary" href="{cancel}">Cancel</a></div>"#
        ),
        prompt = escape_html(prompt),
        action = action,
        cancel = cancel_href,
    )
}

const CONSOLE_CSS: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
    background: #0f1419;
    color: #e7e9ea;
    min-height: 100vh;
}
a { color: #1da1f2; }
.header { background: #16202a; padding: 1rem 2rem; border-bottom: 1px solid #2f3336; }
.header h1 { font-size: 1.5rem; color: #1da1f2; }
.view-nav { background: #16202a; border-bottom: 1px solid #2f3336; padding: 0 2rem; display: flex; gap: 0.5rem; }
.view-tab {
    padding: 1rem 1.5rem; color: #71767b; text-decoration: none;
    font-size: 0.875rem; font-weight: 600; border-bottom: 2px solid transparent;
}
.view-tab:hover { color: #e7e9ea; }
.view-tab.active { color: #1da1f2; border-bottom-color: #1da1f2; }
.container { padding: 1.5rem; max-width: 1600px; margin: 0 auto; }
.section-title { font-size: 1.25rem; font-weight: 600; margin-bottom: 1rem; }
.grid { display: grid; gap: 1.5rem; }
.grid-3 { grid-template-columns: repeat(3, 1fr); }
@media (max-width: 1200px) { .grid-3 { grid-template-columns: repeat(2, 1fr); } }
@media (max-width: 768px) { .grid-3 { grid-template-columns: 1fr; } }
.card { background: #16202a; border-radius: 12px; padding: 1.5rem; border: 1px solid #2f3336; }
.card p { margin: 0.25rem 0; font-size: 0.875rem; }
.card-title { font-size: 1rem; color: #e7e9ea; margin-bottom: 0.75rem; }
.card-actions { margin-top: 1rem; display: flex; gap: 0.5rem; flex-wrap: wrap; }
.position { margin: 0.5rem 0; padding: 0.5rem; background: #1c2732; border-radius: 8px; }
.positive { color: #00ba7c; }
.negative, .error { color: #f4212e; }
.neutral, .muted, .loading, .empty { color: #71767b; }
.status { font-weight: 600; }
.status-running { color: #00ba7c; }
.status-paused { color: #ffd400; }
.status-idle { color: #71767b; }
.alert { background: rgba(29, 161, 242, 0.15); border: 1px solid #1da1f2; border-radius: 8px; padding: 0.75rem 1rem; margin-bottom: 1rem; }
.btn { background: #1da1f2; color: #fff; border: none; border-radius: 6px; padding: 0.5rem 1rem; cursor: pointer; text-decoration: none; font-size: 0.875rem; display: inline-block; }
.btn-secondary { background: #2f3336; }
.btn-danger { background: #f4212e; }
.inline-form { display: inline; }
table { width: 100%; border-collapse: collapse; margin-bottom: 1.5rem; }
th, td { padding: 0.75rem; text-align: left; border-bottom: 1px solid #2f3336; font-size: 0.875rem; }
th { color: #71767b; font-weight: 500; font-size: 0.75rem; text-transform: uppercase; }
.form { display: grid; gap: 0.75rem; max-width: 640px; }
.form label { display: flex; flex-direction: column; gap: 0.25rem; font-size: 0.875rem; color: #71767b; }
.form input[type=text], .form input[type=number], .form input[type=password], .form select {
    background: #0f1419; color: #e7e9ea; border: 1px solid #2f3336; border-radius: 6px; padding: 0.5rem;
}
.form input[type=checkbox] { width: 1rem; height: 1rem; }
.form-actions { margin-top: 0.5rem; }
"#;
