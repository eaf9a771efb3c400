use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::format::escape_html;
use super::{FormError, Region, Surface};
use crate::backend::{Backend, BackendError};
use crate::types::{ApiKeyPayload, ApiKeyRecord, ApiMode};

pub const API_KEYS_PATH: &str = "/api-management-page";
pub const SECRET_EDIT_PLACEHOLDER: &str = "Leave blank to keep the current secret; enter new secret to change";

/// Shows the first and last four characters of a key. Keys too short to
/// hide anything that way are fully masked.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len().max(4));
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// The single add/edit form. `current_edit_id` decides the mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiKeyFormState {
    pub visible: bool,
    pub current_edit_id: Option<Uuid>,
    pub alias: String,
    pub api_key: String,
    pub mode: ApiMode,
}

impl ApiKeyFormState {
    pub fn is_edit(&self) -> bool {
        self.current_edit_id.is_some()
    }

    /// Only a new credential must come with a secret.
    pub fn secret_required(&self) -> bool {
        !self.is_edit()
    }

    pub fn secret_placeholder(&self) -> &'static str {
        if self.is_edit() {
            SECRET_EDIT_PLACEHOLDER
        } else {
            "Secret key"
        }
    }

    pub fn title(&self) -> &'static str {
        if self.is_edit() {
            "Edit API Key"
        } else {
            "Add API Key"
        }
    }
}

/// Raw values as submitted by the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiKeyFormInput {
    pub alias: String,
    pub api_key: String,
    pub secret_key: String,
    pub mode: String,
}

impl ApiKeyFormInput {
    /// A blank secret is dropped from the payload; a non-blank one is sent
    /// exactly as typed.
    pub fn to_payload(&self, editing: bool) -> Result<ApiKeyPayload, FormError> {
        if self.alias.trim().is_empty() {
            return Err(FormError::MissingField("Alias"));
        }
        if self.api_key.trim().is_empty() {
            return Err(FormError::MissingField("API key"));
        }
        let mode = self.parse_mode()?;

        let secret_key = if self.secret_key.trim().is_empty() {
            if !editing {
                return Err(FormError::MissingField("Secret key"));
            }
            None
        } else {
            Some(self.secret_key.clone())
        };

        Ok(ApiKeyPayload {
            alias: self.alias.trim().to_string(),
            api_key: self.api_key.trim().to_string(),
            secret_key,
            mode,
        })
    }

    fn parse_mode(&self) -> Result<ApiMode, FormError> {
        if self.mode.trim().is_empty() {
            return Ok(ApiMode::default());
        }
        self.mode.parse().map_err(|_| FormError::InvalidChoice {
            field: "mode",
            value: self.mode.clone(),
        })
    }
}

pub fn render_rows(records: &[ApiKeyRecord]) -> String {
    if records.is_empty() {
        return r#"<tr><td colspan="5" class="empty">No API keys configured yet.</td></tr>"#.to_string();
    }

    let mut html = String::new();
    for record in records {
        let status_class = if record.is_connected() {
            "positive"
        } else {
            "negative"
        };
        html.push_str(&format!(
            concat!(
                r#"<tr data-id="{id}">"#,
                "<td>{alias}</td>",
                "<td><code>{key}</code></td>",
                "<td>{mode}</td>",
                r#"<td><span class="{status_class}">{status}</span></td>"#,
                "<td>",
                r#"<a class="btn btn-secondary" href="{path}?edit={id}">Edit</a> "#,
                r#"<form method="post" action="{path}/{id}/delete" class="inline-form">"#,
                r#"<button type="submit" class="btn btn-danger" data-id="{id}">Delete</button></form>"#,
                "</td></tr>"
            ),
            id = record.id,
            alias = escape_html(&record.alias),
            key = escape_html(&mask_key(&record.api_key)),
            mode = record.mode,
            status_class = status_class,
            status = escape_html(&record.connection_status),
            path = API_KEYS_PATH,
        ));
    }
    html
}

fn render_load_error(err: &BackendError) -> String {
    format!(
        r#"<tr><td colspan="5" class="error">Failed to load API keys: {}</td></tr>"#,
        escape_html(&err.user_message("server error"))
    )
}

pub fn render_form(state: &ApiKeyFormState) -> String {
    if !state.visible {
        return String::new();
    }

    let edit_id = state
        .current_edit_id
        .map(|id| id.to_string())
        .unwrap_or_default();
    let mode_options: String = [ApiMode::Paper, ApiMode::Live]
        .iter()
        .map(|m| {
            let selected = if *m == state.mode { " selected" } else { "" };
            format!(r#"<option value="{}"{}>{}</option>"#, m.as_str(), selected, m)
        })
        .collect();

    format!(
        concat!(
            r#"<form method="post" action="{path}/save" class="card form" id="api-key-form">"#,
            r#"<h3 class="card-title">{title}</h3>"#,
            r#"<input type="hidden" name="edit_id" value="{edit_id}">"#,
            r#"<label>Alias<input type="text" name="alias" value="{alias}" required></label>"#,
            r#"<label>API Key<input type="text" name="api_key" value="{api_key}" required></label>"#,
            r#"<label>Secret Key<input type="password" name="secret_key" value="" placeholder="{placeholder}"{required}></label>"#,
            r#"<label>Mode<select name="mode">{mode_options}</select></label>"#,
            r#"<div class="form-actions"><button type="submit" class="btn">Save</button> "#,
            r#"<a class="btn btn-secondary" href="{path}">Cancel</a></div>"#,
            "</form>"
        ),
        path = API_KEYS_PATH,
        title = state.title(),
        edit_id = edit_id,
        alias = escape_html(&state.alias),
        api_key = escape_html(&state.api_key),
        placeholder = state.secret_placeholder(),
        required = if state.secret_required() { " required" } else { "" },
        mode_options = mode_options,
    )
}

pub struct ApiKeyController {
    backend: Arc<dyn Backend>,
}

impl ApiKeyController {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Rebuilds the table body. A failed fetch becomes a single explanatory
    /// row; the form is never touched.
    pub async fn refresh(&self, surface: &mut dyn Surface) {
        let html = match self.backend.list_api_keys().await {
            Ok(records) => render_rows(&records),
            Err(e) => {
                warn!("Failed to load API keys: {}", e);
                render_load_error(&e)
            }
        };
        surface.replace(Region::ApiKeyRows, html);
    }

    pub fn show_add_form(&self, state: &mut ApiKeyFormState, surface: &mut dyn Surface) {
        *state = ApiKeyFormState {
            visible: true,
            ..ApiKeyFormState::default()
        };
        surface.replace(Region::ApiKeyForm, render_form(state));
    }

    pub async fn show_edit_form(
        &self,
        state: &mut ApiKeyFormState,
        id: Uuid,
        surface: &mut dyn Surface,
    ) {
        match self.backend.get_api_key(id).await {
            Ok(record) => {
                *state = ApiKeyFormState {
                    visible: true,
                    current_edit_id: Some(record.id),
                    alias: record.alias,
                    api_key: record.api_key,
                    mode: record.mode,
                };
                surface.replace(Region::ApiKeyForm, render_form(state));
            }
            Err(e) => {
                warn!("Failed to load API key {}: {}", id, e);
                surface.alert(&format!(
                    "Failed to load API key details: {}",
                    e.user_message("Unknown error")
                ));
            }
        }
    }

    pub fn hide_form(&self, state: &mut ApiKeyFormState, surface: &mut dyn Surface) {
        *state = ApiKeyFormState::default();
        surface.replace(Region::ApiKeyForm, render_form(state));
    }

    /// Creates or updates depending on the form mode. Returns whether the
    /// backend accepted the submission.
    pub async fn submit(
        &self,
        state: &mut ApiKeyFormState,
        input: ApiKeyFormInput,
        surface: &mut dyn Surface,
    ) -> bool {
        state.visible = true;
        state.alias = input.alias.clone();
        state.api_key = input.api_key.clone();
        if let Ok(mode) = input.mode.parse() {
            state.mode = mode;
        }

        let payload = match input.to_payload(state.is_edit()) {
            Ok(payload) => payload,
            Err(e) => {
                surface.alert(&e.to_string());
                surface.replace(Region::ApiKeyForm, render_form(state));
                return false;
            }
        };

        let alias = payload.alias.clone();
        let result = match state.current_edit_id {
            Some(id) => self.backend.update_api_key(id, payload).await,
            None => self.backend.create_api_key(payload).await,
        };

        match result {
            Ok(record) => {
                let verb = if state.is_edit() { "updated" } else { "added" };
                info!("API key '{}' {} ({})", alias, verb, record.id);
                surface.alert(&format!("API key '{}' {} successfully.", alias, verb));
                self.hide_form(state, surface);
                self.refresh(surface).await;
                true
            }
            Err(e) => {
                warn!("Failed to save API key '{}': {}", alias, e);
                surface.alert(&format!(
                    "Failed to save API key: {}",
                    e.user_message("Unknown error")
                ));
                surface.replace(Region::ApiKeyForm, render_form(state));
                false
            }
        }
    }

    pub async fn delete(&self, id: Uuid, surface: &mut dyn Surface) {
        if !surface.confirm("Are you sure you want to delete this API key?") {
            return;
        }

        match self.backend.delete_api_key(id).await {
            Ok(()) => {
                info!("API key {} deleted", id);
                self.refresh(surface).await;
            }
            Err(e) => {
                warn!("Failed to delete API key {}: {}", id, e);
                surface.alert(&format!(
                    "Failed to delete API key: {}",
                    e.user_message("Unknown error")
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::ui::PageSurface;
    use std::str::FromStr;

    const KEY_ID: &str = "1b2f7e9c-3f5e-4d6a-9c1b-0e8f7a6b5c4d";

    fn key_id() -> Uuid {
        Uuid::from_str(KEY_ID).unwrap()
    }

    fn record(status: &str) -> ApiKeyRecord {
        ApiKeyRecord {
            id: key_id(),
            alias: "Binance paper".to_string(),
            api_key: "ABCD1234567890WXYZ".to_string(),
            mode: ApiMode::Paper,
            connection_status: status.to_string(),
        }
    }

    fn input(secret: &str) -> ApiKeyFormInput {
        ApiKeyFormInput {
            alias: "Binance paper".to_string(),
            api_key: "ABCD1234567890WXYZ".to_string(),
            secret_key: secret.to_string(),
            mode: "live".to_string(),
        }
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("ABCD1234567890WXYZ"), "ABCD...WXYZ");
        assert_eq!(mask_key("short"), "*****");
        assert_eq!(mask_key("ab"), "****");
    }

    #[test]
    fn test_rows_never_show_full_key() {
        let html = render_rows(&[record("connected")]);
        assert!(html.contains("ABCD...WXYZ"));
        assert!(!html.contains("ABCD1234567890WXYZ"));
        assert!(html.contains("connected"));
        assert!(html.contains(&format!("?edit={}", KEY_ID)));
    }

    #[test]
    fn test_blank_secret_is_omitted_when_editing() {
        let payload = input("   ").to_payload(true).unwrap();
        assert_eq!(payload.secret_key, None);
        assert_eq!(payload.mode, ApiMode::Live);
    }

    #[test]
    fn test_non_blank_secret_is_sent_unmodified() {
        let payload = input(" s3cret ").to_payload(true).unwrap();
        assert_eq!(payload.secret_key.as_deref(), Some(" s3cret "));
    }

    #[test]
    fn test_secret_required_when_adding() {
        assert_eq!(
            input("").to_payload(false).unwrap_err(),
            FormError::MissingField("Secret key")
        );
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        let mut bad = input("x");
        bad.mode = "demo".to_string();
        assert!(matches!(
            bad.to_payload(false),
            Err(FormError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn test_form_modes() {
        let add = ApiKeyFormState {
            visible: true,
            ..ApiKeyFormState::default()
        };
        let html = render_form(&add);
        assert!(html.contains("Add API Key"));
        assert!(html.contains(r#"placeholder="Secret key" required"#));

        let edit = ApiKeyFormState {
            current_edit_id: Some(key_id()),
            ..add
        };
        let html = render_form(&edit);
        assert!(html.contains("Edit API Key"));
        assert!(html.contains(SECRET_EDIT_PLACEHOLDER));
        assert!(!html.contains(&format!(r#"placeholder="{}" required"#, SECRET_EDIT_PLACEHOLDER)));
        assert!(html.contains(KEY_ID));

        assert_eq!(render_form(&ApiKeyFormState::default()), "");
    }

    #[tokio::test]
    async fn test_refresh_failure_renders_single_row() {
        let mut backend = MockBackend::new();
        backend
            .expect_list_api_keys()
            .returning(|| Err(BackendError::Http { status: 500, detail: None }));
        let controller = ApiKeyController::new(Arc::new(backend));

        let mut surface = PageSurface::new();
        let mut state = ApiKeyFormState::default();
        controller.show_add_form(&mut state, &mut surface);
        let form_before = surface.region(Region::ApiKeyForm).unwrap().to_string();

        controller.refresh(&mut surface).await;

        let rows = surface.region(Region::ApiKeyRows).unwrap();
        assert_eq!(rows.matches("<tr").count(), 1);
        assert!(rows.contains("Failed to load API keys"));
        assert_eq!(surface.region(Region::ApiKeyForm).unwrap(), form_before);
        assert!(state.visible);
    }

    #[tokio::test]
    async fn test_edit_form_is_populated_without_secret() {
        let mut backend = MockBackend::new();
        backend
            .expect_get_api_key()
            .withf(|id| *id == key_id())
            .returning(|_| Ok(record("connected")));
        let controller = ApiKeyController::new(Arc::new(backend));

        let mut surface = PageSurface::new();
        let mut state = ApiKeyFormState::default();
        controller.show_edit_form(&mut state, key_id(), &mut surface).await;

        assert_eq!(state.current_edit_id, Some(key_id()));
        assert_eq!(state.alias, "Binance paper");
        assert!(!state.secret_required());
        let html = surface.region(Region::ApiKeyForm).unwrap();
        assert!(html.contains(r#"name="secret_key" value="""#));
    }

    #[tokio::test]
    async fn test_edit_submit_uses_put_without_secret() {
        let mut backend = MockBackend::new();
        backend
            .expect_update_api_key()
            .withf(|id, payload| *id == key_id() && payload.secret_key.is_none())
            .times(1)
            .returning(|_, _| Ok(record("connected")));
        backend.expect_create_api_key().times(0);
        backend
            .expect_list_api_keys()
            .times(1)
            .returning(|| Ok(vec![record("connected")]));
        let controller = ApiKeyController::new(Arc::new(backend));

        let mut surface = PageSurface::new();
        let mut state = ApiKeyFormState {
            visible: true,
            current_edit_id: Some(key_id()),
            ..ApiKeyFormState::default()
        };
        assert!(controller.submit(&mut state, input(""), &mut surface).await);

        assert!(!state.visible);
        assert_eq!(surface.region(Region::ApiKeyForm), Some(""));
        assert!(surface.region(Region::ApiKeyRows).unwrap().contains("ABCD...WXYZ"));
    }

    #[tokio::test]
    async fn test_add_submit_uses_post_with_secret() {
        let mut backend = MockBackend::new();
        backend
            .expect_create_api_key()
            .withf(|payload| payload.secret_key.as_deref() == Some("s3cret"))
            .times(1)
            .returning(|_| Ok(record("unknown")));
        backend.expect_list_api_keys().returning(|| Ok(vec![]));
        let controller = ApiKeyController::new(Arc::new(backend));

        let mut surface = PageSurface::new();
        let mut state = ApiKeyFormState::default();
        controller.show_add_form(&mut state, &mut surface);
        assert!(controller.submit(&mut state, input("s3cret"), &mut surface).await);
    }

    #[tokio::test]
    async fn test_submit_failure_surfaces_detail_and_keeps_form() {
        let mut backend = MockBackend::new();
        backend.expect_create_api_key().returning(|_| {
            Err(BackendError::Http {
                status: 400,
                detail: Some("Alias already exists".to_string()),
            })
        });
        backend.expect_list_api_keys().times(0);
        let controller = ApiKeyController::new(Arc::new(backend));

        let mut surface = PageSurface::new();
        let mut state = ApiKeyFormState::default();
        assert!(!controller.submit(&mut state, input("s3cret"), &mut surface).await);

        assert_eq!(surface.alerts(), ["Failed to save API key: Alias already exists".to_string()]);
        assert!(state.visible);
        assert!(surface.region(Region::ApiKeyForm).unwrap().contains("Binance paper"));
    }

    #[tokio::test]
    async fn test_client_validation_blocks_request() {
        let mut backend = MockBackend::new();
        backend.expect_create_api_key().times(0);
        let controller = ApiKeyController::new(Arc::new(backend));

        let mut surface = PageSurface::new();
        let mut state = ApiKeyFormState::default();
        assert!(!controller.submit(&mut state, input(""), &mut surface).await);
        assert_eq!(surface.alerts(), ["Secret key is required.".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_without_body_uses_fallback() {
        let mut backend = MockBackend::new();
        backend
            .expect_delete_api_key()
            .returning(|_| Err(BackendError::from_response_body(500, "")));
        let controller = ApiKeyController::new(Arc::new(backend));

        let mut surface = PageSurface::confirmed();
        controller.delete(key_id(), &mut surface).await;
        assert_eq!(surface.alerts(), ["Failed to delete API key: Unknown error".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_cancelled_sends_nothing() {
        let mut backend = MockBackend::new();
        backend.expect_delete_api_key().times(0);
        let controller = ApiKeyController::new(Arc::new(backend));

        let mut surface = PageSurface::new();
        controller.delete(key_id(), &mut surface).await;
        assert!(surface.pending_confirmation().is_some());
        assert!(surface.alerts().is_empty());
    }
}
