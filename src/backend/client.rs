use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::{Backend, BackendError};
use crate::config::ConsoleConfig;
use crate::types::{ApiKeyPayload, ApiKeyRecord, DashboardData, StrategyAction, StrategyConfig};

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self, BackendError> {
        Self::new(&config.backend_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Passes 2xx responses through and turns everything else into
    /// `BackendError::Http`, reading whatever body came back.
    async fn check(resp: Response) -> Result<Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        // An unreadable body is treated like an empty one
        let body = resp.text().await.unwrap_or_default();
        debug!("Backend returned {}: {}", status, body);
        Err(BackendError::from_response_body(status.as_u16(), &body))
    }

    async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, BackendError> {
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn dashboard_data(&self) -> Result<DashboardData, BackendError> {
        let resp = self.client.get(self.url("/ui/dashboard-data")).send().await?;
        Self::read_json(resp).await
    }

    async fn control_strategy(&self, id: Uuid, action: StrategyAction) -> Result<(), BackendError> {
        let url = self.url(&format!("/control/strategies/{}/{}", id, action.as_str()));
        debug!("POST {}", url);
        let resp = self.client.post(url).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn delete_strategy(&self, id: Uuid) -> Result<(), BackendError> {
        let resp = self
            .client
            .delete(self.url(&format!("/strategies/{}", id)))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn create_strategy(&self, definition: serde_json::Value) -> Result<StrategyConfig, BackendError> {
        let resp = self
            .client
            .post(self.url("/strategies/"))
            .json(&definition)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>, BackendError> {
        let resp = self.client.get(self.url("/apis/")).send().await?;
        Self::read_json(resp).await
    }

    async fn get_api_key(&self, id: Uuid) -> Result<ApiKeyRecord, BackendError> {
        let resp = self
            .client
            .get(self.url(&format!("/apis/{}", id)))
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn create_api_key(&self, payload: ApiKeyPayload) -> Result<ApiKeyRecord, BackendError> {
        let resp = self
            .client
            .post(self.url("/apis/"))
            .json(&payload)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn update_api_key(&self, id: Uuid, payload: ApiKeyPayload) -> Result<ApiKeyRecord, BackendError> {
        let resp = self
            .client
            .put(self.url(&format!("/apis/{}", id)))
            .json(&payload)
            .send()
            .await?;
        Self::read_json(resp).await
    }

    async fn delete_api_key(&self, id: Uuid) -> Result<(), BackendError> {
        let resp = self
            .client
            .delete(self.url(&format!("/apis/{}", id)))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}
