pub mod client;
pub mod error;

pub use client::*;
pub use error::*;

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{ApiKeyPayload, ApiKeyRecord, DashboardData, StrategyAction, StrategyConfig};

/// REST surface of the strategy backend consumed by the console.
///
/// Every method is a single attempt; nothing here retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /ui/dashboard-data`
    async fn dashboard_data(&self) -> Result<DashboardData, BackendError>;
    /// `POST /control/strategies/{id}/{start|pause|stop}`
    async fn control_strategy(&self, id: Uuid, action: StrategyAction) -> Result<(), BackendError>;
    /// `DELETE /strategies/{id}`
    async fn delete_strategy(&self, id: Uuid) -> Result<(), BackendError>;
    /// `POST /strategies/`
    async fn create_strategy(&self, definition: serde_json::Value) -> Result<StrategyConfig, BackendError>;
    /// `GET /apis/`
    async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>, BackendError>;
    /// `GET /apis/{id}`
    async fn get_api_key(&self, id: Uuid) -> Result<ApiKeyRecord, BackendError>;
    /// `POST /apis/`
    async fn create_api_key(&self, payload: ApiKeyPayload) -> Result<ApiKeyRecord, BackendError>;
    /// `PUT /apis/{id}`
    async fn update_api_key(&self, id: Uuid, payload: ApiKeyPayload) -> Result<ApiKeyRecord, BackendError>;
    /// `DELETE /apis/{id}`
    async fn delete_api_key(&self, id: Uuid) -> Result<(), BackendError>;
}
