use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const CONNECTED: &str = "connected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    #[default]
    Paper,
    Live,
}

impl ApiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiMode::Paper => "paper",
            ApiMode::Live => "live",
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiMode::Paper => write!(f, "Paper"),
            ApiMode::Live => write!(f, "Live"),
        }
    }
}

impl FromStr for ApiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paper" => Ok(ApiMode::Paper),
            "live" => Ok(ApiMode::Live),
            other => Err(format!("unknown API mode '{}'", other)),
        }
    }
}

/// Stored exchange credential. The secret is write-only and never comes back
/// from the read endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub id: Uuid,
    pub alias: String,
    pub api_key: String,
    #[serde(default)]
    pub mode: ApiMode,
    #[serde(default = "default_status")]
    pub connection_status: String,
}

fn default_status() -> String {
    "unknown".to_string()
}

impl ApiKeyRecord {
    pub fn is_connected(&self) -> bool {
        self.connection_status == CONNECTED
    }
}

/// Body for `POST /apis/` and `PUT /apis/{id}`.
///
/// A `None` secret is left out of the JSON entirely, which the backend reads
/// as "keep the stored secret".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiKeyPayload {
    pub alias: String,
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    pub mode: ApiMode,
}
