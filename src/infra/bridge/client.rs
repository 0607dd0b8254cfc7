use crate::domain::models::{AppError, BridgeConfig, LightInfo, LightStateBody};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    #[error("light {light_id}: transport failed: {detail}")]
    Network { light_id: u8, detail: String },
    #[error("light {light_id}: no answer within {timeout_ms} ms")]
    Timeout { light_id: u8, timeout_ms: u64 },
    #[error("light {light_id}: bridge rejected the request: {detail}")]
    Rejected { light_id: u8, detail: String },
    #[error("light {light_id}: malformed response: {detail}")]
    MalformedResponse { light_id: u8, detail: String },
}

impl SyncError {
    pub fn light_id(&self) -> u8 {
        match self {
            SyncError::Network { light_id, .. }
            | SyncError::Timeout { light_id, .. }
            | SyncError::Rejected { light_id, .. }
            | SyncError::MalformedResponse { light_id, .. } => *light_id,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            SyncError::Network { .. } | SyncError::Timeout { .. } | SyncError::Rejected { .. } => {
                "NETWORK_ERROR"
            }
            SyncError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
        }
    }
}

impl From<SyncError> for AppError {
    fn from(error: SyncError) -> Self {
        AppError::new(
            error.code(),
            error.to_string(),
            Some("check that the bridge is reachable from this device".to_string()),
        )
    }
}

/// Remote light endpoints. Implementations must be shareable across the
/// spawned write tasks.
pub trait LightClient: Send + Sync + 'static {
    fn fetch_light(
        &self,
        light_id: u8,
    ) -> impl Future<Output = Result<LightInfo, SyncError>> + Send;

    fn put_light_state(
        &self,
        light_id: u8,
        on: bool,
    ) -> impl Future<Output = Result<Value, SyncError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpLightClient {
    http: reqwest::Client,
    api_base: String,
    timeout_ms: u64,
}

impl HttpLightClient {
    pub fn new(config: &BridgeConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("lightswitch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| {
                AppError::new(
                    "BRIDGE_CLIENT_INIT_FAIL",
                    format!("failed to build http client: {error}"),
                    None,
                )
            })?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            timeout_ms: config.request_timeout_ms,
        })
    }

    pub fn light_url(&self, light_id: u8) -> String {
        format!("{}/lights/{light_id}", self.api_base)
    }

    pub fn state_url(&self, light_id: u8) -> String {
        format!("{}/lights/{light_id}/state", self.api_base)
    }

    fn transport_error(&self, light_id: u8, error: reqwest::Error) -> SyncError {
        if error.is_timeout() {
            SyncError::Timeout {
                light_id,
                timeout_ms: self.timeout_ms,
            }
        } else {
            SyncError::Network {
                light_id,
                detail: error.to_string(),
            }
        }
    }

    async fn read_body(
        &self,
        light_id: u8,
        response: reqwest::Response,
    ) -> Result<String, SyncError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| self.transport_error(light_id, error))?;
        if !status.is_success() {
            return Err(SyncError::Network {
                light_id,
                detail: format!("http {status}: {}", body.trim()),
            });
        }
        Ok(body)
    }
}

impl LightClient for HttpLightClient {
    async fn fetch_light(&self, light_id: u8) -> Result<LightInfo, SyncError> {
        let response = self
            .http
            .get(self.light_url(light_id))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|error| self.transport_error(light_id, error))?;
        let body = self.read_body(light_id, response).await?;
        parse_light_info(light_id, &body)
    }

    async fn put_light_state(&self, light_id: u8, on: bool) -> Result<Value, SyncError> {
        let response = self
            .http
            .put(self.state_url(light_id))
            .header("Accept", "application/json")
            .json(&LightStateBody { on })
            .send()
            .await
            .map_err(|error| self.transport_error(light_id, error))?;
        let body = self.read_body(light_id, response).await?;
        parse_acknowledgement(light_id, &body)
    }
}

pub fn parse_light_info(light_id: u8, body: &str) -> Result<LightInfo, SyncError> {
    let value = parse_json(light_id, body)?;
    if let Some(detail) = bridge_error(&value) {
        return Err(SyncError::Rejected { light_id, detail });
    }
    serde_json::from_value::<LightInfo>(value).map_err(|error| SyncError::MalformedResponse {
        light_id,
        detail: error.to_string(),
    })
}

/// The bridge acknowledges with a JSON list of `success`/`error` entries;
/// any `error` entry means the write was not applied.
pub fn parse_acknowledgement(light_id: u8, body: &str) -> Result<Value, SyncError> {
    let value = parse_json(light_id, body)?;
    if let Some(detail) = bridge_error(&value) {
        return Err(SyncError::Rejected { light_id, detail });
    }
    Ok(value)
}

fn parse_json(light_id: u8, body: &str) -> Result<Value, SyncError> {
    serde_json::from_str::<Value>(body).map_err(|error| SyncError::MalformedResponse {
        light_id,
        detail: format!("invalid json: {error}"),
    })
}

fn bridge_error(value: &Value) -> Option<String> {
    let entries = match value {
        Value::Array(entries) => entries.as_slice(),
        other => std::slice::from_ref(other),
    };
    entries.iter().find_map(|entry| {
        let error = entry.get("error")?;
        Some(
            error
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_acknowledgement, parse_light_info, HttpLightClient, SyncError};
    use crate::domain::models::{AppError, BridgeConfig};

    #[test]
    fn urls_are_built_from_configured_base() {
        let client = HttpLightClient::new(&BridgeConfig {
            api_base: "http://bridge.local/api/user/".to_string(),
            request_timeout_ms: 100,
        })
        .unwrap();
        assert_eq!(client.light_url(1), "http://bridge.local/api/user/lights/1");
        assert_eq!(
            client.state_url(5),
            "http://bridge.local/api/user/lights/5/state"
        );
    }

    #[test]
    fn light_info_reads_nested_on_flag() {
        let info = parse_light_info(1, r#"{"state":{"on":true,"bri":254},"name":"Tree"}"#).unwrap();
        assert!(info.state.on);
    }

    #[test]
    fn light_info_with_wrong_shape_is_malformed() {
        let error = parse_light_info(2, r#"{"state":{"bri":1}}"#).unwrap_err();
        assert!(matches!(error, SyncError::MalformedResponse { light_id: 2, .. }));
        let error = parse_light_info(2, "<html>").unwrap_err();
        assert!(matches!(error, SyncError::MalformedResponse { .. }));
    }

    #[test]
    fn acknowledgement_error_entry_is_rejected() {
        let body = r#"[{"error":{"type":3,"address":"/lights/9/state","description":"resource, /lights/9/state, not available"}}]"#;
        let error = parse_acknowledgement(9, body).unwrap_err();
        assert_eq!(
            error,
            SyncError::Rejected {
                light_id: 9,
                detail: "resource, /lights/9/state, not available".to_string()
            }
        );
        let app_error: AppError = error.into();
        assert_eq!(app_error.code, "NETWORK_ERROR");
    }

    #[test]
    fn acknowledgement_success_is_passed_through() {
        let body = r#"[{"success":{"/lights/1/state/on":true}}]"#;
        let value = parse_acknowledgement(1, body).unwrap();
        assert_eq!(value[0]["success"]["/lights/1/state/on"], true);
    }
}
