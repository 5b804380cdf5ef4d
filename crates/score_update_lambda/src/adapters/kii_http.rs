use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ETAG;
use reqwest::{Client, Url};
use score_update_core::contract::{APP_ID_HEADER, APP_KEY_HEADER};
use score_update_core::object_uri::ObjectUri;
use serde::Deserialize;

use super::object_backend::{BackendError, ObjectBackend, RemoteObject, SavedObject};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
struct SiteBinding {
    app_id: String,
    app_key: String,
    endpoint: String,
}

/// REST client for object saves against the mobile backend.
#[derive(Debug, Clone)]
pub struct KiiHttpBackend {
    client: Client,
    site: Option<SiteBinding>,
}

#[derive(Debug, Default, Deserialize)]
struct SaveResponse {
    #[serde(rename = "createdAt")]
    created_at: Option<i64>,
    #[serde(rename = "modifiedAt")]
    modified_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
    message: Option<String>,
}

/// Builds the shared HTTP client; clone it into each per-invocation backend.
pub fn build_http_client(timeout: Duration) -> Result<Client, BackendError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|error| BackendError::Transport(format!("failed to build client: {error}")))
}

impl KiiHttpBackend {
    pub fn with_client(client: Client) -> Self {
        Self { client, site: None }
    }
}

#[async_trait]
impl ObjectBackend for KiiHttpBackend {
    fn initialize_with_site(&mut self, app_id: &str, app_key: &str, endpoint: &str) {
        self.site = Some(SiteBinding {
            app_id: app_id.to_string(),
            app_key: app_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        });
    }

    fn is_initialized(&self) -> bool {
        self.site.is_some()
    }

    async fn save_all_fields(&self, object: &RemoteObject) -> Result<SavedObject, BackendError> {
        let site = self.site.as_ref().ok_or(BackendError::NotInitialized)?;
        let url = object_url(&site.endpoint, &site.app_id, object.uri())?;

        let response = self
            .client
            .put(url)
            .header(APP_ID_HEADER, &site.app_id)
            .header(APP_KEY_HEADER, &site.app_key)
            .json(object.fields())
            .send()
            .await
            .map_err(|error| BackendError::Transport(error.to_string()))?;

        let status = response.status();
        let version = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim_start_matches("W/").trim_matches('"').to_string());
        let body = response
            .text()
            .await
            .map_err(|error| BackendError::Transport(error.to_string()))?;

        if !status.is_success() {
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                message: rejection_message(status.as_u16(), &body),
            });
        }

        let parsed = parse_save_response(&body)?;
        Ok(SavedObject {
            uri: object.uri().to_string(),
            created_at: parsed.created_at,
            modified_at: parsed.modified_at,
            version,
            fields: object.fields().clone(),
        })
    }
}

/// Resolves the object resource URL; every segment is percent-escaped.
pub fn object_url(endpoint: &str, app_id: &str, uri: &ObjectUri) -> Result<Url, BackendError> {
    let mut url = Url::parse(endpoint).map_err(|error| {
        BackendError::Transport(format!("invalid endpoint '{endpoint}': {error}"))
    })?;
    url.path_segments_mut()
        .map_err(|_| {
            BackendError::Transport(format!("endpoint '{endpoint}' cannot be a base URL"))
        })?
        .pop_if_empty()
        .extend(uri.rest_segments(app_id));
    Ok(url)
}

fn parse_save_response(body: &str) -> Result<SaveResponse, BackendError> {
    if body.trim().is_empty() {
        return Ok(SaveResponse::default());
    }
    serde_json::from_str(body).map_err(|error| BackendError::InvalidResponse(error.to_string()))
}

/// Picks the error text to surface for a rejected request.
pub fn rejection_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.filter(|value| !value.trim().is_empty()) {
            return message;
        }
        if let Some(code) = parsed.error_code.filter(|value| !value.trim().is_empty()) {
            return code;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("backend returned status {status}")
    } else {
        trimmed.to_string()
    }
}
