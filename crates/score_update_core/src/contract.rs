use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::object_uri::ObjectUri;

pub const APP_ID_HEADER: &str = "X-Kii-AppID";
pub const APP_KEY_HEADER: &str = "X-Kii-AppKey";
pub const DEFAULT_API_ENDPOINT: &str = "https://dev-jp.internal.kii.com/api";
pub const SCORE_FIELD: &str = "score";

/// Parameter bag passed to the function by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpdateScoreParams {
    #[serde(default)]
    pub uri: Option<String>,
    /// `None` only when the key is absent; an explicit `null` is `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present_value")]
    pub score: Option<Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Invocation context; only the headers are consulted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RequestContext {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_key: String,
}

impl RequestContext {
    pub fn with_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn app_credentials(&self) -> Result<AppCredentials, ValidationError> {
        let app_id = required_header(self, APP_ID_HEADER)?;
        let app_key = required_header(self, APP_KEY_HEADER)?;
        Ok(AppCredentials { app_id, app_key })
    }
}

fn required_header(context: &RequestContext, name: &str) -> Result<String, ValidationError> {
    match context.header(name).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ValidationError::new(format!(
            "request context is missing the {name} header"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedUpdate {
    pub uri: ObjectUri,
    pub score: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn normalize_params(params: UpdateScoreParams) -> Result<NormalizedUpdate, ValidationError> {
    let uri = match params.uri.as_deref() {
        Some(text) => ObjectUri::parse(text)?,
        None => return Err(ValidationError::new("uri is required")),
    };

    let score = match params.score {
        Some(Value::Array(_)) | Some(Value::Object(_)) => {
            return Err(ValidationError::new("score must be a scalar value"));
        }
        Some(value) => value,
        None => return Err(ValidationError::new("score is required")),
    };

    Ok(NormalizedUpdate { uri, score })
}

pub fn request_fingerprint(update: &NormalizedUpdate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(stable_contract_json(&serde_json::json!({
        "uri": update.uri.to_string(),
        "score": update.score,
    })));
    format!("{:x}", hasher.finalize())
}

pub fn stable_contract_json(value: impl Serialize) -> String {
    serde_json::to_string(&value).expect("serialization of contract value should not fail")
}
