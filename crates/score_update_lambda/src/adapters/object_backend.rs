use async_trait::async_trait;
use score_update_core::object_uri::ObjectUri;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("backend client has not been initialized")]
    NotInitialized,
    #[error("{0}")]
    Transport(String),
    /// The backend answered with a non-success status; displays the backend message as-is.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
}

/// Handle to a remote object. Only locally set fields are held here.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteObject {
    uri: ObjectUri,
    fields: Map<String, Value>,
}

impl RemoteObject {
    pub fn new(uri: ObjectUri) -> Self {
        Self {
            uri,
            fields: Map::new(),
        }
    }

    pub fn uri(&self) -> &ObjectUri {
        &self.uri
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Object representation echoed back after a successful save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedObject {
    pub uri: String,
    #[serde(rename = "_created", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(rename = "_modified", skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<i64>,
    #[serde(rename = "_version", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SavedObject {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Binds the client to an application and API endpoint.
    fn initialize_with_site(&mut self, app_id: &str, app_key: &str, endpoint: &str);

    fn is_initialized(&self) -> bool;

    fn object_with_uri(&self, uri: ObjectUri) -> Result<RemoteObject, BackendError> {
        if !self.is_initialized() {
            return Err(BackendError::NotInitialized);
        }
        Ok(RemoteObject::new(uri))
    }

    /// Persists every locally set field of `object`, replacing the remote body.
    async fn save_all_fields(&self, object: &RemoteObject) -> Result<SavedObject, BackendError>;
}
