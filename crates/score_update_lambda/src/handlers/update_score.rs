use std::time::Instant;

use score_update_core::contract::{
    normalize_params, request_fingerprint, RequestContext, UpdateScoreParams, SCORE_FIELD,
};
use serde::Serialize;
use tracing::{error, info};

use crate::adapters::object_backend::{ObjectBackend, SavedObject};

const COMPONENT: &str = "update_score_handler";

/// Terminal outcome of one invocation. Serializes as either the saved object
/// or the bare error string.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Completion {
    Saved(SavedObject),
    Failed(String),
}

impl Completion {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

/// Sets `score` on the object named by `params.uri` and saves it once.
pub async fn handle_update_score<B: ObjectBackend>(
    params: UpdateScoreParams,
    context: &RequestContext,
    endpoint: &str,
    backend: &mut B,
) -> Completion {
    let started_at = Instant::now();

    let credentials = match context.app_credentials() {
        Ok(value) => value,
        Err(error) => return rejected("invalid_context", error.message()),
    };
    backend.initialize_with_site(&credentials.app_id, &credentials.app_key, endpoint);

    let update = match normalize_params(params) {
        Ok(value) => value,
        Err(error) => return rejected("invalid_params", error.message()),
    };
    let fingerprint = request_fingerprint(&update);
    let uri = update.uri.to_string();
    info!(
        component = COMPONENT,
        event = "update_started",
        uri = %uri,
        fingerprint = %fingerprint,
        app_id = %credentials.app_id,
    );

    let mut object = match backend.object_with_uri(update.uri) {
        Ok(value) => value,
        Err(error) => return rejected("lookup_failed", &error.to_string()),
    };
    object.set(SCORE_FIELD, update.score);

    match backend.save_all_fields(&object).await {
        Ok(saved) => {
            info!(
                component = COMPONENT,
                event = "update_saved",
                uri = %uri,
                fingerprint = %fingerprint,
                version = saved.version.as_deref().unwrap_or(""),
                modified_at = %format_millis(saved.modified_at),
                duration_ms = elapsed_ms(started_at),
            );
            Completion::Saved(saved)
        }
        Err(save_error) => {
            error!(
                component = COMPONENT,
                event = "update_failed",
                uri = %uri,
                fingerprint = %fingerprint,
                error = %save_error,
                duration_ms = elapsed_ms(started_at),
            );
            Completion::Failed(save_error.to_string())
        }
    }
}

/// Callback form of [`handle_update_score`]; `done` runs exactly once.
pub async fn dispatch_update_score<B, F>(
    params: UpdateScoreParams,
    context: &RequestContext,
    endpoint: &str,
    backend: &mut B,
    done: F,
) where
    B: ObjectBackend,
    F: FnOnce(Completion),
{
    let completion = handle_update_score(params, context, endpoint, backend).await;
    done(completion);
}

fn rejected(event: &str, message: &str) -> Completion {
    error!(component = COMPONENT, event = event, message = message);
    Completion::Failed(message.to_string())
}

fn elapsed_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn format_millis(millis: Option<i64>) -> String {
    millis
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|value| value.to_rfc3339())
        .unwrap_or_default()
}
