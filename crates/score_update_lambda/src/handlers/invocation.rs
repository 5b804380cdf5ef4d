use score_update_core::contract::{RequestContext, UpdateScoreParams};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::update_score::Completion;

/// How the host delivered the event, which decides the reply format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationShape {
    Direct,
    ApiGatewayProxy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

pub fn invocation_shape(event: &Value) -> InvocationShape {
    match event.as_object() {
        Some(object)
            if !object.contains_key("params")
                && (object.contains_key("body") || object.contains_key("headers")) =>
        {
            InvocationShape::ApiGatewayProxy
        }
        _ => InvocationShape::Direct,
    }
}

#[derive(Debug, Deserialize)]
struct InvocationEnvelope {
    params: UpdateScoreParams,
    #[serde(default)]
    context: RequestContext,
}

/// Splits a host event into parameters and request context.
///
/// Accepts `{"params": .., "context": {"headers": ..}}`, an API Gateway proxy
/// event (`headers` plus a JSON `body`), or a bare parameter object.
pub fn decode_invocation(event: Value) -> Result<(UpdateScoreParams, RequestContext), String> {
    let Some(object) = event.as_object() else {
        return Err("Invocation payload must be a JSON object".to_string());
    };

    if object.contains_key("params") {
        let envelope: InvocationEnvelope = serde_json::from_value(event)
            .map_err(|error| format!("Malformed invocation envelope: {error}"))?;
        return Ok((envelope.params, envelope.context));
    }

    if invocation_shape(&event) == InvocationShape::ApiGatewayProxy {
        let context = RequestContext::with_headers(
            object
                .get("headers")
                .and_then(Value::as_object)
                .into_iter()
                .flatten()
                .filter_map(|(name, value)| value.as_str().map(|text| (name.clone(), text))),
        );
        let body = normalize_body(object.get("body"))?;
        let params = serde_json::from_value(body)
            .map_err(|error| format!("Malformed request parameters: {error}"))?;
        return Ok((params, context));
    }

    let params = serde_json::from_value(event)
        .map_err(|error| format!("Malformed request parameters: {error}"))?;
    Ok((params, RequestContext::default()))
}

/// Reply for a handled invocation: the bare completion for direct calls, a
/// proxy response for API Gateway.
pub fn encode_completion(
    shape: InvocationShape,
    completion: &Completion,
) -> Result<Value, serde_json::Error> {
    match (shape, completion) {
        (InvocationShape::Direct, _) => serde_json::to_value(completion),
        (InvocationShape::ApiGatewayProxy, Completion::Saved(saved)) => {
            serde_json::to_value(success_response(200, serde_json::to_string(saved)?))
        }
        (InvocationShape::ApiGatewayProxy, Completion::Failed(message)) => {
            serde_json::to_value(error_response(
                502,
                json!({"error": "update_failed", "message": message}),
            ))
        }
    }
}

/// Reply for an event that could not be decoded.
pub fn encode_invalid_invocation(
    shape: InvocationShape,
    message: String,
) -> Result<Value, serde_json::Error> {
    match shape {
        InvocationShape::Direct => serde_json::to_value(Completion::Failed(message)),
        InvocationShape::ApiGatewayProxy => serde_json::to_value(error_response(
            400,
            json!({"error": "validation_error", "message": message}),
        )),
    }
}

fn success_response(status_code: u16, body: String) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"Content-Type": "application/json"}),
        body,
    }
}

fn error_response(status_code: u16, payload: Value) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"Content-Type": "application/json"}),
        body: payload.to_string(),
    }
}

fn normalize_body(body: Option<&Value>) -> Result<Value, String> {
    match body {
        None | Some(Value::Null) => Ok(json!({})),
        Some(Value::Object(_)) => Ok(body.cloned().unwrap_or_default()),
        Some(Value::String(text)) => {
            serde_json::from_str(text).map_err(|error| format!("Malformed JSON body: {error}"))
        }
        _ => Err("Request body must be a JSON object".to_string()),
    }
}
