use lambda_runtime::{service_fn, Error, LambdaEvent};
use reqwest::Client;
use score_update_lambda::adapters::kii_http::{build_http_client, KiiHttpBackend};
use score_update_lambda::config::RuntimeConfig;
use score_update_lambda::handlers::invocation::{
    decode_invocation, encode_completion, encode_invalid_invocation, invocation_shape,
};
use score_update_lambda::handlers::update_score::handle_update_score;
use score_update_lambda::logging::init_logging;
use serde_json::Value;

async fn handle_request(
    event: LambdaEvent<Value>,
    config: &RuntimeConfig,
    client: Client,
) -> Result<Value, Error> {
    let shape = invocation_shape(&event.payload);
    let reply = match decode_invocation(event.payload) {
        Ok((params, context)) => {
            let mut backend = KiiHttpBackend::with_client(client);
            let completion =
                handle_update_score(params, &context, &config.endpoint, &mut backend).await;
            encode_completion(shape, &completion)
        }
        Err(message) => {
            tracing::error!(
                component = "update_score_lambda",
                event = "invalid_invocation",
                request_id = %event.context.request_id,
                message = %message,
            );
            encode_invalid_invocation(shape, message)
        }
    };

    reply.map_err(|error| Error::from(format!("failed to serialize reply: {error}")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();
    let config = RuntimeConfig::from_env().map_err(|error| Error::from(error.to_string()))?;
    let client =
        build_http_client(config.request_timeout).map_err(|error| Error::from(error.to_string()))?;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let config = config.clone();
        let client = client.clone();
        async move { handle_request(event, &config, client).await }
    }))
    .await
}
