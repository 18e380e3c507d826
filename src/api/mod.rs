pub mod a2a;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::orchestrator::RouteResolver;

use a2a::{JsonRpcRequest, JsonRpcResponse};

const SERVICE_NAME: &str = "MapRoute AI Agent";

/// Plain webhook body as sent by the messaging platform
#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    pub message: String,
    pub user_id: Option<String>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WebhookPayload {
    JsonRpc(JsonRpcRequest),
    Plain(WebhookMessage),
}

pub fn router(resolver: RouteResolver) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .with_state(resolver)
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": crate::VERSION,
        "status": "running",
        "endpoints": {
            "webhook": "/webhook",
            "health": "/health"
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": crate::VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn webhook(
    State(resolver): State<RouteResolver>,
    Json(payload): Json<WebhookPayload>,
) -> Response {
    match payload {
        WebhookPayload::Plain(message) => plain_message(&resolver, message).await,
        WebhookPayload::JsonRpc(request) => Json(json_rpc(&resolver, request).await).into_response(),
    }
}

#[instrument(skip_all, fields(user_id = ?message.user_id, channel_id = ?message.channel_id))]
async fn plain_message(resolver: &RouteResolver, message: WebhookMessage) -> Response {
    let text = message.message.trim();
    if text.is_empty() {
        warn!("Rejected webhook with empty message");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_request",
                "message": "Message cannot be empty"
            })),
        )
            .into_response();
    }

    info!("Received webhook message ({} chars)", text.len());
    Json(resolver.reply(text).await).into_response()
}

#[instrument(skip_all, fields(method = %request.method))]
async fn json_rpc(resolver: &RouteResolver, request: JsonRpcRequest) -> JsonRpcResponse {
    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::error(request.id, a2a::INVALID_REQUEST, "Invalid Request");
    }
    if request.method != a2a::SEND_MESSAGE {
        warn!("Unsupported JSON-RPC method {}", request.method);
        return JsonRpcResponse::error(request.id, a2a::METHOD_NOT_FOUND, "Method not found");
    }

    let text = match request.message_text() {
        Some(text) if !text.is_empty() => text,
        _ => {
            return JsonRpcResponse::error(
                request.id,
                a2a::INVALID_PARAMS,
                "Invalid params: message has no text",
            );
        }
    };

    info!("Received A2A message ({} chars)", text.len());
    let reply = resolver.reply(&text).await;
    JsonRpcResponse::result(request.id, reply)
}
