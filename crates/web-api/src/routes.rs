use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use application::services::{
    DeleteMessageRequest, EditMessageRequest, ListMessagesRequest, SendMessageRequest,
};
use application::{MessageCreatedDto, MessageDto, ParticipantDto};
use domain::{MessageId, MessageKind};

use crate::{error::ApiError, extract::Requester, state::AppState};

#[derive(Debug, Deserialize)]
struct JoinPayload {
    name: String,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    to: String,
    text: String,
    #[serde(rename = "type")]
    kind: MessageKind,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<String>,
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/participants", get(list_participants).post(join_chat))
        .route("/messages", get(list_messages).post(send_message))
        .route("/messages/{id}", put(edit_message).delete(delete_message))
        .route("/status", post(heartbeat))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_origins)),
        )
        .with_state(state)
}

/// `*` 表示允许任意来源
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "忽略无效的跨域来源");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<ParticipantDto>>, ApiError> {
    let participants = state.chat_service.list_participants().await?;
    Ok(Json(participants.iter().map(ParticipantDto::from).collect()))
}

async fn join_chat(
    State(state): State<AppState>,
    payload: Result<Json<JoinPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<ParticipantDto>), ApiError> {
    let Json(payload) = payload?;
    let participant = state.chat_service.join_chat(payload.name).await?;
    Ok((StatusCode::CREATED, Json(ParticipantDto::from(&participant))))
}

async fn list_messages(
    State(state): State<AppState>,
    Requester(requester): Requester,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    // 非整数的 limit 视为未提供
    let limit = query.limit.and_then(|raw| raw.trim().parse::<i64>().ok());
    let messages = state
        .chat_service
        .list_messages(ListMessagesRequest { requester, limit })
        .await?;
    Ok(Json(messages.iter().map(MessageDto::from).collect()))
}

async fn send_message(
    State(state): State<AppState>,
    Requester(requester): Requester,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageCreatedDto>), ApiError> {
    let Json(payload) = payload?;
    let id = state
        .chat_service
        .send_message(SendMessageRequest {
            from: requester,
            to: payload.to,
            text: payload.text,
            kind: payload.kind,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(MessageCreatedDto::from(id))))
}

async fn edit_message(
    State(state): State<AppState>,
    Requester(requester): Requester,
    Path(id): Path<String>,
    payload: Result<Json<MessagePayload>, JsonRejection>,
) -> Result<Json<MessageDto>, ApiError> {
    let message_id = id.parse::<MessageId>()?;
    let Json(payload) = payload?;
    let message = state
        .chat_service
        .edit_message(EditMessageRequest {
            requester,
            message_id,
            to: payload.to,
            text: payload.text,
            kind: payload.kind,
        })
        .await?;
    Ok(Json(MessageDto::from(&message)))
}

async fn delete_message(
    State(state): State<AppState>,
    Requester(requester): Requester,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let message_id = id.parse::<MessageId>()?;
    state
        .chat_service
        .delete_message(DeleteMessageRequest {
            requester,
            message_id,
        })
        .await?;
    Ok(StatusCode::OK)
}

async fn heartbeat(
    State(state): State<AppState>,
    Requester(requester): Requester,
) -> Result<StatusCode, ApiError> {
    state
        .chat_service
        .send_heartbeat(&requester)
        .await
        .map_err(ApiError::for_heartbeat)?;
    Ok(StatusCode::CREATED)
}
