use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json,
    extract::{ConnectInfo, Path, State, rejection::JsonRejection},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    chat::{AiReply, ChatError},
    database::FeedbackRecord,
    error::AppError::{self, MalformedPayload},
    feedback::FeedbackSubmission,
    state::AppState,
    utils::client_ip,
};

pub const SUBMITTED: &str = "Feedback submitted";
pub const DELETED: &str = "Feedback deleted";

#[derive(Deserialize)]
pub struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
pub struct Acknowledgement {
    pub success: bool,
    pub message: &'static str,
}

impl Acknowledgement {
    fn new(message: &'static str) -> Json<Self> {
        Json(Self {
            success: true,
            message,
        })
    }
}

#[derive(Serialize)]
pub struct Payload<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Payload<T> {
    fn new(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(inner)| inner).map_err(|rejection| {
        warn!("Rejected request body: {rejection}");
        MalformedPayload
    })
}

pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Payload<AiReply>>, AppError> {
    // Chat only ever answers 200 or 500, an unusable body is a failed chat.
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected chat body: {rejection}");
        ChatError::Request(rejection.body_text())
    })?;
    info!(message = %request.message, "Received chat request");

    let reply = state.chat.converse(&request.message).await?;

    Ok(Payload::new(reply))
}

pub async fn submit_feedback_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<FeedbackSubmission>, JsonRejection>,
) -> Result<Json<Acknowledgement>, AppError> {
    let submission = body(payload)?;
    info!(?submission, "Received feedback");

    state
        .feedback
        .submit(submission, client_ip(&headers, peer))
        .await?;

    Ok(Acknowledgement::new(SUBMITTED))
}

pub async fn list_feedback_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Payload<Vec<FeedbackRecord>>>, AppError> {
    let records = state.feedback.list().await?;

    Ok(Payload::new(records))
}

pub async fn delete_feedback_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Acknowledgement>, AppError> {
    // Ids are integers, anything else cannot match a row.
    match id.parse::<i64>() {
        Ok(id) => state.feedback.remove(id).await?,
        Err(_) => debug!(%id, "Non-numeric feedback id, nothing to delete"),
    }

    Ok(Acknowledgement::new(DELETED))
}
