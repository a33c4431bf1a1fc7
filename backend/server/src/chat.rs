//! # Chat Proxy
//!
//! Stateless pass-through to the DashScope text-generation API.
//!
//! Each call sends the fixed persona plus the user's message, waits for one
//! complete response and hands back the first choice. There is no retry and no
//! timeout override, a failed upstream call is reported to the caller on first
//! occurrence.
//!
//! ## Reply extraction
//! - `output.choices[0].message.content` when present and non-empty
//! - otherwise `output.choices[0].text` when present and non-empty
//! - otherwise the response is rejected as malformed, partial text is never guessed
use chrono::{SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    config::ChatConfig,
    models::{
        GenerationRequest, GenerationResponse, Input, Message, Parameters, SYSTEM_PERSONA,
    },
};

pub const CHAT_UNAVAILABLE: &str =
    "Sorry, the AI service is temporarily unavailable, please try again later";

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid chat request: {0}")]
    Request(String),

    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API responded with status {0}")]
    Status(StatusCode),

    #[error("Invalid API response format: {0}")]
    Format(String),
}

#[derive(Serialize, Debug)]
pub struct AiReply {
    pub message: String,
    pub timestamp: String,
}

pub struct ChatClient {
    http: Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        let http = Client::builder().build()?;

        Ok(Self { http, config })
    }

    pub async fn converse(&self, message: &str) -> Result<AiReply, ChatError> {
        let payload = build_payload(&self.config.model, message);

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status));
        }

        let body = response.text().await?;
        debug!(%body, "Upstream response");

        let generation: GenerationResponse =
            serde_json::from_str(&body).map_err(|e| ChatError::Format(e.to_string()))?;

        let reply = AiReply {
            message: extract_reply(generation)?,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        info!(chars = reply.message.chars().count(), "Sending AI reply");

        Ok(reply)
    }
}

pub fn build_payload<'a>(model: &'a str, message: &'a str) -> GenerationRequest<'a> {
    GenerationRequest {
        model,
        input: Input {
            messages: [
                Message {
                    role: "system",
                    content: SYSTEM_PERSONA,
                },
                Message {
                    role: "user",
                    content: message,
                },
            ],
        },
        parameters: Parameters::default(),
    }
}

pub fn extract_reply(response: GenerationResponse) -> Result<String, ChatError> {
    let choice = response
        .output
        .and_then(|output| output.choices.into_iter().next())
        .ok_or_else(|| ChatError::Format("missing output choices".to_string()))?;

    choice
        .message
        .and_then(|message| message.content)
        .filter(|content| !content.is_empty())
        .or(choice.text.filter(|text| !text.is_empty()))
        .ok_or_else(|| ChatError::Format("missing reply content".to_string()))
}
