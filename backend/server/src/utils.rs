use std::net::SocketAddr;

use axum::http::HeaderMap;
use serde_json::Value;

use crate::{
    database::NewFeedback,
    error::AppError::{self, MissingFields},
    feedback::FeedbackSubmission,
};

const FORWARDED_FOR: &str = "x-forwarded-for";
const MAPPED_PREFIX: &str = "::ffff:";

/// Best-effort originating address, never validated as a well-formed IP.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    let ip = forwarded_for(headers).unwrap_or_else(|| peer.ip().to_string());

    ip.strip_prefix(MAPPED_PREFIX).unwrap_or(&ip).to_string()
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(FORWARDED_FOR)?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();

    (!first.is_empty()).then(|| first.to_string())
}

pub fn validate_submission(
    submission: FeedbackSubmission,
    client_ip: String,
) -> Result<NewFeedback, AppError> {
    let (Some(name), Some(email), Some(message)) = (
        present(submission.name),
        present(submission.email),
        present(submission.message),
    ) else {
        return Err(MissingFields);
    };

    Ok(NewFeedback {
        name,
        email,
        message,
        client_ip,
    })
}

fn present(field: Option<Value>) -> Option<String> {
    match field? {
        Value::String(text) => (!text.is_empty()).then_some(text),
        Value::Number(number) => (number.as_f64() != Some(0.0)).then(|| number.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
