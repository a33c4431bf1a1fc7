//! # Message Board
//!
//! Visitors leave a name, an email and a message. Everything is listed newest first and any entry can be removed by
//! id. There is no editing.
//!
//! The only check is presence: `name`, `email` and `message` must each be a non-empty value. Numbers and `true` are
//! kept as their text, while `""`, `0`, `false`, `null`, arrays and objects count as missing. The client IP is taken
//! from the request, never from the body.
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::{
    database::{FeedbackRecord, FeedbackStore},
    error::AppError,
    utils::validate_submission,
};

pub const SUBMIT_FAILED: &str = "Failed to submit feedback";
pub const LIST_FAILED: &str = "Failed to load feedback";
pub const DELETE_FAILED: &str = "Failed to delete feedback";

#[derive(Deserialize, Debug, Default)]
pub struct FeedbackSubmission {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub message: Option<Value>,
}

pub struct FeedbackService {
    store: FeedbackStore,
}

impl FeedbackService {
    pub fn new(store: FeedbackStore) -> Self {
        Self { store }
    }

    pub async fn submit(
        &self,
        submission: FeedbackSubmission,
        client_ip: String,
    ) -> Result<(), AppError> {
        let entry = validate_submission(submission, client_ip)?;

        let id = self
            .store
            .insert(&entry)
            .await
            .map_err(AppError::storage(SUBMIT_FAILED))?;

        info!(id, client_ip = %entry.client_ip, "Feedback saved");

        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<FeedbackRecord>, AppError> {
        let records = self
            .store
            .list_all()
            .await
            .map_err(AppError::storage(LIST_FAILED))?;

        info!(count = records.len(), "Loaded feedback");

        Ok(records)
    }

    pub async fn remove(&self, id: i64) -> Result<(), AppError> {
        self.store
            .delete_by_id(id)
            .await
            .map_err(AppError::storage(DELETE_FAILED))?;

        info!(id, "Feedback deleted");

        Ok(())
    }

    pub async fn close(&self) {
        self.store.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.store.is_closed()
    }
}
