use std::sync::Arc;

use super::{
    chat::ChatClient,
    config::Config,
    database::FeedbackStore,
    error::AppError,
    feedback::FeedbackService,
};

pub struct AppState {
    pub config: Config,
    pub feedback: FeedbackService,
    pub chat: ChatClient,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>, AppError> {
        let store = FeedbackStore::open(&config.database_path)
            .await
            .map_err(AppError::storage("Failed to open database"))?;

        let chat = ChatClient::new(config.chat.clone())?;

        Ok(Arc::new(Self {
            config,
            feedback: FeedbackService::new(store),
            chat,
        }))
    }
}
