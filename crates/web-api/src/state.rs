use std::sync::Arc;

use application::ChatService;

#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat_service: Arc<ChatService>) -> Self {
        Self { chat_service }
    }
}
