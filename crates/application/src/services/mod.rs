mod chat_service;


pub use chat_service::{
    ChatPolicy, ChatService, ChatServiceDependencies, DeleteMessageRequest, EditMessageRequest,
    ListMessagesRequest, SendMessageRequest,
};
