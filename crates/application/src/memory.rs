//! 内存实现的参与者表和消息表
//!
//! 没有配置数据库时使用，也用于测试。每个写操作在一把写锁内完成，
//! 所以“检查再写入”不会与其他写操作交错。

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use domain::{
    Message, MessageEdit, MessageId, NewMessage, Participant, ParticipantName, RepositoryError,
    Timestamp,
};
use futures::stream::{self, StreamExt};
use tokio::sync::RwLock;

use crate::repository::{MessageRepository, MessageStream, ParticipantRepository};

#[derive(Default)]
pub struct MemoryParticipantRepository {
    participants: RwLock<HashMap<ParticipantName, Participant>>,
}

impl MemoryParticipantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipantRepository for MemoryParticipantRepository {
    async fn register(&self, participant: Participant) -> Result<Participant, RepositoryError> {
        let mut participants = self.participants.write().await;
        match participants.entry(participant.name.clone()) {
            Entry::Occupied(_) => Err(RepositoryError::Conflict),
            Entry::Vacant(slot) => Ok(slot.insert(participant).clone()),
        }
    }

    async fn exists(&self, name: &ParticipantName) -> Result<bool, RepositoryError> {
        Ok(self.participants.read().await.contains_key(name))
    }

    async fn heartbeat(
        &self,
        name: &ParticipantName,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut participants = self.participants.write().await;
        let participant = participants.get_mut(name).ok_or(RepositoryError::NotFound)?;
        participant.touch(at);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Participant>, RepositoryError> {
        Ok(self.participants.read().await.values().cloned().collect())
    }

    async fn remove(&self, name: &ParticipantName) -> Result<(), RepositoryError> {
        self.participants.write().await.remove(name);
        Ok(())
    }

    async fn remove_inactive(
        &self,
        name: &ParticipantName,
        cutoff: Timestamp,
    ) -> Result<bool, RepositoryError> {
        let mut participants = self.participants.write().await;
        let idle = participants
            .get(name)
            .map(|participant| participant.last_seen < cutoff)
            .unwrap_or(false);
        if idle {
            participants.remove(name);
        }
        Ok(idle)
    }
}

#[derive(Default)]
pub struct MemoryMessageRepository {
    // 插入顺序即展示顺序
    messages: RwLock<Vec<Message>>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn append(&self, message: NewMessage) -> Result<MessageId, RepositoryError> {
        let mut messages = self.messages.write().await;
        let id = MessageId::generate();
        messages.push(Message::stored(id, message));
        Ok(id)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let messages = self.messages.read().await;
        Ok(messages.iter().find(|message| message.id == id).cloned())
    }

    fn visible_to<'a>(&'a self, name: &'a ParticipantName) -> MessageStream<'a> {
        stream::once(async move {
            let messages = self.messages.read().await;
            messages
                .iter()
                .filter(|message| message.is_visible_to(name))
                .cloned()
                .map(Ok)
                .collect::<Vec<_>>()
        })
        .flat_map(stream::iter)
        .boxed()
    }

    async fn update(
        &self,
        id: MessageId,
        edit: MessageEdit,
        requester: &str,
    ) -> Result<Message, RepositoryError> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|message| message.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if !message.is_owned_by(requester) {
            return Err(RepositoryError::Forbidden);
        }
        message.apply(edit);
        Ok(message.clone())
    }

    async fn delete(&self, id: MessageId, requester: &str) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        let position = messages
            .iter()
            .position(|message| message.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if !messages[position].is_owned_by(requester) {
            return Err(RepositoryError::Forbidden);
        }
        messages.remove(position);
        Ok(())
    }
}
