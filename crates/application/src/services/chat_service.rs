use std::collections::VecDeque;
use std::sync::Arc;

use domain::{
    DomainError, Message, MessageEdit, MessageId, MessageKind, MessageText, NewMessage,
    Participant, ParticipantName, Recipient, RepositoryError,
};
use futures::TryStreamExt;

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{MessageRepository, ParticipantRepository},
};

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

#[derive(Debug, Clone)]
pub struct EditMessageRequest {
    pub requester: String,
    pub message_id: MessageId,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

#[derive(Debug, Clone)]
pub struct DeleteMessageRequest {
    pub requester: String,
    pub message_id: MessageId,
}

#[derive(Debug, Clone)]
pub struct ListMessagesRequest {
    pub requester: String,
    /// 只有正整数生效，其余情况返回全部可见消息
    pub limit: Option<i64>,
}

/// 行为开关
#[derive(Debug, Clone)]
pub struct ChatPolicy {
    /// 非广播的 `to` 必须是当前在线的参与者
    pub require_known_recipient: bool,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            require_known_recipient: true,
        }
    }
}

pub struct ChatServiceDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
    pub policy: ChatPolicy,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    /// 身份检查：名字必须对应当前在线的参与者，否则返回 `unknown(raw)`
    async fn require_participant(
        &self,
        raw: &str,
        unknown: fn(String) -> DomainError,
    ) -> Result<ParticipantName, ApplicationError> {
        let name = ParticipantName::parse(raw).map_err(|_| unknown(raw.to_owned()))?;
        if !self.deps.participant_repository.exists(&name).await? {
            return Err(unknown(name.to_string()).into());
        }
        Ok(name)
    }

    async fn check_recipient(&self, to: &Recipient) -> Result<(), ApplicationError> {
        if !self.deps.policy.require_known_recipient {
            return Ok(());
        }
        let Some(name) = to.participant() else {
            return Ok(());
        };
        if !self.deps.participant_repository.exists(&name).await? {
            return Err(DomainError::invalid_payload(
                "to",
                format!("{name} is not in the room"),
            )
            .into());
        }
        Ok(())
    }

    fn message_content(
        to: String,
        text: String,
        kind: MessageKind,
    ) -> Result<MessageEdit, ApplicationError> {
        let to = Recipient::parse(to)?;
        let text = MessageText::new(text)?;
        Ok(MessageEdit::new(to, text, kind)?)
    }

    pub async fn list_participants(&self) -> Result<Vec<Participant>, ApplicationError> {
        Ok(self.deps.participant_repository.list().await?)
    }

    pub async fn join_chat(&self, name: String) -> Result<Participant, ApplicationError> {
        let name = ParticipantName::parse(name)?;
        let now = self.deps.clock.now();

        let participant = match self
            .deps
            .participant_repository
            .register(Participant::register(name.clone(), now))
            .await
        {
            Ok(participant) => participant,
            Err(RepositoryError::Conflict) => {
                return Err(DomainError::duplicate_name(name.as_str()).into())
            }
            Err(err) => return Err(err.into()),
        };

        // 没有进入消息的参与者不能留在表里，否则重试会变成重名
        if let Err(err) = self
            .deps
            .message_repository
            .append(NewMessage::joined(name.clone(), now))
            .await
        {
            tracing::warn!(participant = %name, error = %err, "写入进入消息失败，撤销注册");
            if let Err(rollback) = self.deps.participant_repository.remove(&name).await {
                tracing::error!(participant = %name, error = %rollback, "撤销注册失败");
            }
            return Err(err.into());
        }

        tracing::info!(participant = %name, "参与者进入聊天室");
        Ok(participant)
    }

    pub async fn send_heartbeat(&self, name: &str) -> Result<(), ApplicationError> {
        let participant =
            ParticipantName::parse(name).map_err(|_| DomainError::unknown_participant(name))?;

        match self
            .deps
            .participant_repository
            .heartbeat(&participant, self.deps.clock.now())
            .await
        {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => {
                Err(DomainError::unknown_participant(participant.as_str()).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// 返回查询者可见的消息，按插入顺序；`limit` 为正数时只保留最近的 N 条
    pub async fn list_messages(
        &self,
        request: ListMessagesRequest,
    ) -> Result<Vec<Message>, ApplicationError> {
        let requester = self
            .require_participant(&request.requester, DomainError::unknown_participant)
            .await?;
        let limit = request
            .limit
            .filter(|limit| *limit > 0)
            .and_then(|limit| usize::try_from(limit).ok());

        let mut stream = self.deps.message_repository.visible_to(&requester);
        let mut window = VecDeque::new();
        while let Some(message) = stream.try_next().await? {
            if limit.is_some_and(|limit| window.len() == limit) {
                window.pop_front();
            }
            window.push_back(message);
        }

        Ok(window.into())
    }

    pub async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<MessageId, ApplicationError> {
        let content = Self::message_content(request.to, request.text, request.kind)?;
        let from = self
            .require_participant(&request.from, DomainError::unknown_sender)
            .await?;
        self.check_recipient(&content.to).await?;

        let message = NewMessage::authored(from, content, self.deps.clock.now());
        let message_id = self.deps.message_repository.append(message).await?;

        tracing::debug!(message_id = %message_id, "消息已保存");
        Ok(message_id)
    }

    pub async fn edit_message(
        &self,
        request: EditMessageRequest,
    ) -> Result<Message, ApplicationError> {
        let content = Self::message_content(request.to, request.text, request.kind)?;
        let requester = self
            .require_participant(&request.requester, DomainError::unknown_sender)
            .await?;
        self.check_recipient(&content.to).await?;

        let updated = self
            .deps
            .message_repository
            .update(request.message_id, content, requester.as_str())
            .await?;

        tracing::debug!(message_id = %updated.id, requester = %requester, "消息已修改");
        Ok(updated)
    }

    pub async fn delete_message(&self, request: DeleteMessageRequest) -> Result<(), ApplicationError> {
        self.deps
            .message_repository
            .delete(request.message_id, request.requester.trim())
            .await?;

        tracing::debug!(message_id = %request.message_id, "消息已删除");
        Ok(())
    }
}
