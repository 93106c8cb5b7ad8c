use async_trait::async_trait;
use domain::{
    Message, MessageEdit, MessageId, NewMessage, Participant, ParticipantName, RepositoryError,
    Timestamp,
};
use futures::stream::BoxStream;

/// 按插入顺序（从旧到新）返回消息的流，可重复获取。
pub type MessageStream<'a> = BoxStream<'a, Result<Message, RepositoryError>>;

/// 在线参与者表
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    // 检查名字和插入是同一个原子步骤，名字已存在返回 Conflict
    async fn register(&self, participant: Participant) -> Result<Participant, RepositoryError>;

    async fn exists(&self, name: &ParticipantName) -> Result<bool, RepositoryError>;

    // 刷新 last_seen，参与者不存在返回 NotFound，不会创建
    async fn heartbeat(&self, name: &ParticipantName, at: Timestamp)
        -> Result<(), RepositoryError>;

    async fn list(&self) -> Result<Vec<Participant>, RepositoryError>;

    // 幂等删除
    async fn remove(&self, name: &ParticipantName) -> Result<(), RepositoryError>;

    // 仅当 last_seen 早于 cutoff 时删除，返回是否真的删除了
    async fn remove_inactive(
        &self,
        name: &ParticipantName,
        cutoff: Timestamp,
    ) -> Result<bool, RepositoryError>;
}

/// 只追加的消息表
#[async_trait]
pub trait MessageRepository: Send + Sync {
    // 分配全局唯一的 id 并保存
    async fn append(&self, message: NewMessage) -> Result<MessageId, RepositoryError>;

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;

    // 公开消息、状态消息，以及 name 发出或收到的私聊
    fn visible_to<'a>(&'a self, name: &'a ParticipantName) -> MessageStream<'a>;

    // 只能替换 to / text / type，requester 必须是作者
    async fn update(
        &self,
        id: MessageId,
        edit: MessageEdit,
        requester: &str,
    ) -> Result<Message, RepositoryError>;

    async fn delete(&self, id: MessageId, requester: &str) -> Result<(), RepositoryError>;
}
