use application::{MessageRepository, MessageStream, ParticipantRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Message, MessageEdit, MessageId, MessageKind, MessageText, NewMessage, Participant,
    ParticipantName, Recipient, RepositoryError, Timestamp,
};
use futures::{future, StreamExt, TryStreamExt};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct ParticipantRecord {
    name: String,
    last_seen: DateTime<Utc>,
}

impl TryFrom<ParticipantRecord> for Participant {
    type Error = RepositoryError;

    fn try_from(value: ParticipantRecord) -> Result<Self, Self::Error> {
        let name = ParticipantName::parse(value.name).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Participant {
            name,
            last_seen: value.last_seen,
        })
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    from_name: String,
    to_name: String,
    text: String,
    message_type: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let from =
            ParticipantName::parse(value.from_name).map_err(|err| invalid_data(err.to_string()))?;
        let to = Recipient::parse(value.to_name).map_err(|err| invalid_data(err.to_string()))?;
        let text = MessageText::new(value.text).map_err(|err| invalid_data(err.to_string()))?;
        let kind = value
            .message_type
            .parse::<MessageKind>()
            .map_err(|err| invalid_data(err.to_string()))?;

        Ok(Message {
            id: MessageId::from(value.id),
            from,
            to,
            text,
            kind,
            time: value.created_at,
        })
    }
}

const MESSAGE_COLUMNS: &str = "id, from_name, to_name, text, message_type, created_at";

#[derive(Clone)]
pub struct PgParticipantRepository {
    pool: PgPool,
}

impl PgParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for PgParticipantRepository {
    async fn register(&self, participant: Participant) -> Result<Participant, RepositoryError> {
        // 唯一性由主键保证，插入和检查是同一条语句
        let result = sqlx::query(
            r#"
            INSERT INTO participants (name, last_seen)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(participant.name.as_str())
        .bind(participant.last_seen)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict);
        }
        Ok(participant)
    }

    async fn exists(&self, name: &ParticipantName) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM participants WHERE name = $1)")
            .bind(name.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)
    }

    async fn heartbeat(
        &self,
        name: &ParticipantName,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE participants SET last_seen = $2 WHERE name = $1")
            .bind(name.as_str())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Participant>, RepositoryError> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT name, last_seen FROM participants ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Participant::try_from).collect()
    }

    async fn remove(&self, name: &ParticipantName) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM participants WHERE name = $1")
            .bind(name.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn remove_inactive(
        &self,
        name: &ParticipantName,
        cutoff: Timestamp,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM participants WHERE name = $1 AND last_seen < $2")
            .bind(name.as_str())
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 条件写失败后区分“不存在”和“不是作者”
    async fn missing_or_forbidden(&self, id: MessageId) -> RepositoryError {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM messages WHERE id = $1)",
        )
        .bind(Uuid::from(id))
        .fetch_one(&self.pool)
        .await;

        match exists {
            Ok(true) => RepositoryError::Forbidden,
            Ok(false) => RepositoryError::NotFound,
            Err(err) => map_sqlx_err(err),
        }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn append(&self, message: NewMessage) -> Result<MessageId, RepositoryError> {
        let id = MessageId::generate();
        sqlx::query(
            r#"
            INSERT INTO messages (id, from_name, to_name, text, message_type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::from(id))
        .bind(message.from.as_str())
        .bind(message.to.as_str())
        .bind(message.text.as_str())
        .bind(message.kind.as_str())
        .bind(message.time)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(id)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Message::try_from).transpose()
    }

    fn visible_to<'a>(&'a self, name: &'a ParticipantName) -> MessageStream<'a> {
        sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, from_name, to_name, text, message_type, created_at
            FROM messages
            WHERE message_type <> 'private_message' OR from_name = $1 OR to_name = $1
            ORDER BY seq
            "#,
        )
        .bind(name.as_str())
        .fetch(&self.pool)
        .map_err(map_sqlx_err)
        .and_then(|record| future::ready(Message::try_from(record)))
        .boxed()
    }

    async fn update(
        &self,
        id: MessageId,
        edit: MessageEdit,
        requester: &str,
    ) -> Result<Message, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            UPDATE messages
            SET to_name = $3, text = $4, message_type = $5
            WHERE id = $1 AND from_name = $2
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(Uuid::from(id))
        .bind(requester)
        .bind(edit.to.as_str())
        .bind(edit.text.as_str())
        .bind(edit.kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        match record {
            Some(record) => Message::try_from(record),
            None => Err(self.missing_or_forbidden(id).await),
        }
    }

    async fn delete(&self, id: MessageId, requester: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND from_name = $2")
            .bind(Uuid::from(id))
            .bind(requester)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_forbidden(id).await);
        }
        Ok(())
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
