use std::sync::Arc;

use thiserror::Error;

use crate::{
    migrations::MIGRATOR,
    repository::{create_pg_pool, PgMessageRepository, PgParticipantRepository},
};

#[derive(Debug, Clone)]
pub struct InfrastructureConfig {
    pub database_url: String,
    pub max_connections: u32,
}

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[derive(Clone)]
pub struct Infrastructure {
    pub participants: Arc<PgParticipantRepository>,
    pub messages: Arc<PgMessageRepository>,
}

impl Infrastructure {
    /// 建立连接池并执行迁移
    pub async fn connect(config: InfrastructureConfig) -> Result<Self, InfrastructureError> {
        let pool = create_pg_pool(&config.database_url, config.max_connections).await?;
        MIGRATOR.run(&pool).await?;
        tracing::info!(max_connections = config.max_connections, "数据库迁移完成");

        Ok(Self {
            participants: Arc::new(PgParticipantRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool)),
        })
    }
}
