//! 主应用程序入口
//!
//! 加载配置，选择存储，启动在线状态清理器和 Axum Web API 服务。

use std::sync::Arc;

use application::{
    ChatPolicy, ChatService, ChatServiceDependencies, Clock, MemoryMessageRepository,
    MemoryParticipantRepository, MessageRepository, ParticipantRepository, PresenceSettings,
    PresenceSweeper, SystemClock,
};
use config::AppConfig;
use infrastructure::{Infrastructure, InfrastructureConfig};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

struct Stores {
    participants: Arc<dyn ParticipantRepository>,
    messages: Arc<dyn MessageRepository>,
}

async fn build_stores(config: &AppConfig) -> anyhow::Result<Stores> {
    match &config.database.url {
        Some(database_url) => {
            let infrastructure = Infrastructure::connect(InfrastructureConfig {
                database_url: database_url.clone(),
                max_connections: config.database.max_connections,
            })
            .await?;
            tracing::info!("使用 PostgreSQL 存储");
            Ok(Stores {
                participants: infrastructure.participants,
                messages: infrastructure.messages,
            })
        }
        None => {
            tracing::warn!("未配置数据库，使用内存存储，重启后数据丢失");
            Ok(Stores {
                participants: Arc::new(MemoryParticipantRepository::new()),
                messages: Arc::new(MemoryMessageRepository::new()),
            })
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "无法监听退出信号");
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，开始关闭");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    tracing::info!(config = %config.sanitize(), "配置已加载");

    let stores = build_stores(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let chat_service = ChatService::new(ChatServiceDependencies {
        participant_repository: stores.participants.clone(),
        message_repository: stores.messages.clone(),
        clock: clock.clone(),
        policy: ChatPolicy {
            require_known_recipient: config.chat.require_known_recipient,
        },
    });

    let sweeper = PresenceSweeper::new(
        stores.participants,
        stores.messages,
        clock,
        PresenceSettings {
            sweep_interval: config.presence.sweep_interval(),
            inactivity_timeout: config.presence.inactivity_timeout(),
        },
    )
    .spawn();

    // 启动 Web 服务器
    let app = router(
        AppState::new(Arc::new(chat_service)),
        &config.server.cors_origins,
    );
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("聊天室服务器启动在 http://{}", addr);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.shutdown().await;
    served?;
    Ok(())
}
