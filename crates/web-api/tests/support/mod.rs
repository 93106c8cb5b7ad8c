use std::{net::SocketAddr, sync::Arc};

use application::{
    ChatPolicy, ChatService, ChatServiceDependencies, ManualClock, MemoryMessageRepository,
    MemoryParticipantRepository, PresenceSettings, PresenceSweeper,
};
use chrono::{TimeZone, Utc};
use tokio::{net::TcpListener, sync::oneshot};
use web_api::{router, AppState};

/// 跑在随机端口上的测试服务，存储和时钟都可由测试直接操作
pub struct TestServer {
    pub base: String,
    pub clock: Arc<ManualClock>,
    pub sweeper: PresenceSweeper,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub async fn spawn_server() -> TestServer {
    let participants = Arc::new(MemoryParticipantRepository::new());
    let messages = Arc::new(MemoryMessageRepository::new());
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap(),
    ));

    let chat_service = ChatService::new(ChatServiceDependencies {
        participant_repository: participants.clone(),
        message_repository: messages.clone(),
        clock: clock.clone(),
        policy: ChatPolicy::default(),
    });
    let sweeper = PresenceSweeper::new(
        participants,
        messages,
        clock.clone(),
        PresenceSettings::default(),
    );

    let app = router(AppState::new(Arc::new(chat_service)), &["*".to_string()]);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr: SocketAddr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    TestServer {
        base: format!("http://{addr}"),
        clock,
        sweeper,
        shutdown: Some(shutdown_tx),
    }
}
