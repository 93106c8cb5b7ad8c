//! 在线状态清理
//!
//! 定时扫描参与者表，把超过不活跃阈值的参与者移出聊天室，
//! 并写入一条“离开”状态消息。

use std::sync::Arc;
use std::time::Duration;

use domain::{NewMessage, Participant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::repository::{MessageRepository, ParticipantRepository};

/// 清理器配置，默认扫描间隔 15 秒、不活跃阈值 10 秒
#[derive(Debug, Clone)]
pub struct PresenceSettings {
    pub sweep_interval: Duration,
    pub inactivity_timeout: Duration,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(15),
            inactivity_timeout: Duration::from_secs(10),
        }
    }
}

/// 单次扫描结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub expired: Vec<String>,
    pub failures: usize,
}

pub struct PresenceSweeper {
    participants: Arc<dyn ParticipantRepository>,
    messages: Arc<dyn MessageRepository>,
    clock: Arc<dyn Clock>,
    settings: PresenceSettings,
}

impl PresenceSweeper {
    pub fn new(
        participants: Arc<dyn ParticipantRepository>,
        messages: Arc<dyn MessageRepository>,
        clock: Arc<dyn Clock>,
        settings: PresenceSettings,
    ) -> Self {
        Self {
            participants,
            messages,
            clock,
            settings,
        }
    }

    fn timeout(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.settings.inactivity_timeout)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// 扫描一次。单个参与者处理失败只记录日志，不影响其他参与者。
    pub async fn sweep_once(&self) -> Result<SweepReport, ApplicationError> {
        let snapshot = self.participants.list().await?;
        let now = self.clock.now();
        let timeout = self.timeout();

        let mut report = SweepReport {
            scanned: snapshot.len(),
            ..SweepReport::default()
        };
        // 阈值大到无法表示时，没有人会过期
        let Some(cutoff) = now.checked_sub_signed(timeout) else {
            return Ok(report);
        };

        for participant in snapshot
            .iter()
            .filter(|participant| participant.is_inactive(now, timeout))
        {
            match self.expire(participant, cutoff).await {
                Ok(true) => {
                    tracing::info!(participant = %participant.name, "参与者超时，已移出聊天室");
                    report.expired.push(participant.name.to_string());
                }
                // 快照之后收到了心跳
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(
                        participant = %participant.name,
                        error = %err,
                        "清理超时参与者失败"
                    );
                    report.failures += 1;
                }
            }
        }

        tracing::debug!(
            scanned = report.scanned,
            expired = report.expired.len(),
            failures = report.failures,
            "在线状态扫描完成"
        );
        Ok(report)
    }

    async fn expire(
        &self,
        participant: &Participant,
        cutoff: domain::Timestamp,
    ) -> Result<bool, ApplicationError> {
        let removed = self
            .participants
            .remove_inactive(&participant.name, cutoff)
            .await?;
        if removed {
            self.messages
                .append(NewMessage::left(participant.name.clone(), self.clock.now()))
                .await?;
        }
        Ok(removed)
    }

    /// 在后台按固定间隔扫描，直到返回的句柄被关闭
    pub fn spawn(self) -> SweeperHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = self.settings.sweep_interval;

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(err) = self.sweep_once().await {
                            tracing::error!(error = %err, "读取参与者列表失败，等待下一次扫描");
                        }
                    }
                }
            }

            tracing::info!("在线状态清理器已停止");
        });

        tracing::info!(
            interval_secs = period.as_secs(),
            "在线状态清理器已启动"
        );
        SweeperHandle { token, task }
    }
}

/// 后台清理任务的停止句柄
pub struct SweeperHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(err) = self.task.await {
            tracing::error!(error = %err, "在线状态清理任务异常退出");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
