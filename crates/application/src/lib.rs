//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理请求校验、身份检查，
//! 以及对外部适配器（参与者表、消息表、时钟）的抽象。

pub mod clock;
pub mod dto;
pub mod error;
pub mod memory;
pub mod presence;
pub mod repository;
pub mod services;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dto::{MessageCreatedDto, MessageDto, ParticipantDto};
pub use error::ApplicationError;
pub use memory::{MemoryMessageRepository, MemoryParticipantRepository};
pub use presence::{PresenceSettings, PresenceSweeper, SweepReport, SweeperHandle};
pub use repository::{MessageRepository, MessageStream, ParticipantRepository};
pub use services::{ChatPolicy, ChatService, ChatServiceDependencies};
