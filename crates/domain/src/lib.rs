//! 在线聊天室核心领域模型
//!
//! 包含参与者、消息等核心实体，以及名字唯一性、消息可见性等业务规则。

pub mod errors;
pub mod message;
pub mod participant;
pub mod value_objects;

// 重新导出常用类型
pub use errors::*;
pub use message::*;
pub use participant::*;
pub use value_objects::*;
