//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求委托给应用层的聊天服务。
//! 请求者身份来自 `User` 请求头。

mod error;
mod extract;
mod routes;
mod state;

pub use error::{ApiError, ErrorBody};
pub use extract::{Requester, REQUESTER_HEADER};
pub use routes::{cors_layer, router};
pub use state::AppState;
