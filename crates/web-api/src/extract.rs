use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

/// 请求者身份所在的请求头
pub const REQUESTER_HEADER: &str = "User";

/// 从 `User` 请求头读取的请求者名字。
///
/// 缺失或无法解码时为空字符串，由服务层按未知参与者处理。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester(pub String);

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let name = parts
            .headers
            .get(REQUESTER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_string())
            .unwrap_or_default();
        Ok(Requester(name))
    }
}
