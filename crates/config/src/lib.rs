//! 统一配置中心
//!
//! 提供应用的全局配置管理，包括：
//! - 服务监听地址和跨域
//! - 数据库连接（可选，未配置时使用内存存储）
//! - 在线状态清理节奏
//! - 聊天收件人策略
//!
//! 加载顺序：默认值 -> `APP_CONFIG_FILE` 指定的文件 -> `APP_` 前缀的环境变量

use std::time::Duration;

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// 服务配置
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    /// 数据库配置
    #[serde(default)]
    #[validate(nested)]
    pub database: DatabaseConfig,
    /// 在线状态配置
    #[serde(default)]
    #[validate(nested)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            cors_origins: vec!["*".into()],
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    #[validate(url)]
    pub url: Option<String>,
    #[validate(range(min = 1))]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PresenceConfig {
    #[validate(range(min = 1))]
    pub sweep_interval_secs: u64,
    #[validate(range(min = 1))]
    pub inactivity_timeout_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 15,
            inactivity_timeout_secs: 10,
        }
    }
}

impl PresenceConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// 私聊或定向消息的收件人必须在线
    pub require_known_recipient: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            require_known_recipient: true,
        }
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

impl AppConfig {
    /// 按优先级合并各来源后校验
    pub fn load() -> Result<Self, ConfigError> {
        let config: AppConfig = Self::figment().extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    fn figment() -> Figment {
        let mut fig = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var("APP_CONFIG_FILE") {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                fig = fig.merge(Yaml::file(path));
            } else if path.ends_with(".json") {
                fig = fig.merge(Json::file(path));
            } else {
                fig = fig.merge(Toml::file(path));
            }
        }
        fig.merge(Env::prefixed("APP_").split("__"))
    }

    /// 用于日志输出，隐藏数据库口令
    pub fn sanitize(&self) -> String {
        let mut sanitized = self.clone();
        if let Some(url) = sanitized.database.url.as_mut() {
            if let Some(scheme_end) = url.find("://") {
                *url = format!("{}://[REDACTED]", &url[..scheme_end]);
            }
        }
        format!("{sanitized:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn load_in_jail() -> Result<AppConfig, figment::Error> {
        AppConfig::load().map_err(|err| figment::Error::from(err.to_string()))
    }

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = load_in_jail()?;
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(config.server.port, 5000);
            assert_eq!(config.server.cors_origins, vec!["*".to_string()]);
            assert!(config.database.url.is_none());
            assert_eq!(config.presence.sweep_interval(), Duration::from_secs(15));
            assert_eq!(config.presence.inactivity_timeout(), Duration::from_secs(10));
            assert!(config.chat.require_known_recipient);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "app.toml",
                r#"
                [server]
                host = "0.0.0.0"
                port = 8080

                [presence]
                sweep_interval_secs = 20
                inactivity_timeout_secs = 12
                "#,
            )?;
            jail.set_env("APP_CONFIG_FILE", "app.toml");
            jail.set_env("APP_SERVER__PORT", "9000");
            jail.set_env("APP_CHAT__REQUIRE_KNOWN_RECIPIENT", "false");

            let config = load_in_jail()?;
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.server.port, 9000);
            assert_eq!(config.presence.sweep_interval_secs, 20);
            assert_eq!(config.presence.inactivity_timeout_secs, 12);
            assert!(!config.chat.require_known_recipient);
            Ok(())
        });
    }

    #[test]
    fn test_yaml_file_with_database() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "app.yaml",
                "database:\n  url: postgres://chat:secret@db:5432/chat\n  max_connections: 8\n",
            )?;
            jail.set_env("APP_CONFIG_FILE", "app.yaml");

            let config = load_in_jail()?;
            assert_eq!(
                config.database.url.as_deref(),
                Some("postgres://chat:secret@db:5432/chat")
            );
            assert_eq!(config.database.max_connections, 8);
            Ok(())
        });
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("APP_PRESENCE__SWEEP_INTERVAL_SECS", "0");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid(_))));
            Ok(())
        });
    }

    #[test]
    fn test_malformed_database_url_is_rejected() {
        let mut config = AppConfig::default();
        config.database.url = Some("not a url".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sanitize_hides_credentials() {
        let mut config = AppConfig::default();
        config.database.url = Some("postgres://chat:secret@db:5432/chat".into());

        let text = config.sanitize();
        assert!(!text.contains("secret"));
        assert!(text.contains("postgres://[REDACTED]"));
    }
}
