//! Memnotify 配置模块
//!
//! 配置从 TOML 文件加载（路径来自 `MEMNOTIFY_CONFIG` 环境变量或显式传入），
//! 所有字段都有文档化的默认值。代码里显式构造的配置结构体优先于外部设置。

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{NotifyError, Result};

/// 指向配置文件的环境变量
pub const CONFIG_ENV_VAR: &str = "MEMNOTIFY_CONFIG";

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemnotifyConfig {
    /// 激活的后端标识（`redis` 或 `dummy`）
    pub backend: String,
    /// Redis 列表存储后端配置
    pub redis: RedisBackendConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

impl Default for MemnotifyConfig {
    fn default() -> Self {
        Self {
            backend: "redis".to_string(),
            redis: RedisBackendConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MemnotifyConfig {
    /// 从 `MEMNOTIFY_CONFIG` 指向的文件加载配置；变量未设置时使用默认值
    pub fn load() -> Result<Self> {
        match env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::load_from_path(Path::new(&path)),
            Err(_) => Ok(Self::default()),
        }
    }

    /// 从指定路径加载 TOML 配置
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            NotifyError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        toml::from_str(&raw).map_err(|e| {
            NotifyError::Config(format!("failed to parse config file {}: {e}", path.display()))
        })
    }
}

/// Redis 列表存储后端配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisBackendConfig {
    /// Redis 服务器地址
    pub host: String,
    /// Redis 端口
    pub port: u16,
    /// 逻辑数据库编号
    pub db: i64,
    /// 认证口令，缺省不认证
    pub password: Option<String>,
    /// 全局广播收件箱的键名，部署方需保证不会与用户 id 冲突
    pub global_key: String,
}

impl Default for RedisBackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            password: None,
            global_key: "GLOBAL_MSG".to_string(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 环境变量优先）
    pub level: String,
    /// 是否显示目标模块
    pub with_target: bool,
    /// 是否显示线程 ID
    pub with_thread_ids: bool,
    /// 是否显示文件名
    pub with_file: bool,
    /// 是否显示行号
    pub with_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: true,
            with_thread_ids: false,
            with_file: false,
            with_line_number: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = MemnotifyConfig::default();
        assert_eq!(config.backend, "redis");
        assert_eq!(config.redis.host, "localhost");
        assert_eq!(config.redis.port, 6379);
        assert_eq!(config.redis.db, 0);
        assert!(config.redis.password.is_none());
        assert_eq!(config.redis.global_key, "GLOBAL_MSG");
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: MemnotifyConfig = toml::from_str(
            r#"
            backend = "dummy"

            [redis]
            host = "redis.internal"
            db = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.backend, "dummy");
        assert_eq!(config.redis.host, "redis.internal");
        assert_eq!(config.redis.db, 3);
        // 未出现的字段保持默认值
        assert_eq!(config.redis.port, 6379);
        assert_eq!(config.redis.global_key, "GLOBAL_MSG");
    }

    #[test]
    fn load_from_missing_path_is_a_config_error() {
        let err = MemnotifyConfig::load_from_path(Path::new("/nonexistent/memnotify.toml"))
            .unwrap_err();
        assert!(matches!(err, NotifyError::Config(_)));
    }
}
