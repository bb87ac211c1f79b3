//! Memnotify 核心库
//!
//! 基于 Redis 列表的内存通知收件箱：
//! - 按用户投递与全局广播两类收件箱
//! - 过期 / 一次性消息在读取时惰性淘汰
//! - 可插拔存储后端（Redis 列表存储、Dummy 空实现）

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod tracing;

pub use backend::{BackendKind, DummyBackend, NotifyBackend, RedisBackend, create_backend};
pub use config::{LoggingConfig, MemnotifyConfig, RedisBackendConfig};
pub use dispatcher::Notifier;
pub use error::{NotifyError, Result};
pub use message::{Level, Message};
