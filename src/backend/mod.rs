//! 通知存储后端契约
//!
//! 所有后端都要实现八个收件箱操作；`open`/`close` 是可选的连接生命周期
//! 钩子，无连接状态的后端保持默认空实现即可。契约方法的默认实现一律
//! 响亮失败（`NotifyError::NotImplemented`），绝不静默成功。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::MemnotifyConfig;
use crate::error::{NotifyError, Result};
use crate::message::{Level, Message};

pub mod dummy;
pub mod redis_backend;

pub use dummy::DummyBackend;
pub use redis_backend::RedisBackend;

/// 通知后端接口（需要作为 trait 对象使用，保留 async-trait）
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    /// 建立到存储服务的网络连接，可重复调用
    ///
    /// 默认实现不做任何事，适用于没有连接状态的后端。
    async fn open(&self) -> Result<()> {
        Ok(())
    }

    /// 关闭网络连接，可重复调用
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// 向指定用户的收件箱追加一条消息
    async fn send(
        &self,
        _user_id: &str,
        _content: &str,
        _level: Level,
        _sender: Option<Value>,
        _expired_at: Option<DateTime<Utc>>,
        _one_time: bool,
    ) -> Result<()> {
        Err(NotifyError::NotImplemented { op: "send" })
    }

    /// 用户未读消息数（列表原始长度，不触发淘汰）
    async fn num_unread(&self, _user_id: &str) -> Result<usize> {
        Err(NotifyError::NotImplemented { op: "num_unread" })
    }

    /// 读取用户全部待处理消息，扫描过程中惰性淘汰过期/一次性消息
    async fn get_messages(&self, _user_id: &str) -> Result<Vec<Message>> {
        Err(NotifyError::NotImplemented { op: "get_messages" })
    }

    /// 弹出并返回用户最新一条消息，空收件箱返回 `Ok(None)`
    async fn get_last_and_read(&self, _user_id: &str) -> Result<Option<Message>> {
        Err(NotifyError::NotImplemented {
            op: "get_last_and_read",
        })
    }

    /// 清空用户收件箱，幂等
    async fn mark_all_as_read(&self, _user_id: &str) -> Result<()> {
        Err(NotifyError::NotImplemented {
            op: "mark_all_as_read",
        })
    }

    /// 向全局广播收件箱追加一条消息（全局消息不支持一次性标记）
    async fn global_send(
        &self,
        _content: &str,
        _level: Level,
        _sender: Option<Value>,
        _expired_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        Err(NotifyError::NotImplemented { op: "global_send" })
    }

    /// 全局收件箱消息数（列表原始长度，不触发淘汰）
    async fn global_num_unread(&self) -> Result<usize> {
        Err(NotifyError::NotImplemented {
            op: "global_num_unread",
        })
    }

    /// 读取全部全局消息，淘汰语义与 `get_messages` 共用同一套判定
    async fn global_get_messages(&self) -> Result<Vec<Message>> {
        Err(NotifyError::NotImplemented {
            op: "global_get_messages",
        })
    }
}

/// 已注册的后端实现
///
/// 以稳定的字符串标识选择实现，替代按类路径动态加载的做法。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Redis 列表存储后端
    Redis,
    /// 空实现，用于关闭通知或测试
    Dummy,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Redis => "redis",
            BackendKind::Dummy => "dummy",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "redis" => Ok(BackendKind::Redis),
            "dummy" => Ok(BackendKind::Dummy),
            other => Err(NotifyError::Config(format!(
                "unknown notify backend: {other}"
            ))),
        }
    }
}

/// 按标识构建后端实例
pub fn create_backend(kind: BackendKind, config: &MemnotifyConfig) -> Result<Arc<dyn NotifyBackend>> {
    match kind {
        BackendKind::Redis => Ok(Arc::new(RedisBackend::new(config.redis.clone())?)),
        BackendKind::Dummy => Ok(Arc::new(DummyBackend)),
    }
}
