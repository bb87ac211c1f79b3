//! Memnotify 错误类型
//!
//! 所有存储层错误原样上抛给调用方，调度器不做重试或吞错。

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotifyError>;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// 配置错误（后端标识无法解析、配置文件损坏等）
    #[error("configuration error: {0}")]
    Config(String),

    /// 后端连接尚未建立就发起了操作
    #[error("connection error: {0}")]
    Connection(String),

    /// Redis 命令执行失败（包括连接建立失败）
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// 存储中的消息无法解码
    #[error("message encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// 后端未覆盖契约要求的方法，属于编程错误
    #[error("notify backend does not implement {op}()")]
    NotImplemented { op: &'static str },
}
