use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 消息级别（序数形式，数值即存储值）
///
/// 级别是不透明的序数，调用方可以自定义新的级别值。
/// 注意：历史原因 ERROR(30) 排在 WARNING(40) 之前，调用方依赖字面数值，
/// 不要按常规日志级别顺序"修正"。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(pub u8);

impl Level {
    pub const DEBUG: Level = Level(10);
    pub const INFO: Level = Level(20);
    pub const ERROR: Level = Level(30);
    pub const WARNING: Level = Level(40);
    pub const CRITICAL: Level = Level(50);
}

/// 通知消息记录
///
/// 编码入库后不可变，读取路径从不原地改写：要么被 `get_last_and_read`
/// 弹出消费，要么被 `get_messages` 扫描时惰性淘汰。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub level: Level,
    /// 发送时刻，由 send 路径填充
    pub created_at: DateTime<Utc>,
    /// 发送者的不透明引用，不做校验，形状任意
    #[serde(default)]
    pub sender: Option<serde_json::Value>,
    /// 缺省表示永不过期
    #[serde(default)]
    pub expired_at: Option<DateTime<Utc>>,
    /// 一次性消息：首次被扫描返回后即删除（仅按用户发送路径可设置）
    #[serde(default)]
    pub one_time: bool,
}

impl Message {
    pub(crate) fn new(
        content: &str,
        level: Level,
        sender: Option<serde_json::Value>,
        expired_at: Option<DateTime<Utc>>,
        one_time: bool,
    ) -> Self {
        Self {
            content: content.to_string(),
            level,
            created_at: Utc::now(),
            sender,
            expired_at,
            one_time,
        }
    }

    /// 相对给定时刻是否已过期（`expired_at <= now`）
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expired_at.is_some_and(|at| at <= now)
    }

    /// 编码为入库存储的不透明字节串
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// 把原始列表条目解码回 `Message`
    pub fn decode(raw: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(raw)?)
    }
}
