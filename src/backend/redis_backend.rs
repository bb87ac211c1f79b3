//! Redis 列表存储后端
//!
//! 每个收件人（用户或全局键）对应一个 Redis 列表，消息以 JSON 字节串
//! 追加到尾部。过期与一次性语义在读取扫描时惰性求值，没有后台清理。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::NotifyBackend;
use crate::config::RedisBackendConfig;
use crate::error::{NotifyError, Result};
use crate::message::{Level, Message};

pub struct RedisBackend {
    client: redis::Client,
    // 连接在 open() 中建立、close() 中释放；ConnectionManager 克隆开销很小
    conn: RwLock<Option<ConnectionManager>>,
    global_key: String,
}

impl RedisBackend {
    pub fn new(config: RedisBackendConfig) -> Result<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                db: config.db,
                password: config.password.clone(),
                ..Default::default()
            },
        };
        let client = redis::Client::open(info)?;
        Ok(Self {
            client,
            conn: RwLock::new(None),
            global_key: config.global_key,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        self.conn
            .read()
            .await
            .clone()
            .ok_or_else(|| NotifyError::Connection("redis backend is not open".to_string()))
    }

    /// 用户唯一 id 直接作为列表键。保证配置的全局键不落在用户 id
    /// 空间里是部署方的责任。
    fn inbox_key(&self, user_id: &str) -> String {
        user_id.to_string()
    }

    async fn push_message(&self, key: &str, msg: &Message) -> Result<()> {
        let mut conn = self.connection().await?;
        let raw = msg.encode()?;
        let _: () = conn.rpush(key, raw).await?;
        Ok(())
    }

    async fn list_len(&self, key: &str) -> Result<usize> {
        let mut conn = self.connection().await?;
        Ok(conn.llen(key).await?)
    }

    /// 按存储顺序扫描整个列表，顺带淘汰过期与一次性条目。一次性消息在
    /// 消费它的那次扫描中仍会返回，过期消息则从结果中剔除。淘汰语义只
    /// 存在于这一处，按用户读取和全局读取都走这里。
    async fn scan_messages(&self, key: &str) -> Result<Vec<Message>> {
        let mut conn = self.connection().await?;
        let raw_entries: Vec<Vec<u8>> = conn.lrange(key, 0, -1).await?;
        let now = Utc::now();

        let mut messages = Vec::with_capacity(raw_entries.len());
        for raw in raw_entries {
            let msg = Message::decode(&raw)?;
            let expired = msg.is_expired(now);
            if expired || msg.one_time {
                // 按值精确匹配，只删这一条编码后的条目
                let removed: i64 = conn.lrem(key, 1, raw.as_slice()).await?;
                debug!(key, removed, expired, one_time = msg.one_time, "evicted message");
            }
            if !expired {
                messages.push(msg);
            }
        }
        Ok(messages)
    }
}

#[async_trait]
impl NotifyBackend for RedisBackend {
    async fn open(&self) -> Result<()> {
        let mut guard = self.conn.write().await;
        if guard.is_none() {
            *guard = Some(ConnectionManager::new(self.client.clone()).await?);
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.conn.write().await.take();
        Ok(())
    }

    async fn send(
        &self,
        user_id: &str,
        content: &str,
        level: Level,
        sender: Option<Value>,
        expired_at: Option<DateTime<Utc>>,
        one_time: bool,
    ) -> Result<()> {
        let msg = Message::new(content, level, sender, expired_at, one_time);
        self.push_message(&self.inbox_key(user_id), &msg).await
    }

    async fn num_unread(&self, user_id: &str) -> Result<usize> {
        // 原始列表长度：计数从不触发淘汰，已过期但未被扫描的条目
        // 在下一次 get_messages 之前仍会被算进来
        self.list_len(&self.inbox_key(user_id)).await
    }

    async fn get_messages(&self, user_id: &str) -> Result<Vec<Message>> {
        self.scan_messages(&self.inbox_key(user_id)).await
    }

    async fn get_last_and_read(&self, user_id: &str) -> Result<Option<Message>> {
        let mut conn = self.connection().await?;
        // 无条件弹出最新一条；这里刻意不做过期检查，最后一条消息
        // 即使已经过期也要呈现给调用方
        let raw: Option<Vec<u8>> = conn.rpop(self.inbox_key(user_id), None).await?;
        match raw {
            Some(raw) => Ok(Some(Message::decode(&raw)?)),
            None => Ok(None),
        }
    }

    async fn mark_all_as_read(&self, user_id: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(self.inbox_key(user_id)).await?;
        Ok(())
    }

    async fn global_send(
        &self,
        content: &str,
        level: Level,
        sender: Option<Value>,
        expired_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        // 全局消息永远不是一次性的
        let msg = Message::new(content, level, sender, expired_at, false);
        self.push_message(&self.global_key, &msg).await
    }

    async fn global_num_unread(&self) -> Result<usize> {
        self.list_len(&self.global_key).await
    }

    async fn global_get_messages(&self) -> Result<Vec<Message>> {
        self.scan_messages(&self.global_key).await
    }
}
