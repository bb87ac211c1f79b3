//! 空实现后端：所有操作平凡成功，用于关闭通知功能或测试环境。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::backend::NotifyBackend;
use crate::error::Result;
use crate::message::{Level, Message};

pub struct DummyBackend;

#[async_trait]
impl NotifyBackend for DummyBackend {
    async fn send(
        &self,
        _user_id: &str,
        _content: &str,
        _level: Level,
        _sender: Option<Value>,
        _expired_at: Option<DateTime<Utc>>,
        _one_time: bool,
    ) -> Result<()> {
        Ok(())
    }

    async fn num_unread(&self, _user_id: &str) -> Result<usize> {
        Ok(0)
    }

    async fn get_messages(&self, _user_id: &str) -> Result<Vec<Message>> {
        Ok(Vec::new())
    }

    async fn get_last_and_read(&self, _user_id: &str) -> Result<Option<Message>> {
        Ok(None)
    }

    async fn mark_all_as_read(&self, _user_id: &str) -> Result<()> {
        Ok(())
    }

    async fn global_send(
        &self,
        _content: &str,
        _level: Level,
        _sender: Option<Value>,
        _expired_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        Ok(())
    }

    async fn global_num_unread(&self) -> Result<usize> {
        Ok(0)
    }

    async fn global_get_messages(&self) -> Result<Vec<Message>> {
        Ok(Vec::new())
    }
}
