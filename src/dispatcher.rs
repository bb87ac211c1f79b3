//! 通知调度器
//!
//! 进程内唯一的门面对象：持有一个按配置选出的后端实例，把八个收件箱
//! 操作原样转发过去。每次调用都包在 open/close 的连接作用域里，出错
//! 也保证释放连接。`reload` 以原子交换的方式替换激活后端。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::backend::{BackendKind, NotifyBackend, create_backend};
use crate::config::MemnotifyConfig;
use crate::error::Result;
use crate::message::{Level, Message};

pub struct Notifier {
    config: RwLock<MemnotifyConfig>,
    backend: RwLock<Arc<dyn NotifyBackend>>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}

impl Notifier {
    /// 按给定配置实例化其命名的后端
    pub fn new(config: MemnotifyConfig) -> Result<Self> {
        let kind: BackendKind = config.backend.parse()?;
        let backend = create_backend(kind, &config)?;
        info!(backend = kind.as_str(), "notify backend selected");
        Ok(Self {
            config: RwLock::new(config),
            backend: RwLock::new(backend),
        })
    }

    /// 从外部设置（`MEMNOTIFY_CONFIG`）加载配置并实例化
    pub fn from_env() -> Result<Self> {
        Self::new(MemnotifyConfig::load()?)
    }

    /// 用现成的后端实例构建调度器，主要供测试与宿主应用注入使用
    pub fn with_backend(config: MemnotifyConfig, backend: Arc<dyn NotifyBackend>) -> Self {
        Self {
            config: RwLock::new(config),
            backend: RwLock::new(backend),
        }
    }

    /// 重新选择激活后端
    ///
    /// 给定显式标识时沿用当前配置构建该后端；否则重新读取外部设置。
    /// 任一步骤失败都不替换原后端，调用方继续使用旧实例。已经捕获旧
    /// 实例的在途调用不受影响。
    pub async fn reload(&self, kind: Option<BackendKind>) -> Result<()> {
        let (config, kind) = match kind {
            Some(kind) => (self.config.read().await.clone(), kind),
            None => {
                let config = MemnotifyConfig::load()?;
                let kind = config.backend.parse()?;
                (config, kind)
            }
        };
        let backend = create_backend(kind, &config)?;

        *self.config.write().await = config;
        *self.backend.write().await = backend;
        info!(backend = kind.as_str(), "notify backend reloaded");
        Ok(())
    }

    /// 当前激活的后端引用
    async fn backend(&self) -> Arc<dyn NotifyBackend> {
        self.backend.read().await.clone()
    }

    /// 关闭失败只记日志，不覆盖操作本身的结果
    async fn close_backend(backend: &Arc<dyn NotifyBackend>) {
        if let Err(err) = backend.close().await {
            warn!(error = %err, "failed to close notify backend connection");
        }
    }

    pub async fn send(
        &self,
        user_id: &str,
        content: &str,
        level: Level,
        sender: Option<Value>,
        expired_at: Option<DateTime<Utc>>,
        one_time: bool,
    ) -> Result<()> {
        let backend = self.backend().await;
        backend.open().await?;
        let result = backend
            .send(user_id, content, level, sender, expired_at, one_time)
            .await;
        Self::close_backend(&backend).await;
        result
    }

    pub async fn num_unread(&self, user_id: &str) -> Result<usize> {
        let backend = self.backend().await;
        backend.open().await?;
        let result = backend.num_unread(user_id).await;
        Self::close_backend(&backend).await;
        result
    }

    pub async fn get_messages(&self, user_id: &str) -> Result<Vec<Message>> {
        let backend = self.backend().await;
        backend.open().await?;
        let result = backend.get_messages(user_id).await;
        Self::close_backend(&backend).await;
        result
    }

    pub async fn get_last_and_read(&self, user_id: &str) -> Result<Option<Message>> {
        let backend = self.backend().await;
        backend.open().await?;
        let result = backend.get_last_and_read(user_id).await;
        Self::close_backend(&backend).await;
        result
    }

    pub async fn mark_all_as_read(&self, user_id: &str) -> Result<()> {
        let backend = self.backend().await;
        backend.open().await?;
        let result = backend.mark_all_as_read(user_id).await;
        Self::close_backend(&backend).await;
        result
    }

    pub async fn global_send(
        &self,
        content: &str,
        level: Level,
        sender: Option<Value>,
        expired_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let backend = self.backend().await;
        backend.open().await?;
        let result = backend.global_send(content, level, sender, expired_at).await;
        Self::close_backend(&backend).await;
        result
    }

    pub async fn global_num_unread(&self) -> Result<usize> {
        let backend = self.backend().await;
        backend.open().await?;
        let result = backend.global_num_unread().await;
        Self::close_backend(&backend).await;
        result
    }

    pub async fn global_get_messages(&self) -> Result<Vec<Message>> {
        let backend = self.backend().await;
        backend.open().await?;
        let result = backend.global_get_messages().await;
        Self::close_backend(&backend).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::backend::DummyBackend;
    use crate::error::NotifyError;

    /// 记录 open/close 调用次数的后端，操作本身可配置为失败
    struct RecordingBackend {
        opened: AtomicUsize,
        closed: AtomicUsize,
        fail_ops: bool,
    }

    impl RecordingBackend {
        fn new(fail_ops: bool) -> Arc<Self> {
            Arc::new(Self {
                opened: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
                fail_ops,
            })
        }
    }

    #[async_trait]
    impl NotifyBackend for RecordingBackend {
        async fn open(&self) -> Result<()> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn num_unread(&self, _user_id: &str) -> Result<usize> {
            if self.fail_ops {
                Err(NotifyError::Connection("boom".to_string()))
            } else {
                Ok(7)
            }
        }
    }

    fn dummy_config() -> MemnotifyConfig {
        MemnotifyConfig {
            backend: "dummy".to_string(),
            ..MemnotifyConfig::default()
        }
    }

    #[tokio::test]
    async fn passes_operations_through_to_backend() {
        let notifier = Notifier::new(dummy_config()).unwrap();
        notifier
            .send("u1", "Test", Level::INFO, None, None, false)
            .await
            .unwrap();
        assert_eq!(notifier.num_unread("u1").await.unwrap(), 0);
        assert!(notifier.get_messages("u1").await.unwrap().is_empty());
        assert!(notifier.get_last_and_read("u1").await.unwrap().is_none());
        notifier.mark_all_as_read("u1").await.unwrap();
        notifier
            .global_send("Test", Level::INFO, None, None)
            .await
            .unwrap();
        assert_eq!(notifier.global_num_unread().await.unwrap(), 0);
        assert!(notifier.global_get_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wraps_each_call_in_open_close_scope() {
        let backend = RecordingBackend::new(false);
        let notifier = Notifier::with_backend(dummy_config(), backend.clone());

        assert_eq!(notifier.num_unread("u1").await.unwrap(), 7);
        assert_eq!(backend.opened.load(Ordering::SeqCst), 1);
        assert_eq!(backend.closed.load(Ordering::SeqCst), 1);

        notifier.num_unread("u1").await.unwrap();
        assert_eq!(backend.opened.load(Ordering::SeqCst), 2);
        assert_eq!(backend.closed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn closes_connection_even_when_operation_fails() {
        let backend = RecordingBackend::new(true);
        let notifier = Notifier::with_backend(dummy_config(), backend.clone());

        let err = notifier.num_unread("u1").await.unwrap_err();
        assert!(matches!(err, NotifyError::Connection(_)));
        assert_eq!(backend.opened.load(Ordering::SeqCst), 1);
        assert_eq!(backend.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unimplemented_operation_surfaces_contract_error() {
        let backend = RecordingBackend::new(false);
        let notifier = Notifier::with_backend(dummy_config(), backend.clone());

        // RecordingBackend 没有覆盖 get_messages，契约默认实现要响亮失败
        let err = notifier.get_messages("u1").await.unwrap_err();
        assert!(matches!(
            err,
            NotifyError::NotImplemented { op: "get_messages" }
        ));
        // 即便如此连接也要关闭
        assert_eq!(backend.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reload_with_explicit_kind_swaps_backend() {
        let backend = RecordingBackend::new(true);
        let notifier = Notifier::with_backend(dummy_config(), backend);

        assert!(notifier.num_unread("u1").await.is_err());

        notifier.reload(Some(BackendKind::Dummy)).await.unwrap();
        assert_eq!(notifier.num_unread("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_backend() {
        let config = MemnotifyConfig {
            backend: "no-such-backend".to_string(),
            ..MemnotifyConfig::default()
        };
        let notifier = Notifier::with_backend(config, Arc::new(DummyBackend));

        // 构造函数路径：无法解析的标识是配置错误
        let err = Notifier::new(MemnotifyConfig {
            backend: "no-such-backend".to_string(),
            ..MemnotifyConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, NotifyError::Config(_)));

        // 显式重载到已知后端仍然可用，旧实例在此之前一直有效
        assert_eq!(notifier.num_unread("u1").await.unwrap(), 0);
        notifier.reload(Some(BackendKind::Dummy)).await.unwrap();
        assert_eq!(notifier.num_unread("u1").await.unwrap(), 0);
    }
}
