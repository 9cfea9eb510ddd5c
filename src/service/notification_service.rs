//! 通知状态服务
//!
//! 面向仪表盘的轻量状态上报：info/success/error三类，固定延迟后自动清除。
//! 流水线各阶段（校验、授权、组装、广播）统一经由这里上报可观测结果。

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

/// 通知类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// 单条通知
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// 通知中心
pub struct NotificationCenter {
    entries: Arc<RwLock<Vec<Notification>>>,
    ttl: Duration,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            ttl,
        })
    }

    /// 上报一条通知，TTL到期后自动清除
    pub async fn show(&self, kind: NotificationKind, message: impl Into<String>) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at: Utc::now(),
        };
        let id = notification.id;

        match kind {
            NotificationKind::Error => {
                tracing::warn!(kind = ?kind, message = %notification.message, "notification")
            }
            _ => tracing::info!(kind = ?kind, message = %notification.message, "notification"),
        }

        self.entries.write().await.push(notification);

        let entries = Arc::clone(&self.entries);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            entries.write().await.retain(|n| n.id != id);
        });

        id
    }

    pub async fn info(&self, message: impl Into<String>) -> Uuid {
        self.show(NotificationKind::Info, message).await
    }

    pub async fn success(&self, message: impl Into<String>) -> Uuid {
        self.show(NotificationKind::Success, message).await
    }

    pub async fn error(&self, message: impl Into<String>) -> Uuid {
        self.show(NotificationKind::Error, message).await
    }

    /// 当前未过期的通知快照（时间序）
    pub async fn snapshot(&self) -> Vec<Notification> {
        self.entries.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_show_appends_in_order() {
        let center = NotificationCenter::new(Duration::from_secs(60));
        center.info("checking balance").await;
        center.error("insufficient balance").await;

        let snapshot = center.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].kind, NotificationKind::Info);
        assert_eq!(snapshot[1].kind, NotificationKind::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_clear_after_ttl() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        center.success("payments sent").await;
        assert_eq!(center.snapshot().await.len(), 1);

        tokio::time::advance(Duration::from_secs(6)).await;
        // 让清除任务得到调度
        tokio::task::yield_now().await;
        assert!(center.snapshot().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_expired_entries_are_cleared() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        center.info("first").await;
        tokio::time::advance(Duration::from_secs(3)).await;
        center.info("second").await;

        tokio::time::advance(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;

        let snapshot = center.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].message, "second");
    }
}
