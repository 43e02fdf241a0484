//! Notifications that travel outside the store, such as toasts and session changes.

use serde::Serialize;
use shared::domain::{ArticleId, UserId};
use tokio::sync::broadcast;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusEvent {
    LoginSucceeded { user_id: UserId },
    LoggedOut,
    /// A privileged command ran without a session.
    LoginRequired { command: &'static str },
    ArticleBlocked { article_id: ArticleId },
    Notice { level: NoticeLevel, message: String },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }

    /// Fire and forget; having no listeners is fine.
    pub fn publish(&self, event: BusEvent) {
        if self.tx.send(event).is_err() {
            trace!("bus event dropped, no subscribers");
        }
    }

    pub fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.publish(BusEvent::Notice {
            level,
            message: message.into(),
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
