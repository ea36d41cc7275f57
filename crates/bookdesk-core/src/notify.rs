// Transient user notifications ("toasts").
//
// Controllers publish; whoever renders (the CLI, a test) subscribes.

use serde::Serialize;
use strum::Display;
use tokio::sync::broadcast;
use tracing::{info, warn};

const TOAST_CHANNEL_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

/// Broadcast sink for toasts. Cheap to clone; publishing with no
/// subscribers is not an error.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Toast>,
}

impl Default for Notifier {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(TOAST_CHANNEL_SIZE);
        Self { tx }
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "toast");
        self.publish(ToastLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "toast");
        self.publish(ToastLevel::Error, message);
    }

    fn publish(&self, level: ToastLevel, message: String) {
        let _ = self.tx.send(Toast { level, message });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.tx.subscribe()
    }
}
