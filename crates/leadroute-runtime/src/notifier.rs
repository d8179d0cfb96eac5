//! Fire-and-forget assignment notifications
//!
//! Delivery is best-effort: callers log failures and never fail a routing
//! decision because a notification could not be sent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Result, RuntimeError};

/// What kind of assignment triggered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    /// First assignment of an inbound lead
    NewLead,
    /// Lead moved to a different counsellor by the sweep
    Reassigned,
    /// Lead handed to an L3 counsellor
    L3Handoff,
}

impl AssignmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentKind::NewLead => "new_lead",
            AssignmentKind::Reassigned => "reassigned",
            AssignmentKind::L3Handoff => "l3_handoff",
        }
    }
}

impl fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentNotification {
    pub target_id: String,
    pub lead_id: String,
    pub kind: AssignmentKind,
}

impl AssignmentNotification {
    pub fn new(
        target_id: impl Into<String>,
        lead_id: impl Into<String>,
        kind: AssignmentKind,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            lead_id: lead_id.into(),
            kind,
        }
    }
}

/// Notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_assignment(&self, notification: &AssignmentNotification) -> Result<()>;
}

/// Writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify_assignment(&self, notification: &AssignmentNotification) -> Result<()> {
        info!(
            target_id = %notification.target_id,
            lead_id = %notification.lead_id,
            kind = %notification.kind,
            "Lead assignment notification"
        );
        Ok(())
    }
}

/// Queues notifications on an unbounded channel so the routing path never
/// waits on delivery
pub struct QueuedNotifier {
    sender: mpsc::UnboundedSender<AssignmentNotification>,
}

impl QueuedNotifier {
    /// Create a notifier and the receiving end of its queue
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AssignmentNotification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Create a notifier whose queue is drained into `downstream` by a background task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(downstream: Arc<dyn Notifier>) -> Self {
        let (notifier, receiver) = Self::channel();
        tokio::spawn(async move {
            Self::drain(receiver, downstream).await;
        });
        debug!("QueuedNotifier background task spawned");
        notifier
    }

    async fn drain(
        mut receiver: mpsc::UnboundedReceiver<AssignmentNotification>,
        downstream: Arc<dyn Notifier>,
    ) {
        while let Some(notification) = receiver.recv().await {
            if let Err(e) = downstream.notify_assignment(&notification).await {
                warn!(
                    "Failed to deliver notification for lead {}: {}",
                    notification.lead_id, e
                );
            }
        }
        debug!("Notification queue closed");
    }
}

#[async_trait]
impl Notifier for QueuedNotifier {
    async fn notify_assignment(&self, notification: &AssignmentNotification) -> Result<()> {
        self.sender
            .send(notification.clone())
            .map_err(|e| RuntimeError::Notification(format!("queue closed: {}", e)))
    }
}
