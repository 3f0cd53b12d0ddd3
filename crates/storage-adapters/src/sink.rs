//! # Collecting alert sink
//!
//! An in-memory inbox per recipient. Stands in for the real delivery
//! collaborator so tests can assert exactly who was notified and with
//! what message.

use async_trait::async_trait;
use dashmap::DashMap;
use domains::ports::AlertSink;
use domains::{RenderedAlert, Result, UserId};

#[derive(Default)]
pub struct CollectingAlertSink {
    inboxes: DashMap<UserId, Vec<RenderedAlert>>,
}

impl CollectingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered to `recipient`, in delivery order.
    pub fn for_recipient(&self, recipient: UserId) -> Vec<RenderedAlert> {
        self.inboxes
            .get(&recipient)
            .map(|inbox| inbox.clone())
            .unwrap_or_default()
    }

    /// All recipients that received at least one alert.
    pub fn recipients(&self) -> Vec<UserId> {
        let mut recipients: Vec<UserId> = self.inboxes.iter().map(|e| *e.key()).collect();
        recipients.sort();
        recipients
    }
}

#[async_trait]
impl AlertSink for CollectingAlertSink {
    async fn deliver(&self, recipient: UserId, alert: RenderedAlert) -> Result<()> {
        self.inboxes.entry(recipient).or_default().push(alert);
        Ok(())
    }
}
