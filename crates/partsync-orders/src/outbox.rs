//! Notification outbox.
//!
//! The forwarder appends events here instead of calling a mailer directly;
//! an external worker drains the queue. A delivery failure therefore cannot
//! affect order state.

use std::sync::Mutex;

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    CustomerConfirmation { order_id: Uuid, message: String },
    AdminAlert { message: String },
}

#[derive(Debug, Default)]
pub struct NotificationOutbox {
    events: Mutex<Vec<NotificationEvent>>,
}

impl NotificationOutbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: NotificationEvent) {
        self.events.lock().expect("outbox mutex poisoned").push(event);
    }

    /// Removes and returns all queued events, oldest first.
    pub fn drain(&self) -> Vec<NotificationEvent> {
        std::mem::take(&mut *self.events.lock().expect("outbox mutex poisoned"))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().expect("outbox mutex poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
