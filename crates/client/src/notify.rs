//! Fire-and-forget side channels out of the session core.
//!
//! - [`Notifier`]: transient banners (message + severity).
//! - [`prompt_channel`]: "open the login prompt" requests from any guarded
//!   view, answered by exactly one listener (the session UI).

use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};

use storefront_core::{Notice, Severity};

/// Sink for user-visible notices. Must never block or fail.
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}

/// Collects notices until a view drains them.
#[derive(Debug, Default)]
pub struct NoticeQueue {
    pending: Mutex<Vec<Notice>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notice> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for NoticeQueue {
    fn notify(&self, notice: Notice) {
        match self.pending.lock() {
            Ok(mut pending) => pending.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}

/// Writes notices to the log instead of a screen.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Error => tracing::error!(notice = %notice.message, "user notice"),
            Severity::Warning => tracing::warn!(notice = %notice.message, "user notice"),
            Severity::Info | Severity::Success => tracing::info!(notice = %notice.message, "user notice"),
        }
    }
}

/// Which form the prompt should open on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    #[default]
    Login,
    Register,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromptRequest {
    pub mode: PromptMode,
    /// Notice that caused the prompt, if the view wants to echo it.
    pub reason: Option<Notice>,
}

impl PromptRequest {
    pub fn login() -> Self {
        Self::default()
    }

    pub fn register() -> Self {
        Self {
            mode: PromptMode::Register,
            reason: None,
        }
    }

    pub fn because(mut self, reason: Option<Notice>) -> Self {
        self.reason = reason;
        self
    }
}

type PromptSlot = Mutex<Option<PromptRequest>>;

/// Create a prompt channel: cloneable triggers, a single listener.
///
/// The channel holds at most one request; a newer raise replaces an unanswered
/// one.
pub fn prompt_channel() -> (PromptTrigger, PromptListener) {
    let slot = Arc::new(PromptSlot::default());
    (
        PromptTrigger {
            slot: Arc::downgrade(&slot),
        },
        PromptListener { slot },
    )
}

#[derive(Debug, Clone)]
pub struct PromptTrigger {
    slot: Weak<PromptSlot>,
}

impl PromptTrigger {
    /// Raise the prompt. Dropped silently when nobody is listening.
    pub fn raise(&self, request: PromptRequest) {
        let Some(slot) = self.slot.upgrade() else {
            tracing::debug!("login prompt raised with no listener");
            return;
        };
        match slot.lock() {
            Ok(mut pending) => *pending = Some(request),
            Err(poisoned) => *poisoned.into_inner() = Some(request),
        }
    }
}

/// The one place that answers prompt requests. Not `Clone`.
#[derive(Debug)]
pub struct PromptListener {
    slot: Arc<PromptSlot>,
}

impl PromptListener {
    /// Latest pending request; several raises since the last poll collapse
    /// into one.
    pub fn poll(&self) -> Option<PromptRequest> {
        match self.slot.lock() {
            Ok(mut pending) => pending.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}
