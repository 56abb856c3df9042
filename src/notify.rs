use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::executor::ForwardChange;
use crate::history::UndoId;
use crate::models::{BulkAction, Translation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NotificationId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
    Warning,
}

/// What a "Retry" control repeats.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryAction {
    /// Resend a single forward mutation with identical arguments.
    Forward {
        subject: Translation,
        change: ForwardChange,
    },
    /// Reopen the bulk confirmation for the same action.
    Bulk(BulkAction),
    /// Reload the current page.
    Refetch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationOptions {
    pub level: NotificationLevel,
    pub title: String,
    pub detail: Option<String>,
    pub on_retry: Option<RetryAction>,
    pub on_undo: Option<UndoId>,
    pub persistent: bool,
    pub duration: Option<Duration>,
}

impl NotificationOptions {
    pub fn new(level: NotificationLevel, title: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            detail: None,
            on_retry: None,
            on_undo: None,
            persistent: false,
            duration: None,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title)
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, title)
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn undo(mut self, id: UndoId) -> Self {
        self.on_undo = Some(id);
        self
    }

    pub fn retry(mut self, action: RetryAction) -> Self {
        self.on_retry = Some(action);
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Controls are plain data. Taking one removes the notification, so it
/// fires at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub level: NotificationLevel,
    pub title: String,
    pub detail: Option<String>,
    pub undo: Option<UndoId>,
    pub retry: Option<RetryAction>,
    pub persistent: bool,
    /// `None` for persistent notifications.
    pub expires_at: Option<Instant>,
}

impl Notification {
    /// Undo is only shown on success and warning messages.
    pub fn undo_available(&self) -> bool {
        self.undo.is_some()
            && matches!(
                self.level,
                NotificationLevel::Success | NotificationLevel::Warning
            )
    }
}

#[derive(Debug)]
pub struct NotificationCenter {
    active: Vec<Notification>,
    next_id: u64,
    default_duration: Duration,
    error_duration: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000), Duration::from_millis(8000))
    }
}

impl NotificationCenter {
    pub fn new(default_duration: Duration, error_duration: Duration) -> Self {
        Self {
            active: Vec::new(),
            next_id: 1,
            default_duration,
            error_duration,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.notify_success_duration, config.notify_error_duration)
    }

    pub fn notify(&mut self, opts: NotificationOptions) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id += 1;

        let expires_at = if opts.persistent {
            None
        } else {
            let duration = opts.duration.unwrap_or(match opts.level {
                NotificationLevel::Error => self.error_duration,
                _ => self.default_duration,
            });
            Some(Instant::now() + duration)
        };

        match opts.level {
            NotificationLevel::Error => warn!(
                "Notification {}: {} - {}",
                id,
                opts.title,
                opts.detail.as_deref().unwrap_or("")
            ),
            _ => info!(
                "Notification {}: {} - {}",
                id,
                opts.title,
                opts.detail.as_deref().unwrap_or("")
            ),
        }

        self.active.push(Notification {
            id,
            level: opts.level,
            title: opts.title,
            detail: opts.detail,
            undo: opts.on_undo,
            retry: opts.on_retry,
            persistent: opts.persistent,
            expires_at,
        });
        id
    }

    pub fn active(&self) -> &[Notification] {
        &self.active
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.active.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Manual dismiss. Returns false if it was already gone.
    pub fn remove(&mut self, id: NotificationId) -> bool {
        let before = self.active.len();
        self.active.retain(|n| n.id != id);
        before != self.active.len()
    }

    /// Take the undo control: removes the notification and yields its undo id.
    pub fn take_undo(&mut self, id: NotificationId) -> Option<UndoId> {
        let index = self
            .active
            .iter()
            .position(|n| n.id == id && n.undo_available())?;
        self.active.remove(index).undo
    }

    /// Take the retry control: removes the notification and yields its retry.
    pub fn take_retry(&mut self, id: NotificationId) -> Option<RetryAction> {
        let index = self
            .active
            .iter()
            .position(|n| n.id == id && n.retry.is_some())?;
        self.active.remove(index).retry
    }

    /// Drop every non-persistent notification whose time is up.
    pub fn expire(&mut self, now: Instant) -> Vec<NotificationId> {
        let mut expired = Vec::new();
        self.active.retain(|n| match n.expires_at {
            Some(deadline) if deadline <= now => {
                expired.push(n.id);
                false
            }
            _ => true,
        });
        if !expired.is_empty() {
            debug!("Expired notifications: {:?}", expired);
        }
        expired
    }

    /// Earliest pending auto-dismiss, for the caller's timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.active.iter().filter_map(|n| n.expires_at).min()
    }

    pub fn clear_all(&mut self) {
        self.active.clear();
    }
}
