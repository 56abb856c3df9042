//! State owned by one logical view instance.
//!
//! Each piece sits behind its own short-lived lock that is never held across
//! an `.await`, so concurrent review calls from the same view interleave only
//! at their suspension points. After [`ViewContext::shut_down`] every
//! completion path becomes a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::api::TranslationApi;
use crate::config::Config;
use crate::history::ActionLog;
use crate::lock;
use crate::models::TranslationQuery;
use crate::notify::{NotificationCenter, NotificationId, NotificationOptions, RetryAction};
use crate::retry::RetryConfig;
use crate::selection::SelectionSet;
use crate::view::{self, ViewCache};

pub struct ViewContext<A> {
    pub(crate) api: A,
    pub(crate) history: Mutex<ActionLog>,
    pub(crate) notifications: Mutex<NotificationCenter>,
    pub(crate) view: Mutex<ViewCache>,
    pub(crate) selection: Mutex<SelectionSet>,
    refetch_retry: RetryConfig,
    alive: AtomicBool,
}

impl<A: TranslationApi> ViewContext<A> {
    pub fn new(api: A, config: &Config, query: TranslationQuery) -> Self {
        Self {
            api,
            history: Mutex::new(ActionLog::new(config.undo_history_size.max(1))),
            notifications: Mutex::new(NotificationCenter::from_config(config)),
            view: Mutex::new(ViewCache::new(query)),
            selection: Mutex::new(SelectionSet::default()),
            refetch_retry: RetryConfig::refetch(),
            alive: AtomicBool::new(true),
        }
    }

    pub fn with_refetch_retry(mut self, retry: RetryConfig) -> Self {
        self.refetch_retry = retry;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Emit a notification unless the view is gone.
    pub fn notify(&self, opts: NotificationOptions) -> Option<NotificationId> {
        if !self.is_alive() {
            debug!("View torn down, dropping notification '{}'", opts.title);
            return None;
        }
        Some(lock(&self.notifications).notify(opts))
    }

    /// Reload the current page. A failure is reported to the user once.
    pub async fn refetch(&self) -> bool {
        lock(&self.view).invalidate();
        match view::refetch(&self.view, &self.api, &self.refetch_retry).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Refetch failed: {}", e);
                let mut opts = NotificationOptions::error("Failed to Load Translations")
                    .detail(e.detail());
                if e.is_retryable() {
                    opts = opts.retry(RetryAction::Refetch);
                }
                self.notify(opts);
                false
            }
        }
    }

    /// Mark the view dead and drop everything it owned.
    pub fn shut_down(&self) {
        self.alive.store(false, Ordering::SeqCst);
        lock(&self.history).clear();
        lock(&self.selection).clear();
        lock(&self.notifications).clear_all();
    }
}
