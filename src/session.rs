use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::api::TranslationApi;
use crate::bulk::{BulkCoordinator, BulkDialog, BulkOutcome};
use crate::config::Config;
use crate::context::ViewContext;
use crate::error::ApiError;
use crate::executor::{ForwardChange, ForwardOutcome, InverseOutcome, ReversibleExecutor};
use crate::filters::{FilterKey, FilterState, TranslationFilters};
use crate::history::{UndoAction, UndoId};
use crate::lock;
use crate::models::{BulkAction, EditFields, Language, Translation, TranslationId};
use crate::notify::{Notification, NotificationId, NotificationOptions, RetryAction};
use crate::retry::RetryConfig;
use crate::selection::HeaderState;

/// What activating a notification's control did.
#[derive(Debug, Clone)]
pub enum Activation {
    /// The notification is gone or has no control.
    Nothing,
    Undone(InverseOutcome),
    Retried(ForwardOutcome),
    BulkReopened(BulkAction),
    Reloaded(bool),
}

#[derive(Debug, Clone, Copy)]
struct Paging {
    page: u32,
    limit: u32,
}

pub struct ReviewSession<A> {
    ctx: ViewContext<A>,
    bulk: BulkCoordinator,
    filters: Mutex<FilterState>,
    paging: Mutex<Paging>,
    recent_window: Duration,
}

impl<A: TranslationApi> ReviewSession<A> {
    pub fn new(api: A, config: &Config) -> Self {
        let filters = FilterState::new(config.filter_debounce);
        let query = filters.applied().to_query(0, config.page_size);
        Self {
            ctx: ViewContext::new(api, config, query),
            bulk: BulkCoordinator::default(),
            filters: Mutex::new(filters),
            paging: Mutex::new(Paging {
                page: 0,
                limit: config.page_size,
            }),
            recent_window: config.recent_change_window,
        }
    }

    pub fn with_refetch_retry(mut self, retry: RetryConfig) -> Self {
        self.ctx = self.ctx.with_refetch_retry(retry);
        self
    }

    fn executor(&self) -> ReversibleExecutor<'_, A> {
        ReversibleExecutor::new(&self.ctx)
    }

    // ==================== View ====================

    /// Load the current page.
    pub async fn load(&self) -> bool {
        self.ctx.refetch().await
    }

    pub fn rows(&self) -> Vec<Translation> {
        lock(&self.ctx.view).rows().to_vec()
    }

    pub fn find(&self, id: TranslationId) -> Option<Translation> {
        lock(&self.ctx.view).find(id).cloned()
    }

    pub fn total(&self) -> u64 {
        lock(&self.ctx.view).total()
    }

    pub fn page(&self) -> u32 {
        lock(&self.paging).page
    }

    pub fn rows_per_page(&self) -> u32 {
        lock(&self.paging).limit
    }

    pub async fn set_page(&self, page: u32) -> bool {
        lock(&self.paging).page = page;
        self.requery().await
    }

    /// Changing the page size starts over at the first page.
    pub async fn set_rows_per_page(&self, limit: u32) -> bool {
        {
            let mut paging = lock(&self.paging);
            paging.limit = limit.max(1);
            paging.page = 0;
        }
        self.requery().await
    }

    async fn requery(&self) -> bool {
        let query = {
            let paging = *lock(&self.paging);
            lock(&self.filters)
                .applied()
                .to_query(paging.page, paging.limit)
        };
        lock(&self.ctx.view).set_query(query);
        self.ctx.refetch().await
    }

    pub async fn languages(&self) -> Result<Vec<Language>, ApiError> {
        self.ctx.api.list_languages().await.map_err(|e| {
            self.ctx.notify(
                NotificationOptions::error("Failed to Load Languages").detail(e.detail()),
            );
            e
        })
    }

    // ==================== Single Actions ====================

    pub async fn approve(&self, id: TranslationId) -> ForwardOutcome {
        self.act(id, ForwardChange::Approve).await
    }

    pub async fn reject(&self, id: TranslationId) -> ForwardOutcome {
        self.act(id, ForwardChange::Reject).await
    }

    pub async fn edit(&self, id: TranslationId, source_text: &str, target_text: &str) -> ForwardOutcome {
        let Some(subject) = self.find(id) else {
            return self.missing_row(id);
        };
        let fields = EditFields::from_translation(&subject).with_texts(source_text, target_text);
        self.executor()
            .apply_forward(&subject, ForwardChange::Edit(fields))
            .await
    }

    async fn act(&self, id: TranslationId, change: ForwardChange) -> ForwardOutcome {
        let Some(subject) = self.find(id) else {
            return self.missing_row(id);
        };
        if lock(&self.ctx.history).is_recently_modified(id, self.recent_window) {
            self.ctx.notify(
                NotificationOptions::warning("Recently Modified")
                    .detail(format!("Translation #{} was changed a moment ago.", id)),
            );
        }
        self.executor().apply_forward(&subject, change).await
    }

    fn missing_row(&self, id: TranslationId) -> ForwardOutcome {
        let e = ApiError::new(Some(404), format!("Translation #{} is not on this page", id));
        self.ctx
            .notify(NotificationOptions::error("Translation Not Found").detail(e.detail()));
        ForwardOutcome::Failed(e)
    }

    pub async fn undo(&self, id: UndoId) -> InverseOutcome {
        self.executor().apply_inverse(id).await
    }

    pub async fn undo_last(&self) -> InverseOutcome {
        self.executor().undo_last().await
    }

    pub fn history(&self) -> Vec<UndoAction> {
        lock(&self.ctx.history).entries()
    }

    pub fn can_undo(&self) -> bool {
        lock(&self.ctx.history).can_undo()
    }

    // ==================== Notifications ====================

    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.ctx.notifications).active().to_vec()
    }

    pub fn dismiss(&self, id: NotificationId) -> bool {
        lock(&self.ctx.notifications).remove(id)
    }

    /// Run the undo or retry control of a notification. The notification
    /// is removed before anything is sent, so a control fires at most once.
    pub async fn activate(&self, id: NotificationId) -> Activation {
        let (undo, retry) = {
            let mut center = lock(&self.ctx.notifications);
            match center.take_undo(id) {
                Some(undo) => (Some(undo), None),
                None => (None, center.take_retry(id)),
            }
        };

        if let Some(undo) = undo {
            return Activation::Undone(self.undo(undo).await);
        }
        match retry {
            Some(RetryAction::Forward { subject, change }) => {
                info!("Retrying {} of translation #{}", change.kind(), subject.id);
                Activation::Retried(self.executor().apply_forward(&subject, change).await)
            }
            Some(RetryAction::Bulk(action)) => {
                self.bulk.open(action);
                Activation::BulkReopened(action)
            }
            Some(RetryAction::Refetch) => Activation::Reloaded(self.ctx.refetch().await),
            None => {
                debug!("Notification {} has no control to activate", id);
                Activation::Nothing
            }
        }
    }

    // ==================== Selection / Bulk ====================

    pub fn select_row(&self, id: TranslationId, checked: bool) {
        lock(&self.ctx.selection).select_row(id, checked);
    }

    pub fn select_all(&self, checked: bool) {
        let visible = lock(&self.ctx.view).visible_ids();
        lock(&self.ctx.selection).select_all(checked, &visible);
    }

    pub fn clear_selection(&self) {
        lock(&self.ctx.selection).clear();
    }

    pub fn selected_ids(&self) -> Vec<TranslationId> {
        lock(&self.ctx.selection).ids()
    }

    pub fn header_state(&self) -> HeaderState {
        let visible = lock(&self.ctx.view).visible_ids();
        lock(&self.ctx.selection).header_state(&visible)
    }

    pub fn bulk_state(&self) -> BulkDialog {
        self.bulk.state()
    }

    pub fn handle_bulk_approve(&self) -> bool {
        self.bulk.handle_bulk_approve()
    }

    pub fn handle_bulk_reject(&self) -> bool {
        self.bulk.handle_bulk_reject()
    }

    pub fn handle_bulk_dialog_close(&self) -> bool {
        self.bulk.handle_bulk_dialog_close()
    }

    pub async fn handle_bulk_confirm(&self) -> BulkOutcome {
        self.bulk.handle_bulk_confirm(&self.ctx).await
    }

    // ==================== Filters ====================

    pub fn draft_filters(&self) -> TranslationFilters {
        lock(&self.filters).draft().clone()
    }

    pub fn applied_filters(&self) -> TranslationFilters {
        lock(&self.filters).applied().clone()
    }

    /// Edit a filter; takes effect on a later [`tick`](Self::tick).
    pub fn set_filter(&self, key: FilterKey, value: &str) -> Result<(), ApiError> {
        lock(&self.filters).set(key, value)
    }

    pub async fn remove_filter(&self, key: FilterKey) -> bool {
        let changed = lock(&self.filters).remove(key);
        if changed {
            self.apply_filters().await;
        }
        changed
    }

    pub async fn clear_filters(&self) -> bool {
        let changed = lock(&self.filters).clear_all();
        if changed {
            self.apply_filters().await;
        }
        changed
    }

    async fn apply_filters(&self) {
        let applied = self.applied_filters();
        info!("Applying filters: {:?}", applied.active());
        if lock(&self.ctx.selection).on_filters_changed(&applied) {
            debug!("Selection cleared by filter change");
        }
        lock(&self.paging).page = 0;
        self.requery().await;
    }

    // ==================== Timers ====================

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let notify = lock(&self.ctx.notifications).next_deadline();
        let filters = lock(&self.filters).next_deadline();
        match (notify, filters) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Expire notifications and apply debounced filters due by `now`.
    pub async fn tick(&self, now: Instant) {
        lock(&self.ctx.notifications).expire(now);
        let changed = lock(&self.filters).poll(now);
        if changed {
            self.apply_filters().await;
        }
    }

    /// Tear the view down; completions that arrive later are dropped.
    pub fn teardown(&self) {
        info!("Tearing down review session");
        self.ctx.shut_down();
        self.bulk.handle_bulk_dialog_close();
        lock(&self.filters).clear_all();
    }
}
