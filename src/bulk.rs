//! Bulk approve/reject over the current selection.
//!
//! The confirmation dialog is a small state machine:
//!
//! ```text
//! Idle --approve/reject--> AwaitingConfirmation(action)
//! AwaitingConfirmation --close--> Idle
//! AwaitingConfirmation --confirm--> Processing(action) --done--> Idle
//! ```
//!
//! `Processing` always ends in `Idle`, including when the remote call fails
//! or the confirming future is dropped. Bulk actions are not logged and
//! cannot be undone.

use std::collections::HashSet;
use std::sync::Mutex;

use tracing::{info, warn};

use crate::api::TranslationApi;
use crate::context::ViewContext;
use crate::error::ApiError;
use crate::lock;
use crate::models::{BulkAction, BulkUpdateRequest, BulkUpdateResponse, TranslationId};
use crate::notify::{NotificationOptions, RetryAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkDialog {
    #[default]
    Idle,
    AwaitingConfirmation(BulkAction),
    Processing(BulkAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOperationResult {
    pub action: BulkAction,
    pub requested_ids: Vec<TranslationId>,
    pub succeeded_ids: Vec<TranslationId>,
    pub failed_ids: Vec<TranslationId>,
}

impl BulkOperationResult {
    /// Normalize the server's answer against what was asked for: every
    /// requested id lands in exactly one list, and ids the server invents
    /// are dropped. An id the server reports in neither list counts as failed.
    pub fn partition(
        action: BulkAction,
        requested: &[TranslationId],
        response: &BulkUpdateResponse,
    ) -> Self {
        let success: HashSet<_> = response.success.iter().copied().collect();
        let failed: HashSet<_> = response.failed.iter().copied().collect();

        let mut seen = HashSet::new();
        let requested_ids: Vec<_> = requested
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let (succeeded_ids, failed_ids): (Vec<_>, Vec<_>) = requested_ids
            .iter()
            .partition(|id| success.contains(*id) && !failed.contains(*id));

        let unknown = response
            .success
            .iter()
            .chain(&response.failed)
            .filter(|id| !seen.contains(*id))
            .count();
        if unknown > 0 {
            warn!("Bulk response mentioned {} ids that were not requested", unknown);
        }

        Self {
            action,
            requested_ids,
            succeeded_ids,
            failed_ids,
        }
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed_ids.is_empty()
    }

    fn summary(&self) -> NotificationOptions {
        let total = self.requested_ids.len();
        let verb = self.action.past_tense();
        if self.is_complete_success() {
            let noun = if total == 1 { "translation has" } else { "translations have" };
            return NotificationOptions::success("Bulk Update Complete")
                .detail(format!("{} {} been {} successfully.", total, noun, verb));
        }

        let failed: Vec<String> = self.failed_ids.iter().map(|id| format!("#{}", id)).collect();
        NotificationOptions::error(format!("Bulk {} partially failed", self.action.verb()))
            .detail(format!(
                "{} of {} translations {}; {} failed: {}. Select them again to retry.",
                self.succeeded_ids.len(),
                total,
                verb,
                self.failed_ids.len(),
                failed.join(", ")
            ))
            .persistent()
    }
}

#[derive(Debug, Clone)]
pub enum BulkOutcome {
    /// Nothing selected, or no dialog open.
    NothingToDo,
    /// A confirm is already processing.
    Busy,
    /// The whole request failed; the selection is kept.
    TransportFailed(ApiError),
    Completed(BulkOperationResult),
    Discarded,
}

/// Puts the dialog back to `Idle` however the confirm ends.
struct ProcessingGuard<'a>(&'a Mutex<BulkDialog>);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        *lock(self.0) = BulkDialog::Idle;
    }
}

#[derive(Debug, Default)]
pub struct BulkCoordinator {
    dialog: Mutex<BulkDialog>,
}

impl BulkCoordinator {
    pub fn state(&self) -> BulkDialog {
        *lock(&self.dialog)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state(), BulkDialog::Processing(_))
    }

    pub fn handle_bulk_approve(&self) -> bool {
        self.open(BulkAction::Approve)
    }

    pub fn handle_bulk_reject(&self) -> bool {
        self.open(BulkAction::Reject)
    }

    /// Open the confirmation for `action`. Ignored while processing.
    pub fn open(&self, action: BulkAction) -> bool {
        let mut dialog = lock(&self.dialog);
        if matches!(*dialog, BulkDialog::Processing(_)) {
            return false;
        }
        *dialog = BulkDialog::AwaitingConfirmation(action);
        true
    }

    /// Close without acting. A processing dialog cannot be closed.
    pub fn handle_bulk_dialog_close(&self) -> bool {
        let mut dialog = lock(&self.dialog);
        match *dialog {
            BulkDialog::AwaitingConfirmation(_) => {
                *dialog = BulkDialog::Idle;
                true
            }
            _ => false,
        }
    }

    pub async fn handle_bulk_confirm<A: TranslationApi>(&self, ctx: &ViewContext<A>) -> BulkOutcome {
        let (action, ids) = {
            let mut dialog = lock(&self.dialog);
            let action = match *dialog {
                BulkDialog::AwaitingConfirmation(action) => action,
                BulkDialog::Processing(_) => return BulkOutcome::Busy,
                BulkDialog::Idle => return BulkOutcome::NothingToDo,
            };
            let ids = lock(&ctx.selection).ids();
            if ids.is_empty() {
                return BulkOutcome::NothingToDo;
            }
            *dialog = BulkDialog::Processing(action);
            (action, ids)
        };
        let _processing = ProcessingGuard(&self.dialog);

        info!("Bulk {} of {} translations", action, ids.len());
        let request = BulkUpdateRequest {
            translation_ids: ids.clone(),
            action,
            reviewer_id: None,
        };
        let result = ctx.api.bulk_update_translations(&request).await;
        if !ctx.is_alive() {
            return BulkOutcome::Discarded;
        }

        match result {
            Ok(response) => {
                let result = BulkOperationResult::partition(action, &ids, &response);
                info!(
                    "Bulk {}: {} succeeded, {} failed",
                    action,
                    result.succeeded_ids.len(),
                    result.failed_ids.len()
                );
                lock(&ctx.selection).clear();
                ctx.notify(result.summary());
                ctx.refetch().await;
                BulkOutcome::Completed(result)
            }
            Err(e) => {
                warn!("Bulk {} failed: {}", action, e);
                let mut opts = NotificationOptions::error(format!("Bulk {} failed", action.verb()))
                    .detail(e.detail())
                    .persistent();
                if e.is_retryable() {
                    opts = opts.retry(RetryAction::Bulk(action));
                }
                ctx.notify(opts);
                BulkOutcome::TransportFailed(e)
            }
        }
    }
}
