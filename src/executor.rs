use tracing::{debug, info, warn};

use crate::api::TranslationApi;
use crate::context::ViewContext;
use crate::error::ApiError;
use crate::history::{ActionKind, UndoAction, UndoId};
use crate::lock;
use crate::models::{EditFields, Translation, TranslationFields, TranslationStatus};
use crate::notify::{NotificationOptions, RetryAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardChange {
    Approve,
    Reject,
    /// New content; the status goes back to pending.
    Edit(EditFields),
}

impl ForwardChange {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Approve => ActionKind::Approve,
            Self::Reject => ActionKind::Reject,
            Self::Edit(_) => ActionKind::Edit,
        }
    }

    /// Field set to send for a subject currently at `before`.
    pub fn apply_to(&self, before: &TranslationFields) -> TranslationFields {
        match self {
            Self::Approve => TranslationFields {
                status: TranslationStatus::Approved,
                ..before.clone()
            },
            Self::Reject => TranslationFields {
                status: TranslationStatus::Rejected,
                ..before.clone()
            },
            Self::Edit(edit) => TranslationFields {
                source_text: edit.source_text.clone(),
                target_text: edit.target_text.clone(),
                source_lang_id: edit.source_lang_id,
                target_lang_id: edit.target_lang_id,
                status: TranslationStatus::Pending,
                domain: edit.domain.clone(),
            },
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        if let Self::Edit(edit) = self {
            if edit.source_text.trim().is_empty() {
                return Err(ApiError::validation("Source text is required."));
            }
            if edit.target_text.trim().is_empty() {
                return Err(ApiError::validation("Target text is required."));
            }
        }
        Ok(())
    }

    fn description(&self, subject: &Translation) -> String {
        match self {
            Self::Approve => format!("Approve translation #{}", subject.id),
            Self::Reject => format!("Reject translation #{}", subject.id),
            Self::Edit(_) => format!("Edit translation #{}", subject.id),
        }
    }

    fn success_title(&self) -> &'static str {
        match self {
            Self::Approve => "Translation Approved",
            Self::Reject => "Translation Rejected",
            Self::Edit(_) => "Translation Updated",
        }
    }

    fn failure_title(&self) -> &'static str {
        match self {
            Self::Approve => "Failed to Approve Translation",
            Self::Reject => "Failed to Reject Translation",
            Self::Edit(_) => "Failed to Update Translation",
        }
    }

    /// Edits are not offered an undo control.
    fn offers_undo(&self) -> bool {
        !matches!(self, Self::Edit(_))
    }
}

#[derive(Debug, Clone)]
pub enum ForwardOutcome {
    Applied {
        undo_id: UndoId,
        updated: Translation,
    },
    Failed(ApiError),
    /// The call finished after the view was torn down.
    Discarded,
}

#[derive(Debug, Clone)]
pub enum InverseOutcome {
    /// Nothing to undo: already undone, evicted, or cleared.
    NotFound,
    Reverted(Translation),
    /// The entry is gone from the log; the failure is reported, not retried.
    Failed(ApiError),
    Discarded,
}

pub struct ReversibleExecutor<'a, A> {
    ctx: &'a ViewContext<A>,
}

impl<'a, A: TranslationApi> ReversibleExecutor<'a, A> {
    pub fn new(ctx: &'a ViewContext<A>) -> Self {
        Self { ctx }
    }

    pub async fn apply_forward(&self, subject: &Translation, change: ForwardChange) -> ForwardOutcome {
        // Captured before the call goes out so the outcome cannot affect it.
        let previous_state = subject.fields();
        let description = change.description(subject);

        if let Err(e) = change.validate() {
            self.report_forward_failure(subject, &change, &e);
            return ForwardOutcome::Failed(e);
        }

        let fields = change.apply_to(&previous_state);
        info!("{}: {} -> {}", description, previous_state.status, fields.status);

        let result = self.ctx.api.update_translation(subject.id, &fields).await;
        if !self.ctx.is_alive() {
            debug!("{} completed after teardown", description);
            return ForwardOutcome::Discarded;
        }

        match result {
            Ok(updated) => {
                let undo_id = lock(&self.ctx.history).append(
                    change.kind(),
                    subject.id,
                    previous_state,
                    description.clone(),
                );
                lock(&self.ctx.view).apply_update(&updated);

                let mut opts = NotificationOptions::success(change.success_title())
                    .detail(format!("{} succeeded.", description));
                if change.offers_undo() {
                    opts = opts.undo(undo_id);
                }
                self.ctx.notify(opts);
                self.ctx.refetch().await;

                ForwardOutcome::Applied { undo_id, updated }
            }
            Err(e) => {
                warn!("{} failed: {}", description, e);
                self.report_forward_failure(subject, &change, &e);
                ForwardOutcome::Failed(e)
            }
        }
    }

    fn report_forward_failure(&self, subject: &Translation, change: &ForwardChange, e: &ApiError) {
        let mut opts = NotificationOptions::error(change.failure_title()).detail(e.detail());
        if e.is_retryable() {
            opts = opts.retry(RetryAction::Forward {
                subject: subject.clone(),
                change: change.clone(),
            });
        }
        self.ctx.notify(opts);
    }

    /// Undo a specific logged action.
    pub async fn apply_inverse(&self, id: UndoId) -> InverseOutcome {
        let entry = lock(&self.ctx.history).pop_by_id(id);
        match entry {
            Some(entry) => self.revert(entry).await,
            None => {
                debug!("{} is no longer in the undo history", id);
                InverseOutcome::NotFound
            }
        }
    }

    /// Undo whatever completed most recently.
    pub async fn undo_last(&self) -> InverseOutcome {
        let entry = lock(&self.ctx.history).pop_most_recent();
        match entry {
            Some(entry) => self.revert(entry).await,
            None => {
                debug!("Undo history is empty");
                InverseOutcome::NotFound
            }
        }
    }

    async fn revert(&self, entry: UndoAction) -> InverseOutcome {
        info!("Undoing {} ({})", entry.id, entry.description);
        let result = self
            .ctx
            .api
            .update_translation(entry.subject_id, &entry.previous_state)
            .await;
        if !self.ctx.is_alive() {
            debug!("Undo of {} completed after teardown", entry.id);
            return InverseOutcome::Discarded;
        }

        match result {
            Ok(restored) => {
                lock(&self.ctx.view).apply_update(&restored);
                self.ctx.notify(
                    NotificationOptions::success("Action Undone")
                        .detail(format!("Reverted: {}.", entry.description)),
                );
                self.ctx.refetch().await;
                InverseOutcome::Reverted(restored)
            }
            Err(e) => {
                warn!("Undo of {} failed: {}", entry.id, e);
                self.ctx.notify(
                    NotificationOptions::error("Failed to Undo")
                        .detail(format!("Could not revert {}. {}", entry.description, e.detail()))
                        .persistent(),
                );
                InverseOutcome::Failed(e)
            }
        }
    }
}
