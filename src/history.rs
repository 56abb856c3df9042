use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::models::{TranslationFields, TranslationId};

pub const DEFAULT_MAX_HISTORY: usize = 10;
pub const DEFAULT_RECENT_WINDOW: Duration = Duration::from_millis(5000);

/// Opaque handle to a logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UndoId(u64);

impl fmt::Display for UndoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "undo-{}", self.0)
    }
}

impl std::str::FromStr for UndoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("undo-").unwrap_or(s);
        digits.parse().map(UndoId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Approve,
    Reject,
    Edit,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Edit => "edit",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoAction {
    pub id: UndoId,
    pub kind: ActionKind,
    pub subject_id: TranslationId,
    /// Every mutable field as it was before the forward call was sent.
    pub previous_state: TranslationFields,
    pub created_at: Instant,
    pub description: String,
}

/// Most-recent-first, bounded. Past capacity the oldest entry is dropped.
#[derive(Debug)]
pub struct ActionLog {
    entries: VecDeque<UndoAction>,
    max_size: usize,
    next_id: u64,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl ActionLog {
    /// # Panics
    /// Panics if `max_size` is 0
    pub fn new(max_size: usize) -> Self {
        assert!(max_size >= 1, "ActionLog max_size must be >= 1");
        Self {
            entries: VecDeque::with_capacity(max_size + 1),
            max_size,
            next_id: 1,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Record a completed action at the head; evicts from the tail when full.
    pub fn append(
        &mut self,
        kind: ActionKind,
        subject_id: TranslationId,
        previous_state: TranslationFields,
        description: impl Into<String>,
    ) -> UndoId {
        let id = UndoId(self.next_id);
        self.next_id += 1;

        self.entries.push_front(UndoAction {
            id,
            kind,
            subject_id,
            previous_state,
            created_at: Instant::now(),
            description: description.into(),
        });

        while self.entries.len() > self.max_size {
            if let Some(evicted) = self.entries.pop_back() {
                debug!("Evicted {} ({}) from undo history", evicted.id, evicted.description);
            }
        }

        id
    }

    /// Remove and return the most recently completed action.
    pub fn pop_most_recent(&mut self) -> Option<UndoAction> {
        self.entries.pop_front()
    }

    /// Remove and return the entry with `id`. `None` if it was already
    /// consumed, evicted or cleared.
    pub fn pop_by_id(&mut self, id: UndoId) -> Option<UndoAction> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        self.entries.remove(index)
    }

    pub fn last(&self) -> Option<&UndoAction> {
        self.entries.front()
    }

    /// Snapshot, most recent first.
    pub fn entries(&self) -> Vec<UndoAction> {
        self.entries.iter().cloned().collect()
    }

    pub fn is_recently_modified(&self, subject_id: TranslationId, window: Duration) -> bool {
        let now = Instant::now();
        self.entries.iter().any(|entry| {
            entry.subject_id == subject_id && now.duration_since(entry.created_at) < window
        })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TranslationStatus;
    use proptest::prelude::*;

    fn snapshot(text: &str) -> TranslationFields {
        TranslationFields {
            source_text: text.to_string(),
            target_text: text.to_uppercase(),
            source_lang_id: 1,
            target_lang_id: 2,
            status: TranslationStatus::Pending,
            domain: None,
        }
    }

    fn subjects(log: &ActionLog) -> Vec<TranslationId> {
        log.entries().iter().map(|e| e.subject_id).collect()
    }

    // ==================== Append / Eviction Tests ====================

    #[test]
    fn test_append_returns_distinct_ids() {
        let mut log = ActionLog::default();
        let a = log.append(ActionKind::Approve, 1, snapshot("a"), "Approve #1");
        let b = log.append(ActionKind::Approve, 1, snapshot("a"), "Approve #1");

        assert_ne!(a, b);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut log = ActionLog::new(2);
        let a = log.append(ActionKind::Approve, 1, snapshot("a"), "A");
        log.append(ActionKind::Approve, 2, snapshot("b"), "B");
        log.append(ActionKind::Reject, 3, snapshot("c"), "C");

        assert_eq!(subjects(&log), vec![3, 2]);
        assert!(log.pop_by_id(a).is_none());
    }

    #[test]
    fn test_churn_keeps_ten_most_recent() {
        let mut log = ActionLog::new(10);
        let ids: Vec<UndoId> = (1..=15)
            .map(|n| log.append(ActionKind::Approve, n, snapshot("x"), format!("#{}", n)))
            .collect();

        assert_eq!(log.len(), 10);
        for evicted in &ids[..5] {
            assert!(log.pop_by_id(*evicted).is_none());
        }
        assert_eq!(subjects(&log), (6..=15).rev().collect::<Vec<_>>());
    }

    #[test]
    #[should_panic(expected = "max_size must be >= 1")]
    fn test_zero_capacity_panics() {
        let _ = ActionLog::new(0);
    }

    // ==================== Pop Tests ====================

    #[test]
    fn test_pop_most_recent() {
        let mut log = ActionLog::default();
        assert!(log.pop_most_recent().is_none());

        log.append(ActionKind::Approve, 1, snapshot("a"), "A");
        log.append(ActionKind::Reject, 2, snapshot("b"), "B");

        let popped = log.pop_most_recent().unwrap();
        assert_eq!(popped.subject_id, 2);
        assert_eq!(popped.kind, ActionKind::Reject);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_pop_by_id_out_of_order() {
        let mut log = ActionLog::default();
        let older = log.append(ActionKind::Approve, 1, snapshot("a"), "A");
        log.append(ActionKind::Approve, 2, snapshot("b"), "B");

        let popped = log.pop_by_id(older).unwrap();
        assert_eq!(popped.subject_id, 1);
        assert_eq!(popped.previous_state, snapshot("a"));
        assert_eq!(subjects(&log), vec![2]);
    }

    #[test]
    fn test_pop_by_id_twice_is_safe() {
        let mut log = ActionLog::default();
        let id = log.append(ActionKind::Approve, 1, snapshot("a"), "A");

        assert!(log.pop_by_id(id).is_some());
        assert!(log.pop_by_id(id).is_none());
    }

    #[test]
    fn test_clear() {
        let mut log = ActionLog::default();
        let id = log.append(ActionKind::Edit, 1, snapshot("a"), "A");
        log.clear();

        assert!(log.is_empty());
        assert!(!log.can_undo());
        assert!(log.pop_by_id(id).is_none());
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut log = ActionLog::default();
        let before = log.append(ActionKind::Edit, 1, snapshot("a"), "A");
        log.clear();
        let after = log.append(ActionKind::Edit, 1, snapshot("a"), "A");

        assert_ne!(before, after);
    }

    #[test]
    fn test_undo_id_display_and_parse() {
        let mut log = ActionLog::default();
        let id = log.append(ActionKind::Approve, 1, snapshot("a"), "A");

        assert_eq!(id.to_string(), "undo-1");
        assert_eq!("undo-1".parse::<UndoId>().unwrap(), id);
        assert_eq!("1".parse::<UndoId>().unwrap(), id);
        assert!("undo-x".parse::<UndoId>().is_err());
    }

    // ==================== Recently Modified Tests ====================

    #[tokio::test(start_paused = true)]
    async fn test_recently_modified_window() {
        let mut log = ActionLog::default();
        log.append(ActionKind::Approve, 42, snapshot("a"), "A");

        assert!(log.is_recently_modified(42, DEFAULT_RECENT_WINDOW));
        assert!(!log.is_recently_modified(7, DEFAULT_RECENT_WINDOW));

        tokio::time::advance(Duration::from_millis(5001)).await;
        assert!(!log.is_recently_modified(42, DEFAULT_RECENT_WINDOW));
        assert!(log.is_recently_modified(42, Duration::from_secs(60)));
    }

    // ==================== Property Tests ====================

    proptest! {
        #[test]
        fn prop_log_never_exceeds_capacity(cap in 1usize..16, appends in 0usize..64) {
            let mut log = ActionLog::new(cap);
            for n in 0..appends {
                log.append(ActionKind::Approve, n as i64, snapshot("p"), "p");
                prop_assert!(log.len() <= cap);
            }
            let expected: Vec<i64> = (0..appends as i64).rev().take(cap).collect();
            prop_assert_eq!(subjects(&log), expected);
        }
    }
}
