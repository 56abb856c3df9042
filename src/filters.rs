use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::Instant;
use tracing::debug;

use crate::debounce::Debouncer;
use crate::error::ApiError;
use crate::models::{TranslationQuery, TranslationStatus};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    SourceLanguage,
    TargetLanguage,
    Status,
    StartDate,
    EndDate,
    Reviewer,
    Search,
}

impl FilterKey {
    pub const ALL: [FilterKey; 7] = [
        Self::SourceLanguage,
        Self::TargetLanguage,
        Self::Status,
        Self::StartDate,
        Self::EndDate,
        Self::Reviewer,
        Self::Search,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceLanguage => "source",
            Self::TargetLanguage => "target",
            Self::Status => "status",
            Self::StartDate => "from",
            Self::EndDate => "to",
            Self::Reviewer => "reviewer",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown filter '{}'", s))
    }
}

/// One filter value per key; an empty string means "not filtered".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationFilters {
    pub source_language: String,
    pub target_language: String,
    pub status: String,
    pub start_date: String,
    pub end_date: String,
    pub reviewer: String,
    pub search: String,
}

impl TranslationFilters {
    fn slot(&mut self, key: FilterKey) -> &mut String {
        match key {
            FilterKey::SourceLanguage => &mut self.source_language,
            FilterKey::TargetLanguage => &mut self.target_language,
            FilterKey::Status => &mut self.status,
            FilterKey::StartDate => &mut self.start_date,
            FilterKey::EndDate => &mut self.end_date,
            FilterKey::Reviewer => &mut self.reviewer,
            FilterKey::Search => &mut self.search,
        }
    }

    pub fn get(&self, key: FilterKey) -> &str {
        match key {
            FilterKey::SourceLanguage => &self.source_language,
            FilterKey::TargetLanguage => &self.target_language,
            FilterKey::Status => &self.status,
            FilterKey::StartDate => &self.start_date,
            FilterKey::EndDate => &self.end_date,
            FilterKey::Reviewer => &self.reviewer,
            FilterKey::Search => &self.search,
        }
    }

    pub fn set(&mut self, key: FilterKey, value: &str) {
        *self.slot(key) = value.trim().to_string();
    }

    pub fn active(&self) -> Vec<(FilterKey, &str)> {
        FilterKey::ALL
            .into_iter()
            .map(|key| (key, self.get(key)))
            .filter(|(_, value)| !value.is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.active().is_empty()
    }

    pub fn to_query(&self, page: u32, limit: u32) -> TranslationQuery {
        let opt = |value: &str| Some(value.to_string()).filter(|v| !v.is_empty());
        TranslationQuery {
            page,
            limit,
            source_lang: opt(&self.source_language),
            target_lang: opt(&self.target_language),
            status: opt(&self.status),
            start_date: opt(&self.start_date),
            end_date: opt(&self.end_date),
            reviewer_id: opt(&self.reviewer),
            search: opt(&self.search),
        }
    }
}

/// Check a raw value and return it in the form the server expects.
fn normalize(key: FilterKey, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(String::new());
    }
    match key {
        FilterKey::Status => TranslationStatus::parse(value)
            .map(|status| status.as_str().to_string())
            .ok_or_else(|| ApiError::validation(format!("Invalid status '{}'", value))),
        FilterKey::StartDate | FilterKey::EndDate => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|date| date.format("%Y-%m-%d").to_string())
            .map_err(|_| {
                ApiError::validation(format!("Invalid date '{}', expected YYYY-MM-DD", value))
            }),
        _ => Ok(value.to_string()),
    }
}

#[derive(Debug)]
pub struct FilterState {
    draft: TranslationFilters,
    applied: TranslationFilters,
    debounce: Debouncer<TranslationFilters>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl FilterState {
    pub fn new(delay: Duration) -> Self {
        Self {
            draft: TranslationFilters::default(),
            applied: TranslationFilters::default(),
            debounce: Debouncer::new(delay),
        }
    }

    pub fn draft(&self) -> &TranslationFilters {
        &self.draft
    }

    pub fn applied(&self) -> &TranslationFilters {
        &self.applied
    }

    /// Edit the draft; it is applied once the debounce period passes.
    pub fn set(&mut self, key: FilterKey, value: &str) -> Result<(), ApiError> {
        let value = normalize(key, value)?;
        self.draft.set(key, &value);
        self.debounce.set(self.draft.clone());
        debug!("Filter {} = '{}' (pending)", key, value);
        Ok(())
    }

    /// Remove one filter right away. Returns true if the applied set changed.
    pub fn remove(&mut self, key: FilterKey) -> bool {
        self.draft.set(key, "");
        if self.debounce.is_pending() {
            self.debounce.set(self.draft.clone());
        }
        let before = self.applied.clone();
        self.applied.set(key, "");
        before != self.applied
    }

    /// Drop every filter right away. Returns true if the applied set changed.
    pub fn clear_all(&mut self) -> bool {
        self.debounce.cancel();
        self.draft = TranslationFilters::default();
        let changed = !self.applied.is_empty();
        self.applied = TranslationFilters::default();
        changed
    }

    /// Apply the draft if its quiet period has passed. Returns true if the
    /// applied set changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.debounce.poll(now) {
            Some(filters) if filters != self.applied => {
                self.applied = filters;
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_filter_key_parse() {
        assert_eq!("status".parse::<FilterKey>().unwrap(), FilterKey::Status);
        assert_eq!("from".parse::<FilterKey>().unwrap(), FilterKey::StartDate);
        assert!("colour".parse::<FilterKey>().is_err());
    }

    #[test]
    fn test_to_query_skips_empty() {
        let mut filters = TranslationFilters::default();
        filters.set(FilterKey::Status, "pending");
        filters.set(FilterKey::Search, "  hello ");

        let query = filters.to_query(2, 25);
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 25);
        assert_eq!(query.status.as_deref(), Some("pending"));
        assert_eq!(query.search.as_deref(), Some("hello"));
        assert!(query.source_lang.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut state = FilterState::default();

        let err = state.set(FilterKey::Status, "maybe").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(state.set(FilterKey::StartDate, "31/12/2024").is_err());
        assert!(state.set(FilterKey::StartDate, "2024-12-31").is_ok());
        assert!(state.set(FilterKey::Status, "").is_ok());

        state.set(FilterKey::Status, "Approved").unwrap();
        assert_eq!(state.draft().status, "approved");
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_applies_after_debounce() {
        let mut state = FilterState::default();
        state.set(FilterKey::Search, "h").unwrap();
        state.set(FilterKey::Search, "he").unwrap();

        assert!(!state.poll(Instant::now()));
        assert_eq!(state.draft().search, "he");
        assert!(state.applied().is_empty());

        tokio::time::advance(DEFAULT_DEBOUNCE).await;
        assert!(state.poll(Instant::now()));
        assert_eq!(state.applied().search, "he");
        assert!(state.next_deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_is_immediate() {
        let mut state = FilterState::default();
        state.set(FilterKey::Status, "approved").unwrap();
        tokio::time::advance(DEFAULT_DEBOUNCE).await;
        state.poll(Instant::now());

        assert!(state.remove(FilterKey::Status));
        assert!(state.applied().is_empty());
        assert!(!state.remove(FilterKey::Status));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_overrides_pending_edit() {
        let mut state = FilterState::default();
        state.set(FilterKey::Reviewer, "7").unwrap();
        state.set(FilterKey::Search, "x").unwrap();
        state.remove(FilterKey::Reviewer);

        tokio::time::advance(DEFAULT_DEBOUNCE).await;
        assert!(state.poll(Instant::now()));
        assert_eq!(state.applied().reviewer, "");
        assert_eq!(state.applied().search, "x");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all_cancels_pending() {
        let mut state = FilterState::default();
        state.set(FilterKey::Search, "x").unwrap();
        tokio::time::advance(DEFAULT_DEBOUNCE).await;
        state.poll(Instant::now());
        state.set(FilterKey::Status, "pending").unwrap();

        assert!(state.clear_all());
        tokio::time::advance(DEFAULT_DEBOUNCE).await;
        assert!(!state.poll(Instant::now()));
        assert!(state.applied().is_empty());
        assert!(state.draft().is_empty());
    }
}
