use std::sync::Mutex;

use tracing::{debug, info};

use crate::api::TranslationApi;
use crate::error::ApiError;
use crate::lock;
use crate::models::{Translation, TranslationId, TranslationPage, TranslationQuery};
use crate::retry::{with_retry, RetryConfig};

#[derive(Debug, Default)]
pub struct ViewCache {
    query: TranslationQuery,
    page: TranslationPage,
    generation: u64,
    stale: bool,
}

impl ViewCache {
    pub fn new(query: TranslationQuery) -> Self {
        Self {
            query,
            page: TranslationPage::default(),
            generation: 0,
            stale: true,
        }
    }

    pub fn query(&self) -> &TranslationQuery {
        &self.query
    }

    /// Switch to a new query; results of refetches already in flight are ignored.
    pub fn set_query(&mut self, query: TranslationQuery) {
        if query != self.query {
            self.query = query;
            self.generation += 1;
        }
        self.stale = true;
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn begin_refetch(&self) -> (u64, TranslationQuery) {
        (self.generation, self.query.clone())
    }

    /// Store a fetched page if it still belongs to the current query.
    pub fn complete_refetch(&mut self, generation: u64, page: TranslationPage) -> bool {
        if generation != self.generation {
            debug!(
                "Discarding page for generation {} (current {})",
                generation, self.generation
            );
            return false;
        }
        self.page = page;
        self.stale = false;
        true
    }

    /// Patch one row in place with what the server returned.
    pub fn apply_update(&mut self, updated: &Translation) -> bool {
        match self.page.translations.iter_mut().find(|t| t.id == updated.id) {
            Some(row) => {
                *row = updated.clone();
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> &[Translation] {
        &self.page.translations
    }

    pub fn find(&self, id: TranslationId) -> Option<&Translation> {
        self.page.translations.iter().find(|t| t.id == id)
    }

    pub fn visible_ids(&self) -> Vec<TranslationId> {
        self.page.translations.iter().map(|t| t.id).collect()
    }

    pub fn total(&self) -> u64 {
        self.page
            .total
            .unwrap_or(self.page.translations.len() as u64)
    }
}

/// Reload the current page into `view`.
pub async fn refetch<A: TranslationApi + ?Sized>(
    view: &Mutex<ViewCache>,
    api: &A,
    retry: &RetryConfig,
) -> Result<(), ApiError> {
    let (generation, query) = lock(view).begin_refetch();
    let page = with_retry(retry, "Refetch translations", || api.list_translations(&query)).await?;
    let rows = page.translations.len();
    if lock(view).complete_refetch(generation, page) {
        info!("Loaded {} translations (page {})", rows, query.page);
    }
    Ok(())
}
