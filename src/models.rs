use serde::{Deserialize, Serialize};
use std::fmt;

pub type TranslationId = i64;
pub type LanguageId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: LanguageId,
    pub name: String,
    pub iso_code: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Review status of a translation pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    Pending,
    Approved,
    Rejected,
}

impl TranslationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for TranslationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub id: TranslationId,
    pub source_text: String,
    pub target_text: String,
    pub source_language: Language,
    pub target_language: Language,
    pub status: TranslationStatus,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Translation {
    /// Snapshot of every field an update can change.
    pub fn fields(&self) -> TranslationFields {
        TranslationFields {
            source_text: self.source_text.clone(),
            target_text: self.target_text.clone(),
            source_lang_id: self.source_language.id,
            target_lang_id: self.target_language.id,
            status: self.status,
            domain: self.domain.clone(),
        }
    }
}

/// The mutable field set of a translation; also the body of
/// `PUT /translations/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationFields {
    pub source_text: String,
    pub target_text: String,
    pub source_lang_id: LanguageId,
    pub target_lang_id: LanguageId,
    pub status: TranslationStatus,
    #[serde(default)]
    pub domain: Option<String>,
}

/// New content for an edit. Status is not part of it: an edit always sends
/// the translation back to review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFields {
    pub source_text: String,
    pub target_text: String,
    pub source_lang_id: LanguageId,
    pub target_lang_id: LanguageId,
    pub domain: Option<String>,
}

impl EditFields {
    /// Start an edit from the current state of a translation.
    pub fn from_translation(translation: &Translation) -> Self {
        Self {
            source_text: translation.source_text.clone(),
            target_text: translation.target_text.clone(),
            source_lang_id: translation.source_language.id,
            target_lang_id: translation.target_language.id,
            domain: translation.domain.clone(),
        }
    }

    pub fn with_texts(mut self, source_text: &str, target_text: &str) -> Self {
        self.source_text = source_text.to_string();
        self.target_text = target_text.to_string();
        self
    }
}

/// Uniform action applied to a whole selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Approve,
    Reject,
}

impl BulkAction {
    pub fn status(self) -> TranslationStatus {
        match self {
            Self::Approve => TranslationStatus::Approved,
            Self::Reject => TranslationStatus::Rejected,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkUpdateRequest {
    pub translation_ids: Vec<TranslationId>,
    pub action: BulkAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<i64>,
}

/// Server-side partition of a bulk update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkUpdateResponse {
    #[serde(default)]
    pub success: Vec<TranslationId>,
    #[serde(default)]
    pub failed: Vec<TranslationId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslationPage {
    pub translations: Vec<Translation>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub prev_cursor: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguagesResponse {
    pub languages: Vec<Language>,
}

/// Query for one page of the filtered translation list. `page` is 0-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationQuery {
    pub page: u32,
    pub limit: u32,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub reviewer_id: Option<String>,
    pub search: Option<String>,
}

impl TranslationQuery {
    /// Query-string pairs; empty filters are left out. The backend pages
    /// from 1.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", (self.page + 1).to_string()),
            ("limit", self.limit.to_string()),
        ];
        let optional = [
            ("source_lang", &self.source_lang),
            ("target_lang", &self.target_lang),
            ("status", &self.status),
            ("created_at_start", &self.start_date),
            ("created_at_end", &self.end_date),
            ("reviewer_id", &self.reviewer_id),
            ("search", &self.search),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
                params.push((key, value.clone()));
            }
        }
        params
    }
}
