//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::types::PageId;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Query(err.to_string())
    }

    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

/// Row predicate used when bulk-loading settings into the cache.
///
/// The two scopes differ: the global load honours the module
/// `active` flag while the per-module load reads every stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkLoadScope {
    /// Settings whose owning module is marked active.
    ActiveModules,
    /// Every settings row regardless of module state.
    AllModules,
}

impl BulkLoadScope {
    pub fn as_str(self) -> &'static str {
        match self {
            BulkLoadScope::ActiveModules => "active_modules",
            BulkLoadScope::AllModules => "all_modules",
        }
    }
}

/// One stored setting with its still-encoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingRow {
    pub module: String,
    pub name: String,
    pub value: String,
}

#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn load_settings(&self, scope: BulkLoadScope) -> Result<Vec<SettingRow>, RepoError>;

    /// Insert the setting, or replace its value when `(module, name)` exists.
    async fn upsert_setting(&self, module: &str, name: &str, value: &str)
    -> Result<(), RepoError>;
}

/// Page header joined with its meta and template rows. Payload columns stay encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeaderRow {
    pub id: i64,
    pub revision_id: i64,
    pub template_id: i64,
    pub title: String,
    pub navigation_title: String,
    pub navigation_title_overwrite: bool,
    pub data: Option<String>,
    pub meta_title: String,
    pub meta_title_overwrite: bool,
    pub meta_keywords: String,
    pub meta_keywords_overwrite: bool,
    pub meta_description: String,
    pub meta_description_overwrite: bool,
    pub meta_custom: Option<String>,
    pub url: String,
    pub url_overwrite: bool,
    pub template_path: String,
    pub template_data: Option<String>,
}

/// Block row left-joined with its extra; extra columns are `None` without a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBlockRow {
    pub id: i64,
    pub extra_id: Option<i64>,
    pub html: String,
    pub extra_module: Option<String>,
    pub extra_type: Option<String>,
    pub extra_action: Option<String>,
    pub extra_data: Option<String>,
}

#[async_trait]
pub trait PagesRepo: Send + Sync {
    /// The active, visible page with `id` in `language`, if any.
    async fn find_active_page(
        &self,
        id: PageId,
        language: &str,
    ) -> Result<Option<PageHeaderRow>, RepoError>;

    /// Active blocks of `revision_id` ordered by block id.
    async fn list_active_blocks(&self, revision_id: i64) -> Result<Vec<PageBlockRow>, RepoError>;
}
