//! Domain entities assembled from persistent storage.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{codec::SettingValue, types::PageId};

/// Every setting of one module, keyed by setting name.
pub type ModuleSettings = BTreeMap<String, SettingValue>;

/// A page with its metadata, template and ordered content blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAggregate {
    pub id: PageId,
    pub revision_id: i64,
    pub template_id: i64,
    pub title: String,
    pub navigation_title: String,
    pub navigation_title_overwrite: bool,
    pub data: Option<SettingValue>,
    pub meta: PageMeta,
    pub template_path: String,
    pub template_data: Option<SettingValue>,
    pub blocks: Vec<PageBlock>,
}

/// Metadata denormalized from the `meta` relation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageMeta {
    pub title: String,
    pub title_overwrite: bool,
    pub keywords: String,
    pub keywords_overwrite: bool,
    pub description: String,
    pub description_overwrite: bool,
    pub custom: Option<String>,
    pub url: String,
    pub url_overwrite: bool,
}

/// One content block of a page revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageBlock {
    pub id: i64,
    pub extra_id: Option<i64>,
    pub html: String,
    pub extra: Option<BlockExtra>,
}

/// The extra a block delegates rendering to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockExtra {
    pub module: String,
    pub kind: String,
    pub action: Option<String>,
    pub data: Option<SettingValue>,
}

impl PageBlock {
    pub fn extra_module(&self) -> Option<&str> {
        self.extra.as_ref().map(|extra| extra.module.as_str())
    }

    pub fn extra_data(&self) -> Option<&SettingValue> {
        self.extra.as_ref().and_then(|extra| extra.data.as_ref())
    }
}
