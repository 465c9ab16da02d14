use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::application::repos::{PageBlockRow, PageHeaderRow, PagesRepo, RepoError};
use crate::domain::{
    codec::{self, CodecError, DecodePolicy},
    entities::{BlockExtra, PageAggregate, PageBlock, PageMeta},
    error::DomainError,
    types::PageId,
};

/// Decode policy for each encoded page column.
///
/// The page's own payload must be valid; template and extra payloads are
/// dropped when they cannot be read.
pub const PAGE_DECODE_POLICY: [(&str, DecodePolicy); 3] = [
    (FIELD_PAGE_DATA, DecodePolicy::Strict),
    (FIELD_TEMPLATE_DATA, DecodePolicy::Lenient),
    (FIELD_BLOCK_DATA, DecodePolicy::Lenient),
];

const FIELD_PAGE_DATA: &str = "page.data";
const FIELD_TEMPLATE_DATA: &str = "template.data";
const FIELD_BLOCK_DATA: &str = "block.extra_data";

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("failed to decode `{field}`: {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: CodecError,
    },
    #[error(transparent)]
    InvalidId(#[from] DomainError),
}

/// Builds page aggregates from the page, meta, template and block relations.
#[derive(Clone)]
pub struct PageAssembler {
    pages: Arc<dyn PagesRepo>,
    language: String,
}

impl PageAssembler {
    pub fn new(pages: Arc<dyn PagesRepo>, language: impl Into<String>) -> Self {
        Self {
            pages,
            language: language.into(),
        }
    }

    /// Assemble the active page `id` in the configured language.
    ///
    /// Returns `Ok(None)` when no active, visible page matches.
    #[instrument(skip(self), fields(language = %self.language))]
    pub async fn get_page(&self, id: PageId) -> Result<Option<PageAggregate>, PageError> {
        let Some(header) = self.pages.find_active_page(id, &self.language).await? else {
            debug!(page_id = %id, "no active page");
            return Ok(None);
        };

        let mut page = assemble_header(header)?;

        let rows = self.pages.list_active_blocks(page.revision_id).await?;
        page.blocks = rows
            .into_iter()
            .map(assemble_block)
            .collect::<Result<Vec<_>, _>>()?;
        page.blocks.sort_by_key(|block| block.id);

        debug!(page_id = %page.id, blocks = page.blocks.len(), "page assembled");
        Ok(Some(page))
    }

    /// Parse `raw` as a page id and assemble that page.
    pub async fn get_page_by_raw_id(&self, raw: &str) -> Result<Option<PageAggregate>, PageError> {
        let id: PageId = raw.parse()?;
        self.get_page(id).await
    }
}

fn decode_field(
    field: &'static str,
    blob: Option<&str>,
) -> Result<Option<codec::SettingValue>, PageError> {
    let policy = PAGE_DECODE_POLICY
        .iter()
        .find_map(|(name, policy)| (*name == field).then_some(*policy))
        .unwrap_or(DecodePolicy::Strict);
    codec::decode_with(policy, field, blob).map_err(|source| PageError::Decode { field, source })
}

fn assemble_header(header: PageHeaderRow) -> Result<PageAggregate, PageError> {
    let data = decode_field(FIELD_PAGE_DATA, header.data.as_deref())?;
    let template_data = decode_field(FIELD_TEMPLATE_DATA, header.template_data.as_deref())?;

    Ok(PageAggregate {
        id: PageId::new(header.id),
        revision_id: header.revision_id,
        template_id: header.template_id,
        title: header.title,
        navigation_title: header.navigation_title,
        navigation_title_overwrite: header.navigation_title_overwrite,
        data,
        meta: PageMeta {
            title: header.meta_title,
            title_overwrite: header.meta_title_overwrite,
            keywords: header.meta_keywords,
            keywords_overwrite: header.meta_keywords_overwrite,
            description: header.meta_description,
            description_overwrite: header.meta_description_overwrite,
            custom: header.meta_custom,
            url: header.url,
            url_overwrite: header.url_overwrite,
        },
        template_path: header.template_path,
        template_data,
        blocks: Vec::new(),
    })
}

fn assemble_block(row: PageBlockRow) -> Result<PageBlock, PageError> {
    // The extra columns come from an outer join; no module means no matching extra.
    let extra = match row.extra_module {
        Some(module) => Some(BlockExtra {
            module,
            kind: row.extra_type.unwrap_or_default(),
            action: row.extra_action,
            data: decode_field(FIELD_BLOCK_DATA, row.extra_data.as_deref())?,
        }),
        None => None,
    };

    Ok(PageBlock {
        id: row.id,
        extra_id: row.extra_id,
        html: row.html,
        extra,
    })
}
