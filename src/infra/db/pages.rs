use async_trait::async_trait;

use crate::{
    application::repos::{PageBlockRow, PageHeaderRow, PagesRepo, RepoError},
    domain::types::{PageId, RecordStatus, flag, parse_flag},
};

use super::{PostgresRepositories, map_sqlx_error};

const FIND_ACTIVE_PAGE_SQL: &str = r#"
    SELECT p.id, p.revision_id, p.template_id, p.title, p.navigation_title,
           p.navigation_title_overwrite, p.data,
           m.title AS meta_title, m.title_overwrite AS meta_title_overwrite,
           m.keywords AS meta_keywords, m.keywords_overwrite AS meta_keywords_overwrite,
           m.description AS meta_description,
           m.description_overwrite AS meta_description_overwrite,
           m.custom AS meta_custom,
           m.url, m.url_overwrite,
           t.path AS template_path, t.data AS template_data
    FROM pages AS p
    INNER JOIN meta AS m ON p.meta_id = m.id
    INNER JOIN pages_templates AS t ON p.template_id = t.id
    WHERE p.id = $1 AND p.status = $2 AND p.hidden = $3 AND p.language = $4
    LIMIT 1
"#;

const LIST_ACTIVE_BLOCKS_SQL: &str = r#"
    SELECT pb.id, pb.extra_id, pb.html,
           pe.module AS extra_module, pe.type AS extra_type,
           pe.action AS extra_action, pe.data AS extra_data
    FROM pages_blocks AS pb
    LEFT OUTER JOIN pages_extras AS pe ON pb.extra_id = pe.id
    WHERE pb.revision_id = $1 AND pb.status = $2
    ORDER BY pb.id
"#;

#[derive(sqlx::FromRow)]
struct PageRow {
    id: i64,
    revision_id: i64,
    template_id: i64,
    title: String,
    navigation_title: String,
    navigation_title_overwrite: String,
    data: Option<String>,
    meta_title: String,
    meta_title_overwrite: String,
    meta_keywords: String,
    meta_keywords_overwrite: String,
    meta_description: String,
    meta_description_overwrite: String,
    meta_custom: Option<String>,
    url: String,
    url_overwrite: String,
    template_path: String,
    template_data: Option<String>,
}

impl From<PageRow> for PageHeaderRow {
    fn from(row: PageRow) -> Self {
        Self {
            id: row.id,
            revision_id: row.revision_id,
            template_id: row.template_id,
            title: row.title,
            navigation_title: row.navigation_title,
            navigation_title_overwrite: parse_flag(&row.navigation_title_overwrite),
            data: row.data,
            meta_title: row.meta_title,
            meta_title_overwrite: parse_flag(&row.meta_title_overwrite),
            meta_keywords: row.meta_keywords,
            meta_keywords_overwrite: parse_flag(&row.meta_keywords_overwrite),
            meta_description: row.meta_description,
            meta_description_overwrite: parse_flag(&row.meta_description_overwrite),
            meta_custom: row.meta_custom,
            url: row.url,
            url_overwrite: parse_flag(&row.url_overwrite),
            template_path: row.template_path,
            template_data: row.template_data,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BlockRow {
    id: i64,
    extra_id: Option<i64>,
    html: Option<String>,
    extra_module: Option<String>,
    extra_type: Option<String>,
    extra_action: Option<String>,
    extra_data: Option<String>,
}

impl From<BlockRow> for PageBlockRow {
    fn from(row: BlockRow) -> Self {
        Self {
            id: row.id,
            extra_id: row.extra_id,
            html: row.html.unwrap_or_default(),
            extra_module: row.extra_module,
            extra_type: row.extra_type,
            extra_action: row.extra_action,
            extra_data: row.extra_data,
        }
    }
}

#[async_trait]
impl PagesRepo for PostgresRepositories {
    async fn find_active_page(
        &self,
        id: PageId,
        language: &str,
    ) -> Result<Option<PageHeaderRow>, RepoError> {
        let row = sqlx::query_as::<_, PageRow>(FIND_ACTIVE_PAGE_SQL)
            .bind(id.get())
            .bind(RecordStatus::Active.as_str())
            .bind(flag(false))
            .bind(language)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PageHeaderRow::from))
    }

    async fn list_active_blocks(&self, revision_id: i64) -> Result<Vec<PageBlockRow>, RepoError> {
        let rows = sqlx::query_as::<_, BlockRow>(LIST_ACTIVE_BLOCKS_SQL)
            .bind(revision_id)
            .bind(RecordStatus::Active.as_str())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PageBlockRow::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_columns_become_booleans() {
        let header = PageHeaderRow::from(PageRow {
            id: 1,
            revision_id: 14,
            template_id: 3,
            title: "Home".into(),
            navigation_title: "Home".into(),
            navigation_title_overwrite: "N".into(),
            data: None,
            meta_title: "Home".into(),
            meta_title_overwrite: "Y".into(),
            meta_keywords: String::new(),
            meta_keywords_overwrite: "N".into(),
            meta_description: String::new(),
            meta_description_overwrite: "N".into(),
            meta_custom: None,
            url: "home".into(),
            url_overwrite: "Y".into(),
            template_path: "core/layout/templates/home.tpl".into(),
            template_data: None,
        });

        assert!(!header.navigation_title_overwrite);
        assert!(header.meta_title_overwrite);
        assert!(header.url_overwrite);
    }

    #[test]
    fn null_block_html_becomes_empty() {
        let block = PageBlockRow::from(BlockRow {
            id: 3,
            extra_id: Some(9),
            html: None,
            extra_module: Some("search".into()),
            extra_type: Some("widget".into()),
            extra_action: None,
            extra_data: None,
        });

        assert_eq!(block.html, "");
        assert_eq!(block.extra_id, Some(9));
    }
}
