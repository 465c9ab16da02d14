//! Page aggregation through the public API against an in-memory store.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use serde_json::json;

use tessera::{
    application::{
        page::{PageAssembler, PageError},
        repos::{PageBlockRow, PageHeaderRow, PagesRepo, RepoError},
    },
    domain::{codec, types::PageId},
};

/// Active pages keyed by `(id, language)` and active blocks by revision, in insertion order.
#[derive(Default)]
struct InMemoryPages {
    pages: HashMap<(i64, String), PageHeaderRow>,
    blocks: HashMap<i64, Vec<PageBlockRow>>,
    block_queries: AtomicUsize,
}

#[async_trait]
impl PagesRepo for InMemoryPages {
    async fn find_active_page(
        &self,
        id: PageId,
        language: &str,
    ) -> Result<Option<PageHeaderRow>, RepoError> {
        Ok(self.pages.get(&(id.get(), language.to_string())).cloned())
    }

    async fn list_active_blocks(&self, revision_id: i64) -> Result<Vec<PageBlockRow>, RepoError> {
        self.block_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.blocks.get(&revision_id).cloned().unwrap_or_default())
    }
}

fn header(id: i64, revision_id: i64) -> PageHeaderRow {
    PageHeaderRow {
        id,
        revision_id,
        template_id: 3,
        title: "About us".into(),
        navigation_title: "About".into(),
        navigation_title_overwrite: true,
        data: Some(codec::encode(&json!({ "hero": "team.jpg" })).expect("encode")),
        meta_title: "About Tessera".into(),
        meta_title_overwrite: false,
        meta_keywords: "about,team".into(),
        meta_keywords_overwrite: false,
        meta_description: "Who we are".into(),
        meta_description_overwrite: false,
        meta_custom: None,
        url: "about".into(),
        url_overwrite: false,
        template_path: "layouts/two-column".into(),
        template_data: Some("not a payload".into()),
    }
}

fn block(id: i64) -> PageBlockRow {
    PageBlockRow {
        id,
        extra_id: None,
        html: format!("<p>block {id}</p>"),
        extra_module: None,
        extra_type: None,
        extra_action: None,
        extra_data: None,
    }
}

fn store() -> Arc<InMemoryPages> {
    let mut pages = HashMap::new();
    pages.insert((7, "en".to_string()), header(7, 70));

    let mut gallery = block(2);
    gallery.extra_id = Some(11);
    gallery.extra_module = Some("gallery".into());
    gallery.extra_type = Some("grid".into());
    gallery.extra_data = Some(codec::encode(&json!({ "album": 4 })).expect("encode"));

    let mut blocks = HashMap::new();
    blocks.insert(70, vec![block(5), gallery, block(9)]);

    Arc::new(InMemoryPages {
        pages,
        blocks,
        ..Default::default()
    })
}

#[tokio::test]
async fn page_is_assembled_with_ordered_blocks() {
    let store = store();
    let assembler = PageAssembler::new(store.clone(), "en");

    let page = assembler
        .get_page(PageId::new(7))
        .await
        .expect("query")
        .expect("page exists");

    let ids: Vec<i64> = page.blocks.iter().map(|block| block.id).collect();
    assert_eq!(ids, vec![2, 5, 9]);
    assert_eq!(page.data, Some(json!({ "hero": "team.jpg" })));
    assert_eq!(page.template_data, None);
    assert_eq!(page.blocks[0].extra_module(), Some("gallery"));
    assert_eq!(page.blocks[0].extra_data(), Some(&json!({ "album": 4 })));
    assert!(page.blocks[1].extra.is_none());
    assert_eq!(store.block_queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn other_language_is_not_found() {
    let store = store();
    let assembler = PageAssembler::new(store.clone(), "de");

    let page = assembler.get_page(PageId::new(7)).await.expect("query");

    assert!(page.is_none());
    assert_eq!(store.block_queries.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn raw_ids_are_parsed() {
    let assembler = PageAssembler::new(store(), "en");

    let page = assembler.get_page_by_raw_id(" 7 ").await.expect("query");
    assert!(page.is_some());

    let err = assembler
        .get_page_by_raw_id("seven")
        .await
        .expect_err("not numeric");
    assert!(matches!(err, PageError::InvalidId(_)));
}

#[tokio::test]
async fn aggregate_serializes_for_output() {
    let assembler = PageAssembler::new(store(), "en");
    let page = assembler
        .get_page(PageId::new(7))
        .await
        .expect("query")
        .expect("page exists");

    let rendered = serde_json::to_value(&page).expect("serialize");
    assert_eq!(rendered["id"], json!(7));
    assert_eq!(rendered["meta"]["url"], json!("about"));
    assert_eq!(rendered["blocks"][0]["extra"]["kind"], json!("grid"));
}
