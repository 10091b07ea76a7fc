// tests/ingest_pipeline.rs
//
// Orchestration over the queue store, without HTTP:
// - sequential ingestions are stored most-recent-first
// - failures before the queue write leave the document untouched
// - two ingestions racing on the same queue version lose one item (last overwrite wins)

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use auto_news_ingest::error::{AppError, FetchError};
use auto_news_ingest::ingest::ingest_url;
use auto_news_ingest::ingest::types::{PageFetcher, RawPage};
use auto_news_ingest::store::memory::InMemoryBlobStore;
use auto_news_ingest::store::QueueStore;

const QUEUE_PATH: &str = "news/pending-queue.json";

/// Serves fixed markup per URL; unknown URLs answer HTTP 404.
struct StubFetcher {
    pages: HashMap<String, String>,
}

impl StubFetcher {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(u, html)| (u.to_string(), html.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &Url) -> Result<RawPage, FetchError> {
        let html = self
            .pages
            .get(url.as_str())
            .ok_or(FetchError::UpstreamStatus { status: 404 })?;
        Ok(RawPage {
            url: url.clone(),
            status: 200,
            content_type: Some("text/html".into()),
            body: html.as_bytes().to_vec(),
        })
    }
}

fn article(title: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body><nav>menu</nav>\
         <p>{title} reported strong quarterly deliveries across all of its electric models.</p>\
         </body></html>"
    )
}

const URL_A: &str = "https://a.example.com/news/1";
const URL_B: &str = "https://b.example.com/news/2";

fn setup() -> (Arc<InMemoryBlobStore>, QueueStore, StubFetcher) {
    let blob = Arc::new(InMemoryBlobStore::new());
    let queue = QueueStore::new(blob.clone(), QUEUE_PATH);
    let (a, b) = (article("Story A"), article("Story B"));
    let fetcher = StubFetcher::new(&[
        (URL_A, a.as_str()),
        (URL_B, b.as_str()),
        ("https://c.example.com/spa", "<html><title>App</title><div id=root></div></html>"),
    ]);
    (blob, queue, fetcher)
}

#[tokio::test]
async fn sequential_ingestions_are_newest_first() {
    let (_blob, queue, fetcher) = setup();

    let a = ingest_url(&fetcher, &queue, URL_A).await.expect("ingest A");
    let b = ingest_url(&fetcher, &queue, URL_B).await.expect("ingest B");

    let listed = queue.list_all().await;
    assert_eq!(listed, vec![b.clone(), a.clone()]);
    assert_eq!(a.source, "a.example.com");
    assert_eq!(a.title, "Story A");
    assert!(!a.text.contains("menu"));
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn no_usable_content_performs_no_write() {
    let (blob, queue, fetcher) = setup();

    let err = ingest_url(&fetcher, &queue, "https://c.example.com/spa")
        .await
        .expect_err("spa page has no content");
    assert!(matches!(err, AppError::Extract(_)));
    assert!(err.user_message().to_lowercase().contains("no usable content"));
    assert_eq!(blob.put_count(), 0);
    assert!(blob.get_raw(QUEUE_PATH).is_none());
}

#[tokio::test]
async fn fetch_failure_performs_no_write() {
    let (blob, queue, fetcher) = setup();
    ingest_url(&fetcher, &queue, URL_A).await.unwrap();
    let before = blob.get_raw(QUEUE_PATH);

    let err = ingest_url(&fetcher, &queue, "https://unknown.example.com/")
        .await
        .expect_err("404");
    assert!(matches!(
        err,
        AppError::Fetch(FetchError::UpstreamStatus { status: 404 })
    ));
    assert_eq!(blob.get_raw(QUEUE_PATH), before);
    assert_eq!(blob.put_count(), 1);
}

#[tokio::test]
async fn concurrent_ingestions_on_same_version_lose_one_item() {
    let (blob, queue, fetcher) = setup();
    // An existing document is needed so both writers actually read it.
    blob.insert_raw(QUEUE_PATH, b"[]".to_vec());
    blob.arm_read_barrier(2);

    let (ra, rb) = tokio::join!(
        ingest_url(&fetcher, &queue, URL_A),
        ingest_url(&fetcher, &queue, URL_B)
    );
    let (a, b) = (ra.expect("A reports success"), rb.expect("B reports success"));

    // Both writers reported success and both wrote, yet only one item survives.
    assert_eq!(blob.put_count(), 2);
    let listed = queue.list_all().await;
    assert_eq!(listed.len(), 1, "last overwrite wins: {listed:?}");
    assert!(listed[0] == a || listed[0] == b);
}

#[tokio::test]
async fn serialized_ingestions_keep_both_items() {
    let (_blob, queue, fetcher) = setup();
    ingest_url(&fetcher, &queue, URL_A).await.unwrap();
    ingest_url(&fetcher, &queue, URL_B).await.unwrap();
    assert_eq!(queue.list_all().await.len(), 2);
}

#[tokio::test]
async fn stored_url_is_the_submitted_string() {
    let blob = Arc::new(InMemoryBlobStore::new());
    let queue = QueueStore::new(blob, QUEUE_PATH);
    let body = article("Mixed case host");
    // The fetcher sees the normalized form; the queue keeps what the caller sent.
    let fetcher = StubFetcher::new(&[("https://www.example.com/", body.as_str())]);

    let item = ingest_url(&fetcher, &queue, "  https://WWW.Example.com  ")
        .await
        .expect("ingest");
    assert_eq!(item.url, "https://WWW.Example.com");
    assert_eq!(item.source, "www.example.com");
    assert_eq!(queue.list_all().await[0].url, "https://WWW.Example.com");
}
