use async_trait::async_trait;
use hn_comments::cache::CacheStore;
use hn_comments::filter::{parse_keywords, KeywordFilter, MatchMode};
use hn_comments::output::{self, Destination};
use hn_comments::resolver::ThreadResolver;
use hn_comments::source::{decode_comment, decode_thread, Comment, ItemSource, Thread};
use hn_comments::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Serves raw item JSON through the same decoders the HTTP client uses
struct FixtureSource {
    items: HashMap<u64, serde_json::Value>,
    calls: AtomicUsize,
}

impl FixtureSource {
    fn new() -> Self {
        Self {
            items: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn thread(mut self, id: u64, kids: &[u64]) -> Self {
        self.items
            .insert(id, serde_json::json!({ "id": id, "kids": kids, "type": "story" }));
        self
    }

    fn comment(mut self, id: u64, parent: u64, text: &str) -> Self {
        self.items.insert(
            id,
            serde_json::json!({ "by": "someone", "id": id, "parent": parent, "text": text, "type": "comment" }),
        );
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn body(&self, id: u64) -> Vec<u8> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let value = self.items.get(&id).cloned().unwrap_or(serde_json::Value::Null);
        serde_json::to_vec(&value).unwrap()
    }
}

#[async_trait]
impl ItemSource for FixtureSource {
    async fn fetch_thread(&self, id: u64) -> Result<Thread> {
        decode_thread(id, &self.body(id))
    }

    async fn fetch_comment(&self, id: u64) -> Result<Comment> {
        decode_comment(id, &self.body(id))
    }
}

#[test]
fn test_fixture_files_decode() {
    let thread: Thread =
        serde_json::from_str(&fs::read_to_string("tests/fixtures/thread.json").unwrap()).unwrap();
    let comment: Comment =
        serde_json::from_str(&fs::read_to_string("tests/fixtures/comment.json").unwrap()).unwrap();

    assert_eq!(thread.kids, vec![1001, 1002]);
    assert_eq!(comment.parent, 9996333);
}

#[tokio::test]
async fn test_keyword_scenario_writes_unescaped_match() {
    let temp_dir = TempDir::new().unwrap();
    let source = Arc::new(
        FixtureSource::new()
            .thread(9996333, &[1001, 1002])
            .comment(1001, 9996333, "I &amp; you")
            .comment(1002, 9996333, "Hiring in Berlin"),
    );
    let resolver = ThreadResolver::new(source, CacheStore::new(temp_dir.path().join("cache")));

    let resolution = resolver.resolve(9996333).await.unwrap();
    let filtered = KeywordFilter::new(&parse_keywords("you"), MatchMode::Any)
        .apply(resolution.comments);

    let out_path = temp_dir.path().join("comments.json");
    let written = output::write_json(&filtered, &Destination::File(out_path.clone()), false).unwrap();
    assert!(written);

    let parsed: Vec<Comment> =
        serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].id, 1001);
    assert_eq!(parsed[0].text, "I & you");
}

#[tokio::test]
async fn test_no_match_writes_no_file() {
    let temp_dir = TempDir::new().unwrap();
    let source = Arc::new(
        FixtureSource::new()
            .thread(2000, &[2001])
            .comment(2001, 2000, "hello world"),
    );
    let resolver = ThreadResolver::new(source, CacheStore::new(temp_dir.path().join("cache")));

    let resolution = resolver.resolve(2000).await.unwrap();
    let filtered = KeywordFilter::new(&parse_keywords("xyz"), MatchMode::Any)
        .apply(resolution.comments);
    assert!(filtered.is_empty());

    let out_path = temp_dir.path().join("comments.json");
    let written = output::write_json(&filtered, &Destination::File(out_path.clone()), false).unwrap();

    assert!(!written);
    assert!(!out_path.exists());
}

#[tokio::test]
async fn test_cached_thread_needs_no_network() {
    let temp_dir = TempDir::new().unwrap();
    let cache_root = temp_dir.path().join("cache");
    let source = Arc::new(
        FixtureSource::new()
            .thread(3000, &[3001, 3002, 3003])
            .comment(3001, 3000, "a")
            .comment(3002, 3000, "b")
            .comment(3003, 3000, "c"),
    );

    let first = ThreadResolver::new(source.clone(), CacheStore::new(&cache_root))
        .resolve(3000)
        .await
        .unwrap();
    assert_eq!(source.calls(), 4);
    assert_eq!(first.comments.len(), 3);

    // Fresh resolver over the same directory, as on a second run
    let second = ThreadResolver::new(source.clone(), CacheStore::new(&cache_root))
        .resolve(3000)
        .await
        .unwrap();

    assert!(second.from_cache);
    assert_eq!(source.calls(), 4);

    let mut first_ids: Vec<u64> = first.comments.iter().map(|c| c.id).collect();
    let mut second_ids: Vec<u64> = second.comments.iter().map(|c| c.id).collect();
    first_ids.sort_unstable();
    second_ids.sort_unstable();
    assert_eq!(first_ids, second_ids);
}

#[tokio::test]
async fn test_missing_child_aborts_without_cache_entry() {
    let temp_dir = TempDir::new().unwrap();
    let cache = CacheStore::new(temp_dir.path());
    // 4002 is never registered, so it decodes from `null`
    let source = Arc::new(
        FixtureSource::new()
            .thread(4000, &[4001, 4002])
            .comment(4001, 4000, "fine"),
    );

    let err = ThreadResolver::new(source, cache.clone())
        .resolve(4000)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { id: 4002, .. }));
    assert!(!cache.path_for(4000).exists());
}
