//! Content fetching.
//!
//! A template's content object is assembled from a JSON file and a
//! same-named directory:
//!
//! ```text
//! content/blog/post.json        {"title": "Post", "draft": true}
//! content/blog/post/draft.json  false
//! content/blog/post/body.md     # Hello
//! ```
//!
//! yields `{"title": "Post", "draft": false, "body": "<h1>Hello</h1>\n"}`.
//! Directory entries are layered over the file, so the directory wins on
//! key collision.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use stencil_render::{Content, Registry};
use stencil_storage::{DirEntry, EntryKind, Storage};
use tokio::sync::OnceCell;
use tokio::task::JoinSet;

use crate::BoxFuture;
use crate::error::ContentError;

/// Reads and merges structured content for templates.
pub struct ContentFetcher {
    storage: Arc<dyn Storage>,
    registry: Arc<Registry>,
    shared_path: Option<PathBuf>,
    shared: OnceCell<Arc<Content>>,
}

impl ContentFetcher {
    /// Create a fetcher. `shared_path` is the logical path of content shared
    /// by every template.
    pub fn new(
        storage: Arc<dyn Storage>,
        registry: Arc<Registry>,
        shared_path: Option<PathBuf>,
    ) -> Self {
        Self {
            storage,
            registry,
            shared_path,
            shared: OnceCell::new(),
        }
    }

    /// Shared content, fetched on first use and reused afterwards.
    pub async fn shared(self: &Arc<Self>) -> Result<Arc<Content>, ContentError> {
        let Some(path) = &self.shared_path else {
            return Ok(Arc::default());
        };
        let content = self
            .shared
            .get_or_try_init(|| async {
                tracing::debug!(path = %path.display(), "Fetching shared content");
                self.fetch_content(path).await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(content))
    }

    /// Merged content for the logical content path `path`.
    ///
    /// Reads `path.json` and the directory `path` concurrently. A missing
    /// file or directory contributes nothing, but a sub-directory of `path`
    /// that cannot be listed is an error.
    pub async fn fetch_content(self: &Arc<Self>, path: &Path) -> Result<Content, ContentError> {
        let json_path = with_json_extension(path);
        let (file, dir) = tokio::join!(
            self.fetch_content_file(&json_path),
            self.fetch_content_from_dir(path),
        );

        let mut content = file?;
        match dir {
            Ok(entries) => content.extend(entries),
            // Only the top directory may be absent; nested listing errors fail.
            Err(ContentError::Storage { path: dir, source }) if dir.as_path() == path => {
                tracing::debug!(path = %dir.display(), error = %source, "No content directory");
            }
            Err(e) => return Err(e),
        }
        Ok(content)
    }

    async fn fetch_content_file(&self, path: &Path) -> Result<Content, ContentError> {
        let raw = match self.storage.read(path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No content file");
                return Ok(Content::new());
            }
        };
        match parse_json(path, &raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(ContentError::NotAnObject {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Aggregate every entry of `dir` into one object.
    ///
    /// Dotfiles are skipped. Keys are basenames without their final
    /// extension; sub-directories become nested objects.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Storage`] if `dir` cannot be listed, and
    /// propagates parse failures of its entries.
    pub fn fetch_content_from_dir(
        self: &Arc<Self>,
        dir: &Path,
    ) -> BoxFuture<'static, Result<Content, ContentError>> {
        let this = Arc::clone(self);
        let dir = dir.to_path_buf();
        Box::pin(async move {
            let entries = this
                .storage
                .list_dir(&dir)
                .await
                .map_err(|source| ContentError::Storage {
                    path: dir.clone(),
                    source,
                })?;

            let mut tasks = JoinSet::new();
            for entry in entries.into_iter().filter(|e| !e.is_hidden()) {
                let this = Arc::clone(&this);
                let path = dir.join(&entry.name);
                tasks.spawn(async move {
                    let name = entry.name.clone();
                    this.fetch_entry(&path, entry)
                        .await
                        .map(|value| value.map(|(key, value)| (name, key, value)))
                });
            }

            let mut fetched = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                let result = match joined {
                    Ok(result) => result,
                    Err(e) => std::panic::resume_unwind(e.into_panic()),
                };
                if let Some(entry) = result? {
                    fetched.push(entry);
                }
            }

            // `about.md` and `about.yaml` share a key; later names win.
            fetched.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(fetched
                .into_iter()
                .map(|(_, key, value)| (key, value))
                .collect())
        })
    }

    async fn fetch_entry(
        self: &Arc<Self>,
        path: &Path,
        entry: DirEntry,
    ) -> Result<Option<(String, Value)>, ContentError> {
        if entry.kind == EntryKind::Directory {
            let nested = self.fetch_content_from_dir(path).await?;
            return Ok(Some((entry.name, Value::Object(nested))));
        }

        let Some((key, ext)) = entry.name.rsplit_once('.') else {
            tracing::warn!(path = %path.display(), "Skipping content file without extension");
            return Ok(None);
        };

        let parser = if ext == "json" {
            None
        } else {
            match self.registry.parser_for(ext) {
                Ok(parser) => Some(parser),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Skipping content file: {e}");
                    return Ok(None);
                }
            }
        };

        let raw = match self.storage.read(path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable content file");
                return Ok(None);
            }
        };

        let value = match parser {
            None => parse_json(path, &raw)?,
            Some(parser) => parser.parse(&raw).map_err(|source| ContentError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
        };
        Ok(Some((key.to_owned(), value)))
    }
}

fn parse_json(path: &Path, raw: &[u8]) -> Result<Value, ContentError> {
    serde_json::from_slice(raw).map_err(|source| ContentError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// `path` with `.json` appended. Stems may contain dots.
fn with_json_extension(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".json");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stencil_storage::MockStorage;

    use super::*;

    fn fetcher(storage: MockStorage, shared: Option<&str>) -> Arc<ContentFetcher> {
        Arc::new(ContentFetcher::new(
            Arc::new(storage),
            Arc::new(Registry::with_defaults()),
            shared.map(PathBuf::from),
        ))
    }

    fn object(value: Value) -> Content {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_directory_wins_over_file() {
        let storage = MockStorage::new()
            .with_file("c/page.json", r#"{"a": 1}"#)
            .with_file("c/page/a.json", "2")
            .with_file("c/page/b.json", "3");

        let content = fetcher(storage, None)
            .fetch_content(Path::new("c/page"))
            .await
            .unwrap();

        assert_eq!(content, object(json!({"a": 2, "b": 3})));
    }

    #[tokio::test]
    async fn test_missing_content_is_empty() {
        let content = fetcher(MockStorage::new(), None)
            .fetch_content(Path::new("c/nothing"))
            .await
            .unwrap();

        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn test_file_only() {
        let storage = MockStorage::new().with_file("c/sub/simple.json", r#"{"title": "Simple"}"#);

        let content = fetcher(storage, None)
            .fetch_content(Path::new("c/sub/simple"))
            .await
            .unwrap();

        assert_eq!(content, object(json!({"title": "Simple"})));
    }

    #[tokio::test]
    async fn test_stem_with_dots_appends_json() {
        let storage = MockStorage::new().with_file("c/jquery.min.json", r#"{"v": 3}"#);

        let content = fetcher(storage, None)
            .fetch_content(Path::new("c/jquery.min"))
            .await
            .unwrap();

        assert_eq!(content, object(json!({"v": 3})));
    }

    #[tokio::test]
    async fn test_malformed_json_is_error() {
        let storage = MockStorage::new().with_file("c/page.json", "{not json");

        let err = fetcher(storage, None)
            .fetch_content(Path::new("c/page"))
            .await
            .unwrap_err();

        assert!(matches!(err, ContentError::Json { .. }));
    }

    #[tokio::test]
    async fn test_non_object_file_is_error() {
        let storage = MockStorage::new().with_file("c/page.json", "[1, 2]");

        let err = fetcher(storage, None)
            .fetch_content(Path::new("c/page"))
            .await
            .unwrap_err();

        assert!(matches!(err, ContentError::NotAnObject { .. }));
    }

    #[tokio::test]
    async fn test_from_dir_uses_parsers_and_skips_dotfiles() {
        let storage = MockStorage::new()
            .with_file("c/about/body.md", "# Hi")
            .with_file("c/about/meta.yaml", "author: Ann")
            .with_file("c/about/.DS_Store", "junk")
            .with_file("c/about/notes.csv", "a,b");

        let content = fetcher(storage, None)
            .fetch_content_from_dir(Path::new("c/about"))
            .await
            .unwrap();

        assert_eq!(
            content,
            object(json!({
                "body": "<h1>Hi</h1>\n",
                "meta": {"author": "Ann"},
            }))
        );
    }

    #[tokio::test]
    async fn test_from_dir_nests_subdirectories() {
        let storage = MockStorage::new()
            .with_file("c/site/nav/main.json", r#"["home", "blog"]"#)
            .with_file("c/site/title.json", r#""Site""#);

        let content = fetcher(storage, None)
            .fetch_content_from_dir(Path::new("c/site"))
            .await
            .unwrap();

        assert_eq!(
            content,
            object(json!({"title": "Site", "nav": {"main": ["home", "blog"]}}))
        );
    }

    #[tokio::test]
    async fn test_from_dir_propagates_listing_error() {
        let err = fetcher(MockStorage::new(), None)
            .fetch_content_from_dir(Path::new("c/missing"))
            .await
            .unwrap_err();

        assert!(matches!(err, ContentError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_unlistable_subdirectory_is_error() {
        let storage = MockStorage::new()
            .with_file("c/page/title.json", r#""Hello""#)
            .with_file("c/page/private/key.json", "1")
            .with_failing_list("c/page/private");

        let err = fetcher(storage, None)
            .fetch_content(Path::new("c/page"))
            .await
            .unwrap_err();

        match err {
            ContentError::Storage { path, .. } => assert_eq!(path, PathBuf::from("c/page/private")),
            other => panic!("expected storage error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unlistable_content_directory_is_empty() {
        let storage = MockStorage::new()
            .with_file("c/page.json", r#"{"title": "File"}"#)
            .with_file("c/page/body.md", "x")
            .with_failing_list("c/page");

        let content = fetcher(storage, None)
            .fetch_content(Path::new("c/page"))
            .await
            .unwrap();

        assert_eq!(content, object(json!({"title": "File"})));
    }

    #[tokio::test]
    async fn test_from_dir_propagates_parse_error() {
        let storage = MockStorage::new().with_file("c/page/meta.yaml", "a: [");

        let err = fetcher(storage, None)
            .fetch_content(Path::new("c/page"))
            .await
            .unwrap_err();

        assert!(matches!(err, ContentError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_shared_content_fetched_once() {
        let storage = Arc::new(MockStorage::new().with_file("c/shared.json", r#"{"site": "x"}"#));
        let fetcher = Arc::new(ContentFetcher::new(
            Arc::clone(&storage) as Arc<dyn Storage>,
            Arc::new(Registry::with_defaults()),
            Some(PathBuf::from("c/shared")),
        ));

        let (a, b) = tokio::join!(fetcher.shared(), fetcher.shared());
        let c = fetcher.shared().await.unwrap();

        assert_eq!(*c, object(json!({"site": "x"})));
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(storage.read_count("c/shared.json"), 1);
    }

    #[tokio::test]
    async fn test_no_shared_content() {
        let shared = fetcher(MockStorage::new(), None).shared().await.unwrap();

        assert!(shared.is_empty());
    }
}
