//! Watched media sources.
//!
//! Each category has its own subdirectory under the media root. New files
//! appearing there between scans are the engine's only input.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use fieldwatch_core::{defaults, Category, MediaItem, Result};

static ORDINAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid ordinal pattern"));

/// Number embedded in a file name, ignoring the extension.
///
/// `12.jpg` and `cam_12.jpg` both yield `12`; the first digit run wins.
pub fn parse_ordinal(file_name: &str) -> Option<u64> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    ORDINAL
        .find(stem)
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

/// Scan order: numeric ordinals ascending, then names without a number in
/// lexicographic order. Equal ordinals fall back to the name.
pub fn compare_items(a: &MediaItem, b: &MediaItem) -> Ordering {
    match (a.ordinal, b.ordinal) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.item_id.cmp(&b.item_id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.item_id.cmp(&b.item_id),
    }
}

/// Directory-backed listing of the two media sources.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    root: PathBuf,
}

impl MediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create from `FIELDWATCH_MEDIA_DIR` (default `./media`).
    pub fn from_env() -> Self {
        let root = std::env::var(defaults::ENV_MEDIA_DIR)
            .unwrap_or_else(|_| defaults::MEDIA_DIR.to_string());
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.source_dir())
    }

    /// List the items of one source in scan order.
    ///
    /// A missing directory is an empty source. Hidden files and
    /// subdirectories are skipped.
    pub async fn list(&self, category: Category) -> Result<Vec<MediaItem>> {
        let dir = self.source_dir(category);
        if !tokio::fs::try_exists(&dir).await? {
            debug!(dir = %dir.display(), "Media source missing, treating as empty");
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            match entry.file_type().await {
                Ok(file_type) if file_type.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                trace!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let path = format!("{}/{}", category.source_dir(), name);
            items.push(MediaItem {
                category,
                ordinal: parse_ordinal(&name),
                url: format!("{}/{}", defaults::MEDIA_URL_PREFIX, path),
                path,
                file_path: entry.path(),
                item_id: name,
            });
        }

        items.sort_by(compare_items);
        Ok(items)
    }

    /// Every item of every source, in scan order (wildlife first).
    pub async fn list_all(&self) -> Result<Vec<MediaItem>> {
        let mut all = Vec::new();
        for category in Category::SCAN_ORDER {
            all.extend(self.list(category).await?);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"img").unwrap();
    }

    #[test]
    fn test_parse_ordinal() {
        assert_eq!(parse_ordinal("1.jpg"), Some(1));
        assert_eq!(parse_ordinal("cam_012.png"), Some(12));
        assert_eq!(parse_ordinal("deer.jpg"), None);
        // Digits in the extension do not count.
        assert_eq!(parse_ordinal("frame.mp4"), None);
    }

    #[tokio::test]
    async fn test_list_sorts_by_ordinal_then_name() {
        let tmp = tempfile::tempdir().unwrap();
        let animals = tmp.path().join("animals");
        std::fs::create_dir_all(&animals).unwrap();
        for name in ["10.jpg", "2.jpg", "zeta.jpg", "1.jpg", "alpha.jpg", ".hidden.jpg"] {
            touch(&animals, name);
        }
        std::fs::create_dir_all(animals.join("nested")).unwrap();

        let library = MediaLibrary::new(tmp.path());
        let names: Vec<String> = library
            .list(Category::Wildlife)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.item_id)
            .collect();
        assert_eq!(names, vec!["1.jpg", "2.jpg", "10.jpg", "alpha.jpg", "zeta.jpg"]);
    }

    #[tokio::test]
    async fn test_list_fills_paths_and_urls() {
        let tmp = tempfile::tempdir().unwrap();
        let face = tmp.path().join("face");
        std::fs::create_dir_all(&face).unwrap();
        touch(&face, "3.jpg");

        let library = MediaLibrary::new(tmp.path());
        let items = library.list(Category::Intrusion).await.unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.path, "face/3.jpg");
        assert_eq!(item.url, "/media/face/3.jpg");
        assert_eq!(item.ordinal, Some(3));
        assert_eq!(item.key(), "intrusion/3.jpg");
        assert_eq!(item.file_path, face.join("3.jpg"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_entries_do_not_fail_listing() {
        let tmp = tempfile::tempdir().unwrap();
        let animals = tmp.path().join("animals");
        std::fs::create_dir_all(&animals).unwrap();
        touch(&animals, "1.jpg");
        std::os::unix::fs::symlink(animals.join("gone.jpg"), animals.join("2.jpg")).unwrap();

        let library = MediaLibrary::new(tmp.path());
        let items = library.list(Category::Wildlife).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_id, "1.jpg");
    }

    #[tokio::test]
    async fn test_missing_source_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let library = MediaLibrary::new(tmp.path().join("does-not-exist"));
        assert!(library.list(Category::Wildlife).await.unwrap().is_empty());
        assert!(library.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_all_wildlife_first() {
        let tmp = tempfile::tempdir().unwrap();
        for dir in ["animals", "face"] {
            std::fs::create_dir_all(tmp.path().join(dir)).unwrap();
        }
        touch(&tmp.path().join("face"), "1.jpg");
        touch(&tmp.path().join("animals"), "5.jpg");

        let library = MediaLibrary::new(tmp.path());
        let keys: Vec<String> = library
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(MediaItem::key)
            .collect();
        assert_eq!(keys, vec!["wildlife/5.jpg", "intrusion/1.jpg"]);
    }
}
