use crate::Result;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use xlfsync_core::TranslationDocument;

#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub enabled: bool,
    pub capacity: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 64,
        }
    }
}

/// Parsed documents keyed by file name. Two files with the same name in
/// different folders share a slot.
///
/// Not synchronized: one writer at a time, and callers must `delete` an entry
/// after writing the file behind it.
pub struct DocumentCache {
    enabled: bool,
    entries: LruCache<String, Arc<TranslationDocument>>,
}

impl DocumentCache {
    pub fn new(opts: CacheOptions) -> Self {
        let cap = NonZeroUsize::new(opts.capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            enabled: opts.enabled,
            entries: LruCache::new(cap),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cached parse of `path`, reading the file on a miss.
    pub fn get(&mut self, path: &Path) -> Result<Arc<TranslationDocument>> {
        let key = cache_key(path);
        if self.enabled {
            if let Some(doc) = self.entries.get(&key) {
                tracing::trace!(event = "cache_hit", file = %key);
                return Ok(Arc::clone(doc));
            }
        }
        let doc = Arc::new(xlfsync_parsers_xml::read_document(path)?);
        if self.enabled {
            tracing::trace!(event = "cache_store", file = %key);
            self.entries.put(key, Arc::clone(&doc));
        }
        Ok(doc)
    }

    /// Re-parse `raw` as the content of `path`. On error the previous entry stays.
    pub fn update(&mut self, path: &Path, raw: &str) -> Result<Arc<TranslationDocument>> {
        let doc = Arc::new(xlfsync_parsers_xml::parse(raw).map_err(|e| e.with_path(path))?);
        if self.enabled {
            self.entries.put(cache_key(path), Arc::clone(&doc));
        }
        Ok(doc)
    }

    pub fn delete(&mut self, path: &Path) -> bool {
        self.entries.pop(&cache_key(path)).is_some()
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.entries.contains(&cache_key(path))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cache_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use xlfsync_core::XlfError;

    const DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xliff version="1.2"><file datatype="xml" source-language="en-US" target-language="sv-SE" original="App"><body><group id="body">
<trans-unit id="a"><source>Cat</source><target>Katt</target></trans-unit>
</group></body></file></xliff>"#;

    #[test]
    fn get_parses_once_and_update_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("App.sv-SE.xlf");
        fs::write(&path, DOC).unwrap();

        let mut cache = DocumentCache::new(CacheOptions::default());
        let first = cache.get(&path).unwrap();
        assert!(cache.is_cached(&path));

        // The file changes on disk but the cached parse is served until invalidated.
        fs::write(&path, DOC.replace("Katt", "Kisse")).unwrap();
        let second = cache.get(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(cache.delete(&path));
        assert_eq!(cache.get(&path).unwrap().units[0].target_text(), "Kisse");

        let updated = cache.update(&path, &DOC.replace("Katt", "Mjau")).unwrap();
        assert_eq!(updated.units[0].target_text(), "Mjau");
    }

    #[test]
    fn failed_update_keeps_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("App.sv-SE.xlf");
        fs::write(&path, DOC).unwrap();
        let mut cache = DocumentCache::new(CacheOptions::default());
        cache.get(&path).unwrap();

        let err = cache.update(&path, "<xliff><file>").unwrap_err();
        match err {
            XlfError::MalformedDocument { path: Some(p), .. } => assert_eq!(p, path),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(cache.is_cached(&path));
        assert_eq!(cache.get(&path).unwrap().units[0].target_text(), "Katt");
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("App.sv-SE.xlf");
        fs::write(&path, DOC).unwrap();
        let mut cache = DocumentCache::new(CacheOptions {
            enabled: false,
            capacity: 4,
        });
        cache.get(&path).unwrap();
        assert!(!cache.is_cached(&path));
        assert!(cache.is_empty());
    }

    #[test]
    fn same_file_name_shares_a_slot() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("App.xlf"), DOC).unwrap();
        fs::write(b.join("App.xlf"), DOC.replace("Katt", "Kisse")).unwrap();
        let mut cache = DocumentCache::new(CacheOptions::default());
        cache.get(&a.join("App.xlf")).unwrap();
        assert_eq!(cache.get(&b.join("App.xlf")).unwrap().units[0].target_text(), "Katt");
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
