//! High-level orchestration layer over the lower-level crates.
//! Exposes the entry points used by the CLI and other front ends.

use std::path::Path;

pub use xlfsync_core::{Result, TranslationDocument, TranslationMode, XlfError};

pub mod batch;
pub mod cache;
pub mod query;
pub mod refresh;
pub mod save;

pub use batch::{create_target_file, refresh_all, refresh_files, BatchOptions};
pub use cache::{CacheOptions, DocumentCache};
pub use query::{KeywordOptions, Page, SourceView, StateFilter};
pub use refresh::{refresh_document, MatchPool, RefreshOptions, RefreshOutcome, TranslationLookup};
pub use save::{apply_translations, save_translations};

/// Parse a document through the cache when one is supplied.
pub fn load_document(
    path: &Path,
    cache: Option<&mut DocumentCache>,
) -> Result<std::sync::Arc<TranslationDocument>> {
    match cache {
        Some(c) => c.get(path),
        None => Ok(std::sync::Arc::new(xlfsync_parsers_xml::read_document(path)?)),
    }
}
