//! Reading and writing XLIFF 1.2 files.
//!
//! Parsing goes through `roxmltree` into the owned model; writing builds a
//! fresh tree with `quick_xml`. Nothing is patched in place.

use std::fs;
use std::io::Write;
use std::path::Path;
use xlfsync_core::{Result, TranslationDocument, XlfError};

mod reader;
mod writer;

pub use reader::parse;
pub use writer::{serialize, SearchReplace, SerializeOptions};

/// Read and parse a file. Parse errors are tagged with `path`.
pub fn read_document(path: &Path) -> Result<TranslationDocument> {
    let text = fs::read_to_string(path).map_err(|e| XlfError::io(path, e))?;
    parse(&text).map_err(|e| e.with_path(path))
}

/// Serialize and write a document in one step.
pub fn write_document(
    path: &Path,
    doc: &TranslationDocument,
    opts: &SerializeOptions,
) -> Result<()> {
    let text = serialize(doc, opts)?;
    write_atomic(path, text.as_bytes())
}

/// Write to a sibling temp file, then rename over the destination so readers
/// never see a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.xlf".to_string());
    let tmp = dir.join(format!(".{file_name}.tmp"));
    {
        let mut f = fs::File::create(&tmp).map_err(|e| XlfError::io(&tmp, e))?;
        f.write_all(bytes).map_err(|e| XlfError::io(&tmp, e))?;
        f.sync_all().map_err(|e| XlfError::io(&tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        XlfError::io(path, e)
    })?;
    tracing::debug!(event = "xliff_written", path = %path.display(), bytes = bytes.len());
    Ok(())
}
