//! Refreshing every target file of a translation folder.
//!
//! Two phases: every file is read and parsed first, so cross-file matching
//! always sees the pre-run snapshot, then each target is rebuilt and written.

use crate::cache::DocumentCache;
use crate::refresh::{refresh_document, MatchPool, RefreshOptions, TranslationLookup};
use crate::Result;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::WalkDir;
use xlfsync_core::{TranslationDocument, XlfError};
use xlfsync_domain::{BatchReport, CreatedTarget, FileFailure, FileOutcome, SCHEMA_VERSION};
use xlfsync_parsers_xml::{serialize, write_atomic, SerializeOptions};

const GENERATOR_SUFFIX: &str = ".g.xlf";

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub refresh: RefreshOptions,
    pub serialize: SerializeOptions,
    /// Write nothing when any target fails to load.
    pub all_or_nothing: bool,
    /// Extra read-only files offered as match sources.
    pub suggestion_paths: Vec<PathBuf>,
}

struct Loaded {
    path: PathBuf,
    raw: String,
    doc: TranslationDocument,
}

fn origin_of(path: &Path) -> String {
    path.display().to_string()
}

fn is_generator(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase().ends_with(GENERATOR_SUFFIX))
        .unwrap_or(false)
}

fn is_xlf(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("xlf"))
        .unwrap_or(false)
}

/// All `*.xlf` files directly inside `dir`, sorted by name.
fn xlf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            XlfError::io(path, e.into())
        })?;
        if entry.file_type().is_file() && is_xlf(entry.path()) {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

/// Every `*.xlf` in `dir` except generator files.
pub fn target_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(xlf_files(dir)?
        .into_iter()
        .filter(|p| !is_generator(p))
        .collect())
}

/// Find the single generator file in `dir` and the target files next to it.
pub fn find_translation_files(dir: &Path) -> Result<(PathBuf, Vec<PathBuf>)> {
    let (generators, targets): (Vec<PathBuf>, Vec<PathBuf>) =
        xlf_files(dir)?.into_iter().partition(|p| is_generator(p));
    let count = generators.len();
    match generators.into_iter().next() {
        Some(generator) if count == 1 => Ok((generator, targets)),
        Some(_) => Err(XlfError::AmbiguousGenerator {
            dir: dir.to_path_buf(),
            count,
        }),
        None => Err(XlfError::MissingFile {
            dir: dir.to_path_buf(),
            what: "generator file (*.g.xlf)".to_string(),
        }),
    }
}

fn load(path: &Path) -> Result<Loaded> {
    let raw = fs::read_to_string(path).map_err(|e| XlfError::io(path, e))?;
    let doc = xlfsync_parsers_xml::parse(&raw).map_err(|e| e.with_path(path))?;
    Ok(Loaded {
        path: path.to_path_buf(),
        raw,
        doc,
    })
}

/// Suggestion files and the lookup provider, after the targets themselves.
fn extend_pool(
    pool: &mut MatchPool,
    languages: &BTreeSet<String>,
    opts: &BatchOptions,
    lookup: Option<&dyn TranslationLookup>,
) {
    if !opts.refresh.match_translation {
        return;
    }
    for path in &opts.suggestion_paths {
        match xlfsync_parsers_xml::read_document(path) {
            Ok(doc) => pool.add_document(&origin_of(path), &doc),
            Err(e) => tracing::warn!(event = "suggestion_file_skipped", path = %path.display(), error = %e),
        }
    }
    let Some(lookup) = lookup else {
        return;
    };
    for lang in languages {
        match lookup.lookup(lang) {
            Ok(Some(map)) => pool.add_map("lookup", lang, map),
            Ok(None) => {}
            Err(e) => tracing::warn!(event = "lookup_failed", language = %lang, error = %e),
        }
    }
}

/// Refresh `targets` against the generator file. Per-file failures are
/// collected into the report; only a broken generator aborts the run.
pub fn refresh_files(
    generator_path: &Path,
    targets: &[PathBuf],
    opts: &BatchOptions,
    lookup: Option<&dyn TranslationLookup>,
    cancel: Option<&AtomicBool>,
    mut cache: Option<&mut DocumentCache>,
) -> Result<BatchReport> {
    let generator = xlfsync_parsers_xml::read_document(generator_path)?;
    let mut report = BatchReport {
        schema_version: SCHEMA_VERSION,
        ..BatchReport::default()
    };

    let mut loaded = Vec::with_capacity(targets.len());
    for path in targets {
        match load(path) {
            Ok(l) => loaded.push(l),
            Err(e) => {
                tracing::warn!(event = "target_load_failed", path = %path.display(), error = %e);
                report.failures.push(FileFailure {
                    path: origin_of(path),
                    error: e.to_string(),
                });
            }
        }
    }
    if opts.all_or_nothing && !report.failures.is_empty() {
        tracing::warn!(event = "batch_aborted", failures = report.failures.len());
        return Ok(report);
    }

    let mut pool = MatchPool::new();
    if opts.refresh.match_translation {
        for l in &loaded {
            pool.add_document(&origin_of(&l.path), &l.doc);
        }
    }
    let languages: BTreeSet<String> = loaded.iter().map(|l| l.doc.target_language.clone()).collect();
    extend_pool(&mut pool, &languages, opts, lookup);

    for l in loaded {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            tracing::info!(event = "batch_cancelled", done = report.files.len());
            report.cancelled = true;
            break;
        }
        let origin = origin_of(&l.path);
        let outcome = refresh_document(&generator, l.doc, &pool, &origin, &opts.refresh);
        let written = serialize(&outcome.document, &opts.serialize).and_then(|text| {
            if text != l.raw {
                write_atomic(&l.path, text.as_bytes())?;
            }
            Ok(())
        });
        if let Some(c) = cache.as_deref_mut() {
            c.delete(&l.path);
        }
        match written {
            Ok(()) => {
                tracing::info!(event = "refresh_file", path = %l.path.display(), changed = outcome.report.is_changed());
                report.total.absorb(&outcome.report);
                report.files.push(FileOutcome {
                    path: origin,
                    report: outcome.report,
                });
            }
            Err(e) => {
                tracing::warn!(event = "refresh_write_failed", path = %l.path.display(), error = %e);
                report.failures.push(FileFailure {
                    path: origin,
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(report)
}

/// Refresh every target in `dir` against its `*.g.xlf` file.
pub fn refresh_all(
    dir: &Path,
    opts: &BatchOptions,
    lookup: Option<&dyn TranslationLookup>,
    cancel: Option<&AtomicBool>,
    cache: Option<&mut DocumentCache>,
) -> Result<BatchReport> {
    let (generator, targets) = find_translation_files(dir)?;
    tracing::debug!(event = "refresh_all", generator = %generator.display(), targets = targets.len());
    refresh_files(&generator, &targets, opts, lookup, cancel, cache)
}

/// `App.g.xlf` + `sv-SE` -> `App.sv-SE.xlf` in the same folder.
pub fn target_path_for(generator_path: &Path, language: &str) -> PathBuf {
    let name = generator_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = if name.to_ascii_lowercase().ends_with(GENERATOR_SUFFIX) {
        &name[..name.len() - GENERATOR_SUFFIX.len()]
    } else {
        name.strip_suffix(".xlf").unwrap_or(&name)
    };
    generator_path.with_file_name(format!("{base}.{language}.xlf"))
}

/// Create a new target file for `language` with every generator unit
/// synthesized as a new unit. Sibling files of the same language are offered
/// as match sources.
pub fn create_target_file(
    generator_path: &Path,
    language: &str,
    overwrite: bool,
    opts: &BatchOptions,
    lookup: Option<&dyn TranslationLookup>,
    cache: Option<&mut DocumentCache>,
) -> Result<CreatedTarget> {
    let out = target_path_for(generator_path, language);
    if out.exists() && !overwrite {
        return Err(XlfError::DuplicateOutput { path: out });
    }
    let generator = xlfsync_parsers_xml::read_document(generator_path)?;

    let mut pool = MatchPool::new();
    if opts.refresh.match_translation {
        if let Some(dir) = generator_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            for path in xlf_files(dir)? {
                if is_generator(&path) || path == out {
                    continue;
                }
                match xlfsync_parsers_xml::read_document(&path) {
                    Ok(doc) => pool.add_document(&origin_of(&path), &doc),
                    Err(e) => tracing::warn!(event = "sibling_skipped", path = %path.display(), error = %e),
                }
            }
        }
    }
    let languages = BTreeSet::from([language.to_string()]);
    extend_pool(&mut pool, &languages, opts, lookup);

    let mut target = generator.empty_like();
    target.target_language = language.to_string();
    let origin = origin_of(&out);
    let outcome = refresh_document(&generator, target, &pool, &origin, &opts.refresh);
    let text = serialize(&outcome.document, &opts.serialize)?;
    write_atomic(&out, text.as_bytes())?;
    if let Some(c) = cache {
        c.delete(&out);
    }
    tracing::info!(event = "target_created", path = %out.display(), units = outcome.document.units.len());
    Ok(CreatedTarget {
        path: origin,
        target_language: language.to_string(),
        units: outcome.document.units.len(),
        number_of_matches: outcome.report.suggestions_added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheOptions;
    use std::collections::HashMap;
    use xlfsync_core::{TargetState, EXACT_MATCH};

    fn xlf(target_language: &str, units: &[(&str, &str, Option<&str>)]) -> String {
        let mut body = String::new();
        for (id, source, target) in units {
            body.push_str(&format!("<trans-unit id=\"{id}\"><source>{source}</source>"));
            if let Some(t) = target {
                body.push_str(&format!("<target state=\"translated\">{t}</target>"));
            }
            body.push_str("</trans-unit>\n");
        }
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<xliff version=\"1.2\"><file datatype=\"xml\" source-language=\"en-US\" target-language=\"{target_language}\" original=\"App\"><body><group id=\"body\">\n{body}</group></body></file></xliff>"
        )
    }

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, text).unwrap();
        p
    }

    fn folder() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "App.g.xlf",
            &xlf("en-US", &[("A", "Cat", None), ("B", "Dog", None), ("C", "Total", None)]),
        );
        write(
            dir.path(),
            "App.sv-SE.xlf",
            &xlf("sv-SE", &[("A", "Cat", Some("Katt")), ("D", "Gone", Some("Borta"))]),
        );
        write(
            dir.path(),
            "App.da-DK.xlf",
            &xlf("da-DK", &[("A", "Cat", Some("Kat"))]),
        );
        dir
    }

    #[test]
    fn refresh_all_updates_every_target() {
        let dir = folder();
        let report = refresh_all(dir.path(), &BatchOptions::default(), None, None, None).unwrap();
        assert!(report.failures.is_empty());
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.total.checked_files, 2);
        assert_eq!(report.total.added, 4);
        assert_eq!(report.total.removed, 1);

        let sv = xlfsync_parsers_xml::read_document(&dir.path().join("App.sv-SE.xlf")).unwrap();
        let ids: Vec<&str> = sv.units.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "C"]);
        assert_eq!(sv.units[0].target_text(), "Katt");
    }

    #[test]
    fn second_run_changes_nothing() {
        let dir = folder();
        refresh_all(dir.path(), &BatchOptions::default(), None, None, None).unwrap();
        let before = fs::read_to_string(dir.path().join("App.sv-SE.xlf")).unwrap();
        let report = refresh_all(dir.path(), &BatchOptions::default(), None, None, None).unwrap();
        assert!(!report.total.is_changed());
        assert_eq!(fs::read_to_string(dir.path().join("App.sv-SE.xlf")).unwrap(), before);
    }

    #[test]
    fn suggestion_file_fills_new_units() {
        let dir = folder();
        let other = tempfile::tempdir().unwrap();
        let base = write(
            other.path(),
            "Base.sv-SE.xlf",
            &xlf("sv-SE", &[("X", "Total", Some("Totalt"))]),
        );
        let opts = BatchOptions {
            suggestion_paths: vec![base],
            ..BatchOptions::default()
        };
        let report = refresh_all(dir.path(), &opts, None, None, None).unwrap();
        assert_eq!(report.total.suggestions_added, 1);

        let sv = xlfsync_parsers_xml::read_document(&dir.path().join("App.sv-SE.xlf")).unwrap();
        let c = sv.unit("C").unwrap();
        let target = c.target.as_ref().unwrap();
        assert_eq!(target.text, "Totalt");
        assert_eq!(target.state, Some(TargetState::NeedsReviewTranslation));
        assert_eq!(target.state_qualifier.as_deref(), Some(EXACT_MATCH));
    }

    struct FixedLookup;

    impl TranslationLookup for FixedLookup {
        fn lookup(&self, target_language: &str) -> Result<Option<HashMap<String, Vec<String>>>> {
            if target_language != "da-DK" {
                return Ok(None);
            }
            Ok(Some(HashMap::from([(
                "Dog".to_string(),
                vec!["Hund".to_string()],
            )])))
        }
    }

    #[test]
    fn lookup_provider_is_consulted_per_language() {
        let dir = folder();
        let report =
            refresh_all(dir.path(), &BatchOptions::default(), Some(&FixedLookup), None, None).unwrap();
        assert_eq!(report.total.suggestions_added, 1);
        let da = xlfsync_parsers_xml::read_document(&dir.path().join("App.da-DK.xlf")).unwrap();
        assert_eq!(da.unit("B").unwrap().target_text(), "Hund");
        let sv = xlfsync_parsers_xml::read_document(&dir.path().join("App.sv-SE.xlf")).unwrap();
        assert_eq!(sv.unit("B").unwrap().target_text(), "");
    }

    #[test]
    fn broken_target_does_not_stop_the_others() {
        let dir = folder();
        write(dir.path(), "App.de-DE.xlf", "<xliff><file>");
        let report = refresh_all(dir.path(), &BatchOptions::default(), None, None, None).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("App.de-DE.xlf"));
        assert_eq!(report.files.len(), 2);
    }

    #[test]
    fn all_or_nothing_writes_nothing_on_failure() {
        let dir = folder();
        write(dir.path(), "App.de-DE.xlf", "<xliff><file>");
        let before = fs::read_to_string(dir.path().join("App.sv-SE.xlf")).unwrap();
        let opts = BatchOptions {
            all_or_nothing: true,
            ..BatchOptions::default()
        };
        let report = refresh_all(dir.path(), &opts, None, None, None).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.files.is_empty());
        assert_eq!(fs::read_to_string(dir.path().join("App.sv-SE.xlf")).unwrap(), before);
    }

    #[test]
    fn cancellation_is_checked_between_files() {
        let dir = folder();
        let cancel = AtomicBool::new(true);
        let report =
            refresh_all(dir.path(), &BatchOptions::default(), None, Some(&cancel), None).unwrap();
        assert!(report.cancelled);
        assert!(report.files.is_empty());
    }

    #[test]
    fn written_files_leave_the_cache() {
        let dir = folder();
        let sv = dir.path().join("App.sv-SE.xlf");
        let mut cache = DocumentCache::new(CacheOptions::default());
        cache.get(&sv).unwrap();
        refresh_all(dir.path(), &BatchOptions::default(), None, None, Some(&mut cache)).unwrap();
        assert!(!cache.is_cached(&sv));
    }

    #[test]
    fn generator_must_be_unique() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "App.sv-SE.xlf", &xlf("sv-SE", &[]));
        assert!(matches!(
            find_translation_files(dir.path()),
            Err(XlfError::MissingFile { .. })
        ));
        write(dir.path(), "App.g.xlf", &xlf("en-US", &[]));
        write(dir.path(), "Other.g.xlf", &xlf("en-US", &[]));
        assert!(matches!(
            find_translation_files(dir.path()),
            Err(XlfError::AmbiguousGenerator { count: 2, .. })
        ));
    }

    #[test]
    fn target_path_replaces_generator_suffix() {
        assert_eq!(
            target_path_for(Path::new("/t/App.g.xlf"), "sv-SE"),
            PathBuf::from("/t/App.sv-SE.xlf")
        );
        assert_eq!(
            target_path_for(Path::new("Base.xlf"), "de-DE"),
            PathBuf::from("Base.de-DE.xlf")
        );
    }

    #[test]
    fn create_target_file_matches_siblings_and_refuses_overwrite() {
        let dir = folder();
        write(
            dir.path(),
            "Base.sv-SE.xlf",
            &xlf("sv-SE", &[("X", "Dog", Some("Hund"))]),
        );
        let g = dir.path().join("App.g.xlf");
        fs::remove_file(dir.path().join("App.sv-SE.xlf")).unwrap();

        let created = create_target_file(&g, "sv-SE", false, &BatchOptions::default(), None, None).unwrap();
        assert_eq!(created.units, 3);
        assert_eq!(created.number_of_matches, 1);
        let doc = xlfsync_parsers_xml::read_document(Path::new(&created.path)).unwrap();
        assert_eq!(doc.target_language, "sv-SE");
        assert_eq!(doc.unit("B").unwrap().target_text(), "Hund");
        assert_eq!(
            doc.unit("A").unwrap().target.as_ref().unwrap().state,
            Some(TargetState::New)
        );

        let err = create_target_file(&g, "sv-SE", false, &BatchOptions::default(), None, None).unwrap_err();
        assert!(matches!(err, XlfError::DuplicateOutput { .. }));
        assert!(create_target_file(&g, "sv-SE", true, &BatchOptions::default(), None, None).is_ok());
    }
}
