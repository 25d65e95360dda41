use crate::settings::Settings;
use crate::Format;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use xlfsync_core::TranslationDocument;
use xlfsync_domain::{TranslatedText, TranslatedTextWithState, UntranslatedText};
use xlfsync_services::query::{self, KeywordOptions, Page, SourceView, StateFilter};

struct Loaded {
    doc: Arc<TranslationDocument>,
    alternate: Option<Arc<TranslationDocument>>,
}

impl Loaded {
    fn view(&self) -> SourceView<'_> {
        SourceView::new(&self.doc, self.alternate.as_deref())
    }
}

fn load(
    settings: &Settings,
    file: &Path,
    source_file: Option<&Path>,
) -> color_eyre::Result<Loaded> {
    let mut cache = settings.cache();
    let doc = xlfsync_services::load_document(file, Some(&mut cache))?;
    let alternate = match source_file {
        Some(p) => Some(xlfsync_services::load_document(p, Some(&mut cache))?),
        None => None,
    };
    Ok(Loaded { doc, alternate })
}

pub fn run_untranslated(
    file: PathBuf,
    offset: usize,
    limit: Option<usize>,
    source_file: Option<PathBuf>,
    format: Format,
    use_color: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "untranslated_args", file = ?file, offset = offset, limit = ?limit);
    let settings = Settings::load()?;
    let loaded = load(&settings, &file, source_file.as_deref())?;
    let page = Page::new(offset, settings.limit(limit));
    let rows = query::untranslated_rows(loaded.view(), page);
    if super::is_json(format) {
        return super::print_json(&rows);
    }
    print_untranslated(&rows, use_color);
    Ok(())
}

#[derive(Debug)]
pub struct TranslatedArgs {
    pub file: PathBuf,
    pub state: String,
    pub source_text: Option<String>,
    pub offset: usize,
    pub limit: Option<usize>,
    pub source_file: Option<PathBuf>,
}

pub fn run_translated(args: TranslatedArgs, format: Format, use_color: bool) -> color_eyre::Result<()> {
    tracing::debug!(event = "translated_args", args = ?args);
    let filter: StateFilter = args.state.parse()?;
    let settings = Settings::load()?;
    let loaded = load(&settings, &args.file, args.source_file.as_deref())?;
    let page = Page::new(args.offset, settings.limit(args.limit));
    let units = query::filter_by_state(&loaded.doc, filter, args.source_text.as_deref());
    let rows = query::with_state_rows(loaded.view(), units, page);
    if super::is_json(format) {
        return super::print_json(&rows);
    }
    print_with_state(&rows, use_color);
    Ok(())
}

pub fn run_search(
    file: PathBuf,
    keyword: String,
    opts: KeywordOptions,
    offset: usize,
    limit: Option<usize>,
    format: Format,
    use_color: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "search_args", file = ?file, keyword = %keyword, opts = ?opts);
    let settings = Settings::load()?;
    let loaded = load(&settings, &file, None)?;
    let page = Page::new(offset, settings.limit(limit));
    let units = query::filter_by_keyword(&loaded.doc, &keyword, opts)?;
    let rows = query::with_state_rows(loaded.view(), units, page);
    if super::is_json(format) {
        return super::print_json(&rows);
    }
    print_with_state(&rows, use_color);
    Ok(())
}

pub fn run_map(
    file: PathBuf,
    offset: usize,
    limit: Option<usize>,
    format: Format,
    use_color: bool,
) -> color_eyre::Result<()> {
    tracing::debug!(event = "map_args", file = ?file, offset = offset, limit = ?limit);
    let settings = Settings::load()?;
    let loaded = load(&settings, &file, None)?;
    let page = Page::new(offset, settings.limit(limit));
    let rows = query::translation_map_rows(loaded.view(), page);
    if super::is_json(format) {
        return super::print_json(&rows);
    }
    print_map(&rows, use_color);
    Ok(())
}

fn print_untranslated(rows: &[UntranslatedText], use_color: bool) {
    for r in rows {
        if use_color {
            crate::ui_out!("{} {}", r.id.cyan(), r.source_text);
        } else {
            crate::ui_out!("{} {}", r.id, r.source_text);
        }
        if let Some(c) = &r.comment {
            crate::ui_out!("    # {}", c);
        }
    }
}

fn print_with_state(rows: &[TranslatedTextWithState], use_color: bool) {
    for r in rows {
        let state = r.translation_state.as_deref().unwrap_or("-");
        if use_color {
            let state = match state {
                s if s.starts_with("needs-") => format!("{}", state.yellow()),
                "final" | "signed-off" => format!("{}", state.blue()),
                _ => format!("{}", state.green()),
            };
            crate::ui_out!("{} [{}] {} => {}", r.id.cyan(), state, r.source_text, r.target_text);
        } else {
            crate::ui_out!("{} [{}] {} => {}", r.id, state, r.source_text, r.target_text);
        }
        if let Some(reason) = &r.review_reason {
            crate::ui_out!("    ! {}", reason);
        }
    }
}

fn print_map(rows: &[TranslatedText], use_color: bool) {
    for r in rows {
        let targets = r.target_texts.join(" | ");
        if use_color {
            crate::ui_out!("{} => {}", r.source_text.cyan(), targets);
        } else {
            crate::ui_out!("{} => {}", r.source_text, targets);
        }
    }
}
