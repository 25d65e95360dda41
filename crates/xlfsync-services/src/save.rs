use crate::cache::DocumentCache;
use crate::Result;
use std::path::Path;
use xlfsync_core::{
    CompletionSignal, NoteSource, Target, TargetState, TranslationDocument, TranslationMode,
    TranslationToken, XlfError,
};
use xlfsync_domain::{SaveSummary, TranslationToSave};
use xlfsync_parsers_xml::{serialize, write_atomic, SerializeOptions};

fn parse_state(item: &TranslationToSave) -> Result<Option<TargetState>> {
    let Some(raw) = item.target_state.as_deref().filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let state: TargetState = raw.parse()?;
    if !state.is_saveable() {
        return Err(XlfError::InvalidState {
            value: raw.to_string(),
        });
    }
    Ok(Some(state))
}

fn saved_target(text: &str, state: Option<TargetState>, mode: TranslationMode) -> Target {
    let signal = match mode {
        TranslationMode::External => {
            CompletionSignal::state(state.unwrap_or(TargetState::Translated))
        }
        TranslationMode::Tokens => match state {
            Some(TargetState::NeedsReviewTranslation) => {
                CompletionSignal::Token(TranslationToken::Review)
            }
            _ => CompletionSignal::None,
        },
    };
    Target::with_signal(text, &signal)
}

/// Set target text and state on the listed units. Every item is validated
/// before anything changes, so a bad id leaves `doc` untouched.
pub fn apply_translations(
    doc: &mut TranslationDocument,
    items: &[TranslationToSave],
    mode: TranslationMode,
) -> Result<usize> {
    let mut states = Vec::with_capacity(items.len());
    for item in items {
        if doc.unit(&item.id).is_none() {
            return Err(XlfError::UnitNotFound {
                id: item.id.clone(),
            });
        }
        states.push(parse_state(item)?);
    }
    for (item, state) in items.iter().zip(states) {
        if let Some(unit) = doc.unit_mut(&item.id) {
            unit.set_targets(vec![saved_target(&item.target_text, state, mode)]);
            unit.remove_note(&NoteSource::RefreshHint);
        }
    }
    Ok(items.len())
}

/// Apply `items` to the file at `path` and write it back.
pub fn save_translations(
    path: &Path,
    items: &[TranslationToSave],
    mode: TranslationMode,
    opts: &SerializeOptions,
    mut cache: Option<&mut DocumentCache>,
) -> Result<SaveSummary> {
    let mut doc = crate::load_document(path, cache.as_deref_mut())?
        .as_ref()
        .clone();
    let saved = apply_translations(&mut doc, items, mode)?;
    let text = serialize(&doc, opts)?;
    write_atomic(path, text.as_bytes())?;
    if let Some(c) = cache {
        c.delete(path);
    }
    tracing::info!(event = "translations_saved", path = %path.display(), saved = saved);
    Ok(SaveSummary {
        path: path.display().to_string(),
        saved,
    })
}
