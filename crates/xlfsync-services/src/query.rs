//! Read-side views over a parsed document.

use regex::RegexBuilder;
use std::collections::HashMap;
use std::str::FromStr;
use xlfsync_core::{Completion, Result, TranslationDocument, TranslationUnit, XlfError};
use xlfsync_domain::{TranslatedText, TranslatedTextWithState, UntranslatedText};

/// Offset/limit window applied to matches. `limit == 0` means no limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset);
        if self.limit == 0 {
            iter.collect()
        } else {
            iter.take(self.limit).collect()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFilter {
    #[default]
    All,
    Translated,
    NeedsReview,
    Final,
    SignedOff,
}

impl StateFilter {
    fn accepts(self, c: Completion) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Translated => c == Completion::Translated,
            StateFilter::NeedsReview => c == Completion::NeedsReview,
            StateFilter::Final => c == Completion::Final,
            StateFilter::SignedOff => c == Completion::SignedOff,
        }
    }
}

impl FromStr for StateFilter {
    type Err = XlfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "all" => Ok(StateFilter::All),
            "translated" => Ok(StateFilter::Translated),
            "needs-review" => Ok(StateFilter::NeedsReview),
            "final" => Ok(StateFilter::Final),
            "signed-off" => Ok(StateFilter::SignedOff),
            other => Err(XlfError::InvalidFilter {
                filter: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordOptions {
    pub case_sensitive: bool,
    pub is_regex: bool,
    pub search_in_target: bool,
}

fn translatable(doc: &TranslationDocument) -> impl Iterator<Item = &TranslationUnit> {
    doc.units.iter().filter(|u| u.translate)
}

/// Units with a target, narrowed by state and optionally by exact source text.
pub fn filter_by_state<'a>(
    doc: &'a TranslationDocument,
    filter: StateFilter,
    source_text: Option<&str>,
) -> Vec<&'a TranslationUnit> {
    translatable(doc)
        .filter(|u| !u.target_text().is_empty())
        .filter(|u| source_text.map_or(true, |s| u.source == s))
        .filter(|u| filter.accepts(u.completion()))
        .collect()
}

pub fn filter_by_keyword<'a>(
    doc: &'a TranslationDocument,
    keyword: &str,
    opts: KeywordOptions,
) -> Result<Vec<&'a TranslationUnit>> {
    let matcher: Box<dyn Fn(&str) -> bool> = if opts.is_regex {
        let re = RegexBuilder::new(keyword)
            .case_insensitive(!opts.case_sensitive)
            .build()
            .map_err(|e| XlfError::Pattern {
                pattern: keyword.to_string(),
                message: e.to_string(),
            })?;
        Box::new(move |text| re.is_match(text))
    } else if opts.case_sensitive {
        let needle = keyword.to_string();
        Box::new(move |text| text.contains(&needle))
    } else {
        let needle = keyword.to_lowercase();
        Box::new(move |text| text.to_lowercase().contains(&needle))
    };

    Ok(translatable(doc)
        .filter(|u| {
            if opts.search_in_target {
                let t = u.target_text();
                !t.is_empty() && matcher(t)
            } else {
                matcher(&u.source)
            }
        })
        .collect())
}

/// Source text to distinct finished translations, in first-seen order.
pub fn build_translation_map(doc: &TranslationDocument) -> Vec<(String, Vec<String>)> {
    let mut order: Vec<(String, Vec<String>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for u in translatable(doc) {
        let text = u.target_text();
        if text.is_empty() || matches!(u.completion(), Completion::Untranslated | Completion::NeedsReview) {
            continue;
        }
        let i = *index.entry(u.source.clone()).or_insert_with(|| {
            order.push((u.source.clone(), Vec::new()));
            order.len() - 1
        });
        let variants = &mut order[i].1;
        if !variants.iter().any(|v| v == text) {
            variants.push(text.to_string());
        }
    }
    order
}

pub fn extract_untranslated(doc: &TranslationDocument) -> Vec<&TranslationUnit> {
    translatable(doc)
        .filter(|u| u.completion() == Completion::Untranslated)
        .collect()
}

/// Where source texts for query rows come from. A translated file can stand
/// in for the generator language, matched by unit id.
#[derive(Clone, Copy)]
pub struct SourceView<'a> {
    doc: &'a TranslationDocument,
    alternate: Option<&'a TranslationDocument>,
}

impl<'a> SourceView<'a> {
    pub fn new(doc: &'a TranslationDocument, alternate: Option<&'a TranslationDocument>) -> Self {
        Self { doc, alternate }
    }

    fn source_of(&self, unit: &TranslationUnit) -> (String, String) {
        if let Some(alt) = self.alternate {
            if let Some(text) = alt
                .unit(&unit.id)
                .map(|u| u.target_text())
                .filter(|t| !t.is_empty())
            {
                return (text.to_string(), alt.target_language.clone());
            }
        }
        (unit.source.clone(), self.doc.source_language.clone())
    }

    fn plain_source_language(&self) -> String {
        self.alternate
            .map(|a| a.target_language.clone())
            .unwrap_or_else(|| self.doc.source_language.clone())
    }
}

fn comment_of(unit: &TranslationUnit) -> Option<String> {
    unit.developer_note()
        .map(|n| n.text.clone())
        .filter(|t| !t.is_empty())
}

fn kind_of(unit: &TranslationUnit) -> String {
    unit.generator_note()
        .map(|n| n.text.clone())
        .unwrap_or_default()
}

pub fn untranslated_rows(view: SourceView<'_>, page: Page) -> Vec<UntranslatedText> {
    page.apply(extract_untranslated(view.doc))
        .into_iter()
        .map(|u| {
            let (source_text, source_language) = view.source_of(u);
            UntranslatedText {
                id: u.id.clone(),
                source_text,
                source_language,
                comment: comment_of(u),
                max_length: u.max_width,
                kind: kind_of(u),
            }
        })
        .collect()
}

pub fn with_state_rows(
    view: SourceView<'_>,
    units: Vec<&TranslationUnit>,
    page: Page,
) -> Vec<TranslatedTextWithState> {
    page.apply(units)
        .into_iter()
        .map(|u| {
            let (source_text, source_language) = view.source_of(u);
            TranslatedTextWithState {
                id: u.id.clone(),
                source_text,
                source_language,
                target_text: u.target_text().to_string(),
                comment: comment_of(u),
                translation_state: u.translation_state(),
                review_reason: u.review_reason(),
                max_length: u.max_width,
                kind: kind_of(u),
            }
        })
        .collect()
}

pub fn translation_map_rows(view: SourceView<'_>, page: Page) -> Vec<TranslatedText> {
    let source_language = view.plain_source_language();
    page.apply(build_translation_map(view.doc))
        .into_iter()
        .map(|(source_text, target_texts)| TranslatedText {
            source_text,
            target_texts,
            source_language: source_language.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use xlfsync_core::{CompletionSignal, Note, NoteSource, Target, TargetState};

    fn unit(id: &str, source: &str, target: Option<Target>) -> TranslationUnit {
        let mut u = TranslationUnit::new(id, source);
        u.target = target;
        u
    }

    fn state(text: &str, st: TargetState) -> Option<Target> {
        Some(Target::with_signal(text, &CompletionSignal::state(st)))
    }

    fn doc() -> TranslationDocument {
        let mut d = TranslationDocument::new("en-US", "sv-SE", "App");
        d.units = vec![
            unit("1", "Cat", state("Katt", TargetState::Translated)),
            unit("2", "Dog", state("Hund", TargetState::NeedsReviewTranslation)),
            unit("3", "Cat", state("Kisse", TargetState::Final)),
            unit("4", "Total", Some(Target::from_raw("[NAB: NOT TRANSLATED]"))),
            unit("5", "Bird", None),
            unit("6", "Cat", Some(Target::new("Katt"))),
            unit("7", "Fish", state("Fisk", TargetState::SignedOff)),
            unit("8", "Horse", Some(Target::from_raw("[NAB: SUGGESTION]Häst"))),
        ];
        d.units[0]
            .notes
            .push(Note::new(NoteSource::Developer, 2, "Pet"));
        d.units[0]
            .notes
            .push(Note::new(NoteSource::Generator, 3, "Table Pet - Field Name"));
        d
    }

    fn ids(units: &[&TranslationUnit]) -> Vec<String> {
        units.iter().map(|u| u.id.clone()).collect()
    }

    #[test]
    fn page_skips_then_limits() {
        let items = vec![1, 2, 3, 4, 5];
        assert_eq!(Page::new(0, 0).apply(items.clone()), items);
        assert_eq!(Page::new(1, 2).apply(items.clone()), vec![2, 3]);
        assert_eq!(Page::new(4, 10).apply(items.clone()), vec![5]);
        assert!(Page::new(9, 1).apply(items).is_empty());
    }

    #[test]
    fn state_filter_excludes_empty_targets() {
        let d = doc();
        assert_eq!(
            ids(&filter_by_state(&d, StateFilter::All, None)),
            ["1", "2", "3", "6", "7", "8"]
        );
        assert_eq!(ids(&filter_by_state(&d, StateFilter::Translated, None)), ["1", "6"]);
        assert_eq!(ids(&filter_by_state(&d, StateFilter::NeedsReview, None)), ["2", "8"]);
        assert_eq!(ids(&filter_by_state(&d, StateFilter::Final, None)), ["3"]);
        assert_eq!(ids(&filter_by_state(&d, StateFilter::SignedOff, None)), ["7"]);
        assert_eq!(
            ids(&filter_by_state(&d, StateFilter::All, Some("Cat"))),
            ["1", "3", "6"]
        );
    }

    #[test]
    fn unknown_state_filter_is_rejected() {
        assert_eq!("".parse::<StateFilter>().unwrap(), StateFilter::All);
        assert!(matches!(
            "reviewed".parse::<StateFilter>(),
            Err(XlfError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn keyword_search_in_source_and_target() {
        let d = doc();
        let hits = filter_by_keyword(&d, "cat", KeywordOptions::default()).unwrap();
        assert_eq!(ids(&hits), ["1", "3", "6"]);

        let sensitive = KeywordOptions {
            case_sensitive: true,
            ..KeywordOptions::default()
        };
        assert!(filter_by_keyword(&d, "cat", sensitive).unwrap().is_empty());

        let in_target = KeywordOptions {
            search_in_target: true,
            is_regex: true,
            ..KeywordOptions::default()
        };
        let hits = filter_by_keyword(&d, "^k", in_target).unwrap();
        assert_eq!(ids(&hits), ["1", "3", "6"]);
    }

    #[test]
    fn bad_regex_names_the_pattern() {
        let d = doc();
        let opts = KeywordOptions {
            is_regex: true,
            ..KeywordOptions::default()
        };
        match filter_by_keyword(&d, "(", opts) {
            Err(XlfError::Pattern { pattern, .. }) => assert_eq!(pattern, "("),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn translation_map_groups_distinct_finished_targets() {
        let map = build_translation_map(&doc());
        assert_eq!(
            map,
            vec![
                ("Cat".to_string(), vec!["Katt".to_string(), "Kisse".to_string()]),
                ("Fish".to_string(), vec!["Fisk".to_string()]),
            ]
        );
    }

    #[test]
    fn untranslated_includes_placeholders_and_missing_targets() {
        let d = doc();
        assert_eq!(ids(&extract_untranslated(&d)), ["4", "5"]);
        let rows = untranslated_rows(SourceView::new(&d, None), Page::new(1, 0));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "5");
        assert_eq!(rows[0].source_language, "en-US");
    }

    #[test]
    fn rows_carry_comment_type_and_review_reason() {
        let d = doc();
        let view = SourceView::new(&d, None);
        let rows = with_state_rows(view, filter_by_state(&d, StateFilter::All, None), Page::default());
        assert_eq!(rows[0].comment.as_deref(), Some("Pet"));
        assert_eq!(rows[0].kind, "Table Pet - Field Name");
        assert_eq!(rows[0].translation_state.as_deref(), Some("translated"));
        assert_eq!(
            rows[1].review_reason.as_deref(),
            Some(TargetState::NeedsReviewTranslation.explanation())
        );
        let horse = rows.iter().find(|r| r.id == "8").unwrap();
        assert_eq!(horse.translation_state.as_deref(), Some("needs-review"));
        let plain = rows.iter().find(|r| r.id == "6").unwrap();
        assert_eq!(plain.translation_state, None);
    }

    #[test]
    fn alternate_source_document_replaces_source_text() {
        let d = doc();
        let mut danish = TranslationDocument::new("en-US", "da-DK", "App");
        danish.units.push(unit("5", "Bird", state("Fugl", TargetState::Translated)));
        let rows = untranslated_rows(SourceView::new(&d, Some(&danish)), Page::default());
        assert_eq!(rows[0].source_text, "Total");
        assert_eq!(rows[0].source_language, "en-US");
        assert_eq!(rows[1].source_text, "Fugl");
        assert_eq!(rows[1].source_language, "da-DK");
    }
}
