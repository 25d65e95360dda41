//! Synchronizing a target-language file with the generator file.
//!
//! The generator file decides which units exist, their order and their source
//! text. Target files keep their translations; changed sources get flagged,
//! new units get a placeholder, a copy of the source or matched suggestions.

use std::collections::HashMap;
use xlfsync_core::{
    Completion, CompletionSignal, Marking, NoteSource, RefreshHint, Result, Target, TargetState,
    TranslationDocument, TranslationMode, TranslationToken, TranslationUnit,
};
use xlfsync_domain::RefreshReport;

#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub mode: TranslationMode,
    /// Only reorder and prune; no unit is added or edited.
    pub sort_only: bool,
    /// Look for identical sources in sibling files and suggestion files.
    pub match_translation: bool,
    /// Also look inside the file being refreshed.
    pub match_from_own_file: bool,
    /// State given to matched suggestions in `External` mode.
    pub exact_match_state: Option<TargetState>,
    pub clear_hints_on_translated: bool,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            mode: TranslationMode::External,
            sort_only: false,
            match_translation: true,
            match_from_own_file: true,
            exact_match_state: None,
            clear_hints_on_translated: true,
        }
    }
}

/// Provider of translations from outside the translation folder, such as a
/// base application's published files. Returns source text to target texts.
pub trait TranslationLookup {
    fn lookup(&self, target_language: &str) -> Result<Option<HashMap<String, Vec<String>>>>;
}

#[derive(Debug, Clone)]
struct Candidate {
    unit_id: Option<String>,
    text: String,
}

#[derive(Debug, Clone)]
struct PoolSource {
    origin: String,
    language: String,
    entries: HashMap<String, Vec<Candidate>>,
}

/// Read-only snapshot of known translations used for cross-file matching.
/// Sources added first are preferred.
#[derive(Debug, Clone, Default)]
pub struct MatchPool {
    sources: Vec<PoolSource>,
}

impl MatchPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every finished translation in `doc`. Placeholders and targets
    /// awaiting review are not offered to other units.
    pub fn add_document(&mut self, origin: &str, doc: &TranslationDocument) {
        let mut entries: HashMap<String, Vec<Candidate>> = HashMap::new();
        for unit in doc.units.iter().filter(|u| u.translate) {
            if !is_reusable(unit) {
                continue;
            }
            entries
                .entry(unit.source.clone())
                .or_default()
                .push(Candidate {
                    unit_id: Some(unit.id.clone()),
                    text: unit.target_text().to_string(),
                });
        }
        tracing::debug!(event = "match_pool_add", origin = origin, sources = entries.len());
        self.sources.push(PoolSource {
            origin: origin.to_string(),
            language: doc.target_language.clone(),
            entries,
        });
    }

    pub fn add_map(&mut self, origin: &str, language: &str, map: HashMap<String, Vec<String>>) {
        let entries = map
            .into_iter()
            .map(|(source, targets)| {
                let cands = targets
                    .into_iter()
                    .filter(|t| !t.is_empty())
                    .map(|text| Candidate {
                        unit_id: None,
                        text,
                    })
                    .collect();
                (source, cands)
            })
            .collect();
        self.sources.push(PoolSource {
            origin: origin.to_string(),
            language: language.to_string(),
            entries,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Distinct target texts for `source` in `language`, in preference order.
    /// Within the file named `origin`, the unit `unit_id` itself is skipped,
    /// and the whole file is skipped unless `include_origin` is set.
    pub fn candidates(
        &self,
        language: &str,
        source: &str,
        origin: &str,
        unit_id: &str,
        include_origin: bool,
    ) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for src in &self.sources {
            if !src.language.eq_ignore_ascii_case(language) {
                continue;
            }
            let own = src.origin == origin;
            if own && !include_origin {
                continue;
            }
            let Some(cands) = src.entries.get(source) else {
                continue;
            };
            for c in cands {
                if own && c.unit_id.as_deref() == Some(unit_id) {
                    continue;
                }
                if !out.contains(&c.text) {
                    out.push(c.text.clone());
                }
            }
        }
        out
    }
}

fn is_reusable(unit: &TranslationUnit) -> bool {
    !unit.target_text().is_empty()
        && matches!(
            unit.completion(),
            Completion::Translated | Completion::Final | Completion::SignedOff
        )
}

/// Result of refreshing one document.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub document: TranslationDocument,
    pub report: RefreshReport,
}

/// How a target could be filled without a human.
enum Fill {
    Nothing,
    EmptySource,
    CopiedSource,
    Suggested,
}

struct Reconciler<'a> {
    opts: &'a RefreshOptions,
    pool: &'a MatchPool,
    origin: &'a str,
    language: String,
    same_language: bool,
}

/// Rebuild `target` from `generator`. `origin` names the target inside `pool`.
pub fn refresh_document(
    generator: &TranslationDocument,
    target: TranslationDocument,
    pool: &MatchPool,
    origin: &str,
    opts: &RefreshOptions,
) -> RefreshOutcome {
    let same_language = target.same_target_language(&generator.target_language)
        || target.same_target_language(&generator.source_language);
    let rec = Reconciler {
        opts,
        pool,
        origin,
        language: target.target_language.clone(),
        same_language,
    };
    let mut report = RefreshReport {
        checked_files: 1,
        ..RefreshReport::default()
    };

    let mut out = target.empty_like();
    if out.original.is_empty() {
        out.original = generator.original.clone();
    }
    let mut leftovers: HashMap<String, TranslationUnit> = target
        .units
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();

    for g in generator.units.iter().filter(|g| g.translate) {
        match leftovers.remove(&g.id) {
            None if opts.sort_only => {}
            None => {
                out.units.push(rec.new_unit(g, &mut report));
                report.added += 1;
            }
            Some(unit) if opts.sort_only => out.units.push(unit),
            Some(mut unit) => {
                rec.update_unit(g, &mut unit, &mut report);
                out.units.push(unit);
            }
        }
    }

    report.removed = leftovers.len();
    if !leftovers.is_empty() {
        let mut ids: Vec<&String> = leftovers.keys().collect();
        ids.sort();
        tracing::debug!(event = "refresh_removed", origin = origin, ids = ?ids);
    }
    tracing::debug!(event = "refresh_document", origin = origin, report = ?report);
    RefreshOutcome {
        document: out,
        report,
    }
}

impl Reconciler<'_> {
    fn signal(&self, marking: Marking) -> CompletionSignal {
        self.opts.mode.signal(marking, self.opts.exact_match_state)
    }

    fn new_unit(&self, g: &TranslationUnit, report: &mut RefreshReport) -> TranslationUnit {
        let mut unit = TranslationUnit::new(g.id.clone(), g.source.clone());
        unit.max_width = g.max_width;
        unit.size_unit = g.size_unit.clone();
        unit.xml_space = g.xml_space.clone();
        unit.al_object_target = g.al_object_target.clone();
        unit.notes = g
            .notes
            .iter()
            .filter(|n| n.from != NoteSource::RefreshHint)
            .cloned()
            .collect();
        match self.fill(&mut unit, report) {
            Fill::Nothing => {
                unit.target = Some(Target::with_signal("", &self.signal(Marking::Placeholder)));
                unit.set_hint(RefreshHint::New);
            }
            Fill::CopiedSource => report.reviews_added += 1,
            Fill::EmptySource | Fill::Suggested => {}
        }
        unit
    }

    /// Try the automatic ways of producing a target, in order.
    fn fill(&self, unit: &mut TranslationUnit, report: &mut RefreshReport) -> Fill {
        if unit.source.is_empty() {
            unit.set_targets(vec![Target::with_signal(
                "",
                &self.signal(Marking::Translated),
            )]);
            unit.remove_note(&NoteSource::RefreshHint);
            return Fill::EmptySource;
        }
        if self.same_language {
            unit.set_targets(vec![Target::with_signal(
                unit.source.clone(),
                &self.signal(Marking::Review),
            )]);
            unit.set_hint(RefreshHint::NewCopiedSource);
            return Fill::CopiedSource;
        }
        if self.opts.match_translation {
            let found = self.pool.candidates(
                &self.language,
                &unit.source,
                self.origin,
                &unit.id,
                self.opts.match_from_own_file,
            );
            if !found.is_empty() {
                let signal = self.signal(Marking::Suggestion);
                let n = found.len();
                unit.set_targets(
                    found
                        .into_iter()
                        .map(|text| Target::with_signal(text, &signal))
                        .collect(),
                );
                // A suggestion that already lands settled gets no hint, or the
                // next run would clear it again.
                if !(self.opts.clear_hints_on_translated && is_settled(unit)) {
                    unit.set_hint(RefreshHint::Suggestion);
                }
                report.suggestions_added += n;
                return Fill::Suggested;
            }
        }
        Fill::Nothing
    }

    fn update_unit(&self, g: &TranslationUnit, unit: &mut TranslationUnit, report: &mut RefreshReport) {
        unit.translate = true;
        let source_changed = unit.source != g.source;
        if source_changed {
            unit.source = g.source.clone();
            report.updated_sources += 1;
        }

        if unit.target.is_none() {
            if let Fill::Nothing = self.fill(unit, report) {
                unit.target = Some(Target::with_signal("", &self.signal(Marking::Regenerated)));
                unit.set_hint(RefreshHint::New);
            }
            report.added += 1;
        } else if unit.is_placeholder() {
            match self.fill(unit, report) {
                Fill::CopiedSource => report.reviews_added += 1,
                Fill::Nothing => self.normalize(unit),
                Fill::EmptySource | Fill::Suggested => {}
            }
        } else {
            if source_changed && !unit.source.is_empty() {
                self.flag_changed_source(unit, report);
            }
            self.normalize(unit);
        }

        if unit.max_width != g.max_width {
            unit.max_width = g.max_width;
            report.updated_max_widths += 1;
        }
        unit.size_unit = g.size_unit.clone();

        for from in [NoteSource::Developer, NoteSource::Generator] {
            match (g.note(&from), unit.note(&from)) {
                (Some(gn), Some(tn)) if gn.text == tn.text => {}
                (Some(gn), _) => {
                    unit.upsert_note(gn.clone());
                    report.updated_notes += 1;
                }
                (None, Some(_)) => {
                    unit.remove_note(&from);
                    report.removed_notes += 1;
                }
                (None, None) => {}
            }
        }

        if self.opts.clear_hints_on_translated && unit.hint_note().is_some() && is_settled(unit) {
            unit.remove_note(&NoteSource::RefreshHint);
            report.removed_notes += 1;
        }
    }

    /// The source moved under an existing translation.
    fn flag_changed_source(&self, unit: &mut TranslationUnit, report: &mut RefreshReport) {
        let source = unit.source.clone();
        let same_language = self.same_language;
        let mode = self.opts.mode;
        let Some(target) = unit.target.as_mut() else {
            return;
        };
        if mode == TranslationMode::Tokens
            && matches!(
                target.token,
                Some(TranslationToken::NotTranslated) | Some(TranslationToken::Review)
            )
        {
            return;
        }
        if target.text == source {
            return;
        }
        let marking = if same_language {
            target.text = source;
            Marking::Review
        } else {
            Marking::Adaptation
        };
        target.set_signal(&self.signal(marking));
        unit.set_hint(RefreshHint::ModifiedSource);
        report.reviews_added += 1;
    }

    /// Re-encode every target into the configured mode.
    fn normalize(&self, unit: &mut TranslationUnit) {
        if unit.source.is_empty() {
            return;
        }
        let mode = self.opts.mode;
        let exact = self.opts.exact_match_state;
        for t in unit.target.iter_mut().chain(unit.alternatives.iter_mut()) {
            let signal = mode.normalize(&t.signal(), &t.text, exact);
            t.set_signal(&signal);
        }
    }
}

/// Nothing left for a reviewer to look at.
fn is_settled(unit: &TranslationUnit) -> bool {
    match &unit.target {
        Some(t) => match t.state {
            Some(s) => matches!(
                s,
                TargetState::Translated | TargetState::SignedOff | TargetState::Final
            ),
            None => t.token.is_none(),
        },
        None => false,
    }
}
