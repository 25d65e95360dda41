use crate::state::{Completion, CompletionSignal, TargetState, TranslationToken, EXACT_MATCH};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_GROUP_ID: &str = "body";
pub const DEFAULT_DATATYPE: &str = "xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Looks at the first line break only.
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(i) if i > 0 && text.as_bytes()[i - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Optional `<header><tool/></header>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolHeader {
    pub tool_id: String,
    pub tool_name: String,
    pub tool_version: Option<String>,
    pub tool_company: Option<String>,
}

/// Optional product attributes on `<file>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub tool_id: Option<String>,
    pub product_name: Option<String>,
    pub product_version: Option<String>,
    pub build_num: Option<String>,
    pub request_id: Option<String>,
}

/// One parsed XLIFF file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationDocument {
    pub datatype: String,
    pub source_language: String,
    pub target_language: String,
    /// Identifier of the originating artifact, carried through unchanged.
    pub original: String,
    pub product: ProductInfo,
    pub header: Option<ToolHeader>,
    pub group_id: String,
    pub line_ending: LineEnding,
    pub units: Vec<TranslationUnit>,
}

impl TranslationDocument {
    pub fn new(
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        original: impl Into<String>,
    ) -> Self {
        Self {
            datatype: DEFAULT_DATATYPE.to_string(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            original: original.into(),
            product: ProductInfo::default(),
            header: None,
            group_id: DEFAULT_GROUP_ID.to_string(),
            line_ending: LineEnding::default(),
            units: Vec::new(),
        }
    }

    /// Copy of the file-level attributes with no units.
    pub fn empty_like(&self) -> Self {
        Self {
            datatype: self.datatype.clone(),
            source_language: self.source_language.clone(),
            target_language: self.target_language.clone(),
            original: self.original.clone(),
            product: self.product.clone(),
            header: self.header.clone(),
            group_id: self.group_id.clone(),
            line_ending: self.line_ending,
            units: Vec::new(),
        }
    }

    pub fn unit(&self, id: &str) -> Option<&TranslationUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: &str) -> Option<&mut TranslationUnit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn same_target_language(&self, other: &str) -> bool {
        self.target_language.eq_ignore_ascii_case(other)
    }
}

/// Who wrote a note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteSource {
    Developer,
    Generator,
    RefreshHint,
    Other(String),
}

impl NoteSource {
    pub fn as_str(&self) -> &str {
        match self {
            NoteSource::Developer => "Developer",
            NoteSource::Generator => "Xliff Generator",
            NoteSource::RefreshHint => "NAB AL Tool Refresh Xlf",
            NoteSource::Other(s) => s,
        }
    }
}

impl From<&str> for NoteSource {
    fn from(s: &str) -> Self {
        match s {
            "Developer" => NoteSource::Developer,
            "Xliff Generator" => NoteSource::Generator,
            "NAB AL Tool Refresh Xlf" => NoteSource::RefreshHint,
            other => NoteSource::Other(other.to_string()),
        }
    }
}

impl fmt::Display for NoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub from: NoteSource,
    pub annotates: Option<String>,
    pub priority: Option<u32>,
    pub text: String,
}

impl Note {
    pub fn new(from: NoteSource, priority: u32, text: impl Into<String>) -> Self {
        Self {
            from,
            annotates: Some("general".to_string()),
            priority: Some(priority),
            text: text.into(),
        }
    }

    pub fn hint(hint: RefreshHint) -> Self {
        Note::new(NoteSource::RefreshHint, 3, hint.text())
    }
}

/// Reasons the refresh engine leaves on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshHint {
    New,
    NewCopiedSource,
    ModifiedSource,
    Suggestion,
}

impl RefreshHint {
    pub fn text(self) -> &'static str {
        match self {
            RefreshHint::New => "New translation.",
            RefreshHint::NewCopiedSource => "New translation. Target copied from source.",
            RefreshHint::ModifiedSource => "Source has been modified.",
            RefreshHint::Suggestion => "Suggested translation inserted.",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Text without any bracket token.
    pub text: String,
    pub state: Option<TargetState>,
    pub state_qualifier: Option<String>,
    pub token: Option<TranslationToken>,
}

impl Target {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_signal(text: impl Into<String>, signal: &CompletionSignal) -> Self {
        let mut t = Target::new(text);
        t.set_signal(signal);
        t
    }

    /// Build from raw element text, splitting off a leading token.
    pub fn from_raw(raw: &str) -> Self {
        let (token, text) = TranslationToken::strip(raw);
        Self {
            text: text.to_string(),
            token,
            ..Self::default()
        }
    }

    /// Text as written to the file.
    pub fn raw_text(&self) -> String {
        match self.token {
            Some(t) => format!("{}{}", t.marker(), self.text),
            None => self.text.clone(),
        }
    }

    pub fn signal(&self) -> CompletionSignal {
        match (self.state, self.token) {
            (Some(state), _) => CompletionSignal::State {
                state,
                exact_match: self.state_qualifier.as_deref() == Some(EXACT_MATCH),
            },
            (None, Some(token)) => CompletionSignal::Token(token),
            (None, None) => CompletionSignal::None,
        }
    }

    pub fn set_signal(&mut self, signal: &CompletionSignal) {
        match signal {
            CompletionSignal::None => {
                self.state = None;
                self.state_qualifier = None;
                self.token = None;
            }
            CompletionSignal::State { state, exact_match } => {
                self.state = Some(*state);
                self.token = None;
                if *exact_match {
                    self.state_qualifier = Some(EXACT_MATCH.to_string());
                } else if self.state_qualifier.as_deref() == Some(EXACT_MATCH) {
                    self.state_qualifier = None;
                }
            }
            CompletionSignal::Token(token) => {
                self.state = None;
                self.state_qualifier = None;
                self.token = Some(*token);
            }
        }
    }

    pub fn completion(&self) -> Completion {
        self.signal().classify(&self.text)
    }

    pub fn has_no_signal(&self) -> bool {
        self.state.is_none() && self.token.is_none()
    }
}

/// A `<trans-unit>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub id: String,
    pub translate: bool,
    pub source: String,
    pub target: Option<Target>,
    /// Further candidates written as extra `<target>` elements.
    /// Kept distinct and in first-seen order.
    pub alternatives: Vec<Target>,
    pub notes: Vec<Note>,
    pub max_width: Option<u32>,
    pub size_unit: Option<String>,
    pub xml_space: Option<String>,
    pub al_object_target: Option<String>,
}

impl TranslationUnit {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            translate: true,
            source: source.into(),
            target: None,
            alternatives: Vec::new(),
            notes: Vec::new(),
            max_width: None,
            size_unit: None,
            xml_space: None,
            al_object_target: None,
        }
    }

    /// Text of the primary target, empty when there is none.
    pub fn target_text(&self) -> &str {
        self.target.as_ref().map(|t| t.text.as_str()).unwrap_or("")
    }

    /// Primary target followed by alternatives.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.target.iter().chain(self.alternatives.iter())
    }

    pub fn completion(&self) -> Completion {
        match &self.target {
            Some(t) => t.completion(),
            None => Completion::Untranslated,
        }
    }

    /// Replace all targets. The first becomes primary, duplicates are dropped.
    pub fn set_targets(&mut self, targets: Vec<Target>) {
        self.alternatives.clear();
        let mut iter = targets.into_iter();
        self.target = iter.next();
        for t in iter {
            self.push_alternative(t);
        }
    }

    /// Add an alternative unless an identical target is already present.
    pub fn push_alternative(&mut self, target: Target) -> bool {
        if self.targets().any(|t| t.text == target.text && t.token == target.token) {
            return false;
        }
        self.alternatives.push(target);
        true
    }

    pub fn note(&self, from: &NoteSource) -> Option<&Note> {
        self.notes.iter().find(|n| &n.from == from)
    }

    pub fn note_text(&self, from: &NoteSource) -> &str {
        self.note(from).map(|n| n.text.as_str()).unwrap_or("")
    }

    pub fn developer_note(&self) -> Option<&Note> {
        self.note(&NoteSource::Developer)
    }

    pub fn generator_note(&self) -> Option<&Note> {
        self.note(&NoteSource::Generator)
    }

    pub fn hint_note(&self) -> Option<&Note> {
        self.note(&NoteSource::RefreshHint)
    }

    /// Notes from anyone but the developer and the generator.
    pub fn custom_notes(&self) -> impl Iterator<Item = &Note> {
        self.notes
            .iter()
            .filter(|n| !matches!(n.from, NoteSource::Developer | NoteSource::Generator))
    }

    /// Insert or replace the note from the same source, keeping its position.
    pub fn upsert_note(&mut self, note: Note) {
        match self.notes.iter_mut().find(|n| n.from == note.from) {
            Some(existing) => *existing = note,
            None => self.notes.push(note),
        }
    }

    pub fn remove_note(&mut self, from: &NoteSource) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| &n.from != from);
        before != self.notes.len()
    }

    /// The hint always goes first and replaces any earlier one.
    pub fn set_hint(&mut self, hint: RefreshHint) {
        self.remove_note(&NoteSource::RefreshHint);
        self.notes.insert(0, Note::hint(hint));
    }

    /// Reason a reviewer should look at this unit, if any.
    pub fn review_reason(&self) -> Option<String> {
        let target = self.target.as_ref()?;
        if target.has_no_signal() {
            return None;
        }
        if let Some(hint) = self.hint_note().filter(|n| !n.text.is_empty()) {
            return Some(hint.text.clone());
        }
        target.state.map(|s| s.explanation().to_string())
    }

    /// State label used by query rows: review tokens read as "needs-review".
    pub fn translation_state(&self) -> Option<String> {
        let target = self.target.as_ref()?;
        match target.token {
            Some(TranslationToken::Review) | Some(TranslationToken::Suggestion) => {
                return Some(Completion::NeedsReview.as_str().to_string())
            }
            _ => {}
        }
        match (target.state, target.token) {
            (Some(state), _) => Some(state.as_str().to_string()),
            (None, Some(_)) => Some(Completion::Untranslated.as_str().to_string()),
            (None, None) => None,
        }
    }

    /// Whether the primary target is a bare placeholder with nothing worth keeping.
    pub fn is_placeholder(&self) -> bool {
        match &self.target {
            Some(t) => {
                t.token == Some(TranslationToken::NotTranslated)
                    || (t.text.is_empty()
                        && matches!(
                            t.state,
                            Some(TargetState::New) | Some(TargetState::NeedsTranslation)
                        ))
            }
            None => false,
        }
    }
}
