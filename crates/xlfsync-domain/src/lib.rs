use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Counters describing one refresh run (one file or a whole batch).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RefreshReport {
    pub added: usize,
    pub removed: usize,
    pub updated_sources: usize,
    pub updated_notes: usize,
    pub updated_max_widths: usize,
    pub removed_notes: usize,
    pub suggestions_added: usize,
    pub reviews_added: usize,
    pub checked_files: usize,
}

impl RefreshReport {
    pub fn is_changed(&self) -> bool {
        self.added
            + self.removed
            + self.updated_sources
            + self.updated_notes
            + self.updated_max_widths
            + self.removed_notes
            + self.suggestions_added
            + self.reviews_added
            > 0
    }

    pub fn absorb(&mut self, other: &RefreshReport) {
        self.added += other.added;
        self.removed += other.removed;
        self.updated_sources += other.updated_sources;
        self.updated_notes += other.updated_notes;
        self.updated_max_widths += other.updated_max_widths;
        self.removed_notes += other.removed_notes;
        self.suggestions_added += other.suggestions_added;
        self.reviews_added += other.reviews_added;
        self.checked_files += other.checked_files;
    }

    /// One-line summary, e.g. "2 inserted translations, 1 removed translations in 3 XLF files".
    pub fn summary(&self, file_name: Option<&str>) -> String {
        let parts: Vec<String> = [
            (self.added, "inserted translations"),
            (self.updated_max_widths, "updated maxwidth"),
            (self.updated_notes, "updated notes"),
            (self.removed_notes, "removed notes"),
            (self.updated_sources, "updated sources"),
            (self.removed, "removed translations"),
            (self.suggestions_added, "added suggestions"),
            (self.reviews_added, "targets marked as in need of review"),
        ]
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{n} {label}"))
        .collect();
        let head = if parts.is_empty() {
            "Nothing changed".to_string()
        } else {
            parts.join(", ")
        };
        match file_name {
            Some(name) => format!("{head} in {name}"),
            None => format!("{head} in {} XLF files", self.checked_files),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileFailure {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileOutcome {
    pub path: String,
    pub report: RefreshReport,
}

/// Outcome of refreshing several target files against one generator file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct BatchReport {
    pub schema_version: u32,
    pub total: RefreshReport,
    pub files: Vec<FileOutcome>,
    pub failures: Vec<FileFailure>,
    /// Set when the run stopped early on a cancellation request.
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UntranslatedText {
    pub id: String,
    pub source_text: String,
    pub source_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranslatedText {
    pub source_text: String,
    pub target_texts: Vec<String>,
    pub source_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranslatedTextWithState {
    pub id: String,
    pub source_text: String,
    pub source_language: String,
    pub target_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Input row of a point save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TranslationToSave {
    pub id: String,
    pub target_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SaveSummary {
    pub path: String,
    pub saved: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreatedTarget {
    pub path: String,
    pub target_language: String,
    pub units: usize,
    pub number_of_matches: usize,
}
