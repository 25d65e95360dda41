//! Target-state vocabulary and the two ways of signalling completeness.
//!
//! A target either carries an XLIFF `state` attribute or, in the older
//! convention, a bracket token prefixed to its text. [`CompletionSignal`]
//! unifies both so that classification and re-encoding happen in one place.

use crate::XlfError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Qualifier written next to a state when the text came from an identical source elsewhere.
pub const EXACT_MATCH: &str = "exact-match";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetState {
    Final,
    NeedsAdaptation,
    NeedsL10n,
    NeedsReviewAdaptation,
    NeedsReviewL10n,
    NeedsReviewTranslation,
    NeedsTranslation,
    New,
    SignedOff,
    Translated,
}

impl TargetState {
    pub const ALL: [TargetState; 10] = [
        TargetState::Final,
        TargetState::NeedsAdaptation,
        TargetState::NeedsL10n,
        TargetState::NeedsReviewAdaptation,
        TargetState::NeedsReviewL10n,
        TargetState::NeedsReviewTranslation,
        TargetState::NeedsTranslation,
        TargetState::New,
        TargetState::SignedOff,
        TargetState::Translated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetState::Final => "final",
            TargetState::NeedsAdaptation => "needs-adaptation",
            TargetState::NeedsL10n => "needs-l10n",
            TargetState::NeedsReviewAdaptation => "needs-review-adaptation",
            TargetState::NeedsReviewL10n => "needs-review-l10n",
            TargetState::NeedsReviewTranslation => "needs-review-translation",
            TargetState::NeedsTranslation => "needs-translation",
            TargetState::New => "new",
            TargetState::SignedOff => "signed-off",
            TargetState::Translated => "translated",
        }
    }

    /// Human readable meaning of the state, surfaced as a review reason.
    pub fn explanation(self) -> &'static str {
        match self {
            TargetState::Final => "The translation has been finalized and should not be modified.",
            TargetState::NeedsAdaptation => {
                "The translation requires adaptation for non-textual content (like formatting or images)."
            }
            TargetState::NeedsL10n => {
                "The translation requires localization for both textual and non-textual content."
            }
            TargetState::NeedsReviewAdaptation => {
                "The non-textual content in the translation needs review."
            }
            TargetState::NeedsReviewL10n => {
                "Both the text and non-textual content need review for localization."
            }
            TargetState::NeedsReviewTranslation => {
                "The translated text needs review before it can be considered final."
            }
            TargetState::NeedsTranslation => "The content still needs to be translated.",
            TargetState::New => "The translation unit is new and has not been processed yet.",
            TargetState::SignedOff => "The translation has been reviewed and approved.",
            TargetState::Translated => {
                "The content has been translated but not yet reviewed or approved."
            }
        }
    }

    pub fn is_needs_review(self) -> bool {
        matches!(
            self,
            TargetState::NeedsAdaptation
                | TargetState::NeedsL10n
                | TargetState::NeedsReviewAdaptation
                | TargetState::NeedsReviewL10n
                | TargetState::NeedsReviewTranslation
        )
    }

    /// States a human (or an automation tool) may write through a point save.
    pub fn is_saveable(self) -> bool {
        matches!(
            self,
            TargetState::NeedsReviewTranslation
                | TargetState::Translated
                | TargetState::Final
                | TargetState::SignedOff
        )
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetState {
    type Err = XlfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetState::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| XlfError::InvalidState {
                value: s.to_string(),
            })
    }
}

/// Bracket markers used instead of `state` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranslationToken {
    NotTranslated,
    Review,
    Suggestion,
}

impl TranslationToken {
    pub fn marker(self) -> &'static str {
        match self {
            TranslationToken::NotTranslated => "[NAB: NOT TRANSLATED]",
            TranslationToken::Review => "[NAB: REVIEW]",
            TranslationToken::Suggestion => "[NAB: SUGGESTION]",
        }
    }

    /// Split a leading marker off raw target text. Only one marker is removed.
    pub fn strip(raw: &str) -> (Option<TranslationToken>, &str) {
        for token in [
            TranslationToken::NotTranslated,
            TranslationToken::Review,
            TranslationToken::Suggestion,
        ] {
            if let Some(rest) = raw.strip_prefix(token.marker()) {
                return (Some(token), rest);
            }
        }
        (None, raw)
    }
}

/// Coarse completeness class of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Completion {
    Untranslated,
    NeedsReview,
    Translated,
    Final,
    SignedOff,
}

impl Completion {
    pub fn as_str(self) -> &'static str {
        match self {
            Completion::Untranslated => "untranslated",
            Completion::NeedsReview => "needs-review",
            Completion::Translated => "translated",
            Completion::Final => "final",
            Completion::SignedOff => "signed-off",
        }
    }
}

/// The completeness signal of one target, in whichever encoding it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionSignal {
    None,
    State {
        state: TargetState,
        exact_match: bool,
    },
    Token(TranslationToken),
}

impl CompletionSignal {
    pub fn state(state: TargetState) -> Self {
        CompletionSignal::State {
            state,
            exact_match: false,
        }
    }

    /// State takes precedence over tokens, tokens over plain text.
    pub fn classify(&self, text: &str) -> Completion {
        match self {
            CompletionSignal::State { state, .. } => match state {
                TargetState::Final => Completion::Final,
                TargetState::SignedOff => Completion::SignedOff,
                TargetState::Translated => Completion::Translated,
                TargetState::New | TargetState::NeedsTranslation => Completion::Untranslated,
                s if s.is_needs_review() => Completion::NeedsReview,
                _ => Completion::Untranslated,
            },
            CompletionSignal::Token(TranslationToken::NotTranslated) => Completion::Untranslated,
            CompletionSignal::Token(_) => Completion::NeedsReview,
            CompletionSignal::None if text.is_empty() => Completion::Untranslated,
            CompletionSignal::None => Completion::Translated,
        }
    }
}

/// What the refresh engine wants to say about a target, independent of encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marking {
    /// Brand new unit with nothing to offer.
    Placeholder,
    /// Existing unit whose target had to be rebuilt.
    Regenerated,
    /// Text mirrors the source and must be checked.
    Review,
    /// Source moved under a human translation.
    Adaptation,
    /// Text copied from an identical source elsewhere.
    Suggestion,
    Translated,
}

/// Which encoding a translation folder uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TranslationMode {
    /// `state` attributes, as expected by external translation tools.
    #[default]
    External,
    /// Bracket tokens in the target text.
    Tokens,
}

impl TranslationMode {
    pub fn signal(self, marking: Marking, exact_match_state: Option<TargetState>) -> CompletionSignal {
        match self {
            TranslationMode::External => match marking {
                Marking::Placeholder => CompletionSignal::state(TargetState::New),
                Marking::Regenerated | Marking::Adaptation => {
                    CompletionSignal::state(TargetState::NeedsAdaptation)
                }
                Marking::Review => CompletionSignal::state(TargetState::NeedsReviewTranslation),
                Marking::Suggestion => CompletionSignal::State {
                    state: exact_match_state.unwrap_or(TargetState::NeedsReviewTranslation),
                    exact_match: true,
                },
                Marking::Translated => CompletionSignal::state(TargetState::Translated),
            },
            TranslationMode::Tokens => match marking {
                Marking::Placeholder | Marking::Regenerated => {
                    CompletionSignal::Token(TranslationToken::NotTranslated)
                }
                Marking::Review | Marking::Adaptation => {
                    CompletionSignal::Token(TranslationToken::Review)
                }
                Marking::Suggestion => CompletionSignal::Token(TranslationToken::Suggestion),
                Marking::Translated => CompletionSignal::None,
            },
        }
    }

    /// Re-encode an existing signal into this mode. `text` is the target text
    /// without any marker.
    pub fn normalize(
        self,
        signal: &CompletionSignal,
        text: &str,
        exact_match_state: Option<TargetState>,
    ) -> CompletionSignal {
        match (self, signal) {
            (TranslationMode::Tokens, CompletionSignal::State { state, .. }) => match state {
                TargetState::New | TargetState::NeedsTranslation => {
                    CompletionSignal::Token(TranslationToken::NotTranslated)
                }
                s if s.is_needs_review() => CompletionSignal::Token(TranslationToken::Review),
                _ => CompletionSignal::None,
            },
            (TranslationMode::External, CompletionSignal::Token(token)) => match token {
                TranslationToken::NotTranslated => {
                    CompletionSignal::state(TargetState::NeedsTranslation)
                }
                TranslationToken::Review => {
                    CompletionSignal::state(TargetState::NeedsReviewTranslation)
                }
                TranslationToken::Suggestion => {
                    self.signal(Marking::Suggestion, exact_match_state)
                }
            },
            (TranslationMode::External, CompletionSignal::None) if text.is_empty() => {
                CompletionSignal::state(TargetState::NeedsTranslation)
            }
            (TranslationMode::External, CompletionSignal::None) => {
                CompletionSignal::state(TargetState::Translated)
            }
            (_, other) => other.clone(),
        }
    }
}

impl fmt::Display for TranslationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TranslationMode::External => "external",
            TranslationMode::Tokens => "tokens",
        })
    }
}

impl FromStr for TranslationMode {
    type Err = XlfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "external" | "states" => Ok(TranslationMode::External),
            "tokens" | "nab-tags" => Ok(TranslationMode::Tokens),
            _ => Err(XlfError::InvalidMode {
                mode: s.to_string(),
            }),
        }
    }
}
