//! Subject classification from source filenames.
//!
//! Product photos are usually named after what they show. The classifier
//! maps a filename to a closed [`SubjectKind`] using a keyword table that
//! callers can replace (in code or from a JSON file) or extend; the
//! default table covers English and Russian product naming.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Subject kind
// ---------------------------------------------------------------------------

/// What kind of furniture a source photo shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Table,
    Bed,
    Chair,
    Cabinet,
    Sofa,
    Unknown,
}

impl SubjectKind {
    /// Noun phrase used in the subject-preservation clause.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Bed => "bed",
            Self::Chair => "chair",
            Self::Cabinet => "cabinet",
            Self::Sofa => "sofa",
            Self::Unknown => "furniture piece",
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Default keyword table. Keywords match as token prefixes ("столик" hits
/// "стол"). Rule order only breaks ties within a single token.
const DEFAULT_KEYWORDS: &[(SubjectKind, &[&str])] = &[
    (
        SubjectKind::Sofa,
        &["sofa", "couch", "divan", "chesterfield", "диван"],
    ),
    (SubjectKind::Bed, &["bed", "кровать"]),
    (
        SubjectKind::Cabinet,
        &[
            "cabinet",
            "wardrobe",
            "dresser",
            "chest",
            "nightstand",
            "шкаф",
            "комод",
            "тумба",
            "тумбочка",
        ],
    ),
    (SubjectKind::Chair, &["chair", "stool", "armchair", "стул", "кресло"]),
    (SubjectKind::Table, &["table", "desk", "стол"]),
];

/// A keyword split into lower-case tokens. Multi-word keywords
/// ("coffee table") match consecutive tokens.
type Keyword = Vec<String>;

/// Split text into lower-case alphabetic tokens. Digits, punctuation and
/// whitespace all separate tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `keyword` matches the tokens ending at `end`: leading keyword
/// tokens must be equal, the last one is a prefix.
fn matches_ending_at(keyword: &[String], tokens: &[String], end: usize) -> bool {
    let Some((last, leading)) = keyword.split_last() else {
        return false;
    };
    let Some(start) = end.checked_sub(leading.len()) else {
        return false;
    };
    tokens[start..end] == *leading && tokens[end].starts_with(last.as_str())
}

/// Keyword-driven filename classifier.
///
/// The stem is split into tokens and the last token that matches a
/// keyword decides the kind, so compound names resolve to their head
/// noun: `bedside_table` is a table, `sofa_table` too.
#[derive(Debug, Clone)]
pub struct SubjectClassifier {
    rules: Vec<(SubjectKind, Vec<Keyword>)>,
}

impl Default for SubjectClassifier {
    fn default() -> Self {
        Self::from_rules(
            DEFAULT_KEYWORDS
                .iter()
                .map(|(kind, words)| (*kind, words.iter().map(|w| w.to_string()).collect()))
                .collect(),
        )
    }
}

/// Keyword file entry, see [`SubjectClassifier::from_json_str`].
#[derive(Debug, Deserialize)]
struct KeywordRule {
    kind: SubjectKind,
    keywords: Vec<String>,
}

impl SubjectClassifier {
    /// Build a classifier from an explicit rule list. Keywords are
    /// tokenized like filenames; blank keywords are dropped.
    pub fn from_rules(rules: Vec<(SubjectKind, Vec<String>)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(kind, words)| (kind, keywords(words.iter().map(String::as_str))))
                .collect(),
        }
    }

    /// Parse a JSON array of `{"kind": "table", "keywords": [...]}` rules.
    /// The result replaces the default table.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let rules: Vec<KeywordRule> = serde_json::from_str(json)?;
        if rules.is_empty() {
            return Err(CoreError::Validation(
                "Keyword table must contain at least one rule".to_string(),
            ));
        }
        if rules.iter().any(|r| r.kind == SubjectKind::Unknown) {
            return Err(CoreError::Validation(
                "'unknown' cannot be mapped to keywords".to_string(),
            ));
        }
        Ok(Self::from_rules(
            rules.into_iter().map(|r| (r.kind, r.keywords)).collect(),
        ))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Add keywords for `kind`. They win ties against existing rules when
    /// both match the same token.
    pub fn with_keywords(mut self, kind: SubjectKind, words: &[&str]) -> Self {
        self.rules.insert(0, (kind, keywords(words.iter().copied())));
        self
    }

    /// Classify a source image by its file stem.
    pub fn classify(&self, source: &Path) -> SubjectKind {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tokens = tokenize(&stem);

        (0..tokens.len())
            .rev()
            .find_map(|end| {
                self.rules
                    .iter()
                    .find(|(_, words)| words.iter().any(|w| matches_ending_at(w, &tokens, end)))
                    .map(|(kind, _)| *kind)
            })
            .unwrap_or(SubjectKind::Unknown)
    }
}

fn keywords<'a>(words: impl Iterator<Item = &'a str>) -> Vec<Keyword> {
    words.map(tokenize).filter(|k| !k.is_empty()).collect()
}
