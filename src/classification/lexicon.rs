//! Keyword lexicons for the two headline gates, loaded from YAML.
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::normalize::normalize_for_matching;

const DEFAULT_LEXICON_YAML: &str = include_str!("../../resources/lexicon.yaml");

/// Which gate a lexicon feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexiconKind {
    NonPolitical,
    Political,
}

impl LexiconKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NonPolitical => "non_political",
            Self::Political => "political",
        }
    }
}

/// A single normalized phrase together with the topic group it was listed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub text: String,
    pub topic: String,
}

/// Ordered phrase list. Order is preserved from the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    kind: LexiconKind,
    phrases: Vec<Phrase>,
}

impl Lexicon {
    /// Builds a lexicon from loose phrases, normalizing and validating them.
    ///
    /// # Errors
    /// Returns [`LexiconError::Empty`] for an empty list and
    /// [`LexiconError::BlankPhrase`] when a phrase normalizes to nothing.
    pub fn from_phrases<I, S>(kind: LexiconKind, topic: &str, phrases: I) -> Result<Self, LexiconError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let group = RawGroup {
            topic: topic.to_string(),
            phrases: phrases
                .into_iter()
                .map(|phrase| phrase.as_ref().to_string())
                .collect(),
        };
        Self::from_groups(kind, vec![group])
    }

    fn from_groups(kind: LexiconKind, groups: Vec<RawGroup>) -> Result<Self, LexiconError> {
        let mut phrases = Vec::new();
        for group in groups {
            for raw in group.phrases {
                let text = normalize_for_matching(&raw);
                if text.is_empty() {
                    return Err(LexiconError::BlankPhrase {
                        list: kind.as_str(),
                        topic: group.topic.clone(),
                    });
                }
                if phrases.iter().any(|existing: &Phrase| existing.text == text) {
                    tracing::debug!(list = kind.as_str(), phrase = %text, "duplicate phrase ignored");
                    continue;
                }
                phrases.push(Phrase {
                    text,
                    topic: group.topic.clone(),
                });
            }
        }
        if phrases.is_empty() {
            return Err(LexiconError::Empty(kind.as_str()));
        }
        Ok(Self { kind, phrases })
    }

    #[must_use]
    pub fn kind(&self) -> LexiconKind {
        self.kind
    }

    #[must_use]
    pub fn phrases(&self) -> &[Phrase] {
        &self.phrases
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

/// The pair of lexicons consumed by the gates. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconSet {
    non_political: Lexicon,
    political: Lexicon,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLexiconFile {
    non_political: Vec<RawGroup>,
    political: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGroup {
    topic: String,
    phrases: Vec<String>,
}

impl LexiconSet {
    /// Pairs two lexicons after checking that no phrase appears in both.
    ///
    /// # Errors
    /// Returns [`LexiconError::WrongKind`] if the arguments are swapped and
    /// [`LexiconError::Overlap`] if the lists share a phrase.
    pub fn new(non_political: Lexicon, political: Lexicon) -> Result<Self, LexiconError> {
        if non_political.kind() != LexiconKind::NonPolitical {
            return Err(LexiconError::WrongKind(LexiconKind::NonPolitical.as_str()));
        }
        if political.kind() != LexiconKind::Political {
            return Err(LexiconError::WrongKind(LexiconKind::Political.as_str()));
        }

        let non_political_index: HashSet<&str> = non_political
            .phrases()
            .iter()
            .map(|phrase| phrase.text.as_str())
            .collect();
        if let Some(shared) = political
            .phrases()
            .iter()
            .find(|phrase| non_political_index.contains(phrase.text.as_str()))
        {
            return Err(LexiconError::Overlap(shared.text.clone()));
        }

        Ok(Self {
            non_political,
            political,
        })
    }

    /// The curated lexicon compiled into the binary.
    ///
    /// # Errors
    /// Only fails if the embedded resource is itself malformed.
    pub fn embedded() -> Result<Self, LexiconError> {
        Self::from_yaml_str(DEFAULT_LEXICON_YAML, Path::new("<embedded>"))
    }

    /// Loads `path` when given, the embedded default otherwise.
    ///
    /// # Errors
    /// See [`LexiconSet::load_from_path`].
    pub fn load(path: Option<&Path>) -> Result<Self, LexiconError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::embedded(),
        }
    }

    /// # Errors
    /// Returns an error if the file cannot be read, is not valid lexicon YAML,
    /// contains an empty list or blank phrase, or the two lists overlap.
    pub fn load_from_path(path: &Path) -> Result<Self, LexiconError> {
        let contents = fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents, path)
    }

    fn from_yaml_str(contents: &str, origin: &Path) -> Result<Self, LexiconError> {
        let raw: RawLexiconFile =
            serde_yaml::from_str(contents).map_err(|source| LexiconError::Deserialize {
                path: origin.to_path_buf(),
                source,
            })?;
        let non_political = Lexicon::from_groups(LexiconKind::NonPolitical, raw.non_political)?;
        let political = Lexicon::from_groups(LexiconKind::Political, raw.political)?;
        Self::new(non_political, political)
    }

    #[must_use]
    pub fn non_political(&self) -> &Lexicon {
        &self.non_political
    }

    #[must_use]
    pub fn political(&self) -> &Lexicon {
        &self.political
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("failed to read lexicon at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse lexicon at {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{0} lexicon is empty")]
    Empty(&'static str),
    #[error("{list} lexicon has a blank phrase under topic {topic:?}")]
    BlankPhrase { list: &'static str, topic: String },
    #[error("phrase {0:?} appears in both the non-political and political lexicons")]
    Overlap(String),
    #[error("expected a {0} lexicon")]
    WrongKind(&'static str),
    #[error("failed to compile {list} lexicon: {source}")]
    Compile {
        list: &'static str,
        #[source]
        source: regex::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write yaml");
        file
    }

    #[test]
    fn embedded_lexicon_loads_in_file_order() {
        let set = LexiconSet::embedded().expect("embedded lexicon");
        let first = &set.non_political().phrases()[0];
        assert_eq!(first.text, "weather");
        assert_eq!(first.topic, "weather");
        assert_eq!(set.political().phrases()[0].text, "politics");
        assert!(set.non_political().len() > 50);
        assert!(set.political().len() > 100);
    }

    #[test]
    fn phrases_are_normalized() {
        let file = write_yaml(
            "non_political:\n  - topic: sports\n    phrases: ['  Box   Office ']\npolitical:\n  - topic: parties\n    phrases: ['BJP']\n",
        );
        let set = LexiconSet::load_from_path(file.path()).expect("lexicon loads");
        assert_eq!(set.non_political().phrases()[0].text, "box office");
        assert_eq!(set.political().phrases()[0].text, "bjp");
    }

    #[test]
    fn overlapping_lists_are_rejected() {
        let file = write_yaml(
            "non_political:\n  - topic: misc\n    phrases: [budget]\npolitical:\n  - topic: policy\n    phrases: [Budget]\n",
        );
        let err = LexiconSet::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, LexiconError::Overlap(ref phrase) if phrase == "budget"));
    }

    #[test]
    fn empty_list_is_rejected() {
        let file = write_yaml("non_political: []\npolitical:\n  - topic: a\n    phrases: [vote]\n");
        let err = LexiconSet::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, LexiconError::Empty("non_political")));
    }

    #[test]
    fn blank_phrase_is_rejected() {
        let file = write_yaml(
            "non_political:\n  - topic: weather\n    phrases: [rain, '   ']\npolitical:\n  - topic: a\n    phrases: [vote]\n",
        );
        let err = LexiconSet::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, LexiconError::BlankPhrase { list: "non_political", .. }));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = LexiconSet::load_from_path(Path::new("/nonexistent/lexicon.yaml")).unwrap_err();
        match err {
            LexiconError::Io { path, .. } => assert!(path.ends_with("lexicon.yaml")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let file = write_yaml("non_political: {weather: 1}\n");
        let err = LexiconSet::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, LexiconError::Deserialize { .. }));
    }

    #[test]
    fn swapped_lexicons_are_rejected() {
        let political = Lexicon::from_phrases(LexiconKind::Political, "a", ["vote"]).unwrap();
        let also_political = political.clone();
        let err = LexiconSet::new(political, also_political).unwrap_err();
        assert!(matches!(err, LexiconError::WrongKind("non_political")));
    }
}
