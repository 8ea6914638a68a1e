//! TF-IDF + logistic regression baseline, loaded from exported JSON weights.
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::{BiasModel, ModelBackend, ModelError};
use crate::classification::normalize::clean_headline;
use crate::classification::{BiasLabel, LABEL_COUNT, LABEL_MAP};

static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern"));

#[derive(Debug, Deserialize)]
struct LinearWeights {
    labels: Vec<String>,
    vocabulary: Vec<String>,
    idf: Vec<f32>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default)]
    stop_words: Vec<String>,
    coefficients: Vec<Vec<f32>>,
    intercepts: Vec<f32>,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

impl LinearWeights {
    fn validate(&self, path: &Path) -> Result<(), ModelError> {
        let invalid = |reason: String| ModelError::Artifact {
            path: path.to_path_buf(),
            reason,
        };

        let labels = self
            .labels
            .iter()
            .map(|raw| raw.parse::<BiasLabel>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ModelError::LabelMapping(err.to_string()))?;
        if labels != LABEL_MAP {
            return Err(ModelError::LabelMapping(format!(
                "expected {LABEL_MAP:?}, artifact declares {labels:?}"
            )));
        }

        let dim = self.vocabulary.len();
        if dim == 0 {
            return Err(invalid("vocabulary is empty".to_string()));
        }
        if self.idf.len() != dim {
            return Err(invalid(format!(
                "idf length {} does not match vocabulary size {dim}",
                self.idf.len()
            )));
        }
        if self.coefficients.len() != LABEL_COUNT {
            return Err(invalid(format!(
                "expected {LABEL_COUNT} coefficient rows, found {}",
                self.coefficients.len()
            )));
        }
        if let Some(row) = self.coefficients.iter().find(|row| row.len() != dim) {
            return Err(invalid(format!(
                "coefficient row length {} does not match vocabulary size {dim}",
                row.len()
            )));
        }
        if self.intercepts.len() != LABEL_COUNT {
            return Err(invalid(format!(
                "expected {LABEL_COUNT} intercepts, found {}",
                self.intercepts.len()
            )));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(invalid(format!("invalid ngram_range ({min_n}, {max_n})")));
        }
        let all_finite = self
            .idf
            .iter()
            .chain(self.intercepts.iter())
            .chain(self.coefficients.iter().flatten())
            .all(|value| value.is_finite());
        if !all_finite {
            return Err(invalid("weights contain NaN or infinite values".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct LinearBiasModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    coefficients: Vec<Vec<f32>>,
    intercepts: Vec<f32>,
}

impl LinearBiasModel {
    /// # Errors
    /// Returns [`ModelError`] if the file is unreadable, not valid JSON, or its
    /// dimensions or label order do not line up.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw, path)
    }

    fn from_json(raw: &str, origin: &Path) -> Result<Self, ModelError> {
        let weights: LinearWeights =
            serde_json::from_str(raw).map_err(|err| ModelError::Artifact {
                path: origin.to_path_buf(),
                reason: format!("failed to parse weights json: {err}"),
            })?;
        weights.validate(origin)?;

        let vocabulary = weights
            .vocabulary
            .into_iter()
            .enumerate()
            .map(|(index, term)| (term, index))
            .collect();
        Ok(Self {
            vocabulary,
            idf: weights.idf,
            ngram_range: weights.ngram_range,
            stop_words: weights.stop_words.into_iter().collect(),
            coefficients: weights.coefficients,
            intercepts: weights.intercepts,
        })
    }

    /// Sparse, L2-normalized TF-IDF vector as `(vocabulary index, weight)` pairs.
    fn features(&self, headline: &str) -> Vec<(usize, f32)> {
        let cleaned = clean_headline(headline);
        let tokens: Vec<&str> = TOKEN_PATTERN
            .find_iter(&cleaned)
            .map(|token| token.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .collect();

        let mut counts: HashMap<usize, f32> = HashMap::new();
        let (min_n, max_n) = self.ngram_range;
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                if let Some(&index) = self.vocabulary.get(&window.join(" ")) {
                    *counts.entry(index).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut weighted: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index]))
            .collect();
        let norm = weighted
            .iter()
            .map(|(_, value)| value * value)
            .sum::<f32>()
            .sqrt();
        if norm > 0.0 {
            for (_, value) in &mut weighted {
                *value /= norm;
            }
        }
        weighted.sort_unstable_by_key(|(index, _)| *index);
        weighted
    }
}

impl BiasModel for LinearBiasModel {
    fn backend(&self) -> ModelBackend {
        ModelBackend::Linear
    }

    fn logits(&self, headline: &str) -> Result<[f32; LABEL_COUNT], ModelError> {
        let features = self.features(headline);
        let mut logits = [0.0_f32; LABEL_COUNT];
        for (class, logit) in logits.iter_mut().enumerate() {
            let row = &self.coefficients[class];
            *logit = self.intercepts[class]
                + features
                    .iter()
                    .map(|(index, value)| row[*index] * value)
                    .sum::<f32>();
        }
        Ok(logits)
    }
}
