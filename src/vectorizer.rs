//! Bag-of-words TF-IDF vectorizer loaded from a JSON artifact.
//!
//! The artifact mirrors what a fitted scikit-learn `TfidfVectorizer` exposes:
//! vocabulary, idf weights, tokenizer settings and the normalization scheme.
//! Leaving out `idf` turns it into a plain count vectorizer.

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::artifacts::ArtifactError;
use crate::engine::{FeatureVector, Vectorizer};

pub const DEFAULT_TOKEN_PATTERN: &str = r"\b\w\w+\b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    pub vocabulary: HashMap<String, usize>,
    #[serde(default)]
    pub idf: Option<Vec<f64>>,
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub stop_words: Vec<String>,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

fn default_lowercase() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

impl VectorizerArtifact {
    #[cfg(test)]
    pub fn new(vocabulary: HashMap<String, usize>) -> Self {
        Self {
            vocabulary,
            idf: None,
            lowercase: default_lowercase(),
            token_pattern: default_token_pattern(),
            ngram_range: default_ngram_range(),
            stop_words: Vec::new(),
            sublinear_tf: false,
            norm: default_norm(),
        }
    }
}

pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f64>>,
    lowercase: bool,
    token_pattern: Regex,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    sublinear_tf: bool,
    norm: Option<Norm>,
}

impl std::fmt::Debug for TfidfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfidfVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("has_idf", &self.idf.is_some())
            .field("ngram_range", &self.ngram_range)
            .field("norm", &self.norm)
            .finish()
    }
}

impl TryFrom<VectorizerArtifact> for TfidfVectorizer {
    type Error = ArtifactError;

    fn try_from(artifact: VectorizerArtifact) -> Result<Self, Self::Error> {
        let size = artifact.vocabulary.len();
        if size == 0 {
            return Err(ArtifactError::Invalid(
                "vectorizer vocabulary is empty".to_string(),
            ));
        }

        let mut seen = vec![false; size];
        for (term, &column) in &artifact.vocabulary {
            if column >= size || std::mem::replace(&mut seen[column], true) {
                return Err(ArtifactError::Invalid(format!(
                    "vocabulary column {column} for term {term:?} is out of range or duplicated"
                )));
            }
        }

        if let Some(idf) = &artifact.idf {
            if idf.len() != size {
                return Err(ArtifactError::Invalid(format!(
                    "idf has {} weights but vocabulary has {size} terms",
                    idf.len()
                )));
            }
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ArtifactError::Invalid(format!(
                "invalid ngram_range ({min_n}, {max_n})"
            )));
        }

        let token_pattern = Regex::new(&artifact.token_pattern).map_err(|e| {
            ArtifactError::Invalid(format!(
                "invalid token_pattern {:?}: {e}",
                artifact.token_pattern
            ))
        })?;

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            lowercase: artifact.lowercase,
            token_pattern,
            ngram_range: artifact.ngram_range,
            stop_words: artifact.stop_words.into_iter().collect(),
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
        })
    }
}

impl TfidfVectorizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        self.token_pattern
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .map(str::to_string)
            .collect()
    }

    fn term_counts(&self, tokens: &[String]) -> BTreeMap<usize, f64> {
        let (min_n, max_n) = self.ngram_range;
        let mut counts = BTreeMap::new();

        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            for window in tokens.windows(n) {
                let gram = window.join(" ");
                if let Some(&column) = self.vocabulary.get(&gram) {
                    *counts.entry(column).or_insert(0.0) += 1.0;
                }
            }
        }

        counts
    }
}

impl Vectorizer for TfidfVectorizer {
    fn transform(&self, text: &str) -> Result<FeatureVector> {
        let tokens = self.tokenize(text);
        let counts = self.term_counts(&tokens);

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(column, count)| {
                let tf = if self.sublinear_tf {
                    1.0 + count.ln()
                } else {
                    count
                };
                let weight = self.idf.as_ref().map_or(1.0, |idf| idf[column]);
                (column, tf * weight)
            })
            .collect();

        let magnitude = match self.norm {
            Some(Norm::L2) => entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
            Some(Norm::L1) => entries.iter().map(|(_, v)| v.abs()).sum::<f64>(),
            None => 0.0,
        };
        if magnitude > 0.0 {
            for (_, value) in &mut entries {
                *value /= magnitude;
            }
        }

        Ok(FeatureVector {
            dimension: self.vocabulary.len(),
            entries,
        })
    }

    fn dimension(&self) -> usize {
        self.vocabulary.len()
    }
}
