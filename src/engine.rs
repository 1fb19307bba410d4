use anyhow::Result;
use async_trait::async_trait;

use crate::types::{PredictionRequest, PredictionResponse};

/// Sparse feature vector: `(column, value)` pairs sorted by column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    pub dimension: usize,
    pub entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|&(column, value)| weights.get(column).copied().unwrap_or(0.0) * value)
            .sum()
    }
}

pub trait Vectorizer: Send + Sync {
    fn transform(&self, text: &str) -> Result<FeatureVector>;

    fn dimension(&self) -> usize;
}

pub trait Classifier: Send + Sync {
    /// Index of the most probable class.
    fn predict(&self, features: &FeatureVector) -> Result<usize> {
        let probabilities = self.predict_proba(features)?;
        let mut best = 0;
        for (index, &p) in probabilities.iter().enumerate() {
            if p > probabilities[best] {
                best = index;
            }
        }
        Ok(best)
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>>;

    fn num_features(&self) -> usize;
}

#[async_trait]
pub trait Engine {
    async fn predict(&self, request: PredictionRequest)
    -> Result<PredictionResponse, PredictError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("Could not detect language. Try a longer input.")]
    LanguageUndetermined,
    #[error("inference failed: {0}")]
    Inference(#[from] anyhow::Error),
}
