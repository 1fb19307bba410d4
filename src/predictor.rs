use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{PredictMode, PredictionPolicy};
use crate::engine::{Classifier, Engine, PredictError, Vectorizer};
use crate::language::{Detection, LanguageDetector};
use crate::preprocess;
use crate::types::{GateStatus, PredictionRequest, PredictionResponse};

const ENGLISH: &str = "en";
const FAKE_CLASS: usize = 1;

/// Rounds half away from zero to four decimal places.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[derive(Clone)]
pub struct PredictionEngine {
    vectorizer: Arc<dyn Vectorizer>,
    classifier: Arc<dyn Classifier>,
    detector: Arc<dyn LanguageDetector>,
    policy: PredictionPolicy,
}

impl PredictionEngine {
    pub fn new(
        vectorizer: Arc<dyn Vectorizer>,
        classifier: Arc<dyn Classifier>,
        detector: Arc<dyn LanguageDetector>,
        policy: PredictionPolicy,
    ) -> Self {
        Self {
            vectorizer,
            classifier,
            detector,
            policy,
        }
    }

    /// Synchronous body of `Engine::predict`; runs on the blocking pool.
    pub fn predict_blocking(&self, text: &str) -> Result<PredictionResponse, PredictError> {
        match self.policy.mode {
            PredictMode::Baseline => self.baseline(text),
            PredictMode::Gated => self.gated(text),
            PredictMode::GatedBoolean => self.gated_boolean(text),
        }
    }

    fn baseline(&self, text: &str) -> Result<PredictionResponse, PredictError> {
        let clean = preprocess::normalize(text);
        let features = self.vectorizer.transform(&clean).context("vectorize")?;
        let class = self.classifier.predict(&features).context("predict")?;
        let probabilities = self
            .classifier
            .predict_proba(&features)
            .context("predict_proba")?;
        let confidence = probabilities
            .get(class)
            .copied()
            .with_context(|| format!("no probability for predicted class {class}"))?;

        let label = if class == FAKE_CLASS { "fake" } else { "real" };
        Ok(PredictionResponse::Baseline {
            label: label.to_string(),
            confidence: round4(confidence),
        })
    }

    fn detect_language(&self, text: &str) -> Result<String, PredictError> {
        match self.detector.detect(text) {
            Detection::Detected(code) => Ok(code),
            Detection::Undetermined => Err(PredictError::LanguageUndetermined),
        }
    }

    fn gated(&self, text: &str) -> Result<PredictionResponse, PredictError> {
        let text = text.trim();

        let language = self.detect_language(text)?;
        if language != ENGLISH {
            return Ok(PredictionResponse::Gated {
                prediction: None,
                confidence: None,
                language,
                status: GateStatus::NonEnglish,
            });
        }

        if preprocess::word_count(text) < self.policy.min_words {
            return Ok(PredictionResponse::Gated {
                prediction: None,
                confidence: None,
                language: ENGLISH.to_string(),
                status: GateStatus::TooShort,
            });
        }

        let features = self.vectorizer.transform(text).context("vectorize")?;
        let probabilities = self
            .classifier
            .predict_proba(&features)
            .context("predict_proba")?;
        let fake = probabilities
            .get(FAKE_CLASS)
            .copied()
            .context("classifier returned no probability for the fake class")?;

        let label = if fake >= self.policy.fake_threshold {
            "FAKE"
        } else {
            "REAL"
        };
        Ok(PredictionResponse::Gated {
            prediction: Some(label.to_string()),
            confidence: Some(round4(fake)),
            language: ENGLISH.to_string(),
            status: GateStatus::Success,
        })
    }

    fn gated_boolean(&self, text: &str) -> Result<PredictionResponse, PredictError> {
        let text = text.trim();

        let language = self.detect_language(text)?;
        if language != ENGLISH {
            return Ok(PredictionResponse::GatedBoolean {
                prediction: None,
                language,
                status: GateStatus::NonEnglish,
            });
        }

        let features = self.vectorizer.transform(text).context("vectorize")?;
        let class = self.classifier.predict(&features).context("predict")?;
        Ok(PredictionResponse::GatedBoolean {
            prediction: Some(class == FAKE_CLASS),
            language: ENGLISH.to_string(),
            status: GateStatus::Success,
        })
    }
}

#[async_trait]
impl Engine for PredictionEngine {
    #[tracing::instrument(skip(self, request), fields(input_len = request.inputs.len(), mode = ?self.policy.mode))]
    async fn predict(
        &self,
        request: PredictionRequest,
    ) -> Result<PredictionResponse, PredictError> {
        let engine = self.clone();
        let input_len = request.inputs.len();

        let result = tokio::task::spawn_blocking(move || engine.predict_blocking(&request.inputs))
            .await
            .map_err(|e| PredictError::Inference(anyhow::anyhow!("Prediction task failed: {e}")))?;

        match &result {
            Ok(response) => tracing::debug!(outcome = response.outcome(), "Prediction finished"),
            Err(PredictError::LanguageUndetermined) => {
                tracing::debug!("Language could not be detected")
            }
            Err(e) => tracing::error!(input_len, error = %e, "Prediction failed"),
        }
        result
    }
}
