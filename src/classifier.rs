use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactError;
use crate::engine::{Classifier, FeatureVector};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    #[serde(default)]
    pub classes: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("feature vector has dimension {actual}, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Logistic regression over sparse features. A single coefficient row is a
/// binary model scored with a sigmoid; several rows are scored with softmax.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    classes: Option<Vec<String>>,
    num_features: usize,
}

impl TryFrom<ClassifierArtifact> for LinearClassifier {
    type Error = ArtifactError;

    fn try_from(artifact: ClassifierArtifact) -> Result<Self, Self::Error> {
        let Some(first) = artifact.coef.first() else {
            return Err(ArtifactError::Invalid(
                "classifier has no coefficient rows".to_string(),
            ));
        };
        let num_features = first.len();

        if artifact.coef.iter().any(|row| row.len() != num_features) {
            return Err(ArtifactError::Invalid(
                "classifier coefficient rows differ in width".to_string(),
            ));
        }
        if artifact.intercept.len() != artifact.coef.len() {
            return Err(ArtifactError::Invalid(format!(
                "classifier has {} coefficient rows but {} intercepts",
                artifact.coef.len(),
                artifact.intercept.len()
            )));
        }

        let classifier = Self {
            coef: artifact.coef,
            intercept: artifact.intercept,
            classes: artifact.classes,
            num_features,
        };

        if let Some(classes) = &classifier.classes {
            if classes.len() != classifier.num_classes() {
                return Err(ArtifactError::Invalid(format!(
                    "classifier lists {} class names for {} classes",
                    classes.len(),
                    classifier.num_classes()
                )));
            }
        }

        Ok(classifier)
    }
}

impl LinearClassifier {
    pub fn num_classes(&self) -> usize {
        if self.coef.len() == 1 { 2 } else { self.coef.len() }
    }

    pub fn classes(&self) -> Option<&[String]> {
        self.classes.as_deref()
    }

    fn decision_function(&self, features: &FeatureVector) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, bias)| features.dot(row) + bias)
            .collect()
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl Classifier for LinearClassifier {
    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        if features.dimension != self.num_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.num_features,
                actual: features.dimension,
            }
            .into());
        }

        let scores = self.decision_function(features);
        if let [score] = scores.as_slice() {
            let positive = sigmoid(*score);
            Ok(vec![1.0 - positive, positive])
        } else {
            Ok(softmax(&scores))
        }
    }

    fn num_features(&self) -> usize {
        self.num_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(weights: Vec<f64>, bias: f64) -> LinearClassifier {
        LinearClassifier::try_from(ClassifierArtifact {
            coef: vec![weights],
            intercept: vec![bias],
            classes: Some(vec!["REAL".to_string(), "FAKE".to_string()]),
        })
        .unwrap()
    }

    fn features(dimension: usize, entries: Vec<(usize, f64)>) -> FeatureVector {
        FeatureVector { dimension, entries }
    }

    #[test]
    fn binary_model_uses_sigmoid() {
        let model = binary(vec![2.0, -1.0], 0.0);
        let proba = model.predict_proba(&features(2, vec![(0, 1.0)])).unwrap();

        let expected = 1.0 / (1.0 + (-2.0_f64).exp());
        assert!((proba[1] - expected).abs() < 1e-12);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);
        assert_eq!(model.predict(&features(2, vec![(0, 1.0)])).unwrap(), 1);
        assert_eq!(model.predict(&features(2, vec![(1, 1.0)])).unwrap(), 0);
        assert_eq!(model.num_classes(), 2);
    }

    #[test]
    fn zero_vector_scores_the_intercept() {
        let model = binary(vec![5.0], 0.0);
        let proba = model.predict_proba(&features(1, vec![])).unwrap();
        assert_eq!(proba, vec![0.5, 0.5]);
        assert_eq!(model.predict(&features(1, vec![])).unwrap(), 0);
    }

    #[test]
    fn sigmoid_is_stable_for_large_scores() {
        let model = binary(vec![1.0], 0.0);
        let high = model.predict_proba(&features(1, vec![(0, 1000.0)])).unwrap();
        let low = model.predict_proba(&features(1, vec![(0, -1000.0)])).unwrap();
        assert_eq!(high[1], 1.0);
        assert_eq!(low[1], 0.0);
        assert!(high.iter().chain(&low).all(|p| p.is_finite()));
    }

    #[test]
    fn multiclass_model_uses_softmax() {
        let model = LinearClassifier::try_from(ClassifierArtifact {
            coef: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 0.0]],
            intercept: vec![0.0, 0.0, 0.0],
            classes: None,
        })
        .unwrap();

        let proba = model.predict_proba(&features(2, vec![(1, 3.0)])).unwrap();
        assert_eq!(proba.len(), 3);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(model.predict(&features(2, vec![(1, 3.0)])).unwrap(), 1);
    }

    #[test]
    fn rejects_foreign_feature_space() {
        let model = binary(vec![1.0, 1.0], 0.0);
        let err = model.predict_proba(&features(3, vec![])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModelError>(),
            Some(ModelError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn rejects_malformed_artifacts() {
        let empty = ClassifierArtifact {
            coef: vec![],
            intercept: vec![],
            classes: None,
        };
        assert!(LinearClassifier::try_from(empty).is_err());

        let ragged = ClassifierArtifact {
            coef: vec![vec![1.0, 2.0], vec![1.0]],
            intercept: vec![0.0, 0.0],
            classes: None,
        };
        assert!(LinearClassifier::try_from(ragged).is_err());

        let intercepts = ClassifierArtifact {
            coef: vec![vec![1.0]],
            intercept: vec![0.0, 1.0],
            classes: None,
        };
        assert!(LinearClassifier::try_from(intercepts).is_err());

        let names = ClassifierArtifact {
            coef: vec![vec![1.0]],
            intercept: vec![0.0],
            classes: Some(vec!["only".to_string()]),
        };
        assert!(LinearClassifier::try_from(names).is_err());
    }
}
