use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::classifier::{ClassifierArtifact, LinearClassifier};
use crate::engine::{Classifier, Vectorizer};
use crate::vectorizer::{TfidfVectorizer, VectorizerArtifact};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse artifact {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid artifact: {0}")]
    Invalid(String),
    #[error("vectorizer produces {vectorizer} features but classifier expects {classifier}")]
    Incompatible { vectorizer: usize, classifier: usize },
}

#[derive(Debug)]
pub struct Artifacts {
    pub vectorizer: TfidfVectorizer,
    pub classifier: LinearClassifier,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Artifacts {
    #[tracing::instrument(skip_all, fields(vectorizer = %vectorizer_path.display(), classifier = %classifier_path.display()))]
    pub fn load(vectorizer_path: &Path, classifier_path: &Path) -> Result<Self, ArtifactError> {
        let vectorizer: TfidfVectorizer =
            read_json::<VectorizerArtifact>(vectorizer_path)?.try_into()?;
        let classifier: LinearClassifier =
            read_json::<ClassifierArtifact>(classifier_path)?.try_into()?;

        if vectorizer.dimension() != classifier.num_features() {
            return Err(ArtifactError::Incompatible {
                vectorizer: vectorizer.dimension(),
                classifier: classifier.num_features(),
            });
        }

        tracing::debug!(
            features = vectorizer.dimension(),
            classes = classifier.num_classes(),
            "Artifacts validated"
        );

        Ok(Self {
            vectorizer,
            classifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, value: serde_json::Value) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    fn vectorizer_json() -> serde_json::Value {
        json!({
            "vocabulary": { "shocking": 0, "report": 1, "senate": 2 },
            "idf": [1.5, 1.2, 2.0]
        })
    }

    #[test]
    fn loads_compatible_pair() {
        let dir = TempDir::new().unwrap();
        let vectorizer = write(&dir, "vectorizer.json", vectorizer_json());
        let classifier = write(
            &dir,
            "model.json",
            json!({ "coef": [[2.0, -0.5, -1.0]], "intercept": [0.1], "classes": ["real", "fake"] }),
        );

        let artifacts = Artifacts::load(&vectorizer, &classifier).unwrap();
        assert_eq!(artifacts.vectorizer.dimension(), 3);
        assert_eq!(artifacts.classifier.num_classes(), 2);

        let features = artifacts.vectorizer.transform("SHOCKING report").unwrap();
        let proba = artifacts.classifier.predict_proba(&features).unwrap();
        assert!(proba[1] > 0.5);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let vectorizer = write(&dir, "vectorizer.json", vectorizer_json());
        let err = Artifacts::load(&vectorizer, &dir.path().join("model.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn corrupt_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let vectorizer = dir.path().join("vectorizer.json");
        fs::write(&vectorizer, b"\x80\x04\x95 not json").unwrap();
        let classifier = write(&dir, "model.json", json!({ "coef": [[1.0]], "intercept": [0.0] }));

        let err = Artifacts::load(&vectorizer, &classifier).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. } | ArtifactError::Parse { .. }));
    }

    #[test]
    fn mismatched_feature_space_is_rejected() {
        let dir = TempDir::new().unwrap();
        let vectorizer = write(&dir, "vectorizer.json", vectorizer_json());
        let classifier = write(
            &dir,
            "model.json",
            json!({ "coef": [[1.0, 2.0]], "intercept": [0.0] }),
        );

        let err = Artifacts::load(&vectorizer, &classifier).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::Incompatible {
                vectorizer: 3,
                classifier: 2
            }
        ));
    }
}
