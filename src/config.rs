use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PredictMode {
    /// Normalize text, no language gate, `{label, confidence}`
    Baseline,
    /// Language and length gate, `{prediction, confidence, language, status}`
    #[default]
    Gated,
    /// Language gate only, boolean `prediction` without confidence
    GatedBoolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Server host to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to bind to
    #[arg(long, env = "PORT", default_value = "8000")]
    pub port: u16,

    /// Directory holding the model and vectorizer artifacts
    #[arg(long, env = "ARTIFACT_DIR", default_value = ".")]
    pub artifact_dir: PathBuf,

    /// Classifier artifact file name, relative to the artifact directory
    #[arg(long, env = "MODEL_FILE", default_value = "model.json")]
    pub model_file: PathBuf,

    /// Vectorizer artifact file name, relative to the artifact directory
    #[arg(long, env = "VECTORIZER_FILE", default_value = "vectorizer.json")]
    pub vectorizer_file: PathBuf,

    /// Prediction policy applied to /predict
    #[arg(long, env = "PREDICT_MODE", value_enum, default_value_t = PredictMode::Gated)]
    pub mode: PredictMode,

    /// Minimum word count for the gated mode
    #[arg(long, env = "MIN_WORDS", default_value = "10")]
    pub min_words: usize,

    /// Fake-class probability at or above which the gated mode answers FAKE
    #[arg(long, env = "FAKE_THRESHOLD", default_value = "0.5")]
    pub fake_threshold: f64,

    /// Minimum detector confidence before a language is accepted;
    /// zero-confidence detections are always rejected
    #[arg(long, env = "MIN_LANGUAGE_CONFIDENCE", default_value = "0.0")]
    pub min_language_confidence: f64,

    /// Allowed CORS origins, comma separated, "*" for any
    #[arg(long, env = "CORS_ALLOW_ORIGINS", default_value = "*", value_delimiter = ',')]
    pub cors_allow_origins: Vec<String>,

    /// Allow credentialed cross-origin requests
    #[arg(
        long,
        env = "CORS_ALLOW_CREDENTIALS",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub cors_allow_credentials: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub struct PredictionPolicy {
    pub mode: PredictMode,
    pub min_words: usize,
    pub fake_threshold: f64,
}

impl Default for PredictionPolicy {
    fn default() -> Self {
        Self {
            mode: PredictMode::Gated,
            min_words: 10,
            fake_threshold: 0.5,
        }
    }
}

impl From<&Config> for PredictionPolicy {
    fn from(config: &Config) -> Self {
        Self {
            mode: config.mode,
            min_words: config.min_words,
            fake_threshold: config.fake_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// Empty means any origin.
    pub allow_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl From<&Config> for CorsConfig {
    fn from(config: &Config) -> Self {
        let origins: Vec<String> = config
            .cors_allow_origins
            .iter()
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        let allow_origins = if origins.iter().any(|origin| origin == "*") {
            Vec::new()
        } else {
            origins
        };

        Self {
            allow_origins,
            allow_credentials: config.cors_allow_credentials,
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.fake_threshold) {
            anyhow::bail!(
                "--fake-threshold must be within [0, 1], got {}",
                self.fake_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.min_language_confidence) {
            anyhow::bail!(
                "--min-language-confidence must be within [0, 1], got {}",
                self.min_language_confidence
            );
        }
        Ok(())
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.model_file)
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.vectorizer_file)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
