use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictionRequest {
    pub inputs: String,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl Default for InfoResponse {
    fn default() -> Self {
        Self {
            status: "API is live",
            message: "POST to /predict with { inputs: 'your text' }",
        }
    }
}

/// Outcome discriminator for the language-gated modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GateStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "non-english")]
    NonEnglish,
    #[serde(rename = "too_short")]
    TooShort,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStatus::Success => "success",
            GateStatus::NonEnglish => "non-english",
            GateStatus::TooShort => "too_short",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Baseline {
        label: String,
        confidence: f64,
    },
    Gated {
        prediction: Option<String>,
        confidence: Option<f64>,
        language: String,
        status: GateStatus,
    },
    GatedBoolean {
        prediction: Option<bool>,
        language: String,
        status: GateStatus,
    },
}

impl PredictionResponse {
    /// Label used for the `predictions_total` metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            PredictionResponse::Baseline { .. } => "success",
            PredictionResponse::Gated { status, .. }
            | PredictionResponse::GatedBoolean { status, .. } => status.as_str(),
        }
    }
}
