use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{HistoricalPoint, ParameterError, TrainingPeriod};

/// Forecast model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Ridge-stabilised linear regression over standardized indicators.
    #[serde(rename = "linear")]
    Linear,
    /// Random forest regression over standardized indicators.
    #[serde(rename = "random_forest")]
    Ensemble,
    /// Recurrent network over a rolling window of min-max scaled rows.
    #[serde(rename = "lstm")]
    Sequence,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [Self::Linear, Self::Ensemble, Self::Sequence];

    /// Parse a model tag. Accepts the wire names and the family names.
    pub fn parse(s: &str) -> Result<Self, ParameterError> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "random_forest" | "ensemble" => Ok(Self::Ensemble),
            "lstm" | "sequence" => Ok(Self::Sequence),
            other => Err(ParameterError::UnknownModel(other.to_string())),
        }
    }

    /// Parse a comma separated list, dropping duplicates but keeping order.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, ParameterError> {
        let mut models = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let model = Self::parse(part)?;
            if !models.contains(&model) {
                models.push(model);
            }
        }
        Ok(models)
    }

    /// Wire tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Ensemble => "random_forest",
            Self::Sequence => "lstm",
        }
    }

    /// Display name reported in metrics.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Linear => "Linear Regression",
            Self::Ensemble => "Random Forest",
            Self::Sequence => "LSTM",
        }
    }

    /// Fixed trust multiplier applied to the confidence curve.
    pub fn confidence_multiplier(&self) -> f64 {
        match self {
            Self::Linear => 1.0,
            Self::Ensemble => 1.1,
            Self::Sequence => 1.15,
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single forecast value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_price: f64,
    /// Probability-like trust in the point, in [0, 1].
    pub confidence: f64,
}

/// In-sample fit quality of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// R² on the training set itself; optimistic by construction.
    pub r2_score: f64,
    pub training_samples: usize,
    pub model_type: String,
    pub model_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_estimators: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookback: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<usize>,
}

/// Category used when listing models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCategory {
    Traditional,
    DeepLearning,
}

/// Catalog entry for one model family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model: ModelKind,
    pub name: String,
    pub description: String,
    pub category: ModelCategory,
    pub available: bool,
}

/// Result of a single forecast request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    pub ticker: String,
    pub model_type: ModelKind,
    pub training_period: TrainingPeriod,
    pub predictions: Vec<ForecastPoint>,
    pub historical_data: Vec<HistoricalPoint>,
    pub metrics: ModelMetrics,
    pub current_price: f64,
    pub last_update: NaiveDate,
}
