//! Random forest regression over standardized indicator features.

use ndarray::{Array1, Array2, Axis};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use tracing::debug;

use super::catalog::EnsembleSettings;
use super::rollout::rollout;
use super::{clean_training_rows, r2_score, ForecastError, Forecaster, TrainingSummary};
use crate::services::features::{training_set, StandardScaler};
use crate::types::{ForecastPoint, IndicatorRow, ModelKind, ModelMetrics, OhlcvBar};

type Forest = RandomForestRegressor<f64, f64, Array2<f64>, Array1<f64>>;

struct Fitted {
    model: Forest,
    scaler: StandardScaler,
    bars: Vec<OhlcvBar>,
    rows: Vec<IndicatorRow>,
    samples: usize,
    r2: f64,
}

pub struct EnsembleForecaster {
    settings: EnsembleSettings,
    fitted: Option<Fitted>,
}

impl EnsembleForecaster {
    pub fn new(settings: EnsembleSettings) -> Self {
        Self {
            settings,
            fitted: None,
        }
    }

    fn parameters(&self) -> RandomForestRegressorParameters {
        RandomForestRegressorParameters::default()
            .with_n_trees(self.settings.n_trees)
            .with_max_depth(self.settings.max_depth)
            .with_min_samples_split(self.settings.min_samples_split)
            .with_min_samples_leaf(self.settings.min_samples_leaf)
            .with_seed(self.settings.seed)
    }
}

impl Forecaster for EnsembleForecaster {
    fn kind(&self) -> ModelKind {
        ModelKind::Ensemble
    }

    fn train(&mut self, bars: &[OhlcvBar]) -> Result<TrainingSummary, ForecastError> {
        let rows = clean_training_rows(bars)?;
        let (x, y) = training_set(&rows);

        let scaler = StandardScaler::fit(&x);
        let x_scaled = scaler.transform(&x);
        let model = Forest::fit(&x_scaled, &y, self.parameters())
            .map_err(|e| ForecastError::Fit(e.to_string()))?;

        let fitted_y = model
            .predict(&x_scaled)
            .map_err(|e| ForecastError::Fit(e.to_string()))?;
        let r2 = r2_score(&y, &fitted_y);
        let samples = y.len();

        debug!(
            raw = bars.len(),
            clean = rows.len(),
            trees = self.settings.n_trees,
            r2,
            "Random forest trained"
        );

        let summary = TrainingSummary {
            raw_rows: bars.len(),
            clean_rows: rows.len(),
            samples,
        };
        self.fitted = Some(Fitted {
            model,
            scaler,
            bars: bars.to_vec(),
            rows,
            samples,
            r2,
        });
        Ok(summary)
    }

    fn predict_next_days(&self, days: usize) -> Result<Vec<ForecastPoint>, ForecastError> {
        let fitted = self.fitted.as_ref().ok_or(ForecastError::NotTrained)?;
        rollout(
            &fitted.bars,
            days,
            self.kind().confidence_multiplier(),
            |features| {
                let x = fitted.scaler.transform_row(features).insert_axis(Axis(0));
                let y = fitted
                    .model
                    .predict(&x)
                    .map_err(|e| ForecastError::Fit(e.to_string()))?;
                y.get(0)
                    .copied()
                    .ok_or_else(|| ForecastError::Fit("empty prediction".to_string()))
            },
        )
    }

    fn metrics(&self) -> Result<ModelMetrics, ForecastError> {
        let fitted = self.fitted.as_ref().ok_or(ForecastError::NotTrained)?;
        Ok(ModelMetrics {
            r2_score: fitted.r2,
            training_samples: fitted.samples,
            model_type: self.kind().display_name().to_string(),
            model_description: "Random forest, accurate with moderate speed (recommended)"
                .to_string(),
            n_estimators: Some(self.settings.n_trees),
            lookback: None,
            layers: None,
        })
    }

    fn training_rows(&self) -> &[IndicatorRow] {
        self.fitted.as_ref().map(|f| f.rows.as_slice()).unwrap_or(&[])
    }
}
