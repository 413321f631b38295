//! Linear regression over standardized indicator features.
//!
//! Fitted as ridge regression with a negligible penalty so the collinear
//! moving-average columns still yield a solvable system. Inputs are already
//! standardized, so the target is centred and its mean added back on
//! prediction.

use ndarray::{Array1, Array2, Axis};
use smartcore::linear::ridge_regression::{
    RidgeRegression, RidgeRegressionParameters, RidgeRegressionSolverName,
};
use tracing::debug;

use super::rollout::rollout;
use super::{clean_training_rows, r2_score, ForecastError, Forecaster, TrainingSummary};
use crate::services::features::{training_set, StandardScaler};
use crate::types::{ForecastPoint, IndicatorRow, ModelKind, ModelMetrics, OhlcvBar};

const RIDGE_ALPHA: f64 = 1e-3;

type Ridge = RidgeRegression<f64, f64, Array2<f64>, Array1<f64>>;

struct Fitted {
    model: Ridge,
    scaler: StandardScaler,
    y_mean: f64,
    bars: Vec<OhlcvBar>,
    rows: Vec<IndicatorRow>,
    samples: usize,
    r2: f64,
}

impl Fitted {
    fn predict_one(&self, features: &Array1<f64>) -> Result<f64, ForecastError> {
        let x = self.scaler.transform_row(features).insert_axis(Axis(0));
        let y = self
            .model
            .predict(&x)
            .map_err(|e| ForecastError::Fit(e.to_string()))?;
        y.get(0)
            .map(|v| v + self.y_mean)
            .ok_or_else(|| ForecastError::Fit("empty prediction".to_string()))
    }
}

#[derive(Default)]
pub struct LinearForecaster {
    fitted: Option<Fitted>,
}

impl LinearForecaster {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Forecaster for LinearForecaster {
    fn kind(&self) -> ModelKind {
        ModelKind::Linear
    }

    fn train(&mut self, bars: &[OhlcvBar]) -> Result<TrainingSummary, ForecastError> {
        let rows = clean_training_rows(bars)?;
        let (x, y) = training_set(&rows);

        let scaler = StandardScaler::fit(&x);
        let x_scaled = scaler.transform(&x);
        let y_mean = y.mean().unwrap_or(0.0);
        let y_centred = &y - y_mean;

        let params = RidgeRegressionParameters::default()
            .with_alpha(RIDGE_ALPHA)
            .with_solver(RidgeRegressionSolverName::Cholesky)
            .with_normalize(false);
        let model = Ridge::fit(&x_scaled, &y_centred, params)
            .map_err(|e| ForecastError::Fit(e.to_string()))?;

        let fitted_y = model
            .predict(&x_scaled)
            .map_err(|e| ForecastError::Fit(e.to_string()))?
            + y_mean;
        let r2 = r2_score(&y, &fitted_y);
        let samples = y.len();

        debug!(
            raw = bars.len(),
            clean = rows.len(),
            samples,
            r2,
            "Linear model trained"
        );

        let summary = TrainingSummary {
            raw_rows: bars.len(),
            clean_rows: rows.len(),
            samples,
        };
        self.fitted = Some(Fitted {
            model,
            scaler,
            y_mean,
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
            |features| fitted.predict_one(features),
        )
    }

    fn metrics(&self) -> Result<ModelMetrics, ForecastError> {
        let fitted = self.fitted.as_ref().ok_or(ForecastError::NotTrained)?;
        Ok(ModelMetrics {
            r2_score: fitted.r2,
            training_samples: fitted.samples,
            model_type: self.kind().display_name().to_string(),
            model_description: "Linear regression, fastest, suited to quick previews".to_string(),
            n_estimators: None,
            lookback: None,
            layers: None,
        })
    }

    fn training_rows(&self) -> &[IndicatorRow] {
        self.fitted.as_ref().map(|f| f.rows.as_slice()).unwrap_or(&[])
    }
}
