//! Recurrent sequence model.
//!
//! Reads a rolling window of min-max scaled rows (close plus the 27
//! indicator features) and predicts the next scaled close. Rollout only
//! refreshes the close slot of each appended row and zero-fills the
//! indicator slots, unlike the regression models which recompute every
//! indicator per step.

mod network;

use chrono::Duration;
use ndarray::{concatenate, s, Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use self::network::LstmNetwork;
use super::catalog::SequenceSettings;
use super::confidence::confidence;
use super::{r2_score, ForecastError, Forecaster, TrainingSummary};
use crate::services::features::{sequence_matrix, MinMaxScaler, FEATURE_COUNT};
use crate::services::indicators::compute_clean;
use crate::types::{ForecastPoint, IndicatorRow, ModelKind, ModelMetrics, OhlcvBar};

/// Recurrent layers in the network.
const LAYERS: usize = 1;
/// Extra clean rows required beyond one lookback window.
const EXTRA_ROWS: usize = 30;
const COLUMNS: usize = FEATURE_COUNT + 1;

struct Fitted {
    network: LstmNetwork,
    scaler: MinMaxScaler,
    rows: Vec<IndicatorRow>,
    /// Last `lookback` scaled rows, the seed window for forecasting.
    window: Array2<f64>,
    samples: usize,
    r2: f64,
}

pub struct SequenceForecaster {
    settings: SequenceSettings,
    fitted: Option<Fitted>,
}

impl SequenceForecaster {
    pub fn new(settings: SequenceSettings) -> Self {
        Self {
            settings,
            fitted: None,
        }
    }

    fn min_rows(&self) -> usize {
        self.settings.lookback + EXTRA_ROWS
    }
}

impl Forecaster for SequenceForecaster {
    fn kind(&self) -> ModelKind {
        ModelKind::Sequence
    }

    fn train(&mut self, bars: &[OhlcvBar]) -> Result<TrainingSummary, ForecastError> {
        let required = self.min_rows();
        if bars.len() < required {
            return Err(ForecastError::InsufficientRawData {
                required,
                actual: bars.len(),
            });
        }
        let rows = compute_clean(bars);
        if rows.len() < required {
            return Err(ForecastError::InsufficientCleanRows {
                required,
                actual: rows.len(),
            });
        }

        let lookback = self.settings.lookback;
        let data = sequence_matrix(&rows);
        let scaler = MinMaxScaler::fit(&data);
        let scaled = scaler.transform(&data);
        let n = scaled.nrows();

        let windows: Vec<ArrayView2<f64>> = (lookback..n)
            .map(|i| scaled.slice(s![i - lookback..i, ..]))
            .collect();
        let targets: Vec<f64> = (lookback..n).map(|i| scaled[[i, 0]]).collect();

        let mut rng = StdRng::seed_from_u64(self.settings.seed);
        let mut network = LstmNetwork::new(COLUMNS, self.settings.hidden_size, &mut rng)?;
        let loss = network.fit(
            &windows,
            &targets,
            self.settings.epochs,
            self.settings.batch_size,
            self.settings.learning_rate,
            &mut rng,
        );
        if !loss.is_finite() {
            return Err(ForecastError::Fit("training diverged".to_string()));
        }

        let fitted_close: Array1<f64> = windows
            .iter()
            .map(|w| scaler.inverse(0, network.predict(*w)))
            .collect();
        let actual_close: Array1<f64> = rows[lookback..].iter().map(IndicatorRow::close).collect();
        let r2 = r2_score(&actual_close, &fitted_close);
        let samples = windows.len();

        debug!(
            raw = bars.len(),
            clean = rows.len(),
            windows = samples,
            loss,
            r2,
            "Sequence model trained"
        );

        let window = scaled.slice(s![n - lookback.., ..]).to_owned();
        let summary = TrainingSummary {
            raw_rows: bars.len(),
            clean_rows: rows.len(),
            samples,
        };
        self.fitted = Some(Fitted {
            network,
            scaler,
            rows,
            window,
            samples,
            r2,
        });
        Ok(summary)
    }

    fn predict_next_days(&self, days: usize) -> Result<Vec<ForecastPoint>, ForecastError> {
        let fitted = self.fitted.as_ref().ok_or(ForecastError::NotTrained)?;
        let last_date = fitted
            .rows
            .last()
            .map(|r| r.date())
            .ok_or(ForecastError::NotTrained)?;
        let multiplier = self.kind().confidence_multiplier();

        let mut window = fitted.window.clone();
        let mut points = Vec::with_capacity(days);
        for step in 1..=days {
            let scaled = fitted.network.predict(window.view());
            let price = fitted.scaler.inverse(0, scaled);
            if !price.is_finite() {
                return Err(ForecastError::Fit(format!(
                    "non-finite prediction at step {}",
                    step
                )));
            }
            points.push(ForecastPoint {
                date: last_date + Duration::days(step as i64),
                predicted_price: price,
                confidence: confidence(step, multiplier),
            });

            let mut next = Array2::zeros((1, COLUMNS));
            next[[0, 0]] = scaled;
            window = concatenate(Axis(0), &[window.slice(s![1.., ..]), next.view()])
                .map_err(|e| ForecastError::Fit(e.to_string()))?;
        }
        Ok(points)
    }

    fn metrics(&self) -> Result<ModelMetrics, ForecastError> {
        let fitted = self.fitted.as_ref().ok_or(ForecastError::NotTrained)?;
        Ok(ModelMetrics {
            r2_score: fitted.r2,
            training_samples: fitted.samples,
            model_type: self.kind().display_name().to_string(),
            model_description: "LSTM network, deep learning for complex patterns".to_string(),
            n_estimators: None,
            lookback: Some(self.settings.lookback),
            layers: Some(LAYERS),
        })
    }

    fn training_rows(&self) -> &[IndicatorRow] {
        self.fitted.as_ref().map(|f| f.rows.as_slice()).unwrap_or(&[])
    }
}
