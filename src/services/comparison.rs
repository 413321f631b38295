//! Multi-model runs.
//!
//! Each requested model gets its own blocking worker. A failing or
//! panicking worker fills its own slot with a failure record and never
//! aborts its siblings.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::services::signals::round2;
use crate::types::{
    BestPredictionModel, FailureKind, FailureRecord, ModelKind, ModelRun, PredictionReport,
    PredictionSummary,
};

/// Added to elapsed seconds before inverting into a speed score.
const SPEED_OFFSET_SECS: f64 = 0.1;

fn seconds(elapsed: Duration) -> f64 {
    round2(elapsed.as_secs_f64())
}

/// Run `job` once per model on the blocking pool and collect every outcome
/// in request order.
pub async fn run_per_model<T, F>(models: &[ModelKind], job: F) -> Vec<ModelRun<T>>
where
    T: Send + 'static,
    F: Fn(ModelKind) -> Result<T, FailureRecord> + Send + Sync + 'static,
{
    let job = Arc::new(job);
    let handles: Vec<_> = models
        .iter()
        .map(|&model| {
            let job = Arc::clone(&job);
            let handle = tokio::task::spawn_blocking(move || {
                let started = Instant::now();
                let outcome = job(model);
                (outcome, started.elapsed())
            });
            (model, handle)
        })
        .collect();

    let mut runs = Vec::with_capacity(handles.len());
    for (model, handle) in handles {
        let run = match handle.await {
            Ok((Ok(result), elapsed)) => ModelRun::succeeded(model, result, seconds(elapsed)),
            Ok((Err(failure), elapsed)) => {
                warn!(model = model.tag(), kind = ?failure.kind, "Model run failed: {}", failure.message);
                ModelRun::failed(model, failure, seconds(elapsed))
            }
            Err(e) => {
                warn!(model = model.tag(), "Model worker crashed: {}", e);
                let failure =
                    FailureRecord::new(FailureKind::Internal, format!("Worker for {} crashed", model));
                ModelRun::failed(model, failure, 0.0)
            }
        };
        runs.push(run);
    }
    runs
}

/// Condense a forecast into the comparison summary.
pub fn summarize(report: &PredictionReport, elapsed_time: f64) -> Result<PredictionSummary, FailureRecord> {
    let last = report
        .predictions
        .last()
        .filter(|_| report.current_price != 0.0)
        .ok_or_else(|| FailureRecord::new(FailureKind::ModelFailure, "No predictions available"))?;
    let change = (last.predicted_price - report.current_price) / report.current_price * 100.0;

    Ok(PredictionSummary {
        r2_score: report.metrics.r2_score,
        elapsed_time,
        predicted_change: round2(change),
        predicted_price: round2(last.predicted_price),
        current_price: round2(report.current_price),
        model_description: report.metrics.model_description.clone(),
        training_samples: report.metrics.training_samples,
    })
}

/// Turn raw forecast runs into summary runs.
pub fn summarize_runs(runs: Vec<ModelRun<PredictionReport>>) -> Vec<ModelRun<PredictionSummary>> {
    runs.into_iter()
        .map(|run| match run.result {
            Some(report) => match summarize(&report, run.elapsed_time) {
                Ok(summary) => ModelRun::succeeded(run.model, summary, run.elapsed_time),
                Err(failure) => ModelRun::failed(run.model, failure, run.elapsed_time),
            },
            None => ModelRun {
                model: run.model,
                success: false,
                elapsed_time: run.elapsed_time,
                result: None,
                failure: run.failure,
            },
        })
        .collect()
}

fn speed_score(summary: &PredictionSummary) -> f64 {
    1.0 / (summary.elapsed_time + SPEED_OFFSET_SECS)
}

/// Rank successful live forecasts.
///
/// Overall is `0.4 × R² + 0.3 × speed + 0.3 × samples`, where speed and
/// samples are divided by the best value among the compared models.
pub fn rank_predictions(runs: &[ModelRun<PredictionSummary>]) -> BestPredictionModel {
    let ok: Vec<(ModelKind, &PredictionSummary)> = runs
        .iter()
        .filter_map(|run| run.result.as_ref().map(|s| (run.model, s)))
        .collect();
    if ok.is_empty() {
        return BestPredictionModel::default();
    }

    let max_speed = ok.iter().map(|(_, s)| speed_score(s)).fold(0.0, f64::max);
    let max_samples = ok.iter().map(|(_, s)| s.training_samples).max().unwrap_or(0) as f64;

    let overall = |s: &PredictionSummary| {
        let speed = if max_speed > 0.0 {
            speed_score(s) / max_speed
        } else {
            0.0
        };
        let samples = if max_samples > 0.0 {
            s.training_samples as f64 / max_samples
        } else {
            0.0
        };
        s.r2_score * 0.4 + speed * 0.3 + samples * 0.3
    };

    BestPredictionModel {
        by_accuracy: first_max(&ok, |s| s.r2_score),
        by_speed: first_max(&ok, |s| -s.elapsed_time),
        by_overall: first_max(&ok, overall),
    }
}

fn first_max<F>(candidates: &[(ModelKind, &PredictionSummary)], key: F) -> Option<ModelKind>
where
    F: Fn(&PredictionSummary) -> f64,
{
    let mut best: Option<(ModelKind, f64)> = None;
    for (model, summary) in candidates {
        let value = key(summary);
        if best.map_or(true, |(_, b)| value > b) {
            best = Some((*model, value));
        }
    }
    best.map(|(model, _)| model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ForecastPoint, ModelMetrics, TrainingPeriod};
    use chrono::NaiveDate;

    fn summary(r2: f64, elapsed: f64, samples: usize) -> PredictionSummary {
        PredictionSummary {
            r2_score: r2,
            elapsed_time: elapsed,
            predicted_change: 0.0,
            predicted_price: 100.0,
            current_price: 100.0,
            model_description: String::new(),
            training_samples: samples,
        }
    }

    fn report(current: f64, prices: &[f64]) -> PredictionReport {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        PredictionReport {
            ticker: "T".to_string(),
            model_type: ModelKind::Linear,
            training_period: TrainingPeriod::OneYear,
            predictions: prices
                .iter()
                .map(|&p| ForecastPoint {
                    date,
                    predicted_price: p,
                    confidence: 0.8,
                })
                .collect(),
            historical_data: Vec::new(),
            metrics: ModelMetrics {
                r2_score: 0.95,
                training_samples: 200,
                model_type: "Linear Regression".to_string(),
                model_description: "fast".to_string(),
                n_estimators: None,
                lookback: None,
                layers: None,
            },
            current_price: current,
            last_update: date,
        }
    }

    #[tokio::test]
    async fn test_worker_failures_stay_in_their_slot() {
        let runs = run_per_model(&ModelKind::ALL, |model| match model {
            ModelKind::Linear => Ok(1),
            ModelKind::Ensemble => Err(FailureRecord::new(FailureKind::InsufficientData, "short")),
            ModelKind::Sequence => panic!("boom"),
        })
        .await;

        assert_eq!(runs.len(), 3);
        assert!(runs[0].success);
        assert_eq!(runs[0].result, Some(1));
        assert_eq!(runs[1].failure.as_ref().unwrap().kind, FailureKind::InsufficientData);
        assert_eq!(runs[2].model, ModelKind::Sequence);
        assert_eq!(runs[2].failure.as_ref().unwrap().kind, FailureKind::Internal);
    }

    #[test]
    fn test_summarize_uses_last_prediction() {
        let s = summarize(&report(100.0, &[101.0, 104.5]), 0.4).unwrap();
        assert_eq!(s.predicted_price, 104.5);
        assert_eq!(s.predicted_change, 4.5);
        assert_eq!(s.elapsed_time, 0.4);
        assert_eq!(s.training_samples, 200);

        let err = summarize(&report(100.0, &[]), 0.4).unwrap_err();
        assert_eq!(err.kind, FailureKind::ModelFailure);
    }

    #[test]
    fn test_rank_predictions() {
        let runs = vec![
            ModelRun::succeeded(ModelKind::Linear, summary(0.80, 0.0, 200), 0.0),
            ModelRun::succeeded(ModelKind::Ensemble, summary(0.95, 0.9, 200), 0.9),
            ModelRun::failed(
                ModelKind::Sequence,
                FailureRecord::new(FailureKind::CapabilityUnavailable, "off"),
                0.0,
            ),
        ];
        let best = rank_predictions(&runs);
        assert_eq!(best.by_accuracy, Some(ModelKind::Ensemble));
        assert_eq!(best.by_speed, Some(ModelKind::Linear));
        // Linear 0.32 + 0.3 + 0.3, ensemble 0.38 + 0.03 + 0.3.
        assert_eq!(best.by_overall, Some(ModelKind::Linear));
    }

    #[test]
    fn test_rank_without_success_is_empty() {
        assert_eq!(rank_predictions(&[]), BestPredictionModel::default());
    }
}
