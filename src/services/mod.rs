pub mod analysis;
pub mod backtest;
pub mod comparison;
pub mod features;
pub mod forecast;
pub mod indicators;
pub mod signals;

pub use analysis::{AnalysisError, AnalysisService};
pub use backtest::BacktestError;
pub use forecast::{ForecastError, Forecaster, ModelCatalog};
