//! Model catalog.
//!
//! Maps each [`ModelKind`] to its settings, listing entry and constructor.
//! Built once at startup from [`Config`] and read-only afterwards.

use super::{EnsembleForecaster, ForecastError, Forecaster, LinearForecaster};
use crate::config::Config;
use crate::types::{ModelCategory, ModelInfo, ModelKind};

/// Random forest shape.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleSettings {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for EnsembleSettings {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

/// Recurrent model shape and optimiser settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceSettings {
    /// Window length fed to the network.
    pub lookback: usize,
    pub hidden_size: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl Default for SequenceSettings {
    fn default() -> Self {
        Self {
            lookback: 60,
            hidden_size: 32,
            epochs: 20,
            batch_size: 32,
            learning_rate: 0.005,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelCatalog {
    pub ensemble: EnsembleSettings,
    pub sequence: SequenceSettings,
    sequence_enabled: bool,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new(EnsembleSettings::default(), SequenceSettings::default(), true)
    }
}

impl ModelCatalog {
    pub fn new(
        ensemble: EnsembleSettings,
        sequence: SequenceSettings,
        sequence_enabled: bool,
    ) -> Self {
        Self {
            ensemble,
            sequence,
            sequence_enabled,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let ensemble = EnsembleSettings {
            n_trees: config.ensemble_trees,
            max_depth: config.ensemble_max_depth,
            ..EnsembleSettings::default()
        };
        let sequence = SequenceSettings {
            lookback: config.sequence_lookback,
            hidden_size: config.sequence_hidden,
            epochs: config.sequence_epochs,
            learning_rate: config.sequence_learning_rate,
            ..SequenceSettings::default()
        };
        Self::new(ensemble, sequence, config.sequence_enabled)
    }

    /// Whether a model can be constructed in this process.
    ///
    /// The sequence model needs the `sequence-model` cargo feature and the
    /// runtime switch.
    pub fn is_available(&self, kind: ModelKind) -> bool {
        match kind {
            ModelKind::Linear | ModelKind::Ensemble => true,
            ModelKind::Sequence => cfg!(feature = "sequence-model") && self.sequence_enabled,
        }
    }

    /// Listing of every model family.
    pub fn models(&self) -> Vec<ModelInfo> {
        ModelKind::ALL
            .iter()
            .map(|&kind| {
                let (description, category) = match kind {
                    ModelKind::Linear => (
                        "Fastest option, suited to quick previews",
                        ModelCategory::Traditional,
                    ),
                    ModelKind::Ensemble => (
                        "Accurate with moderate speed (recommended)",
                        ModelCategory::Traditional,
                    ),
                    ModelKind::Sequence => (
                        "Recurrent network for complex patterns, slowest to train",
                        ModelCategory::DeepLearning,
                    ),
                };
                ModelInfo {
                    model: kind,
                    name: kind.display_name().to_string(),
                    description: description.to_string(),
                    category,
                    available: self.is_available(kind),
                }
            })
            .collect()
    }

    /// Construct an untrained model.
    pub fn create(&self, kind: ModelKind) -> Result<Box<dyn Forecaster>, ForecastError> {
        if !self.is_available(kind) {
            return Err(ForecastError::CapabilityUnavailable(kind));
        }
        match kind {
            ModelKind::Linear => Ok(Box::new(LinearForecaster::new())),
            ModelKind::Ensemble => Ok(Box::new(EnsembleForecaster::new(self.ensemble.clone()))),
            ModelKind::Sequence => self.create_sequence(),
        }
    }

    #[cfg(feature = "sequence-model")]
    fn create_sequence(&self) -> Result<Box<dyn Forecaster>, ForecastError> {
        Ok(Box::new(super::SequenceForecaster::new(self.sequence.clone())))
    }

    #[cfg(not(feature = "sequence-model"))]
    fn create_sequence(&self) -> Result<Box<dyn Forecaster>, ForecastError> {
        Err(ForecastError::CapabilityUnavailable(ModelKind::Sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_sequence_is_unavailable() {
        let catalog = ModelCatalog::new(
            EnsembleSettings::default(),
            SequenceSettings::default(),
            false,
        );
        assert!(!catalog.is_available(ModelKind::Sequence));
        assert!(catalog.is_available(ModelKind::Linear));
        assert_eq!(
            catalog.create(ModelKind::Sequence).err(),
            Some(ForecastError::CapabilityUnavailable(ModelKind::Sequence))
        );
        assert!(catalog.create(ModelKind::Ensemble).is_ok());
    }

    #[test]
    fn test_listing_covers_every_model() {
        let catalog = ModelCatalog::default();
        let models = catalog.models();
        assert_eq!(models.len(), 3);
        assert_eq!(models[2].category, ModelCategory::DeepLearning);
        assert_eq!(
            models[2].available,
            cfg!(feature = "sequence-model")
        );
        assert!(models[0].available && models[1].available);
    }

    #[test]
    fn test_created_model_reports_kind() {
        let catalog = ModelCatalog::default();
        for kind in [ModelKind::Linear, ModelKind::Ensemble] {
            assert_eq!(catalog.create(kind).map(|m| m.kind()).ok(), Some(kind));
        }
    }
}
