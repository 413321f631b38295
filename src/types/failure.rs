use serde::{Deserialize, Serialize};

/// Coarse failure taxonomy shared by every core error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Upstream returned nothing for the ticker.
    DataUnavailable,
    /// Not enough rows for a stage (raw fetch, cleaning, split).
    InsufficientData,
    /// Unknown model, period, or out-of-range parameter.
    UnsupportedConfiguration,
    /// The optional sequence model is not available in this build.
    CapabilityUnavailable,
    /// Upstream could not be reached or timed out.
    ProviderUnavailable,
    /// The regression library rejected the training data.
    ModelFailure,
    /// Unexpected condition such as a crashed worker.
    Internal,
}

/// Serializable failure carried in batch result slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureRecord {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_serialization() {
        let json = serde_json::to_string(&FailureKind::CapabilityUnavailable).unwrap();
        assert_eq!(json, "\"capability_unavailable\"");
    }

    #[test]
    fn test_failure_record_serialization() {
        let record = FailureRecord::new(FailureKind::InsufficientData, "need 60 rows");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"kind\":\"insufficient_data\""));
        assert!(json.contains("\"message\":\"need 60 rows\""));
    }
}
