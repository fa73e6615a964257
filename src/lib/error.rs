use serde::{Deserialize, Serialize};

use crate::arm::Arm;

/// Malformed or out-of-range input, raised before any analyzer runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid value for '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Invalid decision thresholds. Fatal, raised before synthesis.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid decision policy '{field}': {reason}")]
pub struct ConfigurationError {
    pub field: String,
    pub reason: String,
}

impl ConfigurationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("{analyzer} analyzer failed: {reason}")]
    Analyzer { analyzer: String, reason: String },
}

impl AnalysisError {
    pub fn analyzer(analyzer: &str, reason: impl Into<String>) -> Self {
        Self::Analyzer {
            analyzer: analyzer.to_string(),
            reason: reason.into(),
        }
    }
}

/// Non-fatal numerical conditions surfaced alongside a complete report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NumericalWarning {
    /// 0.5 was added to successes and failures because an arm had no
    /// successes or no failures.
    LowCountAdjustment { arms: Vec<Arm> },
    MonteCarloVariance { standard_error: f64, bound: f64 },
}

impl std::fmt::Display for NumericalWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericalWarning::LowCountAdjustment { arms } => {
                let arms = arms.iter().map(|a| a.as_str()).collect::<Vec<_>>().join(", ");
                write!(f, "continuity adjustment applied (degenerate arms: {})", arms)
            }
            NumericalWarning::MonteCarloVariance {
                standard_error,
                bound,
            } => write!(
                f,
                "Monte Carlo standard error {:.5} exceeds bound {:.5}",
                standard_error, bound
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_message() {
        let err = ValidationError::new("alpha", "must be in (0, 1), got 1.5");
        assert_eq!(
            err.to_string(),
            "invalid value for 'alpha': must be in (0, 1), got 1.5"
        );
    }

    #[test]
    fn test_analysis_error_from_validation() {
        let err: AnalysisError = ValidationError::new("control.trials", "must be positive").into();
        assert!(matches!(err, AnalysisError::Validation(_)));
        assert_eq!(err.to_string(), "invalid value for 'control.trials': must be positive");
    }

    #[test]
    fn test_warning_display() {
        let warning = NumericalWarning::LowCountAdjustment {
            arms: vec![Arm::Control],
        };
        assert_eq!(
            warning.to_string(),
            "continuity adjustment applied (degenerate arms: control)"
        );
    }
}
