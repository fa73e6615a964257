use serde::{Deserialize, Serialize};

use crate::arm::Arm;
use crate::error::ValidationError;

/// Aggregate counts for one arm of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmObservation {
    trials: u64,
    successes: u64,
}

impl ArmObservation {
    pub fn new(trials: u64, successes: u64) -> Result<Self, ValidationError> {
        let observation = Self { trials, successes };
        observation.check("arm")?;
        Ok(observation)
    }

    pub(crate) fn check(&self, label: &str) -> Result<(), ValidationError> {
        if self.trials == 0 {
            return Err(ValidationError::new(
                format!("{}.trials", label),
                "must be positive",
            ));
        }
        if self.successes > self.trials {
            return Err(ValidationError::new(
                format!("{}.successes", label),
                format!(
                    "{} successes exceeds {} trials",
                    self.successes, self.trials
                ),
            ));
        }
        Ok(())
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn failures(&self) -> u64 {
        self.trials - self.successes
    }

    /// Observed conversion rate
    pub fn rate(&self) -> f64 {
        self.successes as f64 / self.trials as f64
    }

    /// True when the arm has no successes or no failures.
    pub fn is_degenerate(&self) -> bool {
        self.successes == 0 || self.successes == self.trials
    }
}

/// Statistical configuration shared by the analyzers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub alpha: f64,
    /// Absolute lift the test should be able to detect
    pub mde: f64,
    pub desired_power: f64,
    pub confidence_level: f64,
    pub monte_carlo_iterations: usize,
    pub prior_alpha: f64,
    pub prior_beta: f64,
    pub seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            mde: 0.01,
            desired_power: 0.8,
            confidence_level: 0.95,
            monte_carlo_iterations: 100_000,
            prior_alpha: 1.0,
            prior_beta: 1.0,
            seed: 42,
        }
    }
}

/// Thresholds the decision synthesizer compares against.
///
/// The loss tolerance has no default: callers state how much downside
/// they accept before a significant result is held back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    /// Minimum P(treatment > control) required to ship
    pub ship_probability: f64,
    /// Largest acceptable drop in absolute conversion rate at the lower interval bound
    pub max_lift_loss: f64,
    /// Largest acceptable monthly revenue loss at the lower bound
    pub max_revenue_loss: Option<f64>,
}

impl DecisionPolicy {
    pub const DEFAULT_SHIP_PROBABILITY: f64 = 0.95;

    pub fn new(max_lift_loss: f64) -> Self {
        Self {
            ship_probability: Self::DEFAULT_SHIP_PROBABILITY,
            max_lift_loss,
            max_revenue_loss: None,
        }
    }

    pub fn with_ship_probability(mut self, ship_probability: f64) -> Self {
        self.ship_probability = ship_probability;
        self
    }

    pub fn with_max_revenue_loss(mut self, max_revenue_loss: f64) -> Self {
        self.max_revenue_loss = Some(max_revenue_loss);
        self
    }
}

/// Which statistical method supplies the uncertainty bounds for business projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IntervalSource {
    #[default]
    Frequentist,
    Bayesian,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessParameters {
    pub revenue_per_conversion: f64,
    pub monthly_traffic: f64,
    pub implementation_cost: Option<f64>,
    pub interval_source: IntervalSource,
}

impl BusinessParameters {
    pub fn new(revenue_per_conversion: f64, monthly_traffic: f64) -> Self {
        Self {
            revenue_per_conversion,
            monthly_traffic,
            implementation_cost: None,
            interval_source: IntervalSource::default(),
        }
    }

    pub fn with_implementation_cost(mut self, cost: f64) -> Self {
        self.implementation_cost = Some(cost);
        self
    }

    pub fn with_interval_source(mut self, source: IntervalSource) -> Self {
        self.interval_source = source;
        self
    }
}

/// Everything one analysis needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentInput {
    pub control: ArmObservation,
    pub treatment: ArmObservation,
    pub config: AnalysisConfig,
    pub policy: DecisionPolicy,
    pub business: Option<BusinessParameters>,
}

impl ExperimentInput {
    pub fn new(control: ArmObservation, treatment: ArmObservation, policy: DecisionPolicy) -> Self {
        Self {
            control,
            treatment,
            config: AnalysisConfig::default(),
            policy,
            business: None,
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_business(mut self, business: BusinessParameters) -> Self {
        self.business = Some(business);
        self
    }

    pub fn arm(&self, arm: Arm) -> &ArmObservation {
        match arm {
            Arm::Control => &self.control,
            Arm::Treatment => &self.treatment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_arm_observation() {
        let arm = ArmObservation::new(100, 13).unwrap();
        assert_eq!(arm.trials(), 100);
        assert_eq!(arm.successes(), 13);
        assert_eq!(arm.failures(), 87);
        assert!((arm.rate() - 0.13).abs() < 1e-12);
        assert!(!arm.is_degenerate());
    }

    #[test]
    fn test_arm_observation_rejects_bad_counts() {
        assert!(ArmObservation::new(0, 0).is_err());
        let err = ArmObservation::new(10, 11).unwrap_err();
        assert_eq!(err.field, "arm.successes");
    }

    #[test]
    fn test_degenerate_arms() {
        assert!(ArmObservation::new(10, 0).unwrap().is_degenerate());
        assert!(ArmObservation::new(10, 10).unwrap().is_degenerate());
    }

    #[test]
    fn test_experiment_input_defaults() {
        let input = ExperimentInput::new(
            ArmObservation::new(100, 10).unwrap(),
            ArmObservation::new(100, 12).unwrap(),
            DecisionPolicy::new(0.005),
        );
        assert_eq!(input.config.alpha, 0.05);
        assert_eq!(input.config.monte_carlo_iterations, 100_000);
        assert_eq!(input.policy.ship_probability, 0.95);
        assert!(input.business.is_none());
        assert_eq!(input.arm(Arm::Treatment).successes(), 12);
    }
}
