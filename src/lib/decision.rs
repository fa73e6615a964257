//! Turns the analyzer outputs into one of four verdicts.
//!
//! Checks run in a fixed order: power, significance, downside risk, then
//! posterior confidence. An underpowered test therefore never reaches a
//! ship or hold verdict. Power is judged against the configured target
//! lift, so a large test with no effect ends as inconclusive.

use log::info;
use serde::{Deserialize, Serialize};

use crate::bayesian::BayesianResult;
use crate::business::BusinessImpactResult;
use crate::error::{AnalysisError, ConfigurationError};
use crate::experiment::{DecisionPolicy, IntervalSource};
use crate::frequentist::FrequentistResult;
use crate::power::PowerResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Ship,
    Hold,
    InsufficientPower,
    Inconclusive,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Ship => write!(f, "SHIP"),
            Verdict::Hold => write!(f, "HOLD"),
            Verdict::InsufficientPower => write!(f, "INSUFFICIENT_POWER"),
            Verdict::Inconclusive => write!(f, "INCONCLUSIVE"),
        }
    }
}

/// The numbers the synthesizer compares, extracted from the analyzer results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionSignals {
    pub is_significant: bool,
    pub p_value: f64,
    pub alpha: f64,
    /// Post-hoc power at the observed lift
    pub achieved_power: f64,
    /// Power of the arm sizes against the target lift
    pub power_at_target_mde: f64,
    pub target_mde: f64,
    pub desired_power: f64,
    pub prob_treatment_better: f64,
    pub observed_lift: f64,
    pub minimum_detectable_effect: f64,
    /// Lower bound of the lift interval used for the risk check
    pub downside_lift: f64,
    pub downside_revenue: Option<f64>,
}

impl DecisionSignals {
    pub fn from_results(
        frequentist: &FrequentistResult,
        bayesian: &BayesianResult,
        power: &PowerResult,
        business: Option<&BusinessImpactResult>,
    ) -> Result<Self, AnalysisError> {
        let achieved_power = power.achieved_power().ok_or_else(|| {
            AnalysisError::analyzer("decision", "post-hoc power estimate required")
        })?;
        let downside_lift = match business.map(|b| b.interval_source) {
            Some(IntervalSource::Bayesian) => bayesian.credible_interval.lower,
            _ => frequentist.confidence_interval.lower,
        };
        Ok(Self {
            is_significant: frequentist.is_significant,
            p_value: frequentist.p_value,
            alpha: frequentist.alpha,
            achieved_power,
            power_at_target_mde: power.power_at_target_mde,
            target_mde: power.target_mde,
            desired_power: power.desired_power,
            prob_treatment_better: bayesian.prob_treatment_better,
            observed_lift: frequentist.absolute_lift,
            minimum_detectable_effect: power.minimum_detectable_effect,
            downside_lift,
            downside_revenue: business.map(|b| b.low_bound_revenue_delta),
        })
    }

    pub fn is_underpowered(&self) -> bool {
        self.power_at_target_mde < self.desired_power
    }

    pub fn lift_below_mde(&self) -> bool {
        self.observed_lift.abs() < self.minimum_detectable_effect
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    pub rationale: String,
    pub lift_below_mde: bool,
    pub signals: DecisionSignals,
    pub policy: DecisionPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Power,
    Significance,
    Risk,
    Confidence,
}

#[derive(Debug, Clone)]
pub struct DecisionSynthesizer {
    policy: DecisionPolicy,
}

impl DecisionSynthesizer {
    pub fn new(policy: DecisionPolicy) -> Result<Self, ConfigurationError> {
        if !(0.0..=1.0).contains(&policy.ship_probability) {
            return Err(ConfigurationError::new(
                "ship_probability",
                format!("must be in [0, 1], got {}", policy.ship_probability),
            ));
        }
        if !(policy.max_lift_loss.is_finite() && policy.max_lift_loss >= 0.0) {
            return Err(ConfigurationError::new(
                "max_lift_loss",
                format!("must be finite and non-negative, got {}", policy.max_lift_loss),
            ));
        }
        if let Some(loss) = policy.max_revenue_loss {
            if !(loss.is_finite() && loss >= 0.0) {
                return Err(ConfigurationError::new(
                    "max_revenue_loss",
                    format!("must be finite and non-negative, got {}", loss),
                ));
            }
        }
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    fn risk_breach(&self, signals: &DecisionSignals) -> Option<String> {
        if signals.downside_lift < -self.policy.max_lift_loss {
            return Some(format!(
                "lift lower bound {:.5} is below the tolerated loss of -{:.5}",
                signals.downside_lift, self.policy.max_lift_loss
            ));
        }
        match (signals.downside_revenue, self.policy.max_revenue_loss) {
            (Some(revenue), Some(max_loss)) if revenue < -max_loss => Some(format!(
                "monthly revenue lower bound {:.2} is below the tolerated loss of -{:.2}",
                revenue, max_loss
            )),
            _ => None,
        }
    }

    pub fn decide(&self, signals: &DecisionSignals) -> Decision {
        let mut stage = Stage::Power;
        let (verdict, rationale) = loop {
            match stage {
                Stage::Power => {
                    if signals.is_underpowered() {
                        break (
                            Verdict::InsufficientPower,
                            format!(
                                "power {:.3} against a lift of {:.5} is below the desired {:.3}; extend the test (detectable effect {:.5}, observed lift {:.5})",
                                signals.power_at_target_mde,
                                signals.target_mde,
                                signals.desired_power,
                                signals.minimum_detectable_effect,
                                signals.observed_lift
                            ),
                        );
                    }
                    stage = Stage::Significance;
                }
                Stage::Significance => {
                    if !signals.is_significant {
                        break (
                            Verdict::Inconclusive,
                            format!(
                                "p-value {:.4} is not below alpha {:.4} with power {:.3} against a lift of {:.5}; the true effect is likely near zero",
                                signals.p_value, signals.alpha, signals.power_at_target_mde, signals.target_mde
                            ),
                        );
                    }
                    stage = Stage::Risk;
                }
                Stage::Risk => {
                    if let Some(reason) = self.risk_breach(signals) {
                        break (
                            Verdict::Hold,
                            format!(
                                "significant (p = {:.4} < {:.4}) but {}",
                                signals.p_value, signals.alpha, reason
                            ),
                        );
                    }
                    stage = Stage::Confidence;
                }
                Stage::Confidence => {
                    if signals.prob_treatment_better >= self.policy.ship_probability {
                        break (
                            Verdict::Ship,
                            format!(
                                "significant (p = {:.4} < {:.4}), power {:.3} >= {:.3}, P(treatment > control) = {:.4} >= {:.4}",
                                signals.p_value,
                                signals.alpha,
                                signals.power_at_target_mde,
                                signals.desired_power,
                                signals.prob_treatment_better,
                                self.policy.ship_probability
                            ),
                        );
                    }
                    break (
                        Verdict::Inconclusive,
                        format!(
                            "significant (p = {:.4}) but P(treatment > control) = {:.4} is below {:.4}",
                            signals.p_value, signals.prob_treatment_better, self.policy.ship_probability
                        ),
                    );
                }
            }
        };
        info!("Decision: {} ({})", verdict, rationale);
        Decision {
            verdict,
            rationale,
            lift_below_mde: signals.lift_below_mde(),
            signals: signals.clone(),
            policy: self.policy.clone(),
        }
    }
}
