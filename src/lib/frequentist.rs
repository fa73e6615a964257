use log::{debug, warn};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::arm::Arm;
use crate::experiment::{ArmObservation, ExperimentInput};
use crate::stats::{cohens_h, normal_sf, two_sided_critical};

/// Pseudo-count added to successes and failures of degenerate experiments.
pub const CONTINUITY_ADJUSTMENT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Magnitude bands for Cohen's h (0.2 small, 0.5 medium, 0.8 large).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSizeInterpretation {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectSizeInterpretation {
    pub fn from_cohens_h(h: f64) -> Self {
        match h.abs() {
            x if x < 0.2 => Self::Negligible,
            x if x < 0.5 => Self::Small,
            x if x < 0.8 => Self::Medium,
            _ => Self::Large,
        }
    }
}

impl std::fmt::Display for EffectSizeInterpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Negligible => write!(f, "negligible"),
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequentistResult {
    pub control_rate: f64,
    pub treatment_rate: f64,
    pub absolute_lift: f64,
    pub relative_lift: f64,
    pub z_statistic: f64,
    pub p_value: f64,
    pub confidence_level: f64,
    /// Interval for the absolute lift (unpooled standard error)
    pub confidence_interval: Interval,
    pub control_interval: Interval,
    pub treatment_interval: Interval,
    pub cohens_h: f64,
    pub effect_size: EffectSizeInterpretation,
    pub alpha: f64,
    pub is_significant: bool,
    pub low_count_adjustment_applied: bool,
}

/// Counts used for the variance terms, possibly continuity adjusted.
struct VarianceCounts {
    control: (f64, f64),
    treatment: (f64, f64),
}

impl VarianceCounts {
    fn from_arms(control: &ArmObservation, treatment: &ArmObservation, adjust: bool) -> Self {
        let pseudo = if adjust { CONTINUITY_ADJUSTMENT } else { 0.0 };
        let counts = |arm: &ArmObservation| {
            (
                arm.successes() as f64 + pseudo,
                arm.trials() as f64 + 2.0 * pseudo,
            )
        };
        Self {
            control: counts(control),
            treatment: counts(treatment),
        }
    }

    fn rate(counts: (f64, f64)) -> f64 {
        counts.0 / counts.1
    }

    fn pooled_standard_error(&self) -> f64 {
        let (s_c, n_c) = self.control;
        let (s_t, n_t) = self.treatment;
        let pooled = (s_c + s_t) / (n_c + n_t);
        (pooled * (1.0 - pooled) * (1.0 / n_c + 1.0 / n_t)).sqrt()
    }

    fn unpooled_standard_error(&self) -> f64 {
        let arm_variance = |counts: (f64, f64)| {
            let p = Self::rate(counts);
            p * (1.0 - p) / counts.1
        };
        (arm_variance(self.control) + arm_variance(self.treatment)).sqrt()
    }
}

/// Arms that have no successes or no failures.
pub fn degenerate_arms(input: &ExperimentInput) -> Vec<Arm> {
    Arm::iter()
        .filter(|arm| input.arm(*arm).is_degenerate())
        .collect()
}

/// Two-proportion z-test with a Wald interval for the lift.
pub fn analyze(input: &ExperimentInput) -> FrequentistResult {
    let control = &input.control;
    let treatment = &input.treatment;
    let alpha = input.config.alpha;
    let confidence_level = input.config.confidence_level;

    let degenerate = degenerate_arms(input);
    let adjusted = !degenerate.is_empty();
    if adjusted {
        warn!(
            "Applying continuity adjustment, degenerate arms: {:?}",
            degenerate
        );
    }
    let counts = VarianceCounts::from_arms(control, treatment, adjusted);

    let control_rate = control.rate();
    let treatment_rate = treatment.rate();
    let absolute_lift = treatment_rate - control_rate;
    let relative_base = if control_rate > 0.0 {
        control_rate
    } else {
        VarianceCounts::rate(counts.control)
    };
    let relative_lift = absolute_lift / relative_base;

    let pooled_se = counts.pooled_standard_error();
    let z_statistic = absolute_lift / pooled_se;
    let p_value = (2.0 * normal_sf(z_statistic.abs())).min(1.0);

    let critical = two_sided_critical(confidence_level);
    let margin = critical * counts.unpooled_standard_error();
    let confidence_interval = Interval::new(absolute_lift - margin, absolute_lift + margin);

    let arm_interval = |rate: f64, counts: (f64, f64)| {
        let p = VarianceCounts::rate(counts);
        let margin = critical * (p * (1.0 - p) / counts.1).sqrt();
        Interval::new(rate - margin, rate + margin)
    };
    let control_interval = arm_interval(control_rate, counts.control);
    let treatment_interval = arm_interval(treatment_rate, counts.treatment);

    let h = cohens_h(control_rate, treatment_rate);
    let is_significant = p_value < alpha;
    debug!(
        "z-test: lift = {:.5}, z = {:.4}, p = {:.3e}, significant = {}",
        absolute_lift, z_statistic, p_value, is_significant
    );

    FrequentistResult {
        control_rate,
        treatment_rate,
        absolute_lift,
        relative_lift,
        z_statistic,
        p_value,
        confidence_level,
        confidence_interval,
        control_interval,
        treatment_interval,
        cohens_h: h,
        effect_size: EffectSizeInterpretation::from_cohens_h(h),
        alpha,
        is_significant,
        low_count_adjustment_applied: adjusted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::DecisionPolicy;
    use crate::simulate::simulate_experiment;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn input(n_c: u64, s_c: u64, n_t: u64, s_t: u64) -> ExperimentInput {
        ExperimentInput::new(
            ArmObservation::new(n_c, s_c).unwrap(),
            ArmObservation::new(n_t, s_t).unwrap(),
            DecisionPolicy::new(0.005),
        )
    }

    #[test]
    fn test_large_significant_experiment() {
        let result = analyze(&input(10000, 1145, 10000, 1409));
        assert!((result.control_rate - 0.1145).abs() < 1e-12);
        assert!((result.treatment_rate - 0.1409).abs() < 1e-12);
        assert!((result.absolute_lift - 0.0264).abs() < 1e-12);
        assert!((result.relative_lift - 0.0264 / 0.1145).abs() < 1e-9);
        assert!((result.z_statistic - 5.5932).abs() < 1e-3);
        assert!(result.p_value < 1e-6);
        assert!((result.confidence_interval.lower - 0.01716).abs() < 5e-5);
        assert!((result.confidence_interval.upper - 0.03564).abs() < 5e-5);
        assert!(result.is_significant);
        assert!(!result.low_count_adjustment_applied);
        assert_eq!(result.effect_size, EffectSizeInterpretation::Negligible);
    }

    #[test]
    fn test_small_experiment_not_significant() {
        let result = analyze(&input(100, 10, 100, 13));
        assert!((result.p_value - 0.5061).abs() < 1e-3);
        assert!(!result.is_significant);
        assert!(result.confidence_interval.contains(0.0));
    }

    #[test]
    fn test_arm_intervals_bracket_rates() {
        let result = analyze(&input(2000, 300, 2000, 340));
        assert!(result.control_interval.contains(result.control_rate));
        assert!(result.treatment_interval.contains(result.treatment_rate));
        assert!(result.control_interval.width() > 0.0);
    }

    #[test]
    fn test_p_value_equal_to_alpha_is_not_significant() {
        let mut experiment = input(100, 10, 100, 13);
        let p_value = analyze(&experiment).p_value;
        experiment.config.alpha = p_value;
        assert!(!analyze(&experiment).is_significant);
    }

    #[test]
    fn test_zero_successes_applies_adjustment() {
        let result = analyze(&input(50, 0, 50, 4));
        assert!(result.low_count_adjustment_applied);
        assert!(result.z_statistic.is_finite());
        assert!(result.p_value.is_finite());
        assert!(result.relative_lift.is_finite());
        assert!(result.confidence_interval.lower.is_finite());
        assert_eq!(result.control_rate, 0.0);
    }

    #[test]
    fn test_all_zero_is_finite_and_null() {
        let result = analyze(&input(20, 0, 20, 0));
        assert!(result.low_count_adjustment_applied);
        assert_eq!(result.z_statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert_eq!(result.relative_lift, 0.0);
    }

    #[test]
    fn test_all_successes_applies_adjustment() {
        let result = analyze(&input(30, 30, 30, 25));
        assert!(result.low_count_adjustment_applied);
        assert!(result.p_value.is_finite());
        assert_eq!(
            degenerate_arms(&input(30, 30, 30, 25)),
            vec![Arm::Control]
        );
    }

    #[test]
    fn test_type_one_error_is_calibrated() {
        let mut rng = StdRng::seed_from_u64(7);
        let replicates = 1000;
        let mut rejections = 0;
        for _ in 0..replicates {
            let (control, treatment) = simulate_experiment(1000, 0.2, 0.2, &mut rng).unwrap();
            let experiment = ExperimentInput::new(control, treatment, DecisionPolicy::new(0.0));
            if analyze(&experiment).is_significant {
                rejections += 1;
            }
        }
        let rate = rejections as f64 / replicates as f64;
        assert!(rate > 0.025 && rate < 0.08, "rejection rate was {}", rate);
    }
}
