//! Normal-approximation power analysis for two-proportion tests on the
//! arcsine (Cohen's h) scale.
//!
//! The pre-test and post-hoc contracts are separate functions so each
//! enforces its own inputs. Both report the minimum detectable effect of
//! the sample size in play, and the power those sizes have against the
//! configured target lift. The decision step gates on the latter.

use log::debug;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

use crate::error::ValidationError;
use crate::experiment::ExperimentInput;
use crate::stats::{cohens_h, normal_cdf, normal_quantile};
use crate::validate::check_open_unit;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PowerEstimate {
    PreTest { required_sample_size_per_arm: u64 },
    PostHoc { achieved_power: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerResult {
    pub estimate: PowerEstimate,
    /// Smallest absolute lift above `baseline_rate` detectable at `desired_power`
    pub minimum_detectable_effect: f64,
    pub baseline_rate: f64,
    pub alpha: f64,
    pub desired_power: f64,
    /// Absolute lift the experiment was designed to detect
    pub target_mde: f64,
    /// Power of the arm sizes in play against `baseline_rate + target_mde`
    pub power_at_target_mde: f64,
    /// Per-arm size needed for `target_mde`; `None` when the target lift
    /// passes a rate of 1 or the size is not representable
    pub target_sample_size_per_arm: Option<u64>,
}

impl PowerResult {
    pub fn achieved_power(&self) -> Option<f64> {
        match self.estimate {
            PowerEstimate::PostHoc { achieved_power } => Some(achieved_power),
            PowerEstimate::PreTest { .. } => None,
        }
    }

    /// True when the arm sizes reach the desired power against the target lift.
    pub fn is_adequately_powered(&self) -> bool {
        self.power_at_target_mde >= self.desired_power
    }

    pub fn required_sample_size_per_arm(&self) -> Option<u64> {
        match self.estimate {
            PowerEstimate::PreTest {
                required_sample_size_per_arm,
            } => Some(required_sample_size_per_arm),
            PowerEstimate::PostHoc { .. } => None,
        }
    }
}

fn check_baseline(baseline_rate: f64) -> Result<(), ValidationError> {
    if (0.0..1.0).contains(&baseline_rate) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "baseline_rate",
            format!("must be in [0, 1), got {}", baseline_rate),
        ))
    }
}

fn check_mde(baseline_rate: f64, mde: f64) -> Result<(), ValidationError> {
    if !(mde.is_finite() && mde > 0.0) {
        return Err(ValidationError::new(
            "mde",
            format!("must be positive, got {}", mde),
        ));
    }
    if baseline_rate + mde > 1.0 {
        return Err(ValidationError::new(
            "mde",
            format!(
                "baseline {} plus mde {} exceeds a rate of 1",
                baseline_rate, mde
            ),
        ));
    }
    Ok(())
}

/// z_{1-α/2} + z_{power}, floored at zero so sample sizes stay monotone in power.
fn combined_z(alpha: f64, desired_power: f64) -> f64 {
    (normal_quantile(1.0 - alpha / 2.0) + normal_quantile(desired_power)).max(0.0)
}

/// n_c n_t / (n_c + n_t); equals n / 2 for balanced arms.
fn effective_n(n_control: u64, n_treatment: u64) -> f64 {
    let (n_c, n_t) = (n_control as f64, n_treatment as f64);
    n_c * n_t / (n_c + n_t)
}

/// Required sample size per arm to detect an absolute lift of `mde` above
/// `baseline_rate` with a two-sided test. Always rounded up.
pub fn required_sample_size(
    baseline_rate: f64,
    mde: f64,
    alpha: f64,
    desired_power: f64,
) -> Result<u64, ValidationError> {
    check_baseline(baseline_rate)?;
    check_mde(baseline_rate, mde)?;
    check_open_unit("alpha", alpha)?;
    check_open_unit("desired_power", desired_power)?;

    let h = cohens_h(baseline_rate, baseline_rate + mde);
    let n = (2.0 * (combined_z(alpha, desired_power) / h).powi(2)).ceil();
    if !n.is_finite() || n >= u64::MAX as f64 {
        return Err(ValidationError::new(
            "mde",
            format!("required sample size for mde {} exceeds {}", mde, u64::MAX),
        ));
    }
    Ok((n as u64).max(1))
}

/// Users needed across both arms.
pub fn total_sample_size(per_arm: u64) -> Result<u64, ValidationError> {
    per_arm.checked_mul(2).ok_or_else(|| {
        ValidationError::new(
            "sample_size_per_arm",
            format!("total for {} per arm exceeds {}", per_arm, u64::MAX),
        )
    })
}

/// Power of a two-sided two-proportion test for the observed configuration.
pub fn achieved_power(
    n_control: u64,
    n_treatment: u64,
    control_rate: f64,
    treatment_rate: f64,
    alpha: f64,
) -> Result<f64, ValidationError> {
    check_open_unit("alpha", alpha)?;
    if n_control == 0 || n_treatment == 0 {
        return Err(ValidationError::new("trials", "both arms need trials"));
    }
    for (field, rate) in [("control_rate", control_rate), ("treatment_rate", treatment_rate)] {
        if !(0.0..=1.0).contains(&rate) {
            return Err(ValidationError::new(
                field,
                format!("must be in [0, 1], got {}", rate),
            ));
        }
    }

    let z_alpha = normal_quantile(1.0 - alpha / 2.0);
    let z = cohens_h(control_rate, treatment_rate).abs() * effective_n(n_control, n_treatment).sqrt();
    let power = normal_cdf(z - z_alpha) + normal_cdf(-z - z_alpha);
    Ok(power.clamp(0.0, 1.0))
}

/// Smallest absolute lift above `baseline_rate` the given arm sizes detect
/// with `desired_power`. Capped at `1 - baseline_rate`.
pub fn minimum_detectable_effect(
    baseline_rate: f64,
    n_control: u64,
    n_treatment: u64,
    alpha: f64,
    desired_power: f64,
) -> Result<f64, ValidationError> {
    if !(0.0..=1.0).contains(&baseline_rate) {
        return Err(ValidationError::new(
            "baseline_rate",
            format!("must be in [0, 1], got {}", baseline_rate),
        ));
    }
    check_open_unit("alpha", alpha)?;
    check_open_unit("desired_power", desired_power)?;
    if n_control == 0 || n_treatment == 0 {
        return Err(ValidationError::new("trials", "both arms need trials"));
    }

    let h = combined_z(alpha, desired_power) / effective_n(n_control, n_treatment).sqrt();
    let angle = (baseline_rate.sqrt().asin() + h / 2.0).min(FRAC_PI_2);
    Ok(angle.sin().powi(2) - baseline_rate)
}

/// Pre-test plan: required sample size plus the MDE that size actually reaches.
pub fn plan(
    baseline_rate: f64,
    mde: f64,
    alpha: f64,
    desired_power: f64,
) -> Result<PowerResult, ValidationError> {
    let n = required_sample_size(baseline_rate, mde, alpha, desired_power)?;
    let detectable = minimum_detectable_effect(baseline_rate, n, n, alpha, desired_power)?;
    let power = achieved_power(n, n, baseline_rate, baseline_rate + mde, alpha)?;
    debug!(
        "Pre-test plan: {} per arm detects {:.5} at power {}",
        n, detectable, desired_power
    );
    Ok(PowerResult {
        estimate: PowerEstimate::PreTest {
            required_sample_size_per_arm: n,
        },
        minimum_detectable_effect: detectable,
        baseline_rate,
        alpha,
        desired_power,
        target_mde: mde,
        power_at_target_mde: power,
        target_sample_size_per_arm: Some(n),
    })
}

/// Post-hoc power for a validated experiment, using the control rate as baseline.
///
/// Also evaluates the arm sizes against `config.mde`, which is what decides
/// whether the experiment was large enough.
pub fn analyze(input: &ExperimentInput) -> Result<PowerResult, ValidationError> {
    let config = &input.config;
    let (control, treatment) = (&input.control, &input.treatment);
    let baseline = control.rate();
    let power = achieved_power(
        control.trials(),
        treatment.trials(),
        control.rate(),
        treatment.rate(),
        config.alpha,
    )?;
    let detectable = minimum_detectable_effect(
        control.rate(),
        control.trials(),
        treatment.trials(),
        config.alpha,
        config.desired_power,
    )?;
    let power_at_target = achieved_power(
        control.trials(),
        treatment.trials(),
        baseline,
        (baseline + config.mde).min(1.0),
        config.alpha,
    )?;
    let target_n = required_sample_size(baseline, config.mde, config.alpha, config.desired_power).ok();
    debug!(
        "Post-hoc power {:.4}, minimum detectable effect {:.5}, power {:.4} at target mde {}",
        power, detectable, power_at_target, config.mde
    );
    Ok(PowerResult {
        estimate: PowerEstimate::PostHoc {
            achieved_power: power,
        },
        minimum_detectable_effect: detectable,
        baseline_rate: baseline,
        alpha: config.alpha,
        desired_power: config.desired_power,
        target_mde: config.mde,
        power_at_target_mde: power_at_target,
        target_sample_size_per_arm: target_n,
    })
}

/// Days needed to fill both arms at `daily_traffic` users per day.
pub fn test_duration_days(required_per_arm: u64, daily_traffic: u64) -> Result<u64, ValidationError> {
    if daily_traffic == 0 {
        return Err(ValidationError::new("daily_traffic", "must be positive"));
    }
    Ok(total_sample_size(required_per_arm)?.div_ceil(daily_traffic))
}

/// Required sample size per arm for each MDE in `mdes`.
pub fn sample_size_curve(
    baseline_rate: f64,
    mdes: &[f64],
    alpha: f64,
    desired_power: f64,
) -> Result<Vec<(f64, u64)>, ValidationError> {
    mdes.iter()
        .map(|&mde| {
            required_sample_size(baseline_rate, mde, alpha, desired_power).map(|n| (mde, n))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{ArmObservation, DecisionPolicy};

    #[test]
    fn test_required_sample_size_known_values() {
        assert_eq!(required_sample_size(0.12, 0.015, 0.05, 0.8).unwrap(), 7756);
        assert_eq!(required_sample_size(0.10, 0.02, 0.05, 0.8).unwrap(), 3835);
        assert_eq!(required_sample_size(0.5, 0.1, 0.05, 0.8).unwrap(), 388);
    }

    #[test]
    fn test_required_sample_size_rejects_bad_inputs() {
        assert_eq!(required_sample_size(0.1, 0.0, 0.05, 0.8).unwrap_err().field, "mde");
        assert_eq!(required_sample_size(0.1, -0.01, 0.05, 0.8).unwrap_err().field, "mde");
        assert_eq!(required_sample_size(0.95, 0.1, 0.05, 0.8).unwrap_err().field, "mde");
        assert_eq!(required_sample_size(0.1, 0.01, 1.0, 0.8).unwrap_err().field, "alpha");
        assert_eq!(required_sample_size(0.1, 0.01, 0.05, 0.0).unwrap_err().field, "desired_power");
        assert_eq!(required_sample_size(1.0, 0.01, 0.05, 0.8).unwrap_err().field, "baseline_rate");
    }

    #[test]
    fn test_sample_size_non_increasing_in_mde() {
        let mut previous = u64::MAX;
        for step in 1..60 {
            let mde = step as f64 * 0.005;
            let n = required_sample_size(0.2, mde, 0.05, 0.8).unwrap();
            assert!(n <= previous, "n rose from {} to {} at mde {}", previous, n, mde);
            previous = n;
        }
    }

    #[test]
    fn test_sample_size_non_decreasing_in_power() {
        let mut previous = 0;
        for step in 1..99 {
            let power = step as f64 / 100.0;
            let n = required_sample_size(0.1, 0.02, 0.05, power).unwrap();
            assert!(n >= previous, "n fell from {} to {} at power {}", previous, n, power);
            previous = n;
        }
    }

    #[test]
    fn test_achieved_power_scenarios() {
        let large = achieved_power(10000, 10000, 0.1145, 0.1409, 0.05).unwrap();
        assert!(large > 0.999);
        let small = achieved_power(100, 100, 0.10, 0.13, 0.05).unwrap();
        assert!((small - 0.1022).abs() < 1e-3);
    }

    #[test]
    fn test_achieved_power_under_null_equals_alpha() {
        let power = achieved_power(500, 500, 0.3, 0.3, 0.05).unwrap();
        assert!((power - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_plan_round_trips_through_power() {
        let result = plan(0.12, 0.015, 0.05, 0.8).unwrap();
        let n = result.required_sample_size_per_arm().unwrap();
        assert!(result.minimum_detectable_effect <= 0.015);
        assert!((result.minimum_detectable_effect - 0.015).abs() < 1e-5);
        let power = achieved_power(n, n, 0.12, 0.135, 0.05).unwrap();
        assert!(power >= 0.8);
        assert!(result.achieved_power().is_none());
        assert_eq!(result.target_sample_size_per_arm, Some(n));
        assert!(result.is_adequately_powered());
    }

    #[test]
    fn test_mde_is_capped() {
        let mde = minimum_detectable_effect(0.99, 5, 5, 0.05, 0.8).unwrap();
        assert!((mde - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_analyze_post_hoc() {
        let input = ExperimentInput::new(
            ArmObservation::new(100, 10).unwrap(),
            ArmObservation::new(100, 13).unwrap(),
            DecisionPolicy::new(0.005),
        );
        let result = analyze(&input).unwrap();
        assert!(result.achieved_power().unwrap() < 0.2);
        assert!(result.required_sample_size_per_arm().is_none());
        assert!((result.minimum_detectable_effect - 0.1468).abs() < 1e-3);
        assert_eq!(result.baseline_rate, 0.1);
        let target_n = result.target_sample_size_per_arm.unwrap();
        assert!((14_700..14_800).contains(&target_n), "target n {}", target_n);
        assert!(!result.is_adequately_powered());
    }

    #[test]
    fn test_analyze_follows_configured_mde() {
        let mut input = ExperimentInput::new(
            ArmObservation::new(5000, 500).unwrap(),
            ArmObservation::new(5000, 505).unwrap(),
            DecisionPolicy::new(0.005),
        );
        input.config.mde = 0.01;
        let narrow = analyze(&input).unwrap();
        input.config.mde = 0.05;
        let wide = analyze(&input).unwrap();

        assert_eq!(narrow.achieved_power(), wide.achieved_power());
        assert!(narrow.power_at_target_mde < 0.8);
        assert!(wide.power_at_target_mde > 0.99);
        assert!(!narrow.is_adequately_powered());
        assert!(wide.is_adequately_powered());
        assert!(narrow.target_sample_size_per_arm.unwrap() > wide.target_sample_size_per_arm.unwrap());
        assert_eq!(wide.target_mde, 0.05);
    }

    #[test]
    fn test_analyze_target_past_rate_cap() {
        let mut input = ExperimentInput::new(
            ArmObservation::new(200, 196).unwrap(),
            ArmObservation::new(200, 198).unwrap(),
            DecisionPolicy::new(0.005),
        );
        input.config.mde = 0.05;
        let result = analyze(&input).unwrap();
        assert!(result.target_sample_size_per_arm.is_none());
        assert!(result.power_at_target_mde > 0.0);
    }

    #[test]
    fn test_tiny_mde_is_rejected_not_saturated() {
        let err = required_sample_size(0.5, 1e-10, 0.05, 0.8).unwrap_err();
        assert_eq!(err.field, "mde");
        assert!(plan(0.5, 1e-10, 0.05, 0.8).is_err());
        // Still representable: must stay a real, finite requirement.
        let n = required_sample_size(0.5, 1e-6, 0.05, 0.8).unwrap();
        assert!(n > 1_000_000_000 && n < u64::MAX);
    }

    #[test]
    fn test_totals_do_not_overflow() {
        assert_eq!(total_sample_size(7756).unwrap(), 15512);
        assert_eq!(total_sample_size(u64::MAX).unwrap_err().field, "sample_size_per_arm");
        assert!(test_duration_days(u64::MAX, 1000).is_err());
        assert!(test_duration_days(u64::MAX / 2, 1000).is_ok());
    }

    #[test]
    fn test_duration_and_curve() {
        assert_eq!(test_duration_days(7756, 1000).unwrap(), 16);
        assert!(test_duration_days(10, 0).is_err());
        let curve = sample_size_curve(0.12, &[0.005, 0.01, 0.02], 0.05, 0.8).unwrap();
        assert_eq!(curve.len(), 3);
        assert!(curve[0].1 > curve[1].1 && curve[1].1 > curve[2].1);
    }
}
