use log::debug;
use strum::IntoEnumIterator;

use crate::arm::Arm;
use crate::error::ValidationError;
use crate::experiment::{AnalysisConfig, BusinessParameters, ExperimentInput};

/// Smallest Monte Carlo budget the Bayesian analyzer accepts.
pub const MIN_MONTE_CARLO_ITERATIONS: usize = 1000;

/// Gate every analysis passes through. Returns the input unchanged.
pub fn validate(input: ExperimentInput) -> Result<ExperimentInput, ValidationError> {
    for arm in Arm::iter() {
        input.arm(arm).check(arm.as_str())?;
    }
    validate_config(&input.config)?;
    if let Some(business) = &input.business {
        validate_business(business)?;
    }
    debug!(
        "Validated experiment: control {}/{}, treatment {}/{}",
        input.control.successes(),
        input.control.trials(),
        input.treatment.successes(),
        input.treatment.trials()
    );
    Ok(input)
}

pub fn validate_config(config: &AnalysisConfig) -> Result<(), ValidationError> {
    check_open_unit("alpha", config.alpha)?;
    check_open_unit("mde", config.mde)?;
    check_open_unit("desired_power", config.desired_power)?;
    check_open_unit("confidence_level", config.confidence_level)?;
    if config.monte_carlo_iterations < MIN_MONTE_CARLO_ITERATIONS {
        return Err(ValidationError::new(
            "monte_carlo_iterations",
            format!(
                "at least {} iterations required, got {}",
                MIN_MONTE_CARLO_ITERATIONS, config.monte_carlo_iterations
            ),
        ));
    }
    check_positive("prior_alpha", config.prior_alpha)?;
    check_positive("prior_beta", config.prior_beta)?;
    Ok(())
}

pub fn validate_business(business: &BusinessParameters) -> Result<(), ValidationError> {
    check_non_negative("revenue_per_conversion", business.revenue_per_conversion)?;
    check_non_negative("monthly_traffic", business.monthly_traffic)?;
    if let Some(cost) = business.implementation_cost {
        check_non_negative("implementation_cost", cost)?;
    }
    Ok(())
}

/// Rejects values outside the open interval (0, 1), NaN included.
pub(crate) fn check_open_unit(field: &str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("must be in (0, 1), got {}", value),
        ))
    }
}

fn check_positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("must be finite and positive, got {}", value),
        ))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("must be finite and non-negative, got {}", value),
        ))
    }
}
