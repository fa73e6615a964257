use log::debug;
use rand::distributions::{Bernoulli, Distribution};
use rand::Rng;

use crate::error::ValidationError;
use crate::experiment::ArmObservation;

/// Count successes in `trials` Bernoulli draws with probability `rate`.
pub fn simulate_arm<R: Rng + ?Sized>(
    trials: u64,
    rate: f64,
    rng: &mut R,
) -> Result<ArmObservation, ValidationError> {
    let bernoulli = Bernoulli::new(rate).map_err(|_| {
        ValidationError::new("rate", format!("must be in [0, 1], got {}", rate))
    })?;
    let successes = (0..trials).filter(|_| bernoulli.sample(&mut *rng)).count() as u64;
    ArmObservation::new(trials, successes)
}

/// Synthetic experiment with `trials_per_arm` users in each arm.
pub fn simulate_experiment<R: Rng + ?Sized>(
    trials_per_arm: u64,
    control_rate: f64,
    treatment_rate: f64,
    rng: &mut R,
) -> Result<(ArmObservation, ArmObservation), ValidationError> {
    let control = simulate_arm(trials_per_arm, control_rate, rng)?;
    let treatment = simulate_arm(trials_per_arm, treatment_rate, rng)?;
    debug!(
        "Simulated control {}/{}, treatment {}/{}",
        control.successes(),
        control.trials(),
        treatment.successes(),
        treatment.trials()
    );
    Ok((control, treatment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_simulate_is_seeded() {
        let a = simulate_experiment(5000, 0.12, 0.14, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = simulate_experiment(5000, 0.12, 0.14, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_simulated_rates_are_close() {
        let mut rng = StdRng::seed_from_u64(3);
        let arm = simulate_arm(20_000, 0.25, &mut rng).unwrap();
        assert_eq!(arm.trials(), 20_000);
        assert!((arm.rate() - 0.25).abs() < 0.02);
    }

    #[test]
    fn test_extreme_rates() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(simulate_arm(100, 0.0, &mut rng).unwrap().successes(), 0);
        assert_eq!(simulate_arm(100, 1.0, &mut rng).unwrap().successes(), 100);
        assert!(simulate_arm(100, 1.5, &mut rng).is_err());
    }

    #[test]
    fn test_zero_trials_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(simulate_arm(0, 0.5, &mut rng).is_err());
    }
}
