use log::{debug, warn};
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::Beta;

use crate::error::AnalysisError;
use crate::experiment::{AnalysisConfig, ArmObservation, ExperimentInput};
use crate::frequentist::Interval;
use crate::stats::percentile_sorted;

/// Draws per parallel work unit. Each chunk gets its own seed.
pub const SAMPLES_PER_CHUNK: usize = 10_000;

/// Largest Monte Carlo standard error of P(treatment > control) reported without a warning.
pub const MAX_MONTE_CARLO_STANDARD_ERROR: f64 = 0.005;

/// Beta posterior over a conversion rate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BetaPosterior {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaPosterior {
    pub fn prior(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Update parameters with `successes` and `failures`
    pub fn update(&mut self, successes: u64, failures: u64) {
        self.alpha += successes as f64;
        self.beta += failures as f64;
    }

    pub fn from_observation(config: &AnalysisConfig, arm: &ArmObservation) -> Self {
        let mut posterior = Self::prior(config.prior_alpha, config.prior_beta);
        posterior.update(arm.successes(), arm.failures());
        posterior
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn variance(&self) -> f64 {
        let numerator = self.alpha * self.beta;
        let denominator = (self.alpha + self.beta).powf(2.0) * (self.alpha + self.beta + 1.0);
        numerator / denominator
    }

    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    fn distribution(&self) -> Result<Beta, AnalysisError> {
        Beta::new(self.alpha, self.beta).map_err(|e| {
            AnalysisError::analyzer(
                "bayesian",
                format!("invalid posterior Beta({}, {}): {}", self.alpha, self.beta, e),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianResult {
    pub control_posterior: BetaPosterior,
    pub treatment_posterior: BetaPosterior,
    pub control_mean: f64,
    pub treatment_mean: f64,
    pub prob_treatment_better: f64,
    pub prob_control_better: f64,
    /// Mean of the sampled lift (treatment - control)
    pub expected_lift: f64,
    pub credible_level: f64,
    pub credible_interval: Interval,
    /// Expected conversion rate given up by shipping treatment
    pub expected_loss_treatment: f64,
    /// Expected conversion rate given up by keeping control
    pub expected_loss_control: f64,
    pub monte_carlo_standard_error: f64,
    pub samples_used: usize,
}

impl BayesianResult {
    pub fn exceeds_variance_bound(&self) -> bool {
        self.monte_carlo_standard_error > MAX_MONTE_CARLO_STANDARD_ERROR
    }
}

/// Draw `iterations` paired posterior samples and return the per-draw lifts.
///
/// Chunk seeds come from `rng` in order, so output is identical for a given
/// source state regardless of how rayon schedules the chunks.
pub fn sample_lifts<R: RngCore + ?Sized>(
    control: &BetaPosterior,
    treatment: &BetaPosterior,
    iterations: usize,
    rng: &mut R,
) -> Result<Vec<f64>, AnalysisError> {
    let control_dist = control.distribution()?;
    let treatment_dist = treatment.distribution()?;

    let n_chunks = iterations.div_ceil(SAMPLES_PER_CHUNK);
    let chunk_seeds: Vec<(usize, u64)> = (0..n_chunks).map(|i| (i, rng.next_u64())).collect();

    let chunks: Vec<Vec<f64>> = chunk_seeds
        .into_par_iter()
        .map(|(i, seed)| {
            let size = SAMPLES_PER_CHUNK.min(iterations - i * SAMPLES_PER_CHUNK);
            let mut chunk_rng = StdRng::seed_from_u64(seed);
            (0..size)
                .map(|_| {
                    let c = control_dist.sample(&mut chunk_rng);
                    let t = treatment_dist.sample(&mut chunk_rng);
                    t - c
                })
                .collect()
        })
        .collect();

    Ok(chunks.into_iter().flatten().collect())
}

/// Beta-Binomial comparison of the two arms.
pub fn analyze<R: RngCore + ?Sized>(
    input: &ExperimentInput,
    rng: &mut R,
) -> Result<BayesianResult, AnalysisError> {
    let config = &input.config;
    let control_posterior = BetaPosterior::from_observation(config, &input.control);
    let treatment_posterior = BetaPosterior::from_observation(config, &input.treatment);
    debug!(
        "Posteriors: control Beta({:.1}, {:.1}), treatment Beta({:.1}, {:.1})",
        control_posterior.alpha,
        control_posterior.beta,
        treatment_posterior.alpha,
        treatment_posterior.beta
    );

    let iterations = config.monte_carlo_iterations;
    let mut lifts = sample_lifts(&control_posterior, &treatment_posterior, iterations, rng)?;
    if lifts.len() != iterations {
        return Err(AnalysisError::analyzer(
            "bayesian",
            format!("drew {} samples, expected {}", lifts.len(), iterations),
        ));
    }

    let n = iterations as f64;
    let treatment_wins = lifts.iter().filter(|&&d| d > 0.0).count();
    let control_wins = lifts.iter().filter(|&&d| d < 0.0).count();
    let prob_treatment_better = treatment_wins as f64 / n;
    let prob_control_better = control_wins as f64 / n;
    let expected_lift = lifts.iter().sum::<f64>() / n;
    let expected_loss_treatment = lifts.iter().map(|&d| (-d).max(0.0)).sum::<f64>() / n;
    let expected_loss_control = lifts.iter().map(|&d| d.max(0.0)).sum::<f64>() / n;
    let monte_carlo_standard_error =
        (prob_treatment_better * (1.0 - prob_treatment_better) / n).sqrt();

    lifts.sort_by(|a, b| a.total_cmp(b));
    let tail = (1.0 - config.confidence_level) / 2.0;
    let credible_interval = Interval::new(
        percentile_sorted(&lifts, tail),
        percentile_sorted(&lifts, 1.0 - tail),
    );

    let result = BayesianResult {
        control_mean: control_posterior.mean(),
        treatment_mean: treatment_posterior.mean(),
        control_posterior,
        treatment_posterior,
        prob_treatment_better,
        prob_control_better,
        expected_lift,
        credible_level: config.confidence_level,
        credible_interval,
        expected_loss_treatment,
        expected_loss_control,
        monte_carlo_standard_error,
        samples_used: iterations,
    };
    if result.exceeds_variance_bound() {
        warn!(
            "Monte Carlo standard error {:.5} exceeds {:.5}; consider more iterations",
            monte_carlo_standard_error, MAX_MONTE_CARLO_STANDARD_ERROR
        );
    }
    debug!(
        "P(treatment > control) = {:.4} over {} draws",
        prob_treatment_better, iterations
    );
    Ok(result)
}
