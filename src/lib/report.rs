use log::{info, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::bayesian::{self, BayesianResult, MAX_MONTE_CARLO_STANDARD_ERROR};
use crate::business::{self, BusinessImpactResult};
use crate::decision::{Decision, DecisionSignals, DecisionSynthesizer};
use crate::error::{AnalysisError, NumericalWarning};
use crate::experiment::ExperimentInput;
use crate::frequentist::{self, FrequentistResult};
use crate::power::{self, PowerResult};
use crate::validate::validate;

/// Complete output of one analysis. Either every field is present or the
/// analysis failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub input: ExperimentInput,
    pub frequentist: FrequentistResult,
    pub bayesian: BayesianResult,
    pub power: PowerResult,
    pub business_impact: Option<BusinessImpactResult>,
    pub decision: Decision,
    pub warnings: Vec<NumericalWarning>,
}

/// Run every analyzer on `input`, seeding the Monte Carlo source from `config.seed`.
pub fn run_experiment_analysis(input: ExperimentInput) -> Result<AnalysisReport, AnalysisError> {
    let mut rng = StdRng::seed_from_u64(input.config.seed);
    run_experiment_analysis_with_rng(input, &mut rng)
}

/// As [`run_experiment_analysis`] with a caller-supplied random source.
pub fn run_experiment_analysis_with_rng<R: RngCore + Send>(
    input: ExperimentInput,
    rng: &mut R,
) -> Result<AnalysisReport, AnalysisError> {
    let timer = Instant::now();
    let input = validate(input)?;
    let synthesizer = DecisionSynthesizer::new(input.policy.clone())?;

    // The three analyzers are independent; join waits for all of them.
    let (frequentist, (bayesian, power)) = rayon::join(
        || frequentist::analyze(&input),
        || {
            rayon::join(
                || bayesian::analyze(&input, rng),
                || power::analyze(&input),
            )
        },
    );
    let bayesian = bayesian?;
    let power = power.map_err(|e| AnalysisError::analyzer("power", e.to_string()))?;

    let business_impact = input
        .business
        .as_ref()
        .map(|params| business::estimate_from_results(params, &frequentist, &bayesian));

    let signals = DecisionSignals::from_results(&frequentist, &bayesian, &power, business_impact.as_ref())?;
    let decision = synthesizer.decide(&signals);

    let mut warnings = Vec::new();
    if frequentist.low_count_adjustment_applied {
        warnings.push(NumericalWarning::LowCountAdjustment {
            arms: frequentist::degenerate_arms(&input),
        });
    }
    if bayesian.exceeds_variance_bound() {
        warnings.push(NumericalWarning::MonteCarloVariance {
            standard_error: bayesian.monte_carlo_standard_error,
            bound: MAX_MONTE_CARLO_STANDARD_ERROR,
        });
    }
    for warning in &warnings {
        warn!("{}", warning);
    }

    info!("Finished analysis in {:?}", timer.elapsed());
    Ok(AnalysisReport {
        input,
        frequentist,
        bayesian,
        power,
        business_impact,
        decision,
        warnings,
    })
}
