use log::debug;
use serde::{Deserialize, Serialize};

use crate::bayesian::BayesianResult;
use crate::experiment::{BusinessParameters, IntervalSource};
use crate::frequentist::{FrequentistResult, Interval};

pub const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessImpactResult {
    /// Monthly revenue change at the point estimate of the lift
    pub expected_revenue_delta: f64,
    pub low_bound_revenue_delta: f64,
    pub high_bound_revenue_delta: f64,
    pub annual_expected_revenue_delta: f64,
    /// (annual expected delta - cost) / cost, when a positive cost was given
    pub roi_ratio: Option<f64>,
    pub interval_source: IntervalSource,
}

/// Project a lift and its bounds onto monthly revenue.
///
/// The bounds are passed through from one analyzer; nothing is re-derived here.
pub fn estimate(
    lift_estimate: f64,
    lift_bounds: Interval,
    revenue_per_conversion: f64,
    monthly_traffic: f64,
    implementation_cost: Option<f64>,
    interval_source: IntervalSource,
) -> BusinessImpactResult {
    let to_revenue = |lift: f64| lift * monthly_traffic * revenue_per_conversion;
    let expected_revenue_delta = to_revenue(lift_estimate);
    let annual_expected_revenue_delta = expected_revenue_delta * MONTHS_PER_YEAR;
    let roi_ratio = implementation_cost
        .filter(|&cost| cost > 0.0)
        .map(|cost| (annual_expected_revenue_delta - cost) / cost);

    debug!(
        "Business impact ({:?} bounds): expected {:.2}/month",
        interval_source, expected_revenue_delta
    );
    BusinessImpactResult {
        expected_revenue_delta,
        low_bound_revenue_delta: to_revenue(lift_bounds.lower),
        high_bound_revenue_delta: to_revenue(lift_bounds.upper),
        annual_expected_revenue_delta,
        roi_ratio,
        interval_source,
    }
}

/// Lift estimate and bounds of the analyzer the parameters point at.
pub fn lift_for_source(
    source: IntervalSource,
    frequentist: &FrequentistResult,
    bayesian: &BayesianResult,
) -> (f64, Interval) {
    match source {
        IntervalSource::Frequentist => (frequentist.absolute_lift, frequentist.confidence_interval),
        IntervalSource::Bayesian => (bayesian.expected_lift, bayesian.credible_interval),
    }
}

pub fn estimate_from_results(
    params: &BusinessParameters,
    frequentist: &FrequentistResult,
    bayesian: &BayesianResult,
) -> BusinessImpactResult {
    let (lift, bounds) = lift_for_source(params.interval_source, frequentist, bayesian);
    estimate(
        lift,
        bounds,
        params.revenue_per_conversion,
        params.monthly_traffic,
        params.implementation_cost,
        params.interval_source,
    )
}
