// src/cli.rs
use abverdict_utils::logging::LogLevel;
use abverdict_utils::IntervalSource;
use clap::Parser;

/// Analyse a finished two-arm conversion experiment.
#[derive(Parser, Debug)]
#[command(name = "abverdict", version, about = "Ship/hold verdicts for A/B conversion tests")]
pub struct Cli {
    #[arg(value_name = "CONTROL_TRIALS", help = "Users exposed to the control arm")]
    pub control_trials: u64,

    #[arg(value_name = "CONTROL_SUCCESSES", help = "Conversions in the control arm")]
    pub control_successes: u64,

    #[arg(value_name = "TREATMENT_TRIALS", help = "Users exposed to the treatment arm")]
    pub treatment_trials: u64,

    #[arg(value_name = "TREATMENT_SUCCESSES", help = "Conversions in the treatment arm")]
    pub treatment_successes: u64,

    #[arg(long, default_value = "0.05", help = "Significance level")]
    pub alpha: f64,

    #[arg(
        long,
        default_value = "0.01",
        help = "Absolute lift the test must be powered to detect; gates INSUFFICIENT_POWER"
    )]
    pub mde: f64,

    #[arg(long, default_value = "0.8", help = "Desired statistical power")]
    pub power: f64,

    #[arg(long, default_value = "0.95", help = "Confidence and credible level")]
    pub confidence_level: f64,

    #[arg(long, default_value = "100000", help = "Monte Carlo draws for the Bayesian comparison")]
    pub iterations: usize,

    #[arg(long, default_value = "1.0")]
    pub prior_alpha: f64,

    #[arg(long, default_value = "1.0")]
    pub prior_beta: f64,

    #[arg(long, default_value = "42", help = "Seed for Monte Carlo sampling")]
    pub seed: u64,

    #[arg(
        long,
        default_value = "0.95",
        help = "Minimum P(treatment > control) required to ship"
    )]
    pub ship_probability: f64,

    #[arg(
        long,
        value_name = "LIFT",
        help = "Tolerated drop in conversion rate at the lower interval bound"
    )]
    pub max_lift_loss: f64,

    #[arg(long, value_name = "REVENUE", help = "Tolerated monthly revenue loss at the lower bound")]
    pub max_revenue_loss: Option<f64>,

    #[arg(long, help = "Revenue per conversion, enables the business projection")]
    pub revenue_per_conversion: Option<f64>,

    #[arg(long, default_value = "100000", help = "Monthly users exposed after launch")]
    pub monthly_traffic: f64,

    #[arg(long, help = "One-off implementation cost used for ROI")]
    pub implementation_cost: Option<f64>,

    #[arg(
        value_enum,
        long,
        default_value = "frequentist",
        help = "Interval used for business risk bounds"
    )]
    pub interval_source: IntervalSource,

    #[arg(long, help = "Pretty-print the JSON report")]
    pub pretty: bool,

    #[arg(
        value_enum,
        long,
        default_value = "normal",
        value_name = "VERBOSITY",
        help = "Verbosity level"
    )]
    pub verbosity: LogLevel,
}
