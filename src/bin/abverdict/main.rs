use abverdict_utils::logging::init_logging;
use abverdict_utils::{
    run_experiment_analysis, AnalysisConfig, ArmObservation, BusinessParameters, DecisionPolicy,
    ExperimentInput,
};
use anyhow::Result;
use clap::Parser;
use log::info;

mod cli;

fn build_input(args: &cli::Cli) -> Result<ExperimentInput> {
    let control = ArmObservation::new(args.control_trials, args.control_successes)?;
    let treatment = ArmObservation::new(args.treatment_trials, args.treatment_successes)?;

    let config = AnalysisConfig {
        alpha: args.alpha,
        mde: args.mde,
        desired_power: args.power,
        confidence_level: args.confidence_level,
        monte_carlo_iterations: args.iterations,
        prior_alpha: args.prior_alpha,
        prior_beta: args.prior_beta,
        seed: args.seed,
    };
    let mut policy = DecisionPolicy::new(args.max_lift_loss).with_ship_probability(args.ship_probability);
    if let Some(loss) = args.max_revenue_loss {
        policy = policy.with_max_revenue_loss(loss);
    }

    let mut input = ExperimentInput::new(control, treatment, policy).with_config(config);
    if let Some(revenue) = args.revenue_per_conversion {
        let mut business = BusinessParameters::new(revenue, args.monthly_traffic)
            .with_interval_source(args.interval_source);
        if let Some(cost) = args.implementation_cost {
            business = business.with_implementation_cost(cost);
        }
        input = input.with_business(business);
    }
    Ok(input)
}

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_logging(args.verbosity);

    info!(
        "Analysing control {}/{} vs treatment {}/{}",
        args.control_successes, args.control_trials, args.treatment_successes, args.treatment_trials
    );
    let input = build_input(&args)?;
    let report = run_experiment_analysis(input)?;

    let json = match args.pretty {
        true => serde_json::to_string_pretty(&report)?,
        false => serde_json::to_string(&report)?,
    };
    println!("{}", json);
    info!("Verdict: {}", report.decision.verdict);
    Ok(())
}
