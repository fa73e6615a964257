use abverdict_utils::logging::init_logging;
use abverdict_utils::simulate::simulate_experiment;
use abverdict_utils::{run_experiment_analysis, AnalysisConfig, DecisionPolicy, ExperimentInput};
use anyhow::Result;
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

mod cli;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_logging(args.verbosity);

    let treatment_rate = args.control_rate + args.lift;
    info!(
        "Simulating {} users per arm: control {:.4}, treatment {:.4}",
        args.users_per_arm, args.control_rate, treatment_rate
    );
    let mut rng = StdRng::seed_from_u64(args.seed);
    let (control, treatment) =
        simulate_experiment(args.users_per_arm, args.control_rate, treatment_rate, &mut rng)?;

    let config = AnalysisConfig {
        seed: args.seed,
        ..AnalysisConfig::default()
    };
    let input = ExperimentInput::new(control, treatment, DecisionPolicy::new(args.max_lift_loss))
        .with_config(config);
    let report = run_experiment_analysis(input)?;

    let json = match args.pretty {
        true => serde_json::to_string_pretty(&report)?,
        false => serde_json::to_string(&report)?,
    };
    println!("{}", json);
    info!(
        "p-value {:.4}, verdict {}",
        report.frequentist.p_value, report.decision.verdict
    );
    Ok(())
}
