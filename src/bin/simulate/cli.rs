// src/cli.rs
use abverdict_utils::logging::LogLevel;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "simulate", version, about = "Simulate a conversion experiment and analyse it")]
pub struct Cli {
    #[arg(long, short = 'n', default_value = "10000", help = "Users per arm")]
    pub users_per_arm: u64,

    #[arg(long, default_value = "0.12", help = "True control conversion rate")]
    pub control_rate: f64,

    #[arg(
        long,
        default_value = "0.02",
        help = "True lift of the treatment arm (absolute)"
    )]
    pub lift: f64,

    #[arg(long, default_value = "42", help = "Seed for data generation and Monte Carlo")]
    pub seed: u64,

    #[arg(long, default_value = "0.005", help = "Tolerated drop in conversion rate")]
    pub max_lift_loss: f64,

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
