// src/cli.rs
use abverdict_utils::logging::LogLevel;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "sample_size", version, about = "Pre-test sample size calculator for conversion experiments")]
pub struct Cli {
    #[arg(long, short = 'b', default_value = "0.12", help = "Baseline conversion rate")]
    pub baseline: f64,

    #[arg(
        long,
        short = 'm',
        default_value = "0.015",
        help = "Minimum detectable effect as an absolute lift"
    )]
    pub mde: f64,

    #[arg(long, short = 'a', default_value = "0.05", help = "Significance level")]
    pub alpha: f64,

    #[arg(long, short = 'p', default_value = "0.8", help = "Desired statistical power")]
    pub power: f64,

    #[arg(long, default_value = "1000", help = "Users entering the test per day")]
    pub daily_traffic: u64,

    #[arg(
        long,
        help = "Print required sample size over an MDE sweep instead of the plan"
    )]
    pub curve: bool,

    #[arg(long, default_value = "0.005", help = "First MDE of the sweep")]
    pub curve_start: f64,

    #[arg(long, default_value = "0.05", help = "Sweep stops before this MDE")]
    pub curve_end: f64,

    #[arg(long, default_value = "0.005", help = "MDE increment of the sweep")]
    pub curve_step: f64,

    #[arg(
        value_enum,
        long,
        default_value = "normal",
        value_name = "VERBOSITY",
        help = "Verbosity level"
    )]
    pub verbosity: LogLevel,
}
