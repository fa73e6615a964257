use abverdict_utils::logging::init_logging;
use abverdict_utils::power;
use anyhow::{bail, Result};
use clap::Parser;
use csv::WriterBuilder;
use log::info;
use std::io;

mod cli;

fn sweep(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0) || !(start > 0.0) || end <= start {
        bail!("Invalid MDE sweep: start {}, end {}, step {}", start, end, step);
    }
    // Tolerance keeps float noise from adding a step at `end`.
    let n_steps = ((end - start) / step - 1e-9).ceil() as usize;
    Ok((0..n_steps).map(|i| start + i as f64 * step).collect())
}

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_logging(args.verbosity);

    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_writer(io::stdout());

    if args.curve {
        let mdes = sweep(args.curve_start, args.curve_end, args.curve_step)?;
        info!("Computing sample sizes for {} MDE values", mdes.len());
        let curve = power::sample_size_curve(args.baseline, &mdes, args.alpha, args.power)?;
        writer.write_record(["mde", "sample_size_per_arm", "total_sample_size"])?;
        for (mde, n) in curve {
            let total = power::total_sample_size(n)?;
            writer.write_record(&[format!("{:.4}", mde), n.to_string(), total.to_string()])?;
        }
        writer.flush()?;
        return Ok(());
    }

    let plan = power::plan(args.baseline, args.mde, args.alpha, args.power)?;
    let per_arm = plan
        .required_sample_size_per_arm()
        .ok_or_else(|| anyhow::anyhow!("Pre-test plan did not produce a sample size"))?;
    let days = power::test_duration_days(per_arm, args.daily_traffic)?;
    info!(
        "Baseline {} with MDE {} needs {} users per arm",
        args.baseline, args.mde, per_arm
    );

    writer.write_record(["metric", "value"])?;
    writer.write_record(["sample_size_per_arm", per_arm.to_string().as_str()])?;
    writer.write_record([
        "total_sample_size",
        power::total_sample_size(per_arm)?.to_string().as_str(),
    ])?;
    writer.write_record(["test_duration_days", days.to_string().as_str()])?;
    writer.write_record([
        "detectable_effect",
        format!("{:.6}", plan.minimum_detectable_effect).as_str(),
    ])?;
    writer.flush()?;
    Ok(())
}
