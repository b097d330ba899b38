use anyhow::Context as _;
use dvfs_sim::prelude::*;

use args::Args;

pub mod args;

fn main() {
    let args = match <Args as clap::Parser>::try_parse() {
        Ok(args) => args,
        Err(err) => {
            use clap::error::ErrorKind::*;

            let exit_code = match err.kind() {
                DisplayHelp |
                DisplayHelpOnMissingArgumentOrSubcommand |
                DisplayVersion => 0,
                _ => 2,
            };

            err.print().unwrap();
            std::process::exit(exit_code);
        },
    };

    init_diagnostics(&args.log_filter);

    if let Err(err) = run_campaign(args) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn init_diagnostics(filter: &str) {
    use tracing_subscriber::filter::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::builder().parse_lossy(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_campaign(args: Args) -> anyhow::Result<()> {
    let mut taskset = parse_taskset(&args.taskset.taskset_file, args.taskset.taskset_file_ty)
        .with_context(|| format!("failed to load task set {}", args.taskset.taskset_file))?;
    let hyperperiod = TaskUtils::hyperperiod(&taskset);

    prepare_invocations(&args, &mut taskset, hyperperiod)?;

    let report = std::fs::File::create(&args.output.report_file)
        .with_context(|| format!("failed to create report file {}", args.output.report_file))?;
    let mut report = std::io::BufWriter::new(report);

    let campaign = Campaign::new(taskset);
    let result =
        if args.quiet {
            campaign.run(&mut NullTrace)?
        } else {
            let mut trace = TextTrace::new(&mut report);
            campaign.run(&mut trace)?
        };

    write_normalized_table(&mut report, &result.rows)
        .and_then(|_| std::io::Write::flush(&mut report))
        .with_context(|| format!("failed to write report file {}", args.output.report_file))?;

    write_normalized_table(&mut std::io::stdout().lock(), &result.rows)
        .context("failed to write the result table")?;

    if let Some(path) = &args.output.speed_trace_file {
        let mut speed = SpeedTrace::new();
        campaign.run_policy(Policy::cc_rm(), &mut speed)
            .context("speed-profile pass failed")?;

        let mut out = std::fs::File::create(path)
            .with_context(|| format!("failed to create speed trace file {path}"))?;
        speed.write_tsv(&mut out)
            .with_context(|| format!("failed to write speed trace file {path}"))?;
    }

    if let Some(path) = &args.output.json_file {
        let out = std::fs::File::create(path)
            .with_context(|| format!("failed to create results file {path}"))?;
        serde_json::to_writer_pretty(out, &result)
            .with_context(|| format!("failed to write results file {path}"))?;
    }

    Ok(())
}

fn prepare_invocations(
    args: &Args,
    taskset: &mut [Task],
    hyperperiod: Time
) -> anyhow::Result<()> {
    match &args.taskset.invocation_file {
        Some(path) => match load_invocations(path, taskset) {
            Ok(()) => {
                tracing::info!(path = %path, "loaded invocation times");
                Ok(())
            },
            Err(TasksetIoError::IoError(err)) => {
                tracing::warn!(path = %path, error = %err, "cannot read invocation file, synthesising");
                Ok(synthesize_invocations(taskset, hyperperiod)?)
            },
            Err(err) =>
                Err(err).with_context(|| format!("failed to parse invocation file {path}")),
        },
        None => {
            tracing::info!("no invocation file given, synthesising");
            Ok(synthesize_invocations(taskset, hyperperiod)?)
        },
    }
}
