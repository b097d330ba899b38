use dvfs_sim::prelude::*;

const DEFAULT_AFTER_HELP: &str = "Refer to the crate's documentation for further help";

#[derive(clap::Parser, Debug)]
#[command(after_help=DEFAULT_AFTER_HELP)]
pub struct Args {
    /// Quiet mode / summaries only
    ///
    /// When enabled, the report contains the per-run summaries and the
    /// final table but no per-event trace lines.
    #[arg(short='q', default_value="false", action=clap::ArgAction::SetTrue)]
    pub quiet: bool,

    /// Diagnostic log filter (tracing env-filter syntax)
    #[arg(long="log", value_name="FILTER", default_value="warn")]
    pub log_filter: String,

    #[command(flatten, next_help_heading="Taskset Specification")]
    pub taskset: TasksetArgs,

    #[command(flatten, next_help_heading="Report Output")]
    pub output: OutputArgs,
}

#[derive(clap::Args, Debug)]
pub struct TasksetArgs {
    /// Taskset data file
    #[arg(short='i', value_name="TASKSET FILE")]
    pub taskset_file: String,

    /// Taskset file type
    #[arg(value_enum, short='f', long="format", value_name="FORMAT", default_value="auto")]
    pub taskset_file_ty: TasksetFileType,

    /// Per-job execution time trace
    ///
    /// When the file is absent or unreadable, invocation times covering one
    /// hyperperiod are synthesised instead.
    #[arg(long="invocations", value_name="INVOCATION FILE")]
    pub invocation_file: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct OutputArgs {
    /// Report file
    #[arg(short='o', long="output", value_name="REPORT FILE", default_value="output.txt")]
    pub report_file: String,

    /// Write the ccRM speed profile of an extra pass as TSV
    #[arg(long="speed-trace", value_name="TSV FILE")]
    pub speed_trace_file: Option<String>,

    /// Write the campaign results as JSON
    #[arg(long="json", value_name="JSON FILE")]
    pub json_file: Option<String>,
}
