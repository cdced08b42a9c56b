const DEFAULT_AFTER_HELP: &str = "Refer to the crate's documentation for further help";

use rms_repair_pipeline::input::SpecFormat;

#[derive(clap::Parser, Debug)]
#[command(after_help = DEFAULT_AFTER_HELP)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Run the repair pipeline end-to-end against a taskset file.
    Run(RunArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Taskset specification file.
    #[arg(short = 'i', long = "taskset", value_name = "FILE")]
    pub taskset_file: std::path::PathBuf,

    /// Taskset file format.
    #[arg(value_enum, short = 'f', long = "format", value_name = "FORMAT", default_value = "auto")]
    pub format: SpecFormat,

    /// Strict priority mode: priority errors block the run instead of being auto-repaired.
    #[arg(long, default_value = "false", action = clap::ArgAction::SetTrue)]
    pub strict: bool,

    /// Accept an unschedulable taskset and proceed to synthesis anyway.
    #[arg(long, default_value = "false", action = clap::ArgAction::SetTrue)]
    pub allow_unschedulable: bool,

    /// Force explicit task_scheduled[] arbitration in the emitted model.
    #[arg(long, default_value = "false", action = clap::ArgAction::SetTrue)]
    pub use_shared_scheduler: bool,

    /// Allow an externally supplied candidate property list.
    #[arg(long, default_value = "false", action = clap::ArgAction::SetTrue)]
    pub allow_multitask_properties: bool,

    /// Maximum number of repair iterations before declaring Diverged.
    #[arg(long = "max-iterations", value_name = "N", default_value = "10")]
    pub max_iterations: u32,

    /// Verifier invocation timeout, in seconds.
    #[arg(long = "verifier-timeout-secs", value_name = "N", default_value = "120")]
    pub verifier_timeout_secs: u64,

    /// Substitute T=100, C=T/2 for tasks missing period/execution instead of rejecting them.
    #[arg(long, default_value = "false", action = clap::ArgAction::SetTrue)]
    pub auto_default: bool,

    /// Directory to write the emitted model, property list, and stage log into.
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<std::path::PathBuf>,

    /// Quiet mode: suppress human-readable stage narration.
    #[arg(short = 'q', default_value = "false", action = clap::ArgAction::SetTrue)]
    pub quiet: bool,
}
