mod commands;
mod console;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use capture_handoff_core::{HandoffError, OverflowPolicy, WakeStrategy};

#[derive(Parser)]
#[command(name = "capture-handoff")]
#[command(about = "Capture items from a device and hand them to a background consumer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List capture devices
    List,
    /// Capture from a device until Enter is pressed or the duration elapses
    Run(RunArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Device to capture from; prompts with a numbered list if omitted
    #[arg(short, long)]
    pub device: Option<String>,

    /// Stop after this many seconds instead of waiting for Enter
    #[arg(long)]
    pub duration: Option<f64>,

    /// JSON file with hand-off settings; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Consumer idle backoff in milliseconds
    #[arg(long)]
    pub backoff_ms: Option<u64>,

    /// Statistics sampling interval in milliseconds (0 disables)
    #[arg(long)]
    pub stats_interval_ms: Option<u64>,

    /// Bound the live buffer to this many items
    #[arg(long)]
    pub max_buffered: Option<usize>,

    /// What to drop when the live buffer is full
    #[arg(long, value_enum)]
    pub overflow: Option<OverflowArg>,

    /// How the consumer waits for work
    #[arg(long, value_enum)]
    pub wake: Option<WakeArg>,

    /// Open the device in promiscuous mode
    #[arg(long)]
    pub promiscuous: bool,

    /// Device read timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub read_timeout_ms: u32,

    /// Maximum bytes captured per item
    #[arg(long, default_value_t = 65535)]
    pub snaplen: u32,

    /// Log every processed item at info level instead of debug
    #[arg(long)]
    pub show_items: bool,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OverflowArg {
    DropOldest,
    DropNewest,
}

impl From<OverflowArg> for OverflowPolicy {
    fn from(arg: OverflowArg) -> Self {
        match arg {
            OverflowArg::DropOldest => OverflowPolicy::DropOldest,
            OverflowArg::DropNewest => OverflowPolicy::DropNewest,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum WakeArg {
    Poll,
    Notify,
}

impl From<WakeArg> for WakeStrategy {
    fn from(arg: WakeArg) -> Self {
        match arg {
            WakeArg::Poll => WakeStrategy::Poll,
            WakeArg::Notify => WakeStrategy::Notify,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List => commands::list_devices(),
        Commands::Run(args) => commands::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Device failures exit with 2, everything else with 1.
fn exit_status(error: &HandoffError) -> u8 {
    match error {
        HandoffError::Device(_) => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["capture-handoff", "run"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Run(args) => args,
            Commands::List => panic!("expected run"),
        }
    }

    #[test]
    fn device_open_failure_exits_non_zero() {
        let err = commands::run(run_args(&["--device", "offline", "--duration", "0"])).unwrap_err();

        assert!(matches!(err, HandoffError::Device(_)));
        assert_eq!(exit_status(&err), 2);
    }

    #[test]
    fn unknown_device_exits_non_zero() {
        let err = commands::run(run_args(&["--device", "eth9", "--duration", "0"])).unwrap_err();
        assert_ne!(exit_status(&err), 0);
    }

    #[test]
    fn config_errors_exit_with_one() {
        let err = commands::run(run_args(&["--device", "synth0", "--backoff-ms", "0"])).unwrap_err();

        assert!(matches!(err, HandoffError::Config(_)));
        assert_eq!(exit_status(&err), 1);
    }
}
