#![deny(missing_docs)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use cli::args::{OutputFormatArg, SplitPolicyArg};
use planner_app::LaneIndex;

#[derive(Parser, Debug)]
#[command(name = "planner_cli")]
#[command(bin_name = "planner_cli")]
#[command(version, about, long_about = None)]
pub(crate) struct Opts {
    #[command(subcommand)]
    pub(crate) command: ModeCommand,

    /// Trace log file
    #[arg(long, num_args = 0..=1, default_missing_value = "trace.log")]
    pub(crate) trace: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) verbose: Verbosity<InfoLevel>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum ModeCommand {
    /// Replay a script and print the power budget, summary and issues
    Report(ScriptArgs),

    /// Replay a script and print the position of every node
    Layout {
        #[command(flatten)]
        script: ScriptArgs,

        /// Only print this lane (0-based)
        #[arg(long)]
        lane: Option<LaneIndex>,
    },

    /// Compute the loss of a path made of splitters, splices and connectors
    Loss {
        /// Split ratios, e.g. '8,4'
        #[arg(long, value_delimiter = ',')]
        splitter: Vec<u32>,

        /// Number of fusion splices
        #[arg(long, default_value_t = 0)]
        splices: u32,

        /// Number of connector pairs
        #[arg(long, default_value_t = 0)]
        connectors: u32,

        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormatArg,
    },
}

#[derive(Debug, Args)]
pub(crate) struct ScriptArgs {
    /// A JSON array of edit events
    #[arg(long, value_name = "SCRIPT_FILE")]
    pub(crate) script: PathBuf,

    /// A JSON planner configuration, the options below override its values
    #[arg(long, value_name = "CONFIG_FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Number of PON lanes (1-8)
    #[arg(long)]
    pub(crate) lanes: Option<LaneIndex>,

    /// OLT launch power, in dBm
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) tx_power: Option<f64>,

    /// Terminals per NAP enclosure
    #[arg(long)]
    pub(crate) nap_capacity: Option<u32>,

    /// Maximum ONTs per lane
    #[arg(long)]
    pub(crate) ont_limit: Option<u32>,

    /// Maximum split depth
    #[arg(long)]
    pub(crate) max_depth: Option<usize>,

    /// How splitter output power is shared between children
    #[arg(long, value_enum)]
    pub(crate) split_policy: Option<SplitPolicyArg>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub(crate) format: OutputFormatArg,
}
