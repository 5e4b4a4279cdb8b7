//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "iterscope",
    about = "Break development iterations down into timed spans and export reports",
    after_help = "\
EXAMPLES:
    iterscope replay session.json                       Performance report to stdout
    iterscope replay session.json -f csv -o out.csv     CSV report to a file
    iterscope replay session.json --save saved.json     Keep the captured iterations
    iterscope report saved.json -f chrome-json -o t.json
    iterscope frame session.json 42 -f plaintext        One frame, no lifecycle events"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Report format (see --list-formats)
    #[arg(short, long, default_value = "html-perf", global = true)]
    pub format: String,

    /// Write the report here instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// JSON settings file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Use the deep-profiling marker search depth
    #[arg(long, global = true)]
    pub deep: bool,

    /// Tree view: only user code and kind-tagged spans
    #[arg(long, global = true)]
    pub user_code: bool,

    /// Tree view: hide single-child chains
    #[arg(long, global = true)]
    pub flatten: bool,

    /// Print the registered report formats and exit
    #[arg(long)]
    pub list_formats: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay a recorded session and report the captured iterations
    Replay {
        /// Recorded session (JSON timeline)
        #[arg(value_name = "SESSION")]
        session: PathBuf,

        /// Also save the captured iterations for `report`
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,

        /// Print the tree view instead of a report
        #[arg(long)]
        tree: bool,
    },

    /// Report iterations saved by `replay --save`
    Report {
        #[arg(value_name = "SAVED")]
        saved: PathBuf,
    },

    /// Report a single frame of a recorded session
    Frame {
        #[arg(value_name = "SESSION")]
        session: PathBuf,

        #[arg(value_name = "FRAME")]
        frame: u64,
    },
}
