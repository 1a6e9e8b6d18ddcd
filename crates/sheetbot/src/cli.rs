//! Command-line interface.

use clap::{Parser, Subcommand};
use sheetbot_core::Offset;

/// Sheetbot - announce new spreadsheet rows in a chat
#[derive(Parser, Debug)]
#[command(name = "sheetbot")]
#[command(about = "Polls spreadsheet tables and posts new rows to Telegram or a chat webhook")]
pub struct Cli {
    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Poll every watched table until Ctrl-C
    Run,

    /// Run one poll now and print what happened
    Tick {
        /// Only this table
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Show rows the next poll would announce, without sending anything
    Pending {
        /// Only this table
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Inspect or reset stored offsets
    Offset {
        #[command(subcommand)]
        action: OffsetCommand,
    },

    /// Publish the daily stats report once
    Stats,

    /// Publish the inventory status once
    Inventory,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum OffsetCommand {
    /// Print stored offsets
    Show {
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Overwrite the stored offset of one table
    Set {
        #[arg(short, long)]
        table: String,

        /// Number of data rows already announced
        offset: Offset,
    },
}

/// Log filter for a `-v` count.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "sheetbot=info,sheetbot_core=info,sheetbot_chat=info,sheetbot_sheets=warn,teloxide=warn",
        1 => "sheetbot=debug,sheetbot_core=debug,sheetbot_chat=debug,sheetbot_sheets=info,sheetbot_persistence=info,teloxide=info",
        2 => "sheetbot=trace,sheetbot_core=trace,sheetbot_chat=trace,sheetbot_sheets=trace,sheetbot_persistence=trace,teloxide=debug",
        _ => "trace",
    }
}
