//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmers::names_short()
    )
}

#[derive(Parser)]
#[command(name = "fuseprog")]
#[command(author, version, about = "Fuse-link PROM programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive programmer console
    Console {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,
    },

    /// Read chip contents to a file or hex dump
    Read {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,

        /// Chip family (see list-chips)
        #[arg(short, long)]
        chip: String,

        /// Output file (hex dump to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Burn a file into the chip, verifying every bit
    Write {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,

        /// Chip family (see list-chips)
        #[arg(short, long)]
        chip: String,

        /// Input file (raw image, at most one byte per cell)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compare chip contents against a file
    Verify {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,

        /// Chip family (see list-chips)
        #[arg(short, long)]
        chip: String,

        /// Expected image
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Check the chip is empty
    Empty {
        /// Programmer to use
        #[arg(short, long, help = programmer_help())]
        programmer: String,

        /// Chip family (see list-chips)
        #[arg(short, long)]
        chip: String,
    },

    /// List supported chip families
    ListChips,

    /// List available programmers
    ListProgrammers,
}
