//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};

use lbxd::fetch::{DEFAULT_MAX_RETRIES, DEFAULT_MAX_WORKERS, DEFAULT_PROGRESS_INTERVAL};

use crate::output::OutputFormat;

/// Query the Letterboxd API from the command line.
///
/// Credentials are read from LBXD_KEY and LBXD_SECRET, or from a .env file in
/// the working directory.
#[derive(Parser, Debug)]
#[command(name = "lbxd")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve usernames to member IDs
    MemberId {
        #[arg(required = true)]
        usernames: Vec<String>,

        /// Row format
        #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
        format: OutputFormat,
    },

    /// List the films on one or more members' watchlists
    Watchlist {
        #[arg(required = true)]
        member_ids: Vec<String>,

        /// Row format
        #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
        format: OutputFormat,
    },

    /// List the films a member has watched, highest rated first
    Watches {
        member_id: String,

        /// Row format
        #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
        format: OutputFormat,
    },

    /// Fetch many endpoint paths concurrently and print each body as a JSON line
    Fetch(FetchArgs),

    /// Encode an internal ID into its public form
    Encode {
        #[arg(allow_negative_numbers = true)]
        id: i64,

        /// Encode as a member ID instead of a film/item ID
        #[arg(long)]
        member: bool,
    },

    /// Decode a public ID back to its internal number
    Decode {
        external_id: String,

        /// Also print the ID kind (primary, secondary, or unknown)
        #[arg(long)]
        with_kind: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Endpoint paths relative to the API base; read from stdin when omitted
    pub paths: Vec<String>,

    /// Maximum retries per path for transient failures
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Maximum paths in flight at once (1-256)
    #[arg(short = 'w', long, default_value_t = DEFAULT_MAX_WORKERS as u16, value_parser = clap::value_parser!(u16).range(1..=256))]
    pub max_workers: u16,

    /// Log progress after this many paths complete
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: usize,
}
