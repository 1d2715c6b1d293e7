use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI для snaplist: producer/consumer поверх SnapList
#[derive(Parser, Debug)]
#[command(name = "snaplist", version, about = "Concurrent snapshot list driver")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum GroupBy {
    Kind,
    Extension,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    Name,
    Size,
    Modified,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Isolation {
    Visible,
    Isolated,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// List a directory: a producer thread enumerates into the list while the
    /// main thread reads snapshots concurrently.
    List {
        #[arg(long)]
        path: PathBuf,
        /// Wrap the enumeration in one bulk window (one Reset instead of one Add per batch)
        #[arg(long)]
        bulk: bool,
        /// Reader visibility inside the bulk window (default: from env or "visible")
        #[arg(long, value_enum)]
        isolation: Option<Isolation>,
        #[arg(long, value_enum)]
        group_by: Option<GroupBy>,
        #[arg(long, value_enum, default_value_t = SortBy::Name)]
        sort: SortBy,
        /// Stop after N entries
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        show_hidden: bool,
        #[arg(long)]
        show_dot_files: bool,
        /// Print one JSON object instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Synthetic load: one producer appends in batches, several readers check
    /// that every observed state is a whole-batch prefix.
    Stress {
        #[arg(long, default_value_t = 1000)]
        items: u64,
        #[arg(long, default_value_t = 4)]
        readers: usize,
        /// Items per add_range call
        #[arg(long, default_value_t = 1000)]
        batch: u64,
        #[arg(long)]
        json: bool,
    },
}
