use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};

mod cli;
mod cmd_list;
mod cmd_stress;
mod util;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт info.
    // Пример: RUST_LOG=snaplist=debug snaplist list --path .
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::List {
            path,
            bulk,
            isolation,
            group_by,
            sort,
            limit,
            show_hidden,
            show_dot_files,
            json,
        } => cmd_list::exec(cmd_list::ListArgs {
            path,
            bulk,
            isolation,
            group_by,
            sort,
            limit,
            show_hidden,
            show_dot_files,
            json,
        }),

        cli::Cmd::Stress {
            items,
            readers,
            batch,
            json,
        } => cmd_stress::exec(items, readers, batch, json),
    }
}
