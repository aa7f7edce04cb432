use anyhow::Result;
use clap::Parser;

use fingerspell::{
    cli::{Cli, Command},
    front,
};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let interval = cli.command.interval();

    match cli.command {
        Command::Terminal { .. } => front::terminal::run(cli.camera, interval),
        Command::Serve { port, .. } => front::server::run(cli.camera, port, interval),
        Command::Stream { .. } => front::stream::run(cli.camera, interval),
    }
}
