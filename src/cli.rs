//! CLI argument definitions.

use std::time::Duration;

use clap::{Parser, Subcommand};

/// Per-front-end defaults carried over from the original scripts; the
/// streaming variant samples faster by design.
const DEFAULT_INTERVAL_MS: u64 = 1_000;
const DEFAULT_STREAM_INTERVAL_MS: u64 = 100;

#[derive(Parser, Debug)]
#[command(name = "fingerspell")]
#[command(version)]
#[command(about = "ASL fingerspelling translator: camera hand tracking to letters")]
pub struct Cli {
    /// Camera device index
    #[arg(short = 'c', long, default_value_t = 0, global = true)]
    pub camera: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the current word and finger state in place in the terminal
    Terminal {
        /// Sampling interval in milliseconds
        #[arg(long, value_name = "MS", default_value_t = DEFAULT_INTERVAL_MS)]
        interval_ms: u64,
    },
    /// Serve the translation over HTTP with an MJPEG camera stream
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 5000)]
        port: u16,

        /// Sampling interval in milliseconds
        #[arg(long, value_name = "MS", default_value_t = DEFAULT_INTERVAL_MS)]
        interval_ms: u64,
    },
    /// Print the word to stdout as a single updating line
    Stream {
        /// Sampling interval in milliseconds
        #[arg(long, value_name = "MS", default_value_t = DEFAULT_STREAM_INTERVAL_MS)]
        interval_ms: u64,
    },
}

impl Command {
    pub fn interval(&self) -> Duration {
        let ms = match self {
            Command::Terminal { interval_ms } => *interval_ms,
            Command::Serve { interval_ms, .. } => *interval_ms,
            Command::Stream { interval_ms } => *interval_ms,
        };
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn parses_terminal_defaults() {
        let cli = Cli::parse_from(["fingerspell", "terminal"]);
        assert_eq!(cli.camera, 0);
        assert_eq!(cli.command.interval(), Duration::from_secs(1));
    }

    #[test]
    fn parses_serve_port() {
        let cli = Cli::parse_from(["fingerspell", "serve", "-p", "8080"]);
        match cli.command {
            Command::Serve { port, .. } => assert_eq!(port, 8080),
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn stream_defaults_to_fast_sampling() {
        let cli = Cli::parse_from(["fingerspell", "stream"]);
        assert_eq!(cli.command.interval(), Duration::from_millis(100));
    }

    #[test]
    fn camera_index_is_global() {
        let cli = Cli::parse_from(["fingerspell", "terminal", "--camera", "2"]);
        assert_eq!(cli.camera, 2);
    }

    #[test]
    fn interval_override() {
        let cli = Cli::parse_from(["fingerspell", "terminal", "--interval-ms", "250"]);
        assert_eq!(cli.command.interval(), Duration::from_millis(250));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
