// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Headless show runner
#[derive(Debug, Parser)]
#[command(name = "trajecta_runner")]
#[command(about = "Play a Trajecta show file and stream track positions")]
#[command(version)]
pub struct Cli {
    /// Path to the RON show file
    pub show: PathBuf,

    /// Stop after this many seconds
    #[arg(long)]
    pub seconds: Option<f64>,

    /// Write frames to stdout as JSON lines instead of logging them
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::parse_from(["trajecta_runner", "show.ron", "--seconds", "2.5", "--json"]);
        assert_eq!(cli.show, PathBuf::from("show.ron"));
        assert_eq!(cli.seconds, Some(2.5));
        assert!(cli.json);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["trajecta_runner", "show.ron"]);
        assert_eq!(cli.seconds, None);
        assert!(!cli.json);
    }
}
