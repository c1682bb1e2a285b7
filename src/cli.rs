//! Command-line surface.

use clap::{ArgAction, Parser};
use exhume_library::{Phase, Progress};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "exhume", version, about = "Rebuild a browsable offline site from a wiki space export")]
pub struct Cli {
    /// Export to reconstruct: a zip archive or an extracted directory.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    /// Output root. Defaults to a timestamped folder beside the input.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
    /// Resolve every attachment name and log the plan without writing anything.
    #[arg(long)]
    pub dry_run: bool,
    /// Leave restored attachments where restoration put them.
    #[arg(long)]
    pub no_rehome: bool,
    /// Stop after the attachments; write no pages.
    #[arg(long)]
    pub no_transform: bool,
    /// Also write every page as plain text below this directory.
    #[arg(long, value_name = "DIR")]
    pub export_text: Option<PathBuf>,
    /// Directory searched for a logo, section and empty-page icons.
    #[arg(long, value_name = "DIR")]
    pub resources: Option<PathBuf>,
    /// Configuration file (TOML, YAML or JSON).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// More output; repeat for more. Overrides RUST_LOG.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The log filter: `-v` flags first, then `RUST_LOG`, then `info`.
    pub fn filter(&self) -> EnvFilter {
        match self.verbose {
            0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    }
}

/// Logs progress in steps of ten percent, and on every phase change.
#[derive(Debug, Default)]
pub struct Reporter {
    last: Option<(Phase, u8)>,
}

impl Reporter {
    pub fn report(&mut self, progress: Progress) {
        let step = progress.percent / 10;
        if self.last == Some((progress.phase, step)) {
            return;
        }
        self.last = Some((progress.phase, step));
        info!(phase = ?progress.phase, percent = progress.percent, "progress");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&["exhume", "space.zip"], false, None)]
    #[case(&["exhume", "space.zip", "--dry-run", "-o", "out"], true, Some("out"))]
    fn test_parse(#[case] args: &[&str], #[case] dry_run: bool, #[case] output: Option<&str>) {
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.input, PathBuf::from("space.zip"));
        assert_eq!(cli.dry_run, dry_run);
        assert_eq!(cli.output, output.map(PathBuf::from));
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["exhume", "x", "-vv", "--no-rehome", "--export-text", "txt"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_rehome);
        assert_eq!(cli.export_text, Some(PathBuf::from("txt")));
    }
}
