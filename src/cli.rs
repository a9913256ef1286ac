use crate::util::parse_timeout;
use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "loctrend")]
#[command(about = "Monthly lines-of-code history of a git branch, counted with cloc")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(long, help = "Branch to analyze", default_value = "main")]
    pub branch: String,

    #[arg(short, long, action = ArgAction::Count, global = true, help = "More log output (-v info, -vv debug)")]
    pub verbose: u8,
}

#[derive(Args, Clone)]
pub struct ScanArgs {
    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated subdirectories to track (e.g. apps/web,apps/api)"
    )]
    pub subdirs: Vec<String>,

    #[arg(long, help = "Output directory", default_value = "./loc-output")]
    pub output: PathBuf,

    #[arg(long, help = "Do not write files to the output directory")]
    pub no_files: bool,

    #[arg(long, help = "cloc binary to run", default_value = "cloc")]
    pub cloc: String,

    #[arg(
        long,
        help = "Time limit for each git archive (e.g. 90s, 2m)",
        value_parser = parse_timeout,
        default_value = "2m"
    )]
    pub archive_timeout: Duration,

    #[arg(
        long,
        help = "Time limit for each cloc run (e.g. 300s, 10m)",
        value_parser = parse_timeout,
        default_value = "5m"
    )]
    pub count_timeout: Duration,

    #[arg(long, help = "Months scanned concurrently", default_value_t = 1)]
    pub jobs: usize,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,

    #[arg(long, help = "Output as NDJSON")]
    pub ndjson: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count lines of code for the last commit of every month
    Scan(ScanArgs),
    /// List the commit chosen for every month without counting
    Months {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        init_logging(self.common.verbose);
        match self.command {
            Commands::Scan(args) => crate::scan::exec(self.common, args),
            Commands::Months { json, ndjson } => crate::months::exec(self.common, json, ndjson),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_defaults() {
        let cli = Cli::try_parse_from(["loctrend", "scan"]).unwrap();
        assert_eq!(cli.common.branch, "main");
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert!(args.subdirs.is_empty());
        assert_eq!(args.output, PathBuf::from("./loc-output"));
        assert_eq!(args.archive_timeout, Duration::from_secs(120));
        assert_eq!(args.count_timeout, Duration::from_secs(300));
        assert_eq!(args.jobs, 1);
    }

    #[test]
    fn subdirs_split_on_commas() {
        let cli = Cli::try_parse_from([
            "loctrend",
            "--branch",
            "develop",
            "scan",
            "--subdirs",
            "apps/web,apps/api",
            "--count-timeout",
            "2m",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.common.branch, "develop");
        assert_eq!(cli.common.verbose, 2);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.subdirs, vec!["apps/web", "apps/api"]);
        assert_eq!(args.count_timeout, Duration::from_secs(120));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["loctrend", "scan", "--archive-timeout", "0s"]).is_err());
    }
}
