use crate::cli::{CommonArgs, ScanArgs};
use crate::counter::Cloc;
use crate::export::{output_json, output_ndjson, output_summary, write_files};
use crate::git::{git_version, GitRepo};
use crate::model::{ScanOutput, SCHEMA_VERSION};
use crate::pipeline::{collect_snapshots, ScanOptions};
use crate::util::normalize_subdirs;
use anyhow::Context;
use chrono::Utc;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::time::Instant;

pub fn exec(common: CommonArgs, args: ScanArgs) -> anyhow::Result<()> {
    let repo = GitRepo::open(common.repo.as_ref())
        .context("Failed to open git repository")?
        .with_archive_timeout(args.archive_timeout);

    let git = git_version().context("git is not installed or not on PATH")?;
    info!("using {git}");

    let cloc = Cloc::new(&args.cloc).with_timeout(args.count_timeout);
    let cloc_version = cloc
        .check()
        .with_context(|| format!("{} is not installed or not runnable (e.g. `brew install cloc`)", args.cloc))?;
    info!("using cloc {cloc_version}");

    let subdirs = normalize_subdirs(args.subdirs.as_slice());
    let quiet = args.json || args.ndjson;

    if !quiet {
        println!("{:<11}: {}", style("Repository").bold(), repo.path().display());
        println!("{:<11}: {}", style("Branch").bold(), common.branch);
        if !subdirs.is_empty() {
            println!("{:<11}: {}", style("Subdirs").bold(), subdirs.join(", "));
        }
        if !args.no_files {
            println!("{:<11}: {}", style("Output").bold(), args.output.display());
        }
        println!();
    }

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Collecting LOC snapshots (git archive + cloc)...");
        pb
    };

    let report = |current: usize, total: usize, month: &str| {
        pb.set_length(total as u64);
        pb.set_position(current as u64);
        pb.set_message(format!("Scanned {month}"));
    };

    let options = ScanOptions {
        jobs: args.jobs.max(1),
        ..Default::default()
    };

    let started = Instant::now();
    let snapshots = collect_snapshots(&repo, &cloc, &common.branch, &subdirs, &options, Some(&report))
        .context("Failed to collect snapshots")?;
    pb.finish_and_clear();
    let elapsed = started.elapsed();

    let output = ScanOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path: repo.path().to_string_lossy().to_string(),
        branch: common.branch.clone(),
        subdirs,
        snapshots,
    };

    if !args.no_files && !output.snapshots.is_empty() {
        let (csv, json) = write_files(&args.output, &output).context("Failed to write output files")?;
        if !quiet {
            println!("{:<11}: {}", style("CSV data").bold(), csv.display());
            println!("{:<11}: {}", style("Snapshots").bold(), json.display());
            println!();
        }
    }

    if args.json {
        output_json(&output)?;
    } else if args.ndjson {
        output_ndjson(&output.snapshots)?;
    } else {
        println!(
            "Collected {} monthly snapshots in {:.1}s\n",
            output.snapshots.len(),
            elapsed.as_secs_f64()
        );
        output_summary(&output)?;
    }

    Ok(())
}
