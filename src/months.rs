use crate::cli::CommonArgs;
use crate::git::GitRepo;
use crate::model::{MonthlyCommit, MonthsOutput, SCHEMA_VERSION};
use anyhow::Context;
use chrono::Utc;
use console::style;

pub fn exec(common: CommonArgs, json: bool, ndjson: bool) -> anyhow::Result<()> {
    let repo = GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?;
    let months = repo
        .monthly_commits(&common.branch)
        .context("Failed to read branch history")?;

    if json {
        let output = MonthsOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository_path: repo.path().to_string_lossy().to_string(),
            branch: common.branch,
            months,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if ndjson {
        for m in &months {
            println!("{}", serde_json::to_string(m)?);
        }
    } else {
        output_table(&months);
    }

    Ok(())
}

fn output_table(months: &[MonthlyCommit]) {
    if months.is_empty() {
        println!("No commits found");
        return;
    }

    println!(
        "{:<9} {:<12} {}",
        style("Month").bold(),
        style("Commit").bold(),
        style("Timestamp").bold()
    );
    println!("{}", "─".repeat(48));
    for m in months {
        println!(
            "{:<9} {:<12} {}",
            m.month,
            m.commit_id.get(..10).unwrap_or(&m.commit_id),
            m.timestamp.format("%Y-%m-%d %H:%M:%S %z")
        );
    }
}
