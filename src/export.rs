use crate::error::Result;
use crate::model::{ScanOutput, ScopeStatus, Snapshot};
use crate::util::subdir_column_name;
use console::style;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CSV_FILE: &str = "loc-data.csv";
pub const JSON_FILE: &str = "snapshots.json";

/// `month,repo_total,<subdir>...`, one row per snapshot.
pub fn write_csv<W: Write>(mut out: W, snapshots: &[Snapshot], subdirs: &[String]) -> Result<()> {
    let mut header = vec!["month".to_string(), "repo_total".to_string()];
    header.extend(subdirs.iter().map(|sd| subdir_column_name(sd)));
    writeln!(out, "{}", header.join(","))?;

    for s in snapshots {
        let mut row = vec![s.month.clone(), s.repo_total.to_string()];
        row.extend(subdirs.iter().map(|sd| s.subdir_total(sd).to_string()));
        writeln!(out, "{}", row.join(","))?;
    }
    out.flush()?;
    Ok(())
}

/// Writes the CSV table and the full JSON document into `dir`.
pub fn write_files(dir: &Path, output: &ScanOutput) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)?;

    let csv_path = dir.join(CSV_FILE);
    write_csv(BufWriter::new(File::create(&csv_path)?), &output.snapshots, &output.subdirs)?;

    let json_path = dir.join(JSON_FILE);
    let mut json = BufWriter::new(File::create(&json_path)?);
    serde_json::to_writer_pretty(&mut json, output)?;
    writeln!(json)?;
    json.flush()?;

    Ok((csv_path, json_path))
}

pub fn output_json(output: &ScanOutput) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

pub fn output_ndjson(snapshots: &[Snapshot]) -> anyhow::Result<()> {
    for s in snapshots {
        println!("{}", serde_json::to_string(s)?);
    }
    Ok(())
}

pub fn output_summary(output: &ScanOutput) -> anyhow::Result<()> {
    let Some(latest) = output.snapshots.last() else {
        println!("No data found.");
        return Ok(());
    };

    println!(
        "{:<9} {:>10} {}",
        style("Month").bold(),
        style("Total").bold(),
        output
            .subdirs
            .iter()
            .map(|sd| format!("{:>14}", style(sd.trim_end_matches('/')).bold()))
            .collect::<Vec<_>>()
            .join(" ")
    );
    println!("{}", "─".repeat(21 + 15 * output.subdirs.len()));

    for s in &output.snapshots {
        let total = format!("{:>10}", s.repo_total);
        let total = if s.repo_status == ScopeStatus::Failed {
            style(total).red().to_string()
        } else {
            total
        };
        let cols: Vec<String> = output
            .subdirs
            .iter()
            .map(|sd| {
                let cell = format!("{:>14}", s.subdir_total(sd));
                match s.subdir_status.get(sd) {
                    Some(ScopeStatus::Failed) => style(cell).red().to_string(),
                    Some(ScopeStatus::Absent) => style(cell).dim().to_string(),
                    _ => cell,
                }
            })
            .collect();
        println!("{:<9} {} {}", s.month, total, cols.join(" "));
    }

    println!(
        "\n{} {}: repo={}",
        style("Latest:").bold(),
        latest.month,
        latest.repo_total
    );
    for sd in &output.subdirs {
        println!(
            "    {}={} ({:.1}%)",
            sd.trim_end_matches('/'),
            latest.subdir_total(sd),
            latest.subdir_pct(sd)
        );
    }

    let degraded = output.snapshots.iter().filter(|s| s.is_degraded()).count();
    if degraded > 0 {
        println!(
            "{}",
            style(format!("{degraded} month(s) had counting failures; see warnings above")).yellow()
        );
    }
    Ok(())
}
