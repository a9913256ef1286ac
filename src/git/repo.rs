use crate::error::{LocError, Result};
use crate::model::{CommitRecord, MonthlyCommit};
use crate::pipeline::SnapshotSource;
use crate::process::{run_with_timeout, Stdout};
use crate::select::select_monthly;
use crate::tree::MaterializedTree;
use chrono::{DateTime, FixedOffset};
use gix::revision::walk::Sorting;
use gix::traverse::commit::simple::CommitTimeOrder;
use gix::{discover, ObjectId, ThreadSafeRepository};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

pub const DEFAULT_ARCHIVE_TIMEOUT: Duration = Duration::from_secs(120);

/// Read-only access to one repository: history through gix, tree
/// extraction through `git archive`.
pub struct GitRepo {
    repo: ThreadSafeRepository,
    path: PathBuf,
    archive_timeout: Duration,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = match path {
            Some(p) => p.as_ref().to_path_buf(),
            None => std::env::current_dir()?,
        };

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self {
            repo: repo.into_sync(),
            path,
            archive_timeout: DEFAULT_ARCHIVE_TIMEOUT,
        })
    }

    pub fn with_archive_timeout(mut self, timeout: Duration) -> Self {
        self.archive_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every commit reachable from `branch`, oldest first.
    pub fn history(&self, branch: &str) -> Result<Vec<CommitRecord>> {
        let repo = self.repo.to_thread_local();

        let tip = repo
            .rev_parse_single(branch)
            .map_err(|e| LocError::GitRepo(format!("Unknown branch '{branch}': {e}")))?;
        let tip = tip
            .object()?
            .try_into_commit()
            .map_err(|_| LocError::GitRepo(format!("'{branch}' does not point to a commit")))?;

        let walk = repo
            .rev_walk([tip.id])
            .sorting(Sorting::ByCommitTime(CommitTimeOrder::NewestFirst))
            .all()
            .map_err(|e| LocError::GitRepo(format!("Failed to walk '{branch}': {e}")))?;

        let mut history = Vec::new();
        for info in walk {
            let info = info.map_err(|e| LocError::GitRepo(format!("Failed to walk '{branch}': {e}")))?;
            let commit = info.object()?;
            let author = commit
                .author()
                .map_err(|e| LocError::GitRepo(format!("Failed to decode commit {}: {e}", info.id)))?;
            let time = author
                .time()
                .map_err(|e| LocError::InvalidDate(format!("Bad author date on {}: {e}", info.id)))?;
            let timestamp = commit_timestamp(time)?;
            history.push(CommitRecord {
                id: info.id.to_string(),
                timestamp,
            });
        }
        // Reverse to process oldest first
        history.reverse();

        info!("{} commits on {branch}", history.len());
        Ok(history)
    }

    pub fn monthly_commits(&self, branch: &str) -> Result<Vec<MonthlyCommit>> {
        Ok(select_monthly(self.history(branch)?))
    }

    /// Whether `path` is a directory in the tree of `commit_id`.
    pub fn has_directory(&self, commit_id: &str, path: &str) -> Result<bool> {
        let repo = self.repo.to_thread_local();
        let oid = parse_oid(commit_id)?;
        let tree = repo.find_commit(oid)?.tree()?;

        let entry = tree
            .lookup_entry_by_path(path.trim_end_matches('/'))
            .map_err(|e| LocError::GitRepo(format!("Failed to look up '{path}' in {commit_id}: {e}")))?;

        Ok(entry.is_some_and(|e| e.mode().is_tree()))
    }

    /// Writes `git archive <commit> [-- <filter>]` into a temp tar file.
    pub fn materialize(&self, commit_id: &str, path_filter: Option<&str>) -> Result<MaterializedTree> {
        parse_oid(commit_id)?;

        let archive = tempfile::Builder::new()
            .prefix("loctrend-")
            .suffix(".tar")
            .tempfile()?;

        let mut cmd = Command::new("git");
        cmd.current_dir(&self.path)
            .args(["archive", "--format=tar", commit_id]);
        if let Some(filter) = path_filter {
            cmd.args(["--", filter]);
        }

        run_with_timeout(&mut cmd, Stdout::File(archive.reopen()?), self.archive_timeout)?;
        debug!(
            "archived {} {} -> {}",
            commit_id,
            path_filter.unwrap_or("."),
            archive.path().display()
        );

        Ok(MaterializedTree::archive(archive.into_temp_path()))
    }
}

impl SnapshotSource for GitRepo {
    fn history(&self, branch: &str) -> Result<Vec<CommitRecord>> {
        GitRepo::history(self, branch)
    }

    fn has_directory(&self, commit_id: &str, path: &str) -> Result<bool> {
        GitRepo::has_directory(self, commit_id, path)
    }

    fn materialize(&self, commit_id: &str, path_filter: Option<&str>) -> Result<MaterializedTree> {
        GitRepo::materialize(self, commit_id, path_filter)
    }
}

/// Version line of the `git` binary used for archiving.
pub fn git_version() -> Result<String> {
    let out = run_with_timeout(
        Command::new("git").arg("--version"),
        Stdout::Capture,
        Duration::from_secs(30),
    )?;
    Ok(String::from_utf8_lossy(&out).trim().to_string())
}

fn parse_oid(commit_id: &str) -> Result<ObjectId> {
    ObjectId::from_hex(commit_id.as_bytes())
        .map_err(|e| LocError::Parse(format!("Invalid commit ID '{commit_id}': {e}")))
}

fn commit_timestamp(time: gix::date::Time) -> Result<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(time.offset)
        .ok_or_else(|| LocError::InvalidDate(format!("Invalid offset: {}", time.offset)))?;
    let secs = time.seconds;
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.with_timezone(&offset))
        .ok_or_else(|| LocError::InvalidDate(format!("Invalid timestamp: {secs}")))
}
