use crate::counter::LineCounter;
use crate::error::{LocError, Result};
use crate::model::{CommitRecord, MonthlyCommit, ScopeCount, Snapshot};
use crate::select::select_monthly;
use crate::tree::MaterializedTree;
use crate::util::normalize_subdirs;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Repository access needed to build snapshots.
pub trait SnapshotSource: Sync {
    /// Commits reachable from `branch`, oldest first.
    fn history(&self, branch: &str) -> Result<Vec<CommitRecord>>;

    /// Whether `path` (normalized, trailing `/`) is a directory at `commit_id`.
    fn has_directory(&self, commit_id: &str, path: &str) -> Result<bool>;

    /// Makes the files of `commit_id` under `path_filter` visible on disk.
    fn materialize(&self, commit_id: &str, path_filter: Option<&str>) -> Result<MaterializedTree>;
}

/// Called after each snapshot with `(completed, total, month)`.
pub type Progress<'a> = dyn Fn(usize, usize, &str) + Sync + 'a;

/// Cooperative stop signal, checked before each month is started.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Months processed at once; 1 keeps the scan strictly sequential.
    pub jobs: usize,
    pub cancel: CancelFlag,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { jobs: 1, cancel: CancelFlag::new() }
    }
}

/// Builds one snapshot per month of `branch`, ascending by month.
///
/// Failing to read the history is the only error; every per-month
/// problem degrades the affected scope to an empty count. When cancelled
/// the result holds the months finished before the first skipped one.
pub fn collect_snapshots<S, C>(
    source: &S,
    counter: &C,
    branch: &str,
    subdirs: &[String],
    options: &ScanOptions,
    progress: Option<&Progress<'_>>,
) -> Result<Vec<Snapshot>>
where
    S: SnapshotSource + ?Sized,
    C: LineCounter + ?Sized,
{
    let months = select_monthly(source.history(branch)?);
    let subdirs = normalize_subdirs(subdirs);
    info!(
        "{} months to scan on {branch}, {} tracked subdirectories",
        months.len(),
        subdirs.len()
    );

    if months.is_empty() {
        return Ok(Vec::new());
    }

    if options.jobs <= 1 {
        Ok(collect_sequential(source, counter, &months, &subdirs, options, progress))
    } else {
        collect_parallel(source, counter, &months, &subdirs, options, progress)
    }
}

fn collect_sequential<S, C>(
    source: &S,
    counter: &C,
    months: &[MonthlyCommit],
    subdirs: &[String],
    options: &ScanOptions,
    progress: Option<&Progress<'_>>,
) -> Vec<Snapshot>
where
    S: SnapshotSource + ?Sized,
    C: LineCounter + ?Sized,
{
    let total = months.len();
    let mut snapshots = Vec::with_capacity(total);

    for (i, commit) in months.iter().enumerate() {
        if options.cancel.is_cancelled() {
            info!("scan cancelled after {i} of {total} months");
            break;
        }
        snapshots.push(assemble_snapshot(source, counter, commit, subdirs));
        if let Some(report) = progress {
            report(i + 1, total, &commit.month);
        }
    }

    snapshots
}

fn collect_parallel<S, C>(
    source: &S,
    counter: &C,
    months: &[MonthlyCommit],
    subdirs: &[String],
    options: &ScanOptions,
    progress: Option<&Progress<'_>>,
) -> Result<Vec<Snapshot>>
where
    S: SnapshotSource + ?Sized,
    C: LineCounter + ?Sized,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs)
        .build()
        .map_err(|e| LocError::Other(format!("Failed to start worker pool: {e}")))?;

    let total = months.len();
    let done = AtomicUsize::new(0);

    let results: Vec<Option<Snapshot>> = pool.install(|| {
        months
            .par_iter()
            .map(|commit| {
                if options.cancel.is_cancelled() {
                    return None;
                }
                let snapshot = assemble_snapshot(source, counter, commit, subdirs);
                let n = done.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(report) = progress {
                    report(n, total, &commit.month);
                }
                Some(snapshot)
            })
            .collect()
    });

    let snapshots: Vec<Snapshot> = results.into_iter().map_while(|s| s).collect();
    if snapshots.len() < total {
        info!("scan cancelled after {} of {total} months", snapshots.len());
    }
    Ok(snapshots)
}

/// Counts the whole tree and every tracked subdirectory of one month.
pub fn assemble_snapshot<S, C>(source: &S, counter: &C, commit: &MonthlyCommit, subdirs: &[String]) -> Snapshot
where
    S: SnapshotSource + ?Sized,
    C: LineCounter + ?Sized,
{
    let repo = count_scope(source, counter, commit, None);
    if repo.count.total == 0 {
        debug!("{}: repository total is zero ({:?})", commit.month, repo.status);
    }

    let subdir_counts: Vec<(String, ScopeCount)> = subdirs
        .iter()
        .map(|subdir| {
            let scope = match source.has_directory(&commit.commit_id, subdir) {
                Ok(true) => count_scope(source, counter, commit, Some(subdir)),
                Ok(false) => {
                    debug!("{}: {subdir} absent at {}", commit.month, short_id(&commit.commit_id));
                    ScopeCount::absent()
                }
                Err(e) => {
                    warn!(
                        "{}: cannot check {subdir} at {}: {e}",
                        commit.month,
                        short_id(&commit.commit_id)
                    );
                    ScopeCount::failed()
                }
            };
            (subdir.clone(), scope)
        })
        .collect();

    Snapshot::new(commit, repo, subdir_counts)
}

fn count_scope<S, C>(source: &S, counter: &C, commit: &MonthlyCommit, filter: Option<&str>) -> ScopeCount
where
    S: SnapshotSource + ?Sized,
    C: LineCounter + ?Sized,
{
    let scope = filter.unwrap_or("repository");
    let id = short_id(&commit.commit_id);

    let tree = match source.materialize(&commit.commit_id, filter) {
        Ok(tree) => tree,
        Err(e) => {
            warn!("{}: failed to extract {scope} at {id}: {e}", commit.month);
            return ScopeCount::failed();
        }
    };

    match counter.count(tree.path()) {
        Ok(count) if count.is_consistent() => ScopeCount::counted(count),
        Ok(count) => {
            warn!(
                "{}: inconsistent count for {scope} at {id} (total {} != sum of languages)",
                commit.month, count.total
            );
            ScopeCount::failed()
        }
        Err(e) => {
            warn!("{}: failed to count {scope} at {id}: {e}", commit.month);
            ScopeCount::failed()
        }
    }
}

fn short_id(id: &str) -> &str {
    id.get(..10).unwrap_or(id)
}
