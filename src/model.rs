use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 1;

/// One commit of a branch history, as listed oldest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: String,
    pub timestamp: DateTime<FixedOffset>,
}

/// The representative commit of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCommit {
    pub month: String,
    pub commit_id: String,
    pub timestamp: DateTime<FixedOffset>,
}

/// Line counts reported by the counting tool for one tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocCount {
    pub total: u64,
    pub by_language: BTreeMap<String, u64>,
}

impl LocCount {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `true` when the aggregate row agrees with the per-language rows.
    pub fn is_consistent(&self) -> bool {
        self.total == self.by_language.values().sum::<u64>()
    }
}

/// How a scope's count was obtained. Absent and failed scopes both carry
/// an empty [`LocCount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeStatus {
    Counted,
    Absent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeCount {
    pub count: LocCount,
    pub status: ScopeStatus,
}

impl ScopeCount {
    pub fn counted(count: LocCount) -> Self {
        Self { count, status: ScopeStatus::Counted }
    }

    pub fn absent() -> Self {
        Self { count: LocCount::empty(), status: ScopeStatus::Absent }
    }

    pub fn failed() -> Self {
        Self { count: LocCount::empty(), status: ScopeStatus::Failed }
    }
}

/// Line counts of one sampled month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub month: String,
    pub commit_id: String,
    pub commit_timestamp: DateTime<FixedOffset>,
    pub repo_total: u64,
    pub repo_by_language: BTreeMap<String, u64>,
    pub repo_status: ScopeStatus,
    pub subdir_totals: BTreeMap<String, u64>,
    pub subdir_by_language: BTreeMap<String, BTreeMap<String, u64>>,
    pub subdir_status: BTreeMap<String, ScopeStatus>,
}

impl Snapshot {
    pub fn new(
        commit: &MonthlyCommit,
        repo: ScopeCount,
        subdirs: impl IntoIterator<Item = (String, ScopeCount)>,
    ) -> Self {
        let mut subdir_totals = BTreeMap::new();
        let mut subdir_by_language = BTreeMap::new();
        let mut subdir_status = BTreeMap::new();
        for (path, scope) in subdirs {
            subdir_totals.insert(path.clone(), scope.count.total);
            subdir_by_language.insert(path.clone(), scope.count.by_language);
            subdir_status.insert(path, scope.status);
        }

        Self {
            month: commit.month.clone(),
            commit_id: commit.commit_id.clone(),
            commit_timestamp: commit.timestamp,
            repo_total: repo.count.total,
            repo_by_language: repo.count.by_language,
            repo_status: repo.status,
            subdir_totals,
            subdir_by_language,
            subdir_status,
        }
    }

    /// Total for a normalized subdirectory, 0 when it is not tracked.
    pub fn subdir_total(&self, subdir: &str) -> u64 {
        self.subdir_totals.get(subdir).copied().unwrap_or(0)
    }

    /// Share of the repository total held by `subdir`, in percent.
    pub fn subdir_pct(&self, subdir: &str) -> f64 {
        if self.repo_total == 0 {
            return 0.0;
        }
        self.subdir_total(subdir) as f64 / self.repo_total as f64 * 100.0
    }

    pub fn is_degraded(&self) -> bool {
        self.repo_status == ScopeStatus::Failed
            || self.subdir_status.values().any(|s| *s == ScopeStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub branch: String,
    pub subdirs: Vec<String>,
    pub snapshots: Vec<Snapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub branch: String,
    pub months: Vec<MonthlyCommit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn january() -> MonthlyCommit {
        MonthlyCommit {
            month: "2024-01".to_string(),
            commit_id: "abc123".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2024-01-20T10:00:00+02:00").unwrap(),
        }
    }

    fn count(pairs: &[(&str, u64)]) -> LocCount {
        let by_language: BTreeMap<String, u64> =
            pairs.iter().map(|(l, n)| (l.to_string(), *n)).collect();
        LocCount { total: by_language.values().sum(), by_language }
    }

    #[test]
    fn snapshot_keeps_subdir_maps_in_step() {
        let snap = Snapshot::new(
            &january(),
            ScopeCount::counted(count(&[("Rust", 80), ("TOML", 20)])),
            vec![
                ("apps/web/".to_string(), ScopeCount::absent()),
                ("crates/core/".to_string(), ScopeCount::counted(count(&[("Rust", 60)]))),
            ],
        );

        let totals: Vec<_> = snap.subdir_totals.keys().collect();
        let langs: Vec<_> = snap.subdir_by_language.keys().collect();
        assert_eq!(totals, langs);
        assert_eq!(snap.subdir_total("apps/web/"), 0);
        assert!(snap.subdir_by_language["apps/web/"].is_empty());
        assert_eq!(snap.subdir_status["apps/web/"], ScopeStatus::Absent);
        assert_eq!(snap.repo_total, 100);
        assert!(!snap.is_degraded());
    }

    #[test]
    fn subdir_pct_is_zero_for_empty_repo() {
        let snap = Snapshot::new(
            &january(),
            ScopeCount::failed(),
            vec![("src/".to_string(), ScopeCount::failed())],
        );
        assert_eq!(snap.subdir_pct("src/"), 0.0);
        assert!(snap.is_degraded());
    }

    #[test]
    fn subdir_pct_reports_share() {
        let snap = Snapshot::new(
            &january(),
            ScopeCount::counted(count(&[("Rust", 200)])),
            vec![("src/".to_string(), ScopeCount::counted(count(&[("Rust", 50)])))],
        );
        assert_eq!(snap.subdir_pct("src/"), 25.0);
        assert_eq!(snap.subdir_pct("missing/"), 0.0);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ScopeStatus::Absent).unwrap();
        assert_eq!(json, "\"absent\"");
    }
}
