use crate::model::{CommitRecord, MonthlyCommit};
use crate::util::month_key;
use std::collections::BTreeMap;

/// Reduces an oldest-first history to the last commit of every month,
/// ascending by month. Later commits in the input win, whatever their
/// timestamps say.
pub fn select_monthly<I>(history: I) -> Vec<MonthlyCommit>
where
    I: IntoIterator<Item = CommitRecord>,
{
    let mut by_month: BTreeMap<String, CommitRecord> = BTreeMap::new();
    for commit in history {
        by_month.insert(month_key(&commit.timestamp), commit);
    }

    by_month
        .into_iter()
        .map(|(month, commit)| MonthlyCommit {
            month,
            commit_id: commit.id,
            timestamp: commit.timestamp,
        })
        .collect()
}
