use super::{parse_cloc_csv, LineCounter};
use crate::error::{LocError, Result};
use crate::model::LocCount;
use crate::process::{run_with_timeout, Stdout};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

pub const DEFAULT_COUNT_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs the `cloc` binary against an archive or directory.
#[derive(Debug, Clone)]
pub struct Cloc {
    program: PathBuf,
    timeout: Duration,
}

impl Cloc {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_COUNT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Confirms the binary can be run, returning its version line.
    pub fn check(&self) -> Result<String> {
        let out = run_with_timeout(
            Command::new(&self.program).arg("--version"),
            Stdout::Capture,
            Duration::from_secs(30),
        )
        .map_err(|e| match e {
            LocError::Io(io) => LocError::Counter(format!("cannot run {}: {io}", self.program.display())),
            other => other,
        })?;
        Ok(String::from_utf8_lossy(&out).trim().to_string())
    }
}

impl Default for Cloc {
    fn default() -> Self {
        Self::new("cloc")
    }
}

impl LineCounter for Cloc {
    fn count(&self, tree: &Path) -> Result<LocCount> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(tree).args(["--csv", "--quiet"]);
        let out = run_with_timeout(&mut cmd, Stdout::Capture, self.timeout)?;
        let count = parse_cloc_csv(&String::from_utf8_lossy(&out)).ok_or_else(|| {
            LocError::Counter(format!("unreadable cloc output for {}", tree.display()))
        })?;
        debug!("cloc {}: {} lines", tree.display(), count.total);
        Ok(count)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn stub(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("cloc");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn counts_from_stub_output() {
        let dir = tempfile::tempdir().unwrap();
        let bin = stub(
            dir.path(),
            "echo 'files,language,blank,comment,code'\necho '1,Rust,0,0,12'\necho '1,SUM,0,0,12'",
        );
        let count = Cloc::new(bin).count(dir.path()).unwrap();
        assert_eq!(count.total, 12);
        assert_eq!(count.by_language["Rust"], 12);
    }

    #[test]
    fn nonzero_exit_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bin = stub(dir.path(), "echo '1,SUM,0,0,12'\nexit 1");
        assert!(Cloc::new(bin).count(dir.path()).is_err());
    }

    #[test]
    fn unreadable_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bin = stub(dir.path(), "echo 'Segmentation fault garbage <<<'\nexit 0");
        let err = Cloc::new(bin).count(dir.path()).unwrap_err();
        assert!(matches!(err, LocError::Counter(_)));
    }

    #[test]
    fn silent_success_is_zero_lines() {
        let dir = tempfile::tempdir().unwrap();
        let bin = stub(dir.path(), "exit 0");
        assert_eq!(Cloc::new(bin).count(dir.path()).unwrap(), LocCount::empty());
    }

    #[test]
    fn check_reports_missing_binary() {
        let err = Cloc::new("/nonexistent/cloc-binary").check().unwrap_err();
        assert!(matches!(err, LocError::Counter(_)));
    }
}
