use crate::error::{LocError, Result};
use log::debug;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const MAX_POLL: Duration = Duration::from_millis(100);
const STDERR_LIMIT: usize = 2048;

/// Where a child's stdout goes.
pub enum Stdout {
    /// Spooled to an anonymous temp file and returned on success.
    Capture,
    /// Written straight into the given file; nothing is returned.
    File(File),
}

/// Runs `cmd` to completion, killing it once `timeout` elapses.
///
/// stdout and stderr go to anonymous temp files, never pipes. A non-zero
/// exit is an error carrying the (truncated) stderr.
pub fn run_with_timeout(cmd: &mut Command, stdout: Stdout, timeout: Duration) -> Result<Vec<u8>> {
    let program = cmd.get_program().to_string_lossy().to_string();
    let mut stderr_file = tempfile::tempfile()?;
    let capture = match stdout {
        Stdout::Capture => {
            let f = tempfile::tempfile()?;
            cmd.stdout(Stdio::from(f.try_clone()?));
            Some(f)
        }
        Stdout::File(f) => {
            cmd.stdout(Stdio::from(f));
            None
        }
    };
    cmd.stdin(Stdio::null()).stderr(Stdio::from(stderr_file.try_clone()?));

    debug!("spawning {:?}", cmd);
    let mut child = cmd.spawn()?;
    let started = Instant::now();
    let mut poll = Duration::from_millis(5);

    let status: ExitStatus = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            // The child may exit between try_wait and kill.
            let _ = child.kill();
            let _ = child.wait();
            return Err(LocError::Timeout { program, after: timeout });
        }
        thread::sleep(poll);
        poll = (poll * 2).min(MAX_POLL);
    };

    if !status.success() {
        let stderr = read_back(&mut stderr_file)?;
        let mut stderr = String::from_utf8_lossy(&stderr).trim().to_string();
        if stderr.len() > STDERR_LIMIT {
            let mut cut = STDERR_LIMIT;
            while !stderr.is_char_boundary(cut) {
                cut -= 1;
            }
            stderr.truncate(cut);
        }
        return Err(LocError::ProcessFailed {
            program,
            status: status.to_string(),
            stderr,
        });
    }

    match capture {
        Some(mut f) => read_back(&mut f),
        None => Ok(Vec::new()),
    }
}

fn read_back(file: &mut File) -> Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }

    #[test]
    fn captures_stdout_on_success() {
        let out = run_with_timeout(&mut sh("echo hello"), Stdout::Capture, Duration::from_secs(10)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "hello\n");
    }

    #[test]
    fn nonzero_exit_is_an_error_with_stderr() {
        let err = run_with_timeout(&mut sh("echo boom >&2; exit 1"), Stdout::Capture, Duration::from_secs(10))
            .unwrap_err();
        match err {
            LocError::ProcessFailed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn slow_child_is_killed() {
        let started = Instant::now();
        let err = run_with_timeout(&mut sh("sleep 5"), Stdout::Capture, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, LocError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn large_output_does_not_block() {
        let out = run_with_timeout(
            &mut sh("i=0; while [ $i -lt 20000 ]; do echo 0123456789abcdef; i=$((i+1)); done"),
            Stdout::Capture,
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(out.len(), 20000 * 17);
    }

    #[test]
    fn file_sink_receives_stdout() {
        let target = tempfile::NamedTempFile::new().unwrap();
        let out = run_with_timeout(
            &mut sh("printf data"),
            Stdout::File(target.reopen().unwrap()),
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(out.is_empty());
        assert_eq!(std::fs::read_to_string(target.path()).unwrap(), "data");
    }
}
