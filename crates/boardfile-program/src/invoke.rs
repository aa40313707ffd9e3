//! Running the external programming tool.

use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use boardfile_platform::programmer::DESCRIPTOR_TOKEN;
use boardfile_platform::ToolCommand;
use tracing::{debug, info, warn};

use crate::error::{ProgramError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Exit status and captured output of one tool run, unmodified.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutcome {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, `None` if the tool was terminated by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Arguments for `tool` with [`DESCRIPTOR_TOKEN`] replaced by `descriptor`.
/// If no argument carries the token, the path is appended.
pub fn tool_args(tool: &ToolCommand, descriptor: &Path) -> Vec<String> {
    let path = descriptor.display().to_string();
    let mut args: Vec<String> = tool
        .args
        .iter()
        .map(|a| a.replace(DESCRIPTOR_TOKEN, &path))
        .collect();
    if !tool.args.iter().any(|a| a.contains(DESCRIPTOR_TOKEN)) {
        args.push(path);
    }
    args
}

/// Run `tool` on `descriptor`, killing it after `timeout`.
///
/// A non-zero exit is not an error; it is returned in the [`ToolOutcome`].
/// A timeout too large to represent means no deadline. If the tool exits but
/// something it started keeps its output open, the output read by the
/// deadline is returned.
pub fn run_tool(tool: &ToolCommand, descriptor: &Path, timeout: Duration) -> Result<ToolOutcome> {
    let args = tool_args(tool, descriptor);
    info!(program = %tool.program, ?args, "starting programmer");

    let mut child = Command::new(&tool.program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProgramError::Spawn {
            program: tool.program.clone(),
            source,
        })?;

    let stdout = Capture::start(child.stdout.take());
    let stderr = Capture::start(child.stderr.take());

    let deadline = Instant::now().checked_add(timeout);
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            warn!(program = %tool.program, ?timeout, "programmer timed out, killing it");
            // The child may exit between try_wait and kill
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProgramError::Timeout {
                program: tool.program.clone(),
                after: timeout,
                stdout: stdout.snapshot(),
                stderr: stderr.snapshot(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let outcome = ToolOutcome {
        status,
        stdout: stdout.finish(deadline),
        stderr: stderr.finish(deadline),
    };
    if outcome.success() {
        info!(program = %tool.program, "programmer finished");
    } else {
        warn!(program = %tool.program, status = %outcome.status, "programmer failed");
    }
    Ok(outcome)
}

/// Drains one pipe on a background thread so the child never blocks on a
/// full pipe. The buffer is shared so partial output survives a timeout.
struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
    /// Disconnects when the reader thread is done.
    done: Option<Receiver<()>>,
}

impl Capture {
    fn start<R: Read + Send + 'static>(pipe: Option<R>) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let done = pipe.map(|mut pipe| {
            let buffer = Arc::clone(&buffer);
            let (tx, rx) = mpsc::channel::<()>();
            thread::spawn(move || {
                let _tx = tx;
                let mut chunk = [0u8; 4096];
                loop {
                    match pipe.read(&mut chunk) {
                        Ok(0) => break,
                        Ok(n) => match buffer.lock() {
                            Ok(mut b) => b.extend_from_slice(&chunk[..n]),
                            Err(_) => break,
                        },
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            debug!(error = %e, "pipe read failed");
                            break;
                        }
                    }
                }
            });
            rx
        });
        Self { buffer, done }
    }

    /// Output collected so far, without waiting for the pipe to close.
    fn snapshot(&self) -> String {
        match self.buffer.lock() {
            Ok(b) => String::from_utf8_lossy(&b).into_owned(),
            Err(_) => String::new(),
        }
    }

    /// Wait until the pipe closes or `deadline` passes, then return what was
    /// read. A reader still blocked at the deadline is left detached.
    fn finish(self, deadline: Option<Instant>) -> String {
        if let Some(done) = &self.done {
            let closed = match deadline {
                Some(d) => {
                    let remaining = d.saturating_duration_since(Instant::now());
                    !matches!(done.recv_timeout(remaining), Err(RecvTimeoutError::Timeout))
                }
                None => {
                    let _ = done.recv();
                    true
                }
            };
            if !closed {
                debug!("output pipe still open after the tool exited");
            }
        }
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> ToolCommand {
        ToolCommand {
            program: "/bin/sh".into(),
            args: vec!["-c".into(), script.into(), "sh".into(), DESCRIPTOR_TOKEN.into()],
        }
    }

    #[test]
    fn token_replaced_or_appended() {
        let path = Path::new("/tmp/top.xcf");
        assert_eq!(
            tool_args(&ToolCommand::pgrcmd(), path),
            ["-infile", "/tmp/top.xcf"]
        );
        let bare = ToolCommand {
            program: "openFPGALoader".into(),
            args: vec!["-b".into(), "ecp5_evn".into()],
        };
        assert_eq!(tool_args(&bare, path), ["-b", "ecp5_evn", "/tmp/top.xcf"]);
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_an_outcome() {
        let outcome = run_tool(
            &sh("echo programming; echo 'cable not found' >&2; exit 3"),
            Path::new("unused.xcf"),
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(outcome.code(), Some(3));
        assert!(!outcome.success());
        assert_eq!(outcome.stdout, "programming\n");
        assert_eq!(outcome.stderr, "cable not found\n");
    }

    #[cfg(unix)]
    #[test]
    fn descriptor_path_reaches_tool() {
        let outcome = run_tool(
            &sh("echo \"$1\""),
            Path::new("/work/top.xcf"),
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(outcome.success());
        assert_eq!(outcome.stdout, "/work/top.xcf\n");
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_tool() {
        let started = Instant::now();
        let err = run_tool(
            &sh("echo started; exec sleep 30"),
            Path::new("unused.xcf"),
            Duration::from_millis(300),
        )
        .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(10));
        match err {
            ProgramError::Timeout { stdout, after, .. } => {
                assert_eq!(after, Duration::from_millis(300));
                assert_eq!(stdout, "started\n");
            }
            other => panic!("expected timeout, got {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn background_child_holding_output_does_not_outlast_timeout() {
        let started = Instant::now();
        let outcome = run_tool(
            &sh("sleep 6 & echo done"),
            Path::new("unused.xcf"),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(outcome.success());
        assert_eq!(outcome.stdout, "done\n");
    }

    #[cfg(unix)]
    #[test]
    fn huge_timeout_means_no_deadline() {
        let outcome = run_tool(
            &sh("echo ok"),
            Path::new("unused.xcf"),
            Duration::from_secs(u64::MAX),
        )
        .unwrap();
        assert!(outcome.success());
        assert_eq!(outcome.stdout, "ok\n");
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let tool = ToolCommand {
            program: "/nonexistent/pgrcmd".into(),
            args: vec![],
        };
        assert!(matches!(
            run_tool(&tool, Path::new("x.xcf"), Duration::from_secs(1)),
            Err(ProgramError::Spawn { .. })
        ));
    }
}
