//! External builder invocation.
//!
//! The builder runs as a child process with an argument vector, never
//! through a shell, so level names with spaces or quotes arrive intact.
//! Output is captured on reader threads while the caller waits. On unix the
//! builder leads its own process group, and a timeout kills the whole group
//! so nothing it started can hold the output pipes open.

use std::ffi::OsString;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::BuilderConfig;
use crate::error::BuildError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

// ===========================================================================
// BuildCommand
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl BuildCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// `<program> <args..> <file> <level_flag> <level_name>`.
    pub fn from_config(config: &BuilderConfig, file: &Path, level_name: &str) -> Self {
        Self::new(&config.program)
            .args(&config.args)
            .arg(file)
            .arg(&config.level_flag)
            .arg(level_name)
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Run to completion, killing the child if `timeout` elapses first.
    pub fn run(&self, timeout: Option<Duration>) -> Result<BuildOutcome, BuildError> {
        let command = self.to_string();
        log::info!("running {command}");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        let mut child = cmd.spawn().map_err(|source| BuildError::Spawn {
            command: command.clone(),
            source,
        })?;

        let stdout = child.stdout.take().map(capture);
        let stderr = child.stderr.take().map(capture);

        let waited = match timeout {
            None => child.wait().map(|status| (status, false)),
            Some(limit) => wait_with_timeout(&mut child, limit),
        };
        let (status, timed_out) = waited.map_err(|source| BuildError::Wait {
            command: command.clone(),
            source,
        })?;

        let outcome = BuildOutcome {
            code: status.code(),
            success: status.success() && !timed_out,
            stdout: collect(stdout),
            stderr: collect(stderr),
            timed_out,
            command,
        };
        if outcome.timed_out {
            log::warn!("{} timed out and was killed", outcome.command);
        } else {
            log::debug!("{} exited with {status}", outcome.command);
        }
        Ok(outcome)
    }
}

impl fmt::Display for BuildCommand {
    /// Shell-quoted command line, for logs only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

/// POSIX shell quoting: safe words pass through, everything else is
/// single-quoted.
pub fn shell_quote(s: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c);
    if !s.is_empty() && s.chars().all(safe) {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn capture<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default()
}

fn wait_with_timeout(child: &mut Child, limit: Duration) -> std::io::Result<(ExitStatus, bool)> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        if start.elapsed() >= limit {
            terminate(child);
            return Ok((child.wait()?, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the child and, on unix, every process in its group.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if let Ok(pid) = i32::try_from(child.id()) {
            if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
                log::debug!("could not signal process group {pid}: {e}");
            }
        }
    }
    // The child may exit between try_wait and kill.
    let _ = child.kill();
}

// ===========================================================================
// BuildOutcome
// ===========================================================================

/// What the builder did. Whether a failure is fatal is the caller's call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Exit code; `None` when the child was ended by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    /// Shell-quoted command line that was run.
    pub command: String,
}

impl BuildOutcome {
    /// Turn an unsuccessful outcome into [`BuildError::ExternalBuildFailed`].
    pub fn check(self) -> Result<Self, BuildError> {
        if self.success {
            return Ok(self);
        }
        let reason = if self.timed_out {
            "timed out".to_string()
        } else {
            match self.code {
                Some(code) => format!("exited with status {code}"),
                None => "was terminated by a signal".to_string(),
            }
        };
        Err(BuildError::ExternalBuildFailed {
            command: self.command,
            reason,
            stderr: self.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_leaves_plain_words_alone() {
        assert_eq!(shell_quote("spwn"), "spwn");
        assert_eq!(shell_quote("/tmp/ws-1/compiled.spwn"), "/tmp/ws-1/compiled.spwn");
        assert_eq!(shell_quote("--level-name"), "--level-name");
    }

    #[test]
    fn quoting_wraps_spaces_and_quotes() {
        assert_eq!(shell_quote("My Level"), "'My Level'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn command_from_config_orders_arguments() {
        let config = BuilderConfig::default();
        let cmd = BuildCommand::from_config(&config, Path::new("/ws/compiled.spwn"), "My Level");
        assert_eq!(cmd.program(), "spwn");
        assert_eq!(
            cmd.get_args(),
            ["build", "/ws/compiled.spwn", "--level-name", "My Level"]
        );
        assert_eq!(
            cmd.to_string(),
            "spwn build /ws/compiled.spwn --level-name 'My Level'"
        );
    }

    #[test]
    fn check_reports_failure_reason() {
        let outcome = BuildOutcome {
            code: Some(2),
            success: false,
            stdout: String::new(),
            stderr: "boom".into(),
            timed_out: false,
            command: "spwn build x".into(),
        };
        match outcome.check() {
            Err(BuildError::ExternalBuildFailed { reason, stderr, .. }) => {
                assert_eq!(reason, "exited with status 2");
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let cmd = BuildCommand::new("spwnforge-no-such-builder-7f3a");
        assert!(matches!(cmd.run(None), Err(BuildError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn arguments_arrive_intact_and_output_is_captured() {
        let cmd = BuildCommand::new("sh")
            .args(["-c", r#"printf '%s\n' "$@"; echo oops >&2"#, "sh"])
            .arg("two words")
            .arg("it's");
        let outcome = cmd.run(None).unwrap().check().unwrap();
        assert_eq!(outcome.stdout, "two words\nit's\n");
        assert_eq!(outcome.stderr, "oops\n");
        assert_eq!(outcome.code, Some(0));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_the_child() {
        let cmd = BuildCommand::new("sh").args(["-c", "exec sleep 5"]);
        let start = Instant::now();
        let outcome = cmd.run(Some(Duration::from_millis(200))).unwrap();
        assert!(outcome.timed_out);
        assert!(!outcome.success);
        assert!(start.elapsed() < Duration::from_secs(4));
        assert!(matches!(
            outcome.check(),
            Err(BuildError::ExternalBuildFailed { reason, .. }) if reason == "timed out"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_also_kills_grandchildren() {
        // `sleep` runs as a grandchild holding stdout and stderr open.
        let cmd = BuildCommand::new("sh").args(["-c", "sleep 4; true"]);
        let start = Instant::now();
        let outcome = cmd.run(Some(Duration::from_millis(200))).unwrap();
        assert!(outcome.timed_out);
        assert!(
            start.elapsed() < Duration::from_secs(2),
            "took {:?}",
            start.elapsed()
        );
    }
}
