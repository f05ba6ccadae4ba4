//! External command execution.
//!
//! Every producer and external prober is an opaque command line. This module
//! runs one of them through a shell, streams its output line by line through a
//! [`LineFilter`], and enforces a hard wall-clock deadline.
//!
//! The runner never fails: launch errors, I/O errors and timeouts are folded
//! into [`RunStatus`] so the caller can decide how much of the result to keep.
//! A timeout is a *partial success* and keeps every line read before the deadline.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use futures::{Stream, StreamExt, stream};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::{Instant, timeout_at};
use tokio_stream::wrappers::SplitStream;
use tracing::debug;

use submergex_common::hostname::{self, Hostname, HostnameSet};

/// `sh` reports "command not executable" and "command not found" with these.
const EXIT_NOT_EXECUTABLE: i32 = 126;
const EXIT_NOT_FOUND: i32 = 127;

/// Which output streams feed the line filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Streams {
    /// stdout and stderr are both filtered, so tool chatter never goes missing silently.
    Merged,
    /// Only stdout is filtered; stderr goes to debug logs.
    StdoutOnly,
}

/// What a line has to look like to be kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFilter {
    /// Must pass the hostname normalizer; stored lowercase.
    Hostname,
    /// Anything non-blank, trimmed.
    Trimmed,
}

impl LineFilter {
    pub fn apply(self, line: &str) -> Option<String> {
        match self {
            LineFilter::Hostname => Hostname::parse(line).map(Hostname::into_string),
            LineFilter::Trimmed => {
                let trimmed: &str = line.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

/// A single command execution request.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub timeout: Duration,
    pub streams: Streams,
    pub filter: LineFilter,
    /// File whose contents are piped into the command's stdin.
    pub stdin: Option<PathBuf>,
}

impl Invocation {
    /// Enumeration commands: merged streams, hostname filter.
    pub fn enumeration(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
            streams: Streams::Merged,
            filter: LineFilter::Hostname,
            stdin: None,
        }
    }

    /// Probing commands: stdout only, trimmed lines, hosts fed on stdin.
    pub fn probing(command: impl Into<String>, timeout: Duration, stdin: PathBuf) -> Self {
        Self {
            command: command.into(),
            timeout,
            streams: Streams::StdoutOnly,
            filter: LineFilter::Trimmed,
            stdin: Some(stdin),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The command exited on its own (any exit code except "not found").
    Completed,
    /// The deadline passed and the command was killed. Lines read so far are kept.
    TimedOut,
    /// The command could not be started or its output could not be read.
    LaunchFailed(String),
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => f.write_str("completed"),
            RunStatus::TimedOut => f.write_str("timed out"),
            RunStatus::LaunchFailed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub lines: BTreeSet<String>,
    pub status: RunStatus,
    pub elapsed: Duration,
}

impl CommandOutput {
    pub fn timed_out(&self) -> bool {
        self.status == RunStatus::TimedOut
    }

    pub fn launch_failed(&self) -> bool {
        matches!(self.status, RunStatus::LaunchFailed(_))
    }

    /// The collected lines as hostnames. Lossless for [`LineFilter::Hostname`] output.
    pub fn hostnames(&self) -> HostnameSet {
        hostname::normalize_lines(&self.lines)
    }
}

/// Runs command lines. Swappable so orchestration can be tested without a shell.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> CommandOutput;
}

/// Runs commands as `<shell> -c <command>` so pipelines and redirects work.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, invocation: &Invocation) -> CommandOutput {
        let started: Instant = Instant::now();
        let mut lines: BTreeSet<String> = BTreeSet::new();

        let status: RunStatus = match self.execute(invocation, &mut lines).await {
            Ok(status) => status,
            Err(e) => {
                lines.clear();
                RunStatus::LaunchFailed(format!("{e:#}"))
            }
        };

        debug!(
            command = %invocation.command,
            lines = lines.len(),
            %status,
            "command finished"
        );

        CommandOutput {
            lines,
            status,
            elapsed: started.elapsed(),
        }
    }
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        lines: &mut BTreeSet<String>,
    ) -> anyhow::Result<RunStatus> {
        let deadline: Instant = Instant::now() + invocation.timeout;
        let mut child: Child = self.spawn(invocation)?;

        let stdout = child.stdout.take().context("stdout was not captured")?;
        let stderr = child.stderr.take().context("stderr was not captured")?;
        let output = stream::select(
            line_stream(stdout).map(|line| (Source::Stdout, line)),
            line_stream(stderr).map(|line| (Source::Stderr, line)),
        );

        let collected = timeout_at(deadline, collect_lines(output, invocation, lines)).await;
        match collected {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                kill(&mut child).await;
                return Err(e).context("reading command output");
            }
            Err(_elapsed) => return Ok(kill(&mut child).await),
        }

        match timeout_at(deadline, child.wait()).await {
            Ok(Ok(exit)) => Ok(classify_exit(exit)),
            Ok(Err(e)) => Err(e).context("waiting for command to exit"),
            Err(_elapsed) => Ok(kill(&mut child).await),
        }
    }

    fn spawn(&self, invocation: &Invocation) -> anyhow::Result<Child> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(&invocation.command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so a timeout can take down the whole pipeline.
        #[cfg(unix)]
        cmd.process_group(0);

        match &invocation.stdin {
            Some(path) => {
                let file = std::fs::File::open(path)
                    .with_context(|| format!("opening stdin file {}", path.display()))?;
                cmd.stdin(Stdio::from(file));
            }
            None => {
                cmd.stdin(Stdio::null());
            }
        }

        cmd.spawn()
            .with_context(|| format!("launching '{}' via {}", invocation.command, self.shell))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Stdout,
    Stderr,
}

/// Newline-split byte stream; invalid UTF-8 is replaced rather than treated as an I/O error.
fn line_stream<R>(reader: R) -> impl Stream<Item = std::io::Result<String>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    SplitStream::new(BufReader::new(reader).split(b'\n'))
        .map(|segment| segment.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

async fn collect_lines<S>(
    output: S,
    invocation: &Invocation,
    lines: &mut BTreeSet<String>,
) -> std::io::Result<()>
where
    S: Stream<Item = (Source, std::io::Result<String>)>,
{
    futures::pin_mut!(output);

    while let Some((source, line)) = output.next().await {
        let line: String = line?;
        if source == Source::Stderr && invocation.streams == Streams::StdoutOnly {
            debug!(command = %invocation.command, "stderr: {}", line.trim_end());
            continue;
        }
        if let Some(accepted) = invocation.filter.apply(&line) {
            lines.insert(accepted);
        }
    }

    Ok(())
}

/// SIGKILLs the command's process group, then reaps the shell.
async fn kill(child: &mut Child) -> RunStatus {
    if let Err(e) = kill_group(child) {
        debug!("group kill failed, killing shell only: {e}");
        if let Err(e) = child.start_kill() {
            debug!("kill after timeout failed: {e}");
        }
    }
    if let Err(e) = child.wait().await {
        debug!("reaping killed command failed: {e}");
    }
    RunStatus::TimedOut
}

#[cfg(unix)]
fn kill_group(child: &Child) -> std::io::Result<()> {
    let pid = child
        .id()
        .ok_or_else(|| std::io::Error::other("command already reaped"))?;
    // The shell was spawned with `process_group(0)`, so its pid is the group id.
    let rc: libc::c_int = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}

fn classify_exit(exit: ExitStatus) -> RunStatus {
    match exit.code() {
        Some(code @ (EXIT_NOT_EXECUTABLE | EXIT_NOT_FOUND)) => RunStatus::LaunchFailed(format!(
            "shell exited with {code} (command not found or not executable)"
        )),
        _ => RunStatus::Completed,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SECOND: Duration = Duration::from_secs(1);

    fn sorted(output: &CommandOutput) -> Vec<&str> {
        output.lines.iter().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn run_collects_normalized_lines() {
        let runner = ShellRunner::default();
        let invocation = Invocation::enumeration(
            "printf 'a.example.com\\nA.EXAMPLE.COM\\nnot_a_host\\n\\n# c.example.com\\nb.example.com'",
            10 * SECOND,
        );

        let output = runner.run(&invocation).await;

        assert_eq!(output.status, RunStatus::Completed);
        assert_eq!(sorted(&output), vec!["a.example.com", "b.example.com"]);
    }

    #[tokio::test]
    async fn run_merges_stderr_for_enumeration() {
        let runner = ShellRunner::default();
        let invocation = Invocation::enumeration(
            "echo out.example.com; echo err.example.com >&2",
            10 * SECOND,
        );

        let output = runner.run(&invocation).await;

        assert_eq!(sorted(&output), vec!["err.example.com", "out.example.com"]);
    }

    #[tokio::test]
    async fn run_keeps_stderr_out_of_probe_results() {
        let mut hosts = tempfile::NamedTempFile::new().unwrap();
        writeln!(hosts, "a.example.com").unwrap();

        let runner = ShellRunner::default();
        let invocation = Invocation::probing(
            "sed 's#^#https://#'; echo 'https://noise.example.com' >&2",
            10 * SECOND,
            hosts.path().to_path_buf(),
        );

        let output = runner.run(&invocation).await;

        assert_eq!(output.status, RunStatus::Completed);
        assert_eq!(sorted(&output), vec!["https://a.example.com"]);
    }

    #[tokio::test]
    async fn run_returns_partial_results_on_timeout() {
        let runner = ShellRunner::default();
        let invocation = Invocation::enumeration(
            "printf 'a.example.com\\nb.example.com\\nc.example.com\\n'; sleep 30",
            SECOND,
        );

        let started = std::time::Instant::now();
        let output = runner.run(&invocation).await;

        assert!(output.timed_out());
        assert_eq!(
            sorted(&output),
            vec!["a.example.com", "b.example.com", "c.example.com"]
        );
        assert!(started.elapsed() < 5 * SECOND);
    }

    /// Alive and not a zombie waiting to be reaped by init.
    #[cfg(target_os = "linux")]
    fn is_running(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .is_some_and(|rest| !rest.trim_start().starts_with('Z')),
            Err(_) => false,
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn timeout_kills_the_whole_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("sleeper.pid");
        let runner = ShellRunner::default();
        let invocation = Invocation::enumeration(
            format!(
                "echo a.example.com; sleep 37 & echo $! > {}; sleep 38 | cat",
                pid_file.display()
            ),
            SECOND,
        );

        let output = runner.run(&invocation).await;

        assert!(output.timed_out());
        assert_eq!(sorted(&output), vec!["a.example.com"]);

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let pid = pid.trim();
        let mut running = is_running(pid);
        for _ in 0..40 {
            if !running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            running = is_running(pid);
        }
        assert!(!running, "background process {pid} outlived the timeout");
    }

    #[tokio::test]
    async fn run_reports_missing_binary_as_launch_failure() {
        let runner = ShellRunner::default();
        let invocation =
            Invocation::enumeration("definitely-not-a-real-tool-3f9a -d example.com", 10 * SECOND);

        let output = runner.run(&invocation).await;

        assert!(output.launch_failed(), "status was {}", output.status);
        assert!(output.lines.is_empty());
    }

    #[tokio::test]
    async fn run_reports_missing_shell_as_launch_failure() {
        let runner = ShellRunner::new("/nonexistent/shell");
        let output = runner
            .run(&Invocation::enumeration("echo a.example.com", 10 * SECOND))
            .await;

        assert!(output.launch_failed());
        assert!(output.lines.is_empty());
    }

    #[tokio::test]
    async fn run_tolerates_invalid_utf8() {
        let runner = ShellRunner::default();
        let invocation =
            Invocation::enumeration("printf '\\377\\376\\nok.example.com\\n'", 10 * SECOND);

        let output = runner.run(&invocation).await;

        assert_eq!(output.status, RunStatus::Completed);
        assert_eq!(sorted(&output), vec!["ok.example.com"]);
    }

    #[test]
    fn trimmed_filter_drops_blank_lines() {
        assert_eq!(LineFilter::Trimmed.apply("  https://a.io  "), Some("https://a.io".into()));
        assert_eq!(LineFilter::Trimmed.apply("   "), None);
        assert_eq!(LineFilter::Hostname.apply("https://a.io"), None);
    }
}
