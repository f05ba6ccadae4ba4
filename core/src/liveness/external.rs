//! Delegated probing: hand the whole host list to an external tool such as
//! `httprobe` and read back the URLs it reports as reachable.

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use thiserror::Error;

use submergex_common::hostname::{self, HostnameSet};

use crate::process::{CommandRunner, Invocation, RunStatus};

/// Process-level failures. These trigger the built-in fallback; an empty
/// answer from a tool that ran fine does not.
#[derive(Debug, Error)]
pub enum ExternalFailure {
    #[error("could not stage host list: {0}")]
    Artifact(#[from] std::io::Error),
    #[error("{0}")]
    Launch(String),
}

#[derive(Debug, Clone)]
pub struct ExternalProbe {
    pub live: HostnameSet,
    pub timed_out: bool,
}

pub async fn probe(
    runner: &dyn CommandRunner,
    hosts: &HostnameSet,
    command: &str,
    timeout: Duration,
) -> Result<ExternalProbe, ExternalFailure> {
    // Removed from disk when dropped, on every return path.
    let artifact: NamedTempFile = stage_hosts(hosts)?;

    let invocation = Invocation::probing(command, timeout, artifact.path().to_path_buf());
    let output = runner.run(&invocation).await;

    if let RunStatus::LaunchFailed(reason) = &output.status {
        return Err(ExternalFailure::Launch(reason.clone()));
    }

    let live: HostnameSet = output
        .lines
        .iter()
        .filter_map(|line| hostname::host_from_url(line))
        .filter(|host| hosts.contains(host))
        .collect();

    Ok(ExternalProbe {
        live,
        timed_out: output.status == RunStatus::TimedOut,
    })
}

fn stage_hosts(hosts: &HostnameSet) -> std::io::Result<NamedTempFile> {
    let mut file: NamedTempFile = tempfile::Builder::new()
        .prefix("submergex-hosts-")
        .suffix(".txt")
        .tempfile()?;
    for host in hosts {
        writeln!(file, "{host}")?;
    }
    file.flush()?;
    Ok(file)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
