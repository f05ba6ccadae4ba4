//! # Subdomain Enumeration Service
//!
//! Fans a target domain out to every selected producer, then unions what they
//! return into one [`HostnameSet`].
//!
//! Producers are independent. A producer that times out contributes whatever it
//! printed before the deadline; one that fails to launch contributes nothing.
//! Neither outcome affects the remaining producers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use submergex_common::config::{ExecutionMode, Producer};
use submergex_common::error::PipelineError;
use submergex_common::hostname::HostnameSet;
use submergex_common::{info, success, warn};

use crate::process::{CommandRunner, Invocation, RunStatus};

/// Outcome of a single producer run.
#[derive(Debug, Clone)]
pub struct ProducerReport {
    pub name: String,
    pub command: String,
    pub found: usize,
    pub status: RunStatus,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct EnumerationReport {
    pub domain: String,
    pub hostnames: HostnameSet,
    pub producers: Vec<ProducerReport>,
    pub elapsed: Duration,
}

impl EnumerationReport {
    /// An empty result is terminal for the run: nothing downstream may start on it.
    pub fn require_hosts(&self) -> Result<&HostnameSet, PipelineError> {
        if self.hostnames.is_empty() {
            return Err(PipelineError::NoSubdomains {
                domain: self.domain.clone(),
            });
        }
        Ok(&self.hostnames)
    }

    pub fn tools(&self) -> Vec<&str> {
        self.producers.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn failed(&self) -> impl Iterator<Item = &ProducerReport> {
        self.producers
            .iter()
            .filter(|p| matches!(p.status, RunStatus::LaunchFailed(_)))
    }
}

pub struct EnumerationService {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    mode: ExecutionMode,
}

impl EnumerationService {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration, mode: ExecutionMode) -> Self {
        Self {
            runner,
            timeout,
            mode,
        }
    }

    /// Runs every producer exactly once against `domain` and unions the results.
    ///
    /// Zero producers, or producers that all come back empty, yield an empty
    /// set. Use [`EnumerationReport::require_hosts`] to turn that into an error.
    pub async fn enumerate(&self, domain: &str, producers: &[Producer]) -> EnumerationReport {
        let started: Instant = Instant::now();

        let runs: Vec<(ProducerReport, HostnameSet)> = match self.mode {
            ExecutionMode::Sequential => self.run_sequential(domain, producers).await,
            ExecutionMode::Concurrent { max_parallel } => {
                self.run_concurrent(domain, producers, max_parallel).await
            }
        };

        let mut hostnames: HostnameSet = HostnameSet::new();
        let mut reports: Vec<ProducerReport> = Vec::with_capacity(runs.len());
        for (report, found) in runs {
            hostnames.extend(found);
            reports.push(report);
        }

        EnumerationReport {
            domain: domain.to_string(),
            hostnames,
            producers: reports,
            elapsed: started.elapsed(),
        }
    }

    async fn run_sequential(
        &self,
        domain: &str,
        producers: &[Producer],
    ) -> Vec<(ProducerReport, HostnameSet)> {
        let total: usize = producers.len();
        let mut runs = Vec::with_capacity(total);

        for (idx, producer) in producers.iter().enumerate() {
            let command: String = producer.command_for(domain);
            info!("[{}/{}] Running: {}", idx + 1, total, command);
            let run = run_producer(self.runner.as_ref(), &producer.name, command, self.timeout).await;
            runs.push(run);
        }

        runs
    }

    async fn run_concurrent(
        &self,
        domain: &str,
        producers: &[Producer],
        max_parallel: usize,
    ) -> Vec<(ProducerReport, HostnameSet)> {
        let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
        let mut handles: Vec<(String, String, JoinHandle<(ProducerReport, HostnameSet)>)> =
            Vec::with_capacity(producers.len());

        for producer in producers {
            let command: String = producer.command_for(domain);
            info!("Scheduling {}: {}", producer.name, command);

            let runner: Arc<dyn CommandRunner> = Arc::clone(&self.runner);
            let semaphore: Arc<Semaphore> = Arc::clone(&semaphore);
            let name: String = producer.name.clone();
            let timeout: Duration = self.timeout;
            let task_command: String = command.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                run_producer(runner.as_ref(), &name, task_command, timeout).await
            });
            handles.push((producer.name.clone(), command, handle));
        }

        let mut runs = Vec::with_capacity(handles.len());
        for (name, command, handle) in handles {
            match handle.await {
                Ok(run) => runs.push(run),
                Err(e) => {
                    warn!("Producer {name} crashed: {e}");
                    let report = ProducerReport {
                        name,
                        command,
                        found: 0,
                        status: RunStatus::LaunchFailed(format!("task failed: {e}")),
                        elapsed: Duration::ZERO,
                    };
                    runs.push((report, HostnameSet::new()));
                }
            }
        }
        runs
    }
}

async fn run_producer(
    runner: &dyn CommandRunner,
    name: &str,
    command: String,
    timeout: Duration,
) -> (ProducerReport, HostnameSet) {
    let output = runner.run(&Invocation::enumeration(command.as_str(), timeout)).await;
    let found: HostnameSet = output.hostnames();
    let secs: f64 = output.elapsed.as_secs_f64();

    match &output.status {
        RunStatus::Completed => {
            success!("{name}: found {} subdomains in {secs:.2}s", found.len());
        }
        RunStatus::TimedOut => {
            warn!(
                "{name}: timed out after {secs:.2}s, keeping {} partial results ({command})",
                found.len()
            );
        }
        RunStatus::LaunchFailed(reason) => {
            warn!("{name}: contributed nothing, {reason} ({command})");
        }
    }

    let report = ProducerReport {
        name: name.to_string(),
        command,
        found: found.len(),
        status: output.status,
        elapsed: output.elapsed,
    };
    (report, found)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
