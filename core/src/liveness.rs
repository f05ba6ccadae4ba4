//! # Liveness Service
//!
//! Decides which enumerated hostnames answer over HTTP(S).
//!
//! Two interchangeable strategies:
//! * [`ProbeStrategy::External`] pipes the host list into a batch tool
//!   (`httprobe`, `httpx`, or a custom command).
//! * [`ProbeStrategy::Internal`] issues the HEAD requests itself with bounded
//!   concurrency.
//!
//! If the external tool cannot be run at all, the service re-runs the same
//! input through the internal strategy instead of failing the phase. Both
//! strategies only ever return hosts that were in the input.

pub mod external;
pub mod http;
pub mod internal;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use submergex_common::error::PipelineError;
use submergex_common::hostname::HostnameSet;
use submergex_common::{info, warn};

use crate::process::CommandRunner;
use external::ExternalFailure;
use http::HeadRequester;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStrategy {
    External { name: String, command: String },
    Internal,
}

impl fmt::Display for ProbeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStrategy::External { name, .. } => f.write_str(name),
            ProbeStrategy::Internal => f.write_str("built-in HTTP"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LivenessReport {
    pub live: HostnameSet,
    pub checked: usize,
    /// The strategy that produced `live`.
    pub strategy: ProbeStrategy,
    /// True when an external tool failed and the built-in prober took over.
    pub fell_back: bool,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl LivenessReport {
    pub fn live_rate(&self) -> f64 {
        if self.checked == 0 {
            return 0.0;
        }
        self.live.len() as f64 / self.checked as f64 * 100.0
    }

    pub fn require_live(&self) -> Result<&HostnameSet, PipelineError> {
        if self.live.is_empty() {
            return Err(PipelineError::NoLiveHosts {
                checked: self.checked,
            });
        }
        Ok(&self.live)
    }
}

pub struct LivenessService {
    runner: Arc<dyn CommandRunner>,
    requester: Arc<dyn HeadRequester>,
    concurrency: usize,
    command_timeout: Duration,
}

impl LivenessService {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        requester: Arc<dyn HeadRequester>,
        concurrency: usize,
        command_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            requester,
            concurrency,
            command_timeout,
        }
    }

    pub async fn probe(&self, hosts: &HostnameSet, strategy: &ProbeStrategy) -> LivenessReport {
        let started: Instant = Instant::now();

        let (live, used, fell_back, timed_out) = match strategy {
            ProbeStrategy::Internal => (self.probe_internal(hosts).await, strategy.clone(), false, false),
            ProbeStrategy::External { name, command } => {
                info!("Checking {} hosts with {name}: {command}", hosts.len());
                match external::probe(self.runner.as_ref(), hosts, command, self.command_timeout).await {
                    Ok(probe) => {
                        if probe.timed_out {
                            warn!(
                                "{name} timed out after {:.0}s, keeping {} live hosts seen so far",
                                self.command_timeout.as_secs_f64(),
                                probe.live.len()
                            );
                        }
                        (probe.live, strategy.clone(), false, probe.timed_out)
                    }
                    Err(failure) => {
                        self.report_fallback(name, &failure);
                        let live = self.probe_internal(hosts).await;
                        (live, ProbeStrategy::Internal, true, false)
                    }
                }
            }
        };

        LivenessReport {
            live,
            checked: hosts.len(),
            strategy: used,
            fell_back,
            timed_out,
            elapsed: started.elapsed(),
        }
    }

    async fn probe_internal(&self, hosts: &HostnameSet) -> HostnameSet {
        info!(
            "Checking {} hosts with built-in HTTP ({} concurrent)",
            hosts.len(),
            self.concurrency
        );
        let outcomes = internal::probe_all(Arc::clone(&self.requester), hosts, self.concurrency).await;
        internal::live_set(&outcomes)
    }

    fn report_fallback(&self, name: &str, failure: &ExternalFailure) {
        warn!("{name} could not run ({failure}), falling back to built-in HTTP checking");
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
