//! Built-in probing: one HEAD request per scheme per host, with at most `W`
//! hosts in flight.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

use submergex_common::hostname::{Hostname, HostnameSet};
use submergex_common::{success, warn};

use super::http::{self, HeadRequester, Scheme};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub host: Hostname,
    /// The scheme that answered first. `None` means dead.
    pub scheme: Option<Scheme>,
}

impl ProbeOutcome {
    pub fn is_live(&self) -> bool {
        self.scheme.is_some()
    }

    fn dead(host: Hostname) -> Self {
        Self { host, scheme: None }
    }
}

/// Tries HTTPS, then HTTP. Errors and non-2xx/3xx answers just move on.
pub async fn probe_host(requester: &dyn HeadRequester, host: Hostname) -> ProbeOutcome {
    for scheme in Scheme::PROBE_ORDER {
        let url: String = scheme.url_for(&host);
        match requester.head(&url).await {
            Ok(status) if http::is_success(status) => {
                return ProbeOutcome {
                    host,
                    scheme: Some(scheme),
                };
            }
            Ok(status) => debug!("{url} answered {status}"),
            Err(e) => debug!("{url} unreachable: {e:#}"),
        }
    }
    ProbeOutcome::dead(host)
}

/// Probes every host and waits for all of them.
///
/// Each host runs on its own task; a semaphore caps how many are past the
/// gate at once. A task that panics is logged and its host counted dead.
pub async fn probe_all(
    requester: Arc<dyn HeadRequester>,
    hosts: &HostnameSet,
    concurrency: usize,
) -> Vec<ProbeOutcome> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles: Vec<(Hostname, JoinHandle<ProbeOutcome>)> = Vec::with_capacity(hosts.len());

    for host in hosts {
        let requester: Arc<dyn HeadRequester> = Arc::clone(&requester);
        let semaphore: Arc<Semaphore> = Arc::clone(&semaphore);
        let task_host: Hostname = host.clone();

        let handle = tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let outcome: ProbeOutcome = probe_host(requester.as_ref(), task_host).await;
            if let Some(scheme) = outcome.scheme {
                success!("Live: {} ({scheme})", outcome.host);
            }
            outcome
        });
        handles.push((host.clone(), handle));
    }

    let mut outcomes: Vec<ProbeOutcome> = Vec::with_capacity(handles.len());
    for (host, handle) in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                warn!("Probe for {host} crashed: {e}");
                outcomes.push(ProbeOutcome::dead(host));
            }
        }
    }
    outcomes
}

pub fn live_set(outcomes: &[ProbeOutcome]) -> HostnameSet {
    outcomes
        .iter()
        .filter(|o| o.is_live())
        .map(|o| o.host.clone())
        .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
