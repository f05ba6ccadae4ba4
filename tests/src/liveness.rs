#![cfg(test)]
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use submergex_common::hostname::{Hostname, normalize_lines};
use submergex_core::liveness::http::{HeadRequester, ReqwestRequester};
use submergex_core::liveness::internal::probe_host;
use submergex_core::liveness::{LivenessService, ProbeStrategy};

use crate::util::{LocalRedirect, Recorded, http_server, shell, silent_server};

const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

fn reqwest() -> Arc<dyn HeadRequester> {
    Arc::new(ReqwestRequester::new(Duration::from_secs(2)).unwrap())
}

fn external(command: &str) -> ProbeStrategy {
    ProbeStrategy::External {
        name: String::from("test-prober"),
        command: command.to_string(),
    }
}

#[tokio::test]
async fn reqwest_reports_final_status() {
    let addr = http_server().await;
    let requester = reqwest();

    assert_eq!(requester.head(&format!("http://{addr}/ok")).await.unwrap(), 200);
    assert_eq!(requester.head(&format!("http://{addr}/moved")).await.unwrap(), 200);
    assert_eq!(requester.head(&format!("http://{addr}/missing")).await.unwrap(), 404);
}

#[tokio::test]
async fn builtin_probe_over_real_http() {
    let addr = http_server().await;
    let requester: Arc<dyn HeadRequester> = Arc::new(LocalRedirect {
        inner: reqwest(),
        addr,
        live: vec!["up.example.com"],
    });
    let service = LivenessService::new(shell(), requester, 4, COMMAND_TIMEOUT);
    let hosts = normalize_lines(["up.example.com", "down.example.com"]);

    let report = service.probe(&hosts, &ProbeStrategy::Internal).await;

    assert_eq!(report.live, normalize_lines(["up.example.com"]));
    assert_eq!(report.live_rate(), 50.0);
}

/// Tool prints URLs, including one it was never asked about.
#[tokio::test]
async fn external_output_is_limited_to_input() {
    let addr = http_server().await;
    let requester: Arc<dyn HeadRequester> = Arc::new(LocalRedirect {
        inner: reqwest(),
        addr,
        live: vec![],
    });
    let service = LivenessService::new(shell(), requester, 4, COMMAND_TIMEOUT);
    let hosts = normalize_lines(["a.example.com", "b.example.com"]);

    let report = service
        .probe(
            &hosts,
            &external("sed 's|^|https://|'; echo https://intruder.example.org"),
        )
        .await;

    assert!(!report.fell_back);
    assert_eq!(report.live, hosts);
}

#[tokio::test]
async fn unavailable_prober_falls_back_to_builtin() {
    let addr = http_server().await;
    let requester: Arc<dyn HeadRequester> = Arc::new(LocalRedirect {
        inner: reqwest(),
        addr,
        live: vec!["up.example.com"],
    });
    let service = LivenessService::new(shell(), requester, 4, COMMAND_TIMEOUT);
    let hosts = normalize_lines(["up.example.com", "down.example.com"]);

    let fallback = service
        .probe(&hosts, &external("submergex-no-such-prober -c 50"))
        .await;
    let builtin = service.probe(&hosts, &ProbeStrategy::Internal).await;

    assert!(fallback.fell_back);
    assert_eq!(fallback.strategy, ProbeStrategy::Internal);
    assert_eq!(fallback.live, builtin.live);
}

#[tokio::test]
async fn slow_prober_keeps_what_it_printed() {
    let addr = http_server().await;
    let requester: Arc<dyn HeadRequester> = Arc::new(LocalRedirect {
        inner: reqwest(),
        addr,
        live: vec![],
    });
    let service = LivenessService::new(shell(), requester, 4, Duration::from_secs(1));
    let hosts = normalize_lines(["a.example.com", "b.example.com"]);

    let report = service
        .probe(&hosts, &external("head -n 1 | sed 's|^|http://|'; sleep 30"))
        .await;

    assert!(report.timed_out);
    assert!(!report.fell_back);
    assert_eq!(report.live, normalize_lines(["a.example.com"]));
}

/// A server that accepts and never answers costs one request timeout per scheme.
#[tokio::test]
async fn silent_server_costs_one_timeout_per_scheme() {
    let attempt = Duration::from_millis(300);
    let requester = Recorded {
        inner: Arc::new(ReqwestRequester::new(attempt).unwrap()),
        addr: silent_server().await,
        asked: Mutex::new(Vec::new()),
    };
    let host = Hostname::parse("stalled.example.com").unwrap();

    let started = Instant::now();
    let outcome = probe_host(&requester, host).await;
    let elapsed = started.elapsed();

    assert!(!outcome.is_live());
    assert_eq!(
        *requester.asked.lock().unwrap(),
        vec!["https://stalled.example.com", "http://stalled.example.com"]
    );
    assert!(elapsed >= attempt * 2 - Duration::from_millis(50), "took {elapsed:?}");
    assert!(elapsed < attempt * 3, "took {elapsed:?}");
}
