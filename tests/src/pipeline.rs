#![cfg(test)]
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use submergex_common::config::{CommandRegistry, ExecutionMode};
use submergex_common::hostname::normalize_lines;
use submergex_core::enumeration::EnumerationService;
use submergex_core::liveness::http::ReqwestRequester;
use submergex_core::liveness::{LivenessService, ProbeStrategy};
use submergex_core::storage::{self, HostListKind, OutputFolder, RunSummary, SUMMARY_FILE};

use crate::util::shell;

/// Enumerate with overridden tools, save, probe the saved list with `cat`, save again.
#[tokio::test]
async fn enumerate_save_probe_summarize() {
    let mut registry = CommandRegistry::empty().with_prober("cat", "cat");
    registry.apply_override("alpha=echo www.%s; echo api.%s").unwrap();
    registry.apply_override("beta=echo api.%s; echo dev.%s").unwrap();
    let producers = registry.select("all").unwrap();

    let enumeration = EnumerationService::new(shell(), Duration::from_secs(10), ExecutionMode::Sequential);
    let found = enumeration.enumerate("example.com", &producers).await;
    let all = found.require_hosts().unwrap().clone();
    assert_eq!(all.len(), 3);

    let base = tempfile::tempdir().unwrap();
    let mut folder = OutputFolder::create(base.path(), "example.com").unwrap();
    let all_file = folder.save_hosts(&all, HostListKind::All).unwrap().unwrap();

    let reloaded = storage::load_hosts(&all_file).unwrap();
    assert_eq!(reloaded, all);

    let liveness = LivenessService::new(
        shell(),
        Arc::new(ReqwestRequester::new(Duration::from_secs(1)).unwrap()),
        4,
        Duration::from_secs(10),
    );
    let strategy = ProbeStrategy::External {
        name: String::from("cat"),
        command: registry.prober("cat").unwrap().to_string(),
    };
    let probed = liveness.probe(&reloaded, &strategy).await;
    assert_eq!(probed.live, all);

    folder.save_hosts(&probed.live, HostListKind::Live).unwrap();
    folder.save_live_urls(&probed.live).unwrap();
    folder
        .write_summary(&RunSummary {
            domain: "example.com",
            tools: found.tools(),
            all: &all,
            live: Some(&probed.live),
        })
        .unwrap();

    let summary = fs::read_to_string(folder.path().join(SUMMARY_FILE)).unwrap();
    assert!(summary.contains("Tools used: alpha, beta"));
    assert!(summary.contains("Live subdomain rate: 100.0%"));
    assert!(folder.path().join("example.com_live_urls.txt").exists());
    for name in [
        "example.com_all_subdomains.txt",
        "example.com_live_subdomains.txt",
        "example.com_live_urls.txt",
    ] {
        assert!(summary.contains(&format!("- {name}\n")), "{name} missing from summary");
    }
    assert_eq!(
        normalize_lines(fs::read_to_string(folder.path().join("example.com_live_subdomains.txt")).unwrap().lines()),
        all
    );
}
