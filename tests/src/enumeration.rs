#![cfg(test)]
use std::time::Duration;

use submergex_common::config::{ExecutionMode, Producer};
use submergex_common::error::PipelineError;
use submergex_common::hostname::normalize_lines;
use submergex_core::enumeration::EnumerationService;
use submergex_core::process::RunStatus;

use crate::util::shell;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Echo producer that repeats a name in another case: both spellings collapse to one.
#[tokio::test]
async fn echo_producer_is_normalized() {
    let service = EnumerationService::new(shell(), TIMEOUT, ExecutionMode::Sequential);
    let producers = vec![Producer::new(
        "echo",
        "echo a.%s; echo b.%s; echo A.%s; echo '#comment'; echo",
    )];

    let report = service.enumerate("example.com", &producers).await;

    assert_eq!(
        report.hostnames,
        normalize_lines(["a.example.com", "b.example.com"])
    );
    assert_eq!(report.producers[0].status, RunStatus::Completed);
    assert_eq!(report.producers[0].found, 2);
}

#[tokio::test]
async fn producers_are_unioned_in_both_modes() {
    let producers = vec![
        Producer::new("first", "printf 'a.%s\\nshared.%s\\n'"),
        Producer::new("second", "echo shared.%s; echo c.%s 1>&2"),
    ];
    let expected = normalize_lines(["a.example.com", "shared.example.com", "c.example.com"]);

    for mode in [
        ExecutionMode::Sequential,
        ExecutionMode::Concurrent { max_parallel: 2 },
    ] {
        let service = EnumerationService::new(shell(), TIMEOUT, mode);
        let report = service.enumerate("example.com", &producers).await;

        assert_eq!(report.hostnames, expected, "mode {mode:?}");
        assert_eq!(report.tools(), vec!["first", "second"]);
    }
}

#[tokio::test]
async fn slow_producer_keeps_partial_output() {
    let service = EnumerationService::new(shell(), Duration::from_secs(1), ExecutionMode::Sequential);
    let producers = vec![
        Producer::new("slow", "echo early.%s; sleep 30; echo late.%s"),
        Producer::new("fast", "echo fast.%s"),
    ];

    let report = service.enumerate("example.com", &producers).await;

    assert_eq!(
        report.hostnames,
        normalize_lines(["early.example.com", "fast.example.com"])
    );
    assert_eq!(report.producers[0].status, RunStatus::TimedOut);
    assert!(report.elapsed < Duration::from_secs(10));
}

#[tokio::test]
async fn missing_tool_does_not_stop_the_others() {
    let service = EnumerationService::new(
        shell(),
        TIMEOUT,
        ExecutionMode::Concurrent { max_parallel: 4 },
    );
    let producers = vec![
        Producer::new("ghost", "submergex-no-such-tool -d %s"),
        Producer::new("echo", "echo www.%s"),
    ];

    let report = service.enumerate("example.com", &producers).await;

    assert_eq!(report.hostnames, normalize_lines(["www.example.com"]));
    assert_eq!(report.failed().map(|p| p.name.as_str()).collect::<Vec<_>>(), vec!["ghost"]);
}

#[tokio::test]
async fn nothing_found_is_terminal() {
    let service = EnumerationService::new(shell(), TIMEOUT, ExecutionMode::Sequential);
    let producers = vec![
        Producer::new("silent", "true"),
        Producer::new("ghost", "submergex-no-such-tool %s"),
    ];

    let report = service.enumerate("example.com", &producers).await;

    assert!(matches!(
        report.require_hosts(),
        Err(PipelineError::NoSubdomains { domain }) if domain == "example.com"
    ));
}
