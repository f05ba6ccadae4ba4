use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::*;
use tracing::Instrument;

use submergex_common::config::{CommandRegistry, Config, validate_domain};
use submergex_common::hostname::HostnameSet;
use submergex_common::{success, warn};
use submergex_core::liveness::http::{HeadRequester, ReqwestRequester};
use submergex_core::liveness::{LivenessReport, LivenessService, ProbeStrategy};
use submergex_core::storage::{self, HostListKind, OutputFolder, RunSummary};
use submergex_core::tools;

use crate::commands::{self, ProbeArgs};
use crate::mprint;
use crate::terminal::{colors, format, print, spinner};

pub async fn probe(
    file: &Path,
    domain: Option<&str>,
    args: &ProbeArgs,
    registry: &CommandRegistry,
    cfg: &Config,
) -> anyhow::Result<()> {
    let hosts: HostnameSet = storage::load_hosts(file)
        .with_context(|| format!("could not read host list {}", file.display()))?;
    if hosts.is_empty() {
        warn!("No valid hostnames in {}", file.display());
        print::no_results();
        return Ok(());
    }

    let label: String = match domain {
        Some(domain) => validate_domain(domain)?,
        None => file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("hosts")),
    };

    let report: LivenessReport = probing_phase(&hosts, args, registry, cfg).await?;
    if cfg.no_save {
        return Ok(());
    }

    let mut folder = OutputFolder::create(&cfg.output_root, &label)?;
    folder.save_hosts(&report.live, HostListKind::Live)?;
    folder.save_live_urls(&report.live)?;
    folder.write_summary(&RunSummary {
        domain: &label,
        tools: Vec::new(),
        all: &hosts,
        live: Some(&report.live),
    })?;
    Ok(())
}

/// Probes `hosts` and prints the phase summary. An empty live set is reported, not an error.
pub async fn probing_phase(
    hosts: &HostnameSet,
    args: &ProbeArgs,
    registry: &CommandRegistry,
    cfg: &Config,
) -> anyhow::Result<LivenessReport> {
    let strategy: ProbeStrategy = choose_strategy(args, registry).await?;
    probing_starts(hosts, &strategy, cfg);

    let requester: Arc<dyn HeadRequester> = Arc::new(ReqwestRequester::new(cfg.probe_timeout)?);
    let service = LivenessService::new(
        commands::runner(cfg),
        requester,
        cfg.probe_concurrency,
        cfg.probe_command_timeout,
    );
    let report: LivenessReport = service
        .probe(hosts, &strategy)
        .instrument(spinner::phase("Probing hosts", cfg.quiet))
        .await;

    if let Err(e) = report.require_live() {
        warn!("{e}");
        print::header("zero live hosts", cfg.quiet);
        print::no_results();
        return Ok(report);
    }

    probing_ends(&report, cfg);
    Ok(report)
}

/// External prober when its binary is on `PATH`, built-in HTTP otherwise.
async fn choose_strategy(args: &ProbeArgs, registry: &CommandRegistry) -> anyhow::Result<ProbeStrategy> {
    let (name, command): (String, String) = match (&args.probe_command, args.prober.registry_name()) {
        (Some(command), _) => (String::from("custom prober"), command.clone()),
        (None, Some(name)) => (name.to_string(), registry.prober(name)?.to_string()),
        (None, None) => return Ok(ProbeStrategy::Internal),
    };

    let installed: bool = match tools::binary_of(&command) {
        Some(binary) => tools::is_installed(binary).await,
        None => false,
    };
    if !installed {
        warn!("{name} is not installed, using built-in HTTP probing");
        return Ok(ProbeStrategy::Internal);
    }

    Ok(ProbeStrategy::External { name, command })
}

fn probing_starts(hosts: &HostnameSet, strategy: &ProbeStrategy, cfg: &Config) {
    print::header("liveness probing", cfg.quiet);
    if cfg.quiet > 0 {
        return;
    }

    print::aligned_line("Hosts", hosts.len().to_string().color(colors::HOST));
    print::aligned_line("Prober", strategy.to_string());
    match strategy {
        ProbeStrategy::External { command, .. } => {
            print::aligned_line("Command", command.as_str());
            print::aligned_line(
                "Timeout",
                format!("{}s", cfg.probe_command_timeout.as_secs()),
            );
        }
        ProbeStrategy::Internal => {
            print::aligned_line("Concurrency", cfg.probe_concurrency.to_string());
            print::aligned_line(
                "Timeout",
                format!("{}ms per request", cfg.probe_timeout.as_millis()),
            );
        }
    }
    mprint!();
}

fn probing_ends(report: &LivenessReport, cfg: &Config) {
    if cfg.quiet >= 2 {
        for host in &report.live {
            mprint!(host.as_str());
        }
        return;
    }

    print::header("live hosts", cfg.quiet);
    if cfg.quiet == 0 {
        let mut details: Vec<(String, ColoredString)> = vec![
            (String::from("Prober"), report.strategy.to_string().normal()),
            (String::from("Checked"), report.checked.to_string().normal()),
            (String::from("Live"), report.live.len().to_string().color(colors::HOST)),
            (String::from("Rate"), format::rate(report.live_rate())),
        ];
        if report.fell_back {
            details.push((String::from("Note"), "external prober failed, used fallback".yellow()));
        }
        if report.timed_out {
            details.push((String::from("Note"), "prober timed out, results partial".yellow()));
        }
        print::as_tree_one_level(details);
        mprint!();
        print::print_status("Live subdomains");
        print::as_tree_one_level(format::host_sample(&report.live));
    }

    let output: String = format!(
        "Probing Complete: {} of {} ({}) in {}",
        format::count(report.live.len(), "live"),
        report.checked,
        format::rate(report.live_rate()),
        format::duration(report.elapsed)
    );

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => success!("{}", output),
    }
}
