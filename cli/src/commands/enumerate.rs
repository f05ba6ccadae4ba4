use colored::*;
use tracing::Instrument;

use submergex_common::config::{CommandRegistry, Config, ExecutionMode, Producer, validate_domain};
use submergex_common::{success, warn};
use submergex_core::enumeration::{EnumerationReport, EnumerationService};
use submergex_core::storage::{HostListKind, OutputFolder, RunSummary};

use crate::commands::{self, EnumerateArgs};
use crate::mprint;
use crate::terminal::{colors, format, print, spinner};

pub async fn enumerate(
    args: &EnumerateArgs,
    registry: &CommandRegistry,
    cfg: &Config,
) -> anyhow::Result<()> {
    let domain: String = validate_domain(&args.domain)?;
    let Some(report) = enumeration_phase(&domain, &args.tools, registry, cfg).await? else {
        return Ok(());
    };

    if cfg.no_save {
        return Ok(());
    }

    let mut folder = OutputFolder::create(&cfg.output_root, &domain)?;
    folder.save_hosts(&report.hostnames, HostListKind::All)?;
    folder.write_summary(&RunSummary {
        domain: &domain,
        tools: report.tools(),
        all: &report.hostnames,
        live: None,
    })?;
    Ok(())
}

/// Runs the selected producers and prints the phase summary.
///
/// `None` means nothing was found and the run should stop here.
pub async fn enumeration_phase(
    domain: &str,
    selection: &str,
    registry: &CommandRegistry,
    cfg: &Config,
) -> anyhow::Result<Option<EnumerationReport>> {
    let producers: Vec<Producer> = registry.select(selection)?;
    enumeration_starts(domain, &producers, cfg);

    let service = EnumerationService::new(commands::runner(cfg), cfg.enumeration_timeout, cfg.execution);
    let report: EnumerationReport = service
        .enumerate(domain, &producers)
        .instrument(spinner::phase("Enumerating subdomains", cfg.quiet))
        .await;

    if let Err(e) = report.require_hosts() {
        warn!("{e}");
        print::header("zero subdomains found", cfg.quiet);
        print::no_results();
        return Ok(None);
    }

    enumeration_ends(&report, cfg);
    Ok(Some(report))
}

fn enumeration_starts(domain: &str, producers: &[Producer], cfg: &Config) {
    print::header("subdomain enumeration", cfg.quiet);
    if cfg.quiet > 0 {
        return;
    }

    let names: Vec<&str> = producers.iter().map(|p| p.name.as_str()).collect();
    let mode: String = match cfg.execution {
        ExecutionMode::Sequential => String::from("sequential"),
        ExecutionMode::Concurrent { max_parallel } => format!("concurrent ({max_parallel} at once)"),
    };

    print::aligned_line("Target", domain.color(colors::HOST));
    print::aligned_line("Tools", names.join(", "));
    print::aligned_line("Mode", mode);
    print::aligned_line(
        "Timeout",
        format!("{}s per tool", cfg.enumeration_timeout.as_secs()),
    );
    mprint!();
}

fn enumeration_ends(report: &EnumerationReport, cfg: &Config) {
    if cfg.quiet >= 2 {
        for host in &report.hostnames {
            mprint!(host.as_str());
        }
        return;
    }

    print::header("enumeration results", cfg.quiet);
    if cfg.quiet == 0 {
        for (idx, producer) in report.producers.iter().enumerate() {
            print::tree_head(idx + 1, &producer.name);
            print::as_tree_one_level(vec![
                (String::from("Found"), producer.found.to_string().color(colors::HOST)),
                (String::from("Status"), format::run_status(&producer.status)),
                (String::from("Time"), format::duration(producer.elapsed)),
            ]);
        }
        mprint!();
        print::print_status("Discovered subdomains");
        print::as_tree_one_level(format::host_sample(&report.hostnames));
    }

    let output: String = format!(
        "Enumeration Complete: {} from {} tools in {}",
        format::count(report.hostnames.len(), "unique subdomains"),
        report.producers.len(),
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
