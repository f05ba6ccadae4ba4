use submergex_common::config::{CommandRegistry, Config, validate_domain};
use submergex_common::success;
use submergex_core::liveness::LivenessReport;
use submergex_core::storage::{HostListKind, OutputFolder, RunSummary};

use crate::commands::enumerate::enumeration_phase;
use crate::commands::probe::probing_phase;
use crate::commands::{EnumerateArgs, ProbeArgs};
use crate::terminal::print;

/// Full workflow: enumerate, save, probe, save, summarize.
///
/// The all-subdomains file is written before probing starts so a long probe
/// never costs the enumeration results.
pub async fn run(
    enumerate: &EnumerateArgs,
    probe: &ProbeArgs,
    registry: &CommandRegistry,
    cfg: &Config,
) -> anyhow::Result<()> {
    let domain: String = validate_domain(&enumerate.domain)?;
    let Some(enumerated) = enumeration_phase(&domain, &enumerate.tools, registry, cfg).await? else {
        return Ok(());
    };

    let folder: Option<OutputFolder> = match cfg.no_save {
        true => None,
        false => {
            let mut folder = OutputFolder::create(&cfg.output_root, &domain)?;
            folder.save_hosts(&enumerated.hostnames, HostListKind::All)?;
            Some(folder)
        }
    };

    let liveness: LivenessReport = probing_phase(&enumerated.hostnames, probe, registry, cfg).await?;

    if let Some(mut folder) = folder {
        folder.save_hosts(&liveness.live, HostListKind::Live)?;
        folder.save_live_urls(&liveness.live)?;
        folder.write_summary(&RunSummary {
            domain: &domain,
            tools: enumerated.tools(),
            all: &enumerated.hostnames,
            live: Some(&liveness.live),
        })?;
        success!("Results saved in {}", folder.path().display());
    }

    if cfg.quiet == 0 {
        print::end_of_program();
    }
    Ok(())
}
