//! # Result Storage
//!
//! Writes run results into a per-run output folder and reads host lists back in.
//!
//! Layout of a run folder (`<domain>_SubMergeX_<timestamp>/`):
//! * `<domain>_all_subdomains.txt`
//! * `<domain>_live_subdomains.txt`
//! * `<domain>_live_urls.txt`
//! * `summary_report.txt`

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use submergex_common::error::PipelineError;
use submergex_common::hostname::{self, HostnameSet};
use submergex_common::success;

use crate::liveness::http::USER_AGENT;

pub const SUMMARY_FILE: &str = "summary_report.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostListKind {
    All,
    Live,
}

impl HostListKind {
    fn as_str(self) -> &'static str {
        match self {
            HostListKind::All => "all",
            HostListKind::Live => "live",
        }
    }

    fn title(self) -> &'static str {
        match self {
            HostListKind::All => "All",
            HostListKind::Live => "Live",
        }
    }
}

/// Everything the summary report needs to know about a run.
pub struct RunSummary<'a> {
    pub domain: &'a str,
    pub tools: Vec<&'a str>,
    pub all: &'a HostnameSet,
    pub live: Option<&'a HostnameSet>,
}

pub struct OutputFolder {
    path: PathBuf,
    domain: String,
    written: Vec<PathBuf>,
}

impl OutputFolder {
    /// Creates `<base>/<domain>_SubMergeX_<YYYYmmdd_HHMMSS>`.
    pub fn create(base: &Path, domain: &str) -> Result<Self, PipelineError> {
        let stamp: String = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let path: PathBuf = base.join(format!("{domain}_SubMergeX_{stamp}"));
        fs::create_dir_all(&path).map_err(|e| PipelineError::io(&path, e))?;
        success!("Created output folder: {}", path.display());

        Ok(Self {
            path,
            domain: domain.to_string(),
            written: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Files written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Writes a host list with a `#` header. Empty sets are skipped.
    pub fn save_hosts(
        &mut self,
        hosts: &HostnameSet,
        kind: HostListKind,
    ) -> Result<Option<PathBuf>, PipelineError> {
        if hosts.is_empty() {
            return Ok(None);
        }

        let mut lines: Vec<String> = vec![
            format!("# {} Subdomains for {}", kind.title(), self.domain),
            format!("# Generated on: {}", Local::now().to_rfc2822()),
            format!("# Total subdomains: {}", hosts.len()),
            format!("# Tool: {USER_AGENT}"),
            String::new(),
        ];
        lines.extend(hosts.iter().map(|host| host.to_string()));

        let file: PathBuf = self
            .path
            .join(format!("{}_{}_subdomains.txt", self.domain, kind.as_str()));
        self.write(&file, &lines)?;
        Ok(Some(file))
    }

    /// Writes `https://` and `http://` variants of every live host.
    pub fn save_live_urls(&mut self, live: &HostnameSet) -> Result<Option<PathBuf>, PipelineError> {
        if live.is_empty() {
            return Ok(None);
        }

        let mut lines: Vec<String> = vec![
            format!("# Live URLs for {}", self.domain),
            format!("# Generated on: {}", Local::now().to_rfc2822()),
            String::from("# Format: HTTP and HTTPS variants"),
            String::new(),
        ];
        for host in live {
            lines.push(format!("https://{host}"));
            lines.push(format!("http://{host}"));
        }

        let file: PathBuf = self.path.join(format!("{}_live_urls.txt", self.domain));
        self.write(&file, &lines)?;
        Ok(Some(file))
    }

    /// Writes the report; its file list is whatever this folder has written so far.
    pub fn write_summary(&mut self, summary: &RunSummary<'_>) -> Result<PathBuf, PipelineError> {
        let file: PathBuf = self.path.join(SUMMARY_FILE);
        let body: Vec<String> = render_summary(summary, &self.written, Local::now());
        self.write(&file, &body)?;
        Ok(file)
    }

    fn write(&mut self, file: &Path, lines: &[String]) -> Result<(), PipelineError> {
        let mut body: String = lines.join("\n");
        body.push('\n');
        fs::write(file, body).map_err(|e| PipelineError::io(file, e))?;
        success!("Saved {}", file.display());
        self.written.push(file.to_path_buf());
        Ok(())
    }
}

/// Reads a host list, skipping comments, blank lines and anything that is not a hostname.
pub fn load_hosts(path: &Path) -> Result<HostnameSet, PipelineError> {
    let content: String = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(hostname::normalize_lines(content.lines()))
}

/// Report lines. `files` are listed by name under OUTPUT FILES.
pub fn render_summary(
    summary: &RunSummary<'_>,
    files: &[PathBuf],
    generated: DateTime<Local>,
) -> Vec<String> {
    let mut out: Vec<String> = vec![
        String::from("SubMergeX Enumeration Summary Report"),
        String::from("====================================="),
        format!("Domain: {}", summary.domain),
        format!("Generated: {}", generated.to_rfc2822()),
        String::new(),
        String::from("STATISTICS:"),
        String::from("-----------"),
    ];
    if !summary.tools.is_empty() {
        out.push(format!("Tools used: {}", summary.tools.join(", ")));
    }
    out.push(format!("Total subdomains discovered: {}", summary.all.len()));
    if let Some(live) = summary.live {
        out.push(format!("Live subdomains found: {}", live.len()));
        if !summary.all.is_empty() {
            let rate: f64 = live.len() as f64 / summary.all.len() as f64 * 100.0;
            out.push(format!("Live subdomain rate: {rate:.1}%"));
        }
    }

    out.extend([
        String::new(),
        String::from("OUTPUT FILES:"),
        String::from("-------------"),
    ]);
    out.extend(
        files
            .iter()
            .filter_map(|file| file.file_name())
            .map(|name| format!("- {}", name.to_string_lossy())),
    );

    out.extend([
        String::new(),
        String::from("DISCOVERED SUBDOMAINS:"),
        String::from("----------------------"),
    ]);
    out.extend(summary.all.iter().map(|host| host.to_string()));

    if let Some(live) = summary.live.filter(|live| !live.is_empty()) {
        out.extend([
            String::new(),
            String::from("LIVE SUBDOMAINS:"),
            String::from("----------------"),
        ]);
        out.extend(live.iter().map(|host| host.to_string()));
    }

    out
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use submergex_common::hostname::normalize_lines;

    #[test]
    fn save_and_load_host_list() {
        let base = tempfile::tempdir().unwrap();
        let mut folder = OutputFolder::create(base.path(), "example.com").unwrap();
        let hosts = normalize_lines(["b.example.com", "a.example.com"]);

        let file = folder.save_hosts(&hosts, HostListKind::All).unwrap().unwrap();

        assert!(file.ends_with("example.com_all_subdomains.txt"));
        let content = fs::read_to_string(&file).unwrap();
        assert!(content.starts_with("# All Subdomains for example.com"));
        assert!(content.ends_with("a.example.com\nb.example.com\n"));
        assert_eq!(load_hosts(&file).unwrap(), hosts);
    }

    #[test]
    fn empty_sets_are_not_written() {
        let base = tempfile::tempdir().unwrap();
        let mut folder = OutputFolder::create(base.path(), "example.com").unwrap();

        assert!(folder.save_hosts(&HostnameSet::new(), HostListKind::Live).unwrap().is_none());
        assert!(folder.save_live_urls(&HostnameSet::new()).unwrap().is_none());
    }

    #[test]
    fn live_urls_list_both_schemes() {
        let base = tempfile::tempdir().unwrap();
        let mut folder = OutputFolder::create(base.path(), "example.com").unwrap();

        let file = folder
            .save_live_urls(&normalize_lines(["www.example.com"]))
            .unwrap()
            .unwrap();

        let content = fs::read_to_string(file).unwrap();
        assert!(content.contains("https://www.example.com\nhttp://www.example.com\n"));
    }

    #[test]
    fn load_hosts_skips_noise() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hosts.txt");
        fs::write(&file, "# header\n\nAPI.example.com\nnot a host\napi.example.com\n").unwrap();

        assert_eq!(load_hosts(&file).unwrap(), normalize_lines(["api.example.com"]));
        assert!(load_hosts(&dir.path().join("missing.txt")).is_err());
    }

    #[test]
    fn summary_reports_rate_and_files() {
        let all = normalize_lines(["a.example.com", "b.example.com", "c.example.com", "d.example.com"]);
        let live = normalize_lines(["a.example.com"]);
        let summary = RunSummary {
            domain: "example.com",
            tools: vec!["subfinder", "amass"],
            all: &all,
            live: Some(&live),
        };

        let files = vec![PathBuf::from("/tmp/run/example.com_live_urls.txt")];

        let text = render_summary(&summary, &files, Local::now()).join("\n");

        assert!(text.contains("Tools used: subfinder, amass"));
        assert!(text.contains("Total subdomains discovered: 4"));
        assert!(text.contains("Live subdomain rate: 25.0%"));
        assert!(text.contains("OUTPUT FILES:\n-------------\n- example.com_live_urls.txt\n\n"));
        assert!(text.ends_with("LIVE SUBDOMAINS:\n----------------\na.example.com"));
    }

    /// A run that starts from a host list never writes the all-subdomains file.
    #[test]
    fn summary_lists_only_files_written() {
        let base = tempfile::tempdir().unwrap();
        let mut folder = OutputFolder::create(base.path(), "hosts").unwrap();
        let all = normalize_lines(["a.example.com", "b.example.com"]);
        let live = normalize_lines(["a.example.com"]);

        folder.save_hosts(&live, HostListKind::Live).unwrap();
        folder.save_live_urls(&live).unwrap();
        let file = folder
            .write_summary(&RunSummary {
                domain: "hosts",
                tools: Vec::new(),
                all: &all,
                live: Some(&live),
            })
            .unwrap();

        let text = fs::read_to_string(file).unwrap();
        assert!(text.contains("- hosts_live_subdomains.txt\n- hosts_live_urls.txt\n"));
        assert!(!text.contains("hosts_all_subdomains.txt"));
        assert!(!folder.path().join("hosts_all_subdomains.txt").exists());
        assert!(!text.contains("Tools used"));
        assert!(text.contains("Total subdomains discovered: 2"));
        assert!(text.contains("Live subdomain rate: 50.0%"));
        assert_eq!(folder.written().len(), 3);
    }
}
