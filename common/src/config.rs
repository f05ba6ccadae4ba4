use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::PipelineError;

pub const ENUMERATION_TIMEOUT: Duration = Duration::from_secs(300);
pub const PROBE_COMMAND_TIMEOUT: Duration = Duration::from_secs(900);
pub const PROBE_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(5_000);
pub const PROBE_CONCURRENCY: usize = 50;
pub const RECOMMENDED_TOOLS: &[&str] = &["subfinder", "assetfinder", "amass"];

const DEFAULT_PRODUCERS: &[(&str, &str)] = &[
    ("subfinder", "subfinder -d %s -silent"),
    ("assetfinder", "assetfinder --subs-only %s"),
    ("amass", "amass enum -passive -d %s"),
    ("findomain", "findomain -t %s -q"),
    (
        "crt.sh",
        "curl -s 'https://crt.sh/?q=%%25.%s&output=json' | jq -r '.[].name_value' | sort -u",
    ),
    ("sublist3r", "sublist3r -d %s -o /dev/stdout"),
];

const DEFAULT_PROBERS: &[(&str, &str)] = &[
    ("httprobe", "httprobe -c 50"),
    ("httpx", "httpx -silent -threads 100"),
];

static DOMAIN_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]{0,61}[a-zA-Z0-9]?\.[a-zA-Z]{2,}$")
        .expect("domain grammar is a valid regex")
});

pub struct Config {
    /// Hard wall-clock limit for each enumeration command.
    pub enumeration_timeout: Duration,
    /// Hard wall-clock limit for an external probing command.
    pub probe_command_timeout: Duration,
    /// Per-attempt connect/read timeout for the built-in HTTP prober.
    pub probe_timeout: Duration,
    /// Maximum number of in-flight built-in probes.
    pub probe_concurrency: usize,
    /// How producers are scheduled.
    pub execution: ExecutionMode,
    /// Interpreter used to run command lines (`<shell> -c <command>`).
    pub shell: String,
    /// Parent directory for run output folders.
    pub output_root: PathBuf,
    /// Skips writing result files.
    pub no_save: bool,
    /// 0 = full output, 1 = summaries only, 2 = bare results.
    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enumeration_timeout: ENUMERATION_TIMEOUT,
            probe_command_timeout: PROBE_COMMAND_TIMEOUT,
            probe_timeout: PROBE_ATTEMPT_TIMEOUT,
            probe_concurrency: PROBE_CONCURRENCY,
            execution: ExecutionMode::Sequential,
            shell: String::from("sh"),
            output_root: PathBuf::from("."),
            no_save: false,
            quiet: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One producer at a time, in selection order.
    Sequential,
    /// Up to `max_parallel` producers at once.
    Concurrent { max_parallel: usize },
}

/// An enumeration tool and the command line that drives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Producer {
    pub name: String,
    pub template: String,
}

impl Producer {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    /// Expands the template printf-style: `%s` becomes `domain`, `%%` a literal `%`.
    pub fn command_for(&self, domain: &str) -> String {
        let mut command = String::with_capacity(self.template.len() + domain.len());
        let mut chars = self.template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                command.push(c);
                continue;
            }
            match chars.peek() {
                Some('s') => {
                    chars.next();
                    command.push_str(domain);
                }
                Some('%') => {
                    chars.next();
                    command.push('%');
                }
                _ => command.push('%'),
            }
        }

        command
    }
}

/// Name → command-line tables for producers and external probers.
///
/// Built once at start-up and handed to whoever needs it; nothing looks it up
/// implicitly.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    producers: BTreeMap<String, String>,
    probers: BTreeMap<String, String>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        let table = |entries: &[(&str, &str)]| -> BTreeMap<String, String> {
            entries
                .iter()
                .map(|(name, cmd)| (name.to_string(), cmd.to_string()))
                .collect()
        };
        Self {
            producers: table(DEFAULT_PRODUCERS),
            probers: table(DEFAULT_PROBERS),
        }
    }
}

impl CommandRegistry {
    pub fn empty() -> Self {
        Self {
            producers: BTreeMap::new(),
            probers: BTreeMap::new(),
        }
    }

    /// Applies a `NAME=COMMAND` override. Names already registered as probers
    /// replace the prober; everything else is treated as a producer.
    ///
    /// Names are stored lowercase, the same form [`Self::select`] matches on.
    pub fn apply_override(&mut self, entry: &str) -> Result<(), PipelineError> {
        let Some((name, command)) = entry.split_once('=') else {
            return Err(PipelineError::InvalidOverride(entry.to_string()));
        };
        let (name, command): (String, &str) = (name.trim().to_ascii_lowercase(), command.trim());
        if name.is_empty() || command.is_empty() {
            return Err(PipelineError::InvalidOverride(entry.to_string()));
        }

        if self.probers.contains_key(&name) {
            self.probers.insert(name, command.to_string());
        } else {
            self.producers.insert(name, command.to_string());
        }
        Ok(())
    }

    pub fn with_prober(mut self, name: &str, command: &str) -> Self {
        self.probers.insert(name.to_string(), command.to_string());
        self
    }

    pub fn producer_names(&self) -> Vec<&str> {
        self.producers.keys().map(String::as_str).collect()
    }

    pub fn prober_names(&self) -> Vec<&str> {
        self.probers.keys().map(String::as_str).collect()
    }

    pub fn producer(&self, name: &str) -> Result<Producer, PipelineError> {
        self.producers
            .get(name)
            .map(|template| Producer::new(name, template.as_str()))
            .ok_or_else(|| PipelineError::UnknownTool {
                name: name.to_string(),
                known: self.producer_names().join(", "),
            })
    }

    pub fn prober(&self, name: &str) -> Result<&str, PipelineError> {
        self.probers
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::UnknownTool {
                name: name.to_string(),
                known: self.prober_names().join(", "),
            })
    }

    /// Resolves a selection string into producers.
    ///
    /// Accepted forms:
    /// * `all`
    /// * `recommended` (subfinder, assetfinder, amass)
    /// * a comma-separated list of 1-based indexes into [`Self::producer_names`]
    ///   and/or tool names, e.g. `1,3,crt.sh`
    pub fn select(&self, selection: &str) -> Result<Vec<Producer>, PipelineError> {
        let lowered: String = selection.trim().to_ascii_lowercase();
        let names: Vec<String> = match lowered.as_str() {
            "all" => self.producers.keys().cloned().collect(),
            "recommended" => RECOMMENDED_TOOLS.iter().map(|s| s.to_string()).collect(),
            _ => self.parse_list(&lowered)?,
        };

        names.iter().map(|name| self.producer(name)).collect()
    }

    fn parse_list(&self, list: &str) -> Result<Vec<String>, PipelineError> {
        let available: Vec<&str> = self.producer_names();
        let mut names: Vec<String> = Vec::new();

        for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let name: String = match part.parse::<usize>() {
                Ok(idx) if (1..=available.len()).contains(&idx) => available[idx - 1].to_string(),
                Ok(_) => return Err(PipelineError::InvalidSelection(list.to_string())),
                Err(_) => part.to_string(),
            };
            if !names.contains(&name) {
                names.push(name);
            }
        }

        if names.is_empty() {
            return Err(PipelineError::InvalidSelection(list.to_string()));
        }
        Ok(names)
    }
}

/// Checks the shape of a user supplied target domain.
pub fn validate_domain(domain: &str) -> Result<String, PipelineError> {
    let trimmed: &str = domain.trim();
    if DOMAIN_GRAMMAR.is_match(trimmed) {
        Ok(trimmed.to_ascii_lowercase())
    } else {
        Err(PipelineError::InvalidDomain(domain.to_string()))
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
