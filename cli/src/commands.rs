pub mod enumerate;
pub mod probe;
pub mod run;
pub mod tools;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use submergex_common::config::{CommandRegistry, Config, ExecutionMode};
use submergex_core::process::{CommandRunner, ShellRunner};

#[derive(Parser)]
#[command(name = "submergex")]
#[command(version)]
#[command(about = "Subdomain enumeration and liveness probing.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Less output; -qq prints bare results only
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,

    /// More log detail; -vv for trace
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Add or replace a tool: NAME=COMMAND (use %s for the domain)
    #[arg(long = "command", value_name = "NAME=COMMAND", global = true)]
    pub overrides: Vec<String>,

    /// Parent directory for run output folders
    #[arg(short, long, default_value = ".", global = true)]
    pub output: PathBuf,

    /// Do not write any result files
    #[arg(long, global = true)]
    pub no_save: bool,

    /// Interpreter used to run tool command lines
    #[arg(long, default_value = "sh", global = true)]
    pub shell: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enumerate subdomains of a domain
    #[command(alias = "e")]
    Enumerate(EnumerateArgs),
    /// Check which hosts from a file answer over HTTP(S)
    #[command(alias = "p")]
    Probe {
        /// Host list, one name per line
        file: PathBuf,
        /// Domain used to name the output files
        #[arg(long)]
        domain: Option<String>,
        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// Enumerate, then probe the results
    #[command(alias = "r")]
    Run {
        #[command(flatten)]
        enumerate: EnumerateArgs,
        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// List known tools and whether they are installed
    #[command(alias = "t")]
    Tools,
}

#[derive(Args)]
pub struct EnumerateArgs {
    pub domain: String,

    /// all, recommended, or a comma list of numbers/names from `tools`
    #[arg(short, long, default_value = "recommended")]
    pub tools: String,

    /// Per-tool time limit in seconds
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,

    /// Run up to N tools at once instead of one after another
    #[arg(long, value_name = "N")]
    pub parallel: Option<usize>,
}

#[derive(Args)]
pub struct ProbeArgs {
    /// Prober to use; falls back to builtin when unavailable
    #[arg(long, value_enum, default_value_t = ProberChoice::Httprobe)]
    pub prober: ProberChoice,

    /// Custom prober command line; hosts are fed on stdin
    #[arg(long, value_name = "COMMAND", conflicts_with = "prober")]
    pub probe_command: Option<String>,

    /// Concurrent requests for the builtin prober
    #[arg(long, default_value_t = 50)]
    pub concurrency: usize,

    /// Per-request timeout for the builtin prober, in milliseconds
    #[arg(long, default_value_t = 5_000)]
    pub probe_timeout_ms: u64,

    /// Time limit for an external prober run, in seconds
    #[arg(long, default_value_t = 900)]
    pub probe_command_timeout: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProberChoice {
    Httprobe,
    Httpx,
    Builtin,
}

impl ProberChoice {
    pub fn registry_name(self) -> Option<&'static str> {
        match self {
            ProberChoice::Httprobe => Some("httprobe"),
            ProberChoice::Httpx => Some("httpx"),
            ProberChoice::Builtin => None,
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Settings shared by every subcommand; phase arguments are layered on with `apply`.
    pub fn config(&self) -> Config {
        Config {
            shell: self.shell.clone(),
            output_root: self.output.clone(),
            no_save: self.no_save,
            quiet: self.quiet,
            ..Config::default()
        }
    }

    pub fn registry(&self) -> anyhow::Result<CommandRegistry> {
        let mut registry = CommandRegistry::default();
        for entry in &self.overrides {
            registry.apply_override(entry)?;
        }
        Ok(registry)
    }
}

impl EnumerateArgs {
    pub fn apply(&self, cfg: &mut Config) {
        cfg.enumeration_timeout = Duration::from_secs(self.timeout);
        cfg.execution = match self.parallel {
            Some(max_parallel) if max_parallel > 1 => ExecutionMode::Concurrent { max_parallel },
            _ => ExecutionMode::Sequential,
        };
    }
}

impl ProbeArgs {
    pub fn apply(&self, cfg: &mut Config) {
        cfg.probe_concurrency = self.concurrency.max(1);
        cfg.probe_timeout = Duration::from_millis(self.probe_timeout_ms);
        cfg.probe_command_timeout = Duration::from_secs(self.probe_command_timeout);
    }
}

pub fn runner(cfg: &Config) -> Arc<dyn CommandRunner> {
    Arc::new(ShellRunner::new(cfg.shell.clone()))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
