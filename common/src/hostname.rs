//! # Hostname Model
//!
//! Every hostname that enters the pipeline passes through [`Hostname::parse`].
//! A `Hostname` can only be built by that parser, so anything stored in a
//! [`HostnameSet`] is trimmed, grammar-checked and lowercase.
//!
//! Accepted grammar: `label(.label)+` where each label is alphanumeric with
//! optional internal hyphens and the final label is alphabetic with at least
//! two characters.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Unique, normalized hostnames. Iteration order is sorted, which keeps file
/// output stable, but nothing in the pipeline depends on it.
pub type HostnameSet = BTreeSet<Hostname>;

static HOSTNAME_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)*\.[a-z]{2,}$")
        .expect("hostname grammar is a valid regex")
});

const MIN_LEN: usize = 4;
const COMMENT_PREFIX: char = '#';

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hostname(String);

impl Hostname {
    /// Validates and canonicalizes one raw line of tool output.
    ///
    /// Returns `None` for blank lines, `#` comments and anything that does not
    /// match the hostname grammar. Rejection is a filtering decision, not an error.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed: &str = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
            return None;
        }

        let lowered: String = trimmed.to_ascii_lowercase();
        if lowered.len() < MIN_LEN || !HOSTNAME_GRAMMAR.is_match(&lowered) {
            return None;
        }

        Some(Self(lowered))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Hostname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Runs every line through [`Hostname::parse`] and keeps the accepted ones.
pub fn normalize_lines<I, S>(lines: I) -> HostnameSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| Hostname::parse(line.as_ref()))
        .collect()
}

/// Recovers the bare hostname from a URL-ish line such as
/// `https://user@Api.Example.com:8443/login?next=/`.
///
/// Only the scheme, userinfo, port and everything after the authority are
/// removed; the remainder still has to pass [`Hostname::parse`].
pub fn host_from_url(line: &str) -> Option<Hostname> {
    let trimmed: &str = line.trim();
    let without_scheme: &str = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);

    let authority: &str = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let authority: &str = authority.rsplit('@').next().unwrap_or(authority);
    let host: &str = match authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    };

    Hostname::parse(host)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
