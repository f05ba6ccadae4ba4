use std::fmt;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Method, redirect::Policy};

use submergex_common::hostname::Hostname;

pub const USER_AGENT: &str = concat!("SubMergeX/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Https,
    Http,
}

impl Scheme {
    /// HTTPS first; HTTP is only tried when HTTPS did not succeed.
    pub const PROBE_ORDER: [Scheme; 2] = [Scheme::Https, Scheme::Http];

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }

    pub fn url_for(self, host: &Hostname) -> String {
        format!("{}://{}", self.as_str(), host)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A response in `[200, 400)` counts as reachable.
pub fn is_success(status: u16) -> bool {
    (200..400).contains(&status)
}

/// Issues a single HEAD request and reports the final status code.
///
/// Any transport problem (DNS, connect, TLS, timeout) is an `Err`; the prober
/// treats it as "this scheme failed" and never propagates it.
#[async_trait]
pub trait HeadRequester: Send + Sync {
    async fn head(&self, url: &str) -> anyhow::Result<u16>;
}

/// `reqwest` backed requester: redirects followed, per-attempt timeout on
/// both connect and the whole exchange.
#[derive(Debug, Clone)]
pub struct ReqwestRequester {
    client: Client,
}

impl ReqwestRequester {
    pub fn new(attempt_timeout: Duration) -> anyhow::Result<Self> {
        let client: Client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .connect_timeout(attempt_timeout)
            .timeout(attempt_timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HeadRequester for ReqwestRequester {
    async fn head(&self, url: &str) -> anyhow::Result<u16> {
        let response = self.client.request(Method::HEAD, url).send().await?;
        Ok(response.status().as_u16())
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
