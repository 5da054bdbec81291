use std::time::Duration;

use clap::Parser;

use crate::ip::Endpoints;
use crate::services::namesilo;

pub const USER_AGENT: &str = concat!("silodyn/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_API_URL: &str = "https://www.namesilo.com/api";
pub const DEFAULT_IPV4_URL: &str = "https://ipv4.icanhazip.com";
pub const DEFAULT_IPV6_URL: &str = "https://ipv6.icanhazip.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Points the A and AAAA records of a NameSilo domain at this host's
/// current public addresses.
#[derive(Debug, Parser)]
#[command(name = "silodyn")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// NameSilo API key
    #[arg(long = "api-key", alias = "api_key", value_name = "KEY")]
    pub api_key: String,

    /// Domain whose records are updated, e.g. example.com
    #[arg(long)]
    pub domain: String,

    /// Base URL of the NameSilo API
    #[arg(long = "api-url", value_name = "URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Endpoint answering with this host's public IPv4 address
    #[arg(long = "ipv4-url", value_name = "URL", default_value = DEFAULT_IPV4_URL)]
    pub ipv4_url: String,

    /// Endpoint answering with this host's public IPv6 address
    #[arg(long = "ipv6-url", value_name = "URL", default_value = DEFAULT_IPV6_URL)]
    pub ipv6_url: String,

    /// Timeout of every HTTP request, in seconds
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Update A/AAAA records even if they already hold the current address
    #[arg(long)]
    pub force: bool,

    /// Look up addresses and records, but don't change anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            ipv4: self.ipv4_url.as_str().into(),
            ipv6: self.ipv6_url.as_str().into(),
        }
    }
}

impl From<&Cli> for namesilo::Config {
    fn from(cli: &Cli) -> Self {
        Self {
            api_url: cli.api_url.as_str().into(),
            api_key: cli.api_key.as_str().into(),
            domain: cli.domain.as_str().into(),
            force: cli.force,
            dry_run: cli.dry_run,
        }
    }
}
