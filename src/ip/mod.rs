mod http;

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use thiserror::Error;
use tracing::{info, warn};

use crate::http::Transport;

/// The "what is my IP" endpoints, one per address family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub ipv4: Box<str>,
    pub ipv6: Box<str>,
}

/// The public addresses of this host as seen from the outside. Either family
/// may be missing, e.g. on a network without IPv6.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublicAddresses {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
}

#[derive(Debug, Error, Clone)]
pub enum DynamicIpError {
    #[error("unable to obtain IP using HTTP: {0}")]
    HttpFailure(Box<str>),

    #[error("the response {0:?} is not a valid address")]
    InvalidAddress(Box<str>),
}

impl fmt::Display for PublicAddresses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_none(ip: Option<impl fmt::Display>) -> String {
            ip.map(|ip| ip.to_string())
                .unwrap_or_else(|| String::from("(none)"))
        }

        write!(f, "IPv4 {}, IPv6 {}", or_none(self.ipv4), or_none(self.ipv6))
    }
}

/// Looks up both address families. The two lookups are independent and a
/// failure only leaves that family empty.
pub fn resolve(transport: &impl Transport, endpoints: &Endpoints) -> PublicAddresses {
    let ipv4 = http::get_address::<Ipv4Addr>(transport, &endpoints.ipv4)
        .map_err(|e| warn!("IPv4 lookup via {} failed: {}", endpoints.ipv4, e))
        .ok();

    let ipv6 = http::get_address::<Ipv6Addr>(transport, &endpoints.ipv6)
        .map_err(|e| warn!("IPv6 lookup via {} failed: {}", endpoints.ipv6, e))
        .ok();

    let addresses = PublicAddresses { ipv4, ipv6 };
    info!("Public addresses: {}", addresses);
    addresses
}
