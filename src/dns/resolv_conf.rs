//! Nameserver discovery from `resolv.conf`

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

/// Default location of the system resolver configuration
pub const RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

/// Nameserver used when the system configuration names none
pub const FALLBACK_NAMESERVER: SocketAddr =
    SocketAddr::new(IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 53);

/// Extract `nameserver` entries from resolv.conf text.
///
/// Comments (`#`, `;`) and unparsable addresses are skipped. IPv6
/// zone suffixes (`fe80::1%eth0`) are dropped since the zone cannot be
/// expressed in a `SocketAddr` without a scope id lookup.
pub fn parse(text: &str) -> Vec<SocketAddr> {
    let mut servers = Vec::new();

    for line in text.lines() {
        let line = line.split(['#', ';']).next().unwrap_or("");
        let mut fields = line.split_whitespace();

        if fields.next() != Some("nameserver") {
            continue;
        }

        let Some(addr) = fields.next() else {
            continue;
        };
        let addr = addr.split('%').next().unwrap_or(addr);

        match addr.parse::<IpAddr>() {
            Ok(ip) => servers.push(SocketAddr::new(ip, 53)),
            Err(_) => log::trace!("ignoring unparsable nameserver {:?}", addr),
        }
    }

    servers
}

/// Read the nameservers configured at `path`, falling back to
/// [`FALLBACK_NAMESERVER`] when the file is missing or lists none.
pub async fn load(path: &Path) -> Vec<SocketAddr> {
    let servers = match tokio::fs::read_to_string(path).await {
        Ok(text) => parse(&text),
        Err(e) => {
            log::debug!("cannot read {}: {}", path.display(), e);
            Vec::new()
        }
    };

    if servers.is_empty() {
        vec![FALLBACK_NAMESERVER]
    } else {
        servers
    }
}
