//! TXT lookup capability
//!
//! [`Resolver`] is the only network-facing dependency of a fetch. The
//! default is [`SystemResolver`], which asks the nameservers listed in
//! `/etc/resolv.conf`; tests and offline tooling use [`StaticResolver`] or
//! wrap a closure with [`resolver_fn`].

use crate::dns::message::DnsHeader;
use crate::dns::{resolv_conf, DnsError, DnsMessage, Rcode};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::io::Cursor;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio_util::sync::CancellationToken;

/// Per-nameserver query timeout used by [`SystemResolver`]
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// TXT lookup failures
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no such host: {0}")]
    NotFound(String),

    #[error("no nameservers configured")]
    NoNameservers,

    #[error("nameserver {server} answered {rcode}")]
    ServerFailure { server: SocketAddr, rcode: Rcode },

    #[error("nameserver {0} did not answer in time")]
    Timeout(SocketAddr),

    #[error("lookup cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DNS protocol error: {0}")]
    Protocol(#[from] DnsError),

    #[error("{0}")]
    Other(String),
}

/// Capability to look up the TXT strings of a name
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Return the TXT strings published under `name`, one per record.
    ///
    /// `cancel` fires when the caller stops waiting; implementations
    /// should give up promptly when it does.
    async fn lookup_txt(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<Vec<String>, ResolveError>;
}

/// Canonical zone key: lower case, no trailing dot
fn zone_key(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// In-memory resolver serving fixed TXT record sets
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    zones: HashMap<String, Vec<String>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `lines` as the TXT record set of `name`
    pub fn with_zone<S: Into<String>>(mut self, name: &str, lines: impl IntoIterator<Item = S>) -> Self {
        self.insert(name, lines);
        self
    }

    /// Replace the TXT record set of `name`
    pub fn insert<S: Into<String>>(&mut self, name: &str, lines: impl IntoIterator<Item = S>) {
        self.zones
            .insert(zone_key(name), lines.into_iter().map(Into::into).collect());
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn lookup_txt(
        &self,
        _cancel: &CancellationToken,
        name: &str,
    ) -> Result<Vec<String>, ResolveError> {
        self.zones
            .get(&zone_key(name))
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }
}

/// Resolver backed by an async closure, see [`resolver_fn`]
pub struct ResolverFn<F>(F);

/// Wrap `f` as a [`Resolver`]
///
/// ```rust
/// use dnstxtjwt::resolver::{resolver_fn, ResolveError};
///
/// let resolver = resolver_fn(|_cancel, name| async move {
///     Err::<Vec<String>, _>(ResolveError::NotFound(name))
/// });
/// # let _ = resolver;
/// ```
pub fn resolver_fn<F, Fut>(f: F) -> ResolverFn<F>
where
    F: Fn(CancellationToken, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<String>, ResolveError>> + Send,
{
    ResolverFn(f)
}

#[async_trait]
impl<F, Fut> Resolver for ResolverFn<F>
where
    F: Fn(CancellationToken, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<String>, ResolveError>> + Send,
{
    async fn lookup_txt(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<Vec<String>, ResolveError> {
        (self.0)(cancel.clone(), name.to_string()).await
    }
}

/// Stub resolver speaking plain DNS to recursive nameservers.
///
/// Queries go over UDP and are retried over TCP when the answer comes back
/// truncated. Nameservers are tried in order until one answers; NXDOMAIN
/// from any of them ends the lookup.
#[derive(Debug, Clone)]
pub struct SystemResolver {
    nameservers: Vec<SocketAddr>,
    resolv_conf: PathBuf,
    attempt_timeout: Duration,
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self {
            nameservers: Vec::new(),
            resolv_conf: PathBuf::from(resolv_conf::RESOLV_CONF_PATH),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl SystemResolver {
    /// Resolver using the nameservers from `/etc/resolv.conf`
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver using an explicit nameserver list
    pub fn with_nameservers(nameservers: Vec<SocketAddr>) -> Self {
        Self {
            nameservers,
            ..Self::default()
        }
    }

    /// Read nameservers from another resolv.conf
    pub fn with_resolv_conf(mut self, path: impl Into<PathBuf>) -> Self {
        self.resolv_conf = path.into();
        self
    }

    /// Time allowed for each nameserver to answer
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    async fn nameservers(&self) -> Vec<SocketAddr> {
        if self.nameservers.is_empty() {
            resolv_conf::load(&self.resolv_conf).await
        } else {
            self.nameservers.clone()
        }
    }

    async fn query(&self, server: SocketAddr, name: &str) -> Result<Vec<String>, ResolveError> {
        let id: u16 = rand::random();
        let query = DnsMessage::new_query(name, id).to_bytes()?;

        let mut raw = exchange_udp(server, &query, id).await?;
        if DnsHeader::parse(&mut Cursor::new(&raw[..]))?.is_truncated() {
            log::debug!("truncated answer from {}, retrying over TCP", server);
            raw = exchange_tcp(server, &query, id).await?;
        }

        let response = DnsMessage::parse(&raw)?;
        match response.header.rcode() {
            Rcode::NoError => Ok(response.txt_answers()?),
            Rcode::NxDomain => Err(ResolveError::NotFound(name.to_string())),
            rcode => Err(ResolveError::ServerFailure { server, rcode }),
        }
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn lookup_txt(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<Vec<String>, ResolveError> {
        let mut last_err = ResolveError::NoNameservers;

        for server in self.nameservers().await {
            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
                result = tokio::time::timeout(self.attempt_timeout, self.query(server, name)) => {
                    result.unwrap_or(Err(ResolveError::Timeout(server)))
                }
            };

            match result {
                Ok(lines) => {
                    log::debug!("{} answered {} TXT strings for {}", server, lines.len(), name);
                    return Ok(lines);
                }
                Err(e @ ResolveError::NotFound(_)) => return Err(e),
                Err(e) => {
                    log::debug!("TXT lookup for {} via {} failed: {}", name, server, e);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }
}

/// Parse just the header and check it answers query `id`
fn answers(raw: &[u8], id: u16) -> bool {
    DnsHeader::parse(&mut Cursor::new(raw))
        .map(|header| header.id == id && header.is_response())
        .unwrap_or(false)
}

async fn exchange_udp(server: SocketAddr, query: &[u8], id: u16) -> Result<Vec<u8>, ResolveError> {
    let local: SocketAddr = if server.is_ipv4() {
        "0.0.0.0:0"
    } else {
        "[::]:0"
    }
    .parse()
    .map_err(|e| ResolveError::Other(format!("bad local address: {}", e)))?;

    let socket = UdpSocket::bind(local).await?;
    socket.connect(server).await?;
    socket.send(query).await?;

    let mut buf = vec![0u8; 65535];
    loop {
        let n = socket.recv(&mut buf).await?;
        if answers(&buf[..n], id) {
            buf.truncate(n);
            return Ok(buf);
        }
        log::trace!("ignoring stray {} byte datagram from {}", n, server);
    }
}

async fn exchange_tcp(server: SocketAddr, query: &[u8], id: u16) -> Result<Vec<u8>, ResolveError> {
    let mut stream = TcpStream::connect(server).await?;

    // TCP DNS uses 2-byte length prefix
    let len = u16::try_from(query.len())
        .map_err(|_| ResolveError::Other("query too long for TCP".into()))?;
    let mut framed = Vec::with_capacity(2 + query.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(query);
    stream.write_all(&framed).await?;

    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;
    let mut response = vec![0u8; u16::from_be_bytes(len_buf) as usize];
    stream.read_exact(&mut response).await?;

    if !answers(&response, id) {
        return Err(DnsError::InvalidMessage("TCP answer does not match query".into()).into());
    }
    Ok(response)
}
