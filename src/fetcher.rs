//! Fetching and verifying a token published in DNS
//!
//! A [`Fetcher`] looks up the TXT record set of one name, reassembles the
//! frames and verifies the resulting token. The lookup runs on its own
//! task and races a deadline and the caller's cancellation token; the
//! first of the three to finish decides the outcome.

use crate::jws::{self, ParseOption, Token};
use crate::reassemble::reassemble;
use crate::resolver::{ResolveError, Resolver, SystemResolver};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Timeout applied when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a fetch may wait for the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchTimeout {
    /// [`DEFAULT_TIMEOUT`]
    #[default]
    Default,
    /// Wait indefinitely
    Disabled,
    /// Give up after this long; a zero duration means [`DEFAULT_TIMEOUT`]
    After(Duration),
}

impl From<Duration> for FetchTimeout {
    fn from(timeout: Duration) -> Self {
        if timeout.is_zero() {
            FetchTimeout::Default
        } else {
            FetchTimeout::After(timeout)
        }
    }
}

impl FetchTimeout {
    /// The effective deadline, `None` when disabled
    pub fn duration(self) -> Option<Duration> {
        match self {
            FetchTimeout::Default => Some(DEFAULT_TIMEOUT),
            FetchTimeout::Disabled => None,
            FetchTimeout::After(d) if d.is_zero() => Some(DEFAULT_TIMEOUT),
            FetchTimeout::After(d) => Some(d),
        }
    }
}

/// Configuration for [`Fetcher::new`]
#[derive(Clone, Default)]
pub struct FetcherOptions {
    /// Name whose TXT record carries the token (required, used as given)
    pub fqdn: String,

    /// Resolver override; `None` uses [`SystemResolver`]
    pub resolver: Option<Arc<dyn Resolver>>,

    /// Deadline for the TXT lookup
    pub timeout: FetchTimeout,

    /// Options handed to the token parser
    pub parse_options: Vec<ParseOption>,
}

impl FetcherOptions {
    pub fn new(fqdn: impl Into<String>) -> Self {
        Self {
            fqdn: fqdn.into(),
            ..Self::default()
        }
    }

    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn timeout(mut self, timeout: impl Into<FetchTimeout>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Append token parse options
    pub fn parse_options(mut self, options: impl IntoIterator<Item = ParseOption>) -> Self {
        self.parse_options.extend(options);
        self
    }
}

impl fmt::Debug for FetcherOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherOptions")
            .field("fqdn", &self.fqdn)
            .field("resolver", &self.resolver.as_ref().map(|_| ".."))
            .field("timeout", &self.timeout)
            .field("parse_options", &self.parse_options)
            .finish()
    }
}

/// Fetches and validates a token published as a TXT record set
pub struct Fetcher {
    fqdn: String,
    resolver: Arc<dyn Resolver>,
    timeout: Option<Duration>,
    parse_options: Vec<ParseOption>,
}

impl Fetcher {
    /// Apply defaults to `options` and validate them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the FQDN is empty.
    pub fn new(options: FetcherOptions) -> Result<Self> {
        let FetcherOptions {
            fqdn,
            resolver,
            timeout,
            parse_options,
        } = options;

        if fqdn.trim().is_empty() {
            return Err(Error::InvalidInput("fqdn must be set".into()));
        }

        let resolver = resolver.unwrap_or_else(|| Arc::new(SystemResolver::new()));

        Ok(Self {
            fqdn,
            resolver,
            timeout: timeout.duration(),
            parse_options,
        })
    }

    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    /// Effective lookup deadline, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Fetch the TXT record, reassemble it and verify it as a token.
    ///
    /// Returns the parsed token and the token's raw payload bytes.
    pub async fn fetch(&self) -> Result<(Token, Vec<u8>)> {
        self.fetch_with(&CancellationToken::new()).await
    }

    /// Like [`Fetcher::fetch`], giving up with [`Error::Cancelled`] once
    /// `cancel` fires.
    pub async fn fetch_with(&self, cancel: &CancellationToken) -> Result<(Token, Vec<u8>)> {
        let lines = self.fetch_lines(cancel).await?;
        let txt = reassemble(&lines);

        self.verify(cancel, &txt)
    }

    /// Look up the raw TXT strings without decoding them.
    ///
    /// The resolver is handed a child of `cancel` that fires when the
    /// deadline passes or the wait is abandoned, and its task is aborted.
    /// A resolver that blocks its thread without yielding keeps running
    /// until it returns; its result is discarded.
    pub async fn fetch_lines(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let (tx, rx) = oneshot::channel();
        let lookup_cancel = cancel.child_token();
        let resolver = Arc::clone(&self.resolver);
        let fqdn = self.fqdn.clone();
        let task_cancel = lookup_cancel.clone();

        log::debug!("looking up TXT record for {} (timeout {:?})", self.fqdn, self.timeout);

        let handle = tokio::spawn(async move {
            let result = resolver.lookup_txt(&task_cancel, &fqdn).await;
            // The receiver is gone if the caller stopped waiting.
            let _ = tx.send(result);
        });
        let _guard = LookupGuard {
            cancel: lookup_cancel,
            handle,
        };

        let timeout = self.timeout;
        let deadline = async move {
            match timeout {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            result = rx => match result {
                Ok(Ok(lines)) => {
                    log::debug!("{} returned {} TXT strings", self.fqdn, lines.len());
                    Ok(lines)
                }
                Ok(Err(_)) if cancel.is_cancelled() => Err(Error::Cancelled),
                Ok(Err(e)) => {
                    log::debug!("TXT lookup for {} failed: {}", self.fqdn, e);
                    Err(Error::Resolve(e))
                }
                Err(_) => Err(Error::Resolve(ResolveError::Other(
                    "lookup task ended without a result".into(),
                ))),
            },
            _ = deadline => {
                let elapsed = timeout.unwrap_or_default();
                log::warn!("TXT lookup for {} exceeded {:?}", self.fqdn, elapsed);
                Err(Error::DeadlineExceeded(elapsed))
            }
            _ = cancel.cancelled() => Err(Error::Cancelled),
        }
    }

    /// Parse the reassembled text as a token and extract its payload.
    fn verify(&self, cancel: &CancellationToken, txt: &str) -> Result<(Token, Vec<u8>)> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let input = txt.as_bytes();
        let token = jws::parse(input, &self.parse_options)?;

        // Taken from the raw text so callers get the exact bytes that were signed.
        let payload = jws::payload(input)?;

        Ok((token, payload))
    }
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("fqdn", &self.fqdn)
            .field("timeout", &self.timeout)
            .field("parse_options", &self.parse_options)
            .finish_non_exhaustive()
    }
}

/// Stops the lookup task when the caller is done waiting on it
struct LookupGuard {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Drop for LookupGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}
