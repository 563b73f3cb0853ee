//! dnstxtjwt: signed tokens carried in DNS TXT records
//!
//! TXT character-strings are limited to 255 bytes, so a token is published
//! as a set of indexed frames (`"00:eyJhbGci..."`, `"01:..."`) and
//! reassembled by the consumer. A publisher uses [`create_record`]; a
//! consumer builds a [`Fetcher`] that looks the record up, reassembles it,
//! and verifies the token.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dnstxtjwt::jws::{Algorithm, ParseOption, VerifyingKey};
//! use dnstxtjwt::{Fetcher, FetcherOptions};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = VerifyingKey::from_base64url(Algorithm::Es256, "BNq...")?;
//!
//!     let fetcher = Fetcher::new(
//!         FetcherOptions::new("device-42.example.com")
//!             .timeout(Duration::from_secs(5))
//!             .parse_options([ParseOption::Key(key)]),
//!     )?;
//!
//!     let (token, payload) = fetcher.fetch().await?;
//!     println!("role: {:?}", token.get("role"));
//!     println!("payload: {}", String::from_utf8_lossy(&payload));
//!     Ok(())
//! }
//! ```
//!
//! ## Record Format
//!
//! ```text
//! ┌──────────┐  create_record   ┌───────────────┐   DNS    ┌──────────────┐
//! │  token   │─────────────────▶│ 00:chunk_0    │─────────▶│  reassemble  │
//! │ (JWS)    │                  │ 01:chunk_1    │ (any     │  + verify    │
//! └──────────┘                  │ nn:chunk_nn   │  order)  └──────────────┘
//!                               └───────────────┘
//! ```

pub mod config;
pub mod dns;
pub mod fetcher;
pub mod jws;
pub mod reassemble;
pub mod record;
pub mod resolver;

// Re-export core types
pub use config::{Config, FetchConfig, RecordConfig};
pub use fetcher::{FetchTimeout, Fetcher, FetcherOptions, DEFAULT_TIMEOUT};
pub use jws::{ParseOption, Token, TokenError};
pub use reassemble::reassemble;
pub use record::{create_record, RecordOptions};
pub use resolver::{ResolveError, Resolver, StaticResolver, SystemResolver};
pub use tokio_util::sync::CancellationToken;

use std::time::Duration;

/// dnstxtjwt error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing configuration or a record over its size budget
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The reassembled record is not a valid, trusted token
    #[error("invalid JWT: {0}")]
    InvalidToken(#[from] TokenError),

    /// The resolver failed
    #[error("TXT lookup failed: {0}")]
    Resolve(#[from] ResolveError),

    /// The lookup did not finish before the fetch timeout
    #[error("deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// The caller cancelled the fetch
    #[error("fetch cancelled")]
    Cancelled,
}

impl Error {
    /// True for resolver failures, deadlines and cancellation
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Resolve(_) | Error::DeadlineExceeded(_) | Error::Cancelled
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
