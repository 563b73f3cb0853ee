// Minimal DNS wire support for TXT lookups
//
// Just enough of RFC 1035 to ask a recursive nameserver for the TXT
// records of one name and to read the answers back.

pub mod message;
pub mod resolv_conf;

pub use message::{DnsHeader, DnsMessage, DnsQuestion, DnsRecord, Rcode, TYPE_TXT, CLASS_IN};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DnsError {
    #[error("Invalid DNS message: {0}")]
    InvalidMessage(String),

    #[error("Truncated DNS message: {0}")]
    Truncated(&'static str),

    #[error("Domain name too long: {0} bytes")]
    NameTooLong(usize),

    #[error("Label too long: {0} bytes (max: 63)")]
    LabelTooLong(usize),
}

pub type Result<T> = std::result::Result<T, DnsError>;
