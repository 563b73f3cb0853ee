//! Compact JWS tokens
//!
//! Parsing, signature verification and claim validation for the signed
//! JWTs carried in TXT records, plus a [`Signer`] for publishers.
//!
//! A token is `b64url(header).b64url(claims).b64url(signature)` without
//! padding. Supported algorithms are `ES256`, `ES384` and `EdDSA`
//! (Ed25519).
//!
//! ## Example
//!
//! ```rust
//! use dnstxtjwt::jws::{self, Algorithm, ParseOption, Signer};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), dnstxtjwt::jws::TokenError> {
//! let pkcs8 = Signer::generate_pkcs8(Algorithm::Es256)?;
//! let signer = Signer::from_pkcs8(Algorithm::Es256, &pkcs8)?;
//!
//! let token = signer.sign(&json!({"role": "user"}))?;
//! let parsed = jws::parse(token.as_bytes(), &[ParseOption::Key(signer.verifying_key())])?;
//!
//! assert_eq!(parsed.get("role"), Some(&json!("user")));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, Ed25519KeyPair, KeyPair, UnparsedPublicKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Token processing errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(&'static str),

    #[error("invalid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("no key available to verify the token")]
    NoKey,

    #[error("signature verification failed")]
    BadSignature,

    #[error("token is expired")]
    Expired,

    #[error("token is not valid yet")]
    NotYetValid,

    #[error("token was issued in the future")]
    IssuedInFuture,

    #[error("invalid claim: {0}")]
    InvalidClaim(String),

    #[error("key rejected: {0}")]
    KeyRejected(String),

    #[error("signing failed")]
    Signing,
}

pub type Result<T> = std::result::Result<T, TokenError>;

/// Signature algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "ES256")]
    Es256,
    #[serde(rename = "ES384")]
    Es384,
    #[serde(rename = "EdDSA")]
    EdDsa,
}

impl Algorithm {
    /// JOSE name of the algorithm
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Es256 => "ES256",
            Algorithm::Es384 => "ES384",
            Algorithm::EdDsa => "EdDSA",
        }
    }

    fn verification(&self) -> &'static dyn signature::VerificationAlgorithm {
        match self {
            Algorithm::Es256 => &signature::ECDSA_P256_SHA256_FIXED,
            Algorithm::Es384 => &signature::ECDSA_P384_SHA384_FIXED,
            Algorithm::EdDsa => &signature::ED25519,
        }
    }
}

impl FromStr for Algorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ES256" => Ok(Algorithm::Es256),
            "ES384" => Ok(Algorithm::Es384),
            "EdDSA" => Ok(Algorithm::EdDsa),
            other => Err(TokenError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protected header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Any other header parameters
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Header {
    fn new(alg: Algorithm, kid: Option<String>) -> Self {
        Self {
            alg: alg.as_str().to_string(),
            typ: Some("JWT".to_string()),
            kid,
            extra: Map::new(),
        }
    }

    /// The header's algorithm, if supported
    pub fn algorithm(&self) -> Result<Algorithm> {
        self.alg.parse()
    }
}

/// Public key used to verify signatures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    algorithm: Algorithm,
    public_key: Vec<u8>,
    kid: Option<String>,
}

impl VerifyingKey {
    /// Wrap raw public key bytes: an uncompressed SEC1 point for ECDSA,
    /// the 32 byte key for Ed25519.
    pub fn new(algorithm: Algorithm, public_key: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm,
            public_key: public_key.into(),
            kid: None,
        }
    }

    /// Decode a base64url (unpadded) public key
    pub fn from_base64url(algorithm: Algorithm, encoded: &str) -> Result<Self> {
        Ok(Self::new(algorithm, URL_SAFE_NO_PAD.decode(encoded.trim())?))
    }

    /// Restrict the key to tokens carrying this `kid`
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    /// Public key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.public_key
    }

    pub fn to_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.public_key)
    }

    /// Whether this key may verify a token with `header`
    pub fn accepts(&self, header: &Header) -> bool {
        if header.alg != self.algorithm.as_str() {
            return false;
        }
        match (&self.kid, &header.kid) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => true,
        }
    }

    fn verify(&self, message: &[u8], sig: &[u8]) -> bool {
        UnparsedPublicKey::new(self.algorithm.verification(), &self.public_key)
            .verify(message, sig)
            .is_ok()
    }
}

/// Pluggable key resolution, consulted with the token's protected header.
pub trait KeyProvider: Send + Sync {
    /// Candidate keys for a token with `header`
    fn keys(&self, header: &Header) -> Result<Vec<VerifyingKey>>;
}

impl KeyProvider for Vec<VerifyingKey> {
    fn keys(&self, header: &Header) -> Result<Vec<VerifyingKey>> {
        Ok(self.iter().filter(|key| key.accepts(header)).cloned().collect())
    }
}

/// Options for [`parse`]
#[derive(Clone)]
pub enum ParseOption {
    /// Verify with this key
    Key(VerifyingKey),
    /// Verify with the keys a provider resolves
    KeyProvider(Arc<dyn KeyProvider>),
    /// Clock skew tolerated when validating `exp`, `nbf` and `iat`
    AcceptableSkew(Duration),
    /// Validate time claims (default `true`)
    Validate(bool),
}

impl fmt::Debug for ParseOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseOption::Key(key) => f.debug_tuple("Key").field(key).finish(),
            ParseOption::KeyProvider(_) => f.write_str("KeyProvider(..)"),
            ParseOption::AcceptableSkew(skew) => f.debug_tuple("AcceptableSkew").field(skew).finish(),
            ParseOption::Validate(validate) => f.debug_tuple("Validate").field(validate).finish(),
        }
    }
}

/// A verified token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    header: Header,
    claims: Map<String, Value>,
}

impl Token {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// Look up a claim by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get("iss").and_then(Value::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.timestamp("exp")
    }

    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.timestamp("nbf")
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("iat")
    }

    fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        numeric_date(self.get(name)?).and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// The three sections of a compact token
struct Compact<'a> {
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
}

impl<'a> Compact<'a> {
    fn split(input: &'a [u8]) -> Result<Self> {
        let text = std::str::from_utf8(input).map_err(|_| TokenError::Malformed("not UTF-8"))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(TokenError::Malformed("empty token"));
        }

        let mut sections = text.split('.');
        match (sections.next(), sections.next(), sections.next(), sections.next()) {
            (Some(header), Some(payload), Some(signature), None) => Ok(Self {
                header,
                payload,
                signature,
            }),
            _ => Err(TokenError::Malformed("expected three sections")),
        }
    }

    fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.payload)
    }

    fn decode_header(&self) -> Result<Header> {
        Ok(serde_json::from_slice(&URL_SAFE_NO_PAD.decode(self.header)?)?)
    }
}

/// Parse, verify and validate a compact token.
///
/// The signature must verify under at least one candidate key from the
/// [`ParseOption::Key`] and [`ParseOption::KeyProvider`] options.
pub fn parse(input: &[u8], options: &[ParseOption]) -> Result<Token> {
    let compact = Compact::split(input)?;
    let header = compact.decode_header()?;
    let algorithm = header.algorithm()?;

    let sig = URL_SAFE_NO_PAD.decode(compact.signature)?;
    let claims: Map<String, Value> =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(compact.payload)?)?;

    let message = compact.signing_input();
    let mut candidates = 0usize;
    let mut verified = false;

    'options: for option in options {
        let keys = match option {
            ParseOption::Key(key) => vec![key.clone()],
            ParseOption::KeyProvider(provider) => provider.keys(&header)?,
            _ => continue,
        };

        for key in keys.iter().filter(|key| key.accepts(&header)) {
            candidates += 1;
            if key.verify(message.as_bytes(), &sig) {
                verified = true;
                break 'options;
            }
        }
    }

    if !verified {
        return Err(if candidates == 0 {
            TokenError::NoKey
        } else {
            TokenError::BadSignature
        });
    }
    log::trace!("verified {} token after {} candidate keys", algorithm, candidates);

    let mut skew = Duration::ZERO;
    let mut validate = true;
    for option in options {
        match option {
            ParseOption::AcceptableSkew(s) => skew = *s,
            ParseOption::Validate(v) => validate = *v,
            _ => {}
        }
    }

    if validate {
        let skew = i64::try_from(skew.as_secs()).unwrap_or(i64::MAX);
        validate_times(&claims, Utc::now().timestamp(), skew)?;
    }

    Ok(Token { header, claims })
}

/// Decode the payload section without verifying anything.
pub fn payload(input: &[u8]) -> Result<Vec<u8>> {
    let compact = Compact::split(input)?;
    compact.decode_header()?;
    Ok(URL_SAFE_NO_PAD.decode(compact.payload)?)
}

fn numeric_date(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}

fn claim_time(claims: &Map<String, Value>, name: &str) -> Result<Option<i64>> {
    match claims.get(name) {
        None => Ok(None),
        Some(value) => numeric_date(value)
            .map(Some)
            .ok_or_else(|| TokenError::InvalidClaim(format!("{} is not a numeric date", name))),
    }
}

fn validate_times(claims: &Map<String, Value>, now: i64, skew: i64) -> Result<()> {
    if let Some(exp) = claim_time(claims, "exp")? {
        if now >= exp.saturating_add(skew) {
            return Err(TokenError::Expired);
        }
    }
    if let Some(nbf) = claim_time(claims, "nbf")? {
        if now.saturating_add(skew) < nbf {
            return Err(TokenError::NotYetValid);
        }
    }
    if let Some(iat) = claim_time(claims, "iat")? {
        if now.saturating_add(skew) < iat {
            return Err(TokenError::IssuedInFuture);
        }
    }
    Ok(())
}

enum SigningKey {
    Ecdsa(EcdsaKeyPair),
    Ed25519(Ed25519KeyPair),
}

/// Token signer for publishers
pub struct Signer {
    algorithm: Algorithm,
    key: SigningKey,
    kid: Option<String>,
    rng: SystemRandom,
}

impl Signer {
    /// Generate a fresh PKCS#8 private key document
    pub fn generate_pkcs8(algorithm: Algorithm) -> Result<Vec<u8>> {
        let rng = SystemRandom::new();
        let document = match algorithm {
            Algorithm::Es256 => {
                EcdsaKeyPair::generate_pkcs8(&signature::ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
            }
            Algorithm::Es384 => {
                EcdsaKeyPair::generate_pkcs8(&signature::ECDSA_P384_SHA384_FIXED_SIGNING, &rng)
            }
            Algorithm::EdDsa => Ed25519KeyPair::generate_pkcs8(&rng),
        }
        .map_err(|_| TokenError::Signing)?;

        Ok(document.as_ref().to_vec())
    }

    /// Load a signer from a PKCS#8 private key document
    pub fn from_pkcs8(algorithm: Algorithm, pkcs8: &[u8]) -> Result<Self> {
        let rng = SystemRandom::new();
        let rejected = |e: ring::error::KeyRejected| TokenError::KeyRejected(e.to_string());

        let key = match algorithm {
            Algorithm::Es256 => SigningKey::Ecdsa(
                EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
                    .map_err(rejected)?,
            ),
            Algorithm::Es384 => SigningKey::Ecdsa(
                EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P384_SHA384_FIXED_SIGNING, pkcs8, &rng)
                    .map_err(rejected)?,
            ),
            Algorithm::EdDsa => {
                SigningKey::Ed25519(Ed25519KeyPair::from_pkcs8(pkcs8).map_err(rejected)?)
            }
        };

        Ok(Self {
            algorithm,
            key,
            kid: None,
            rng,
        })
    }

    /// Put a `kid` in the header of every token this signer produces
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The public half of the signing key
    pub fn verifying_key(&self) -> VerifyingKey {
        let public_key = match &self.key {
            SigningKey::Ecdsa(pair) => pair.public_key().as_ref().to_vec(),
            SigningKey::Ed25519(pair) => pair.public_key().as_ref().to_vec(),
        };

        let key = VerifyingKey::new(self.algorithm, public_key);
        match &self.kid {
            Some(kid) => key.with_kid(kid.clone()),
            None => key,
        }
    }

    /// Sign a claim set into a compact token
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
        self.sign_payload(&serde_json::to_vec(claims)?)
    }

    /// Sign raw payload bytes into a compact token
    pub fn sign_payload(&self, payload: &[u8]) -> Result<String> {
        let header = serde_json::to_vec(&Header::new(self.algorithm, self.kid.clone()))?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );

        let sig = match &self.key {
            SigningKey::Ecdsa(pair) => pair
                .sign(&self.rng, signing_input.as_bytes())
                .map_err(|_| TokenError::Signing)?
                .as_ref()
                .to_vec(),
            SigningKey::Ed25519(pair) => pair.sign(signing_input.as_bytes()).as_ref().to_vec(),
        };

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(sig)))
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("algorithm", &self.algorithm)
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signer(algorithm: Algorithm) -> Signer {
        let pkcs8 = Signer::generate_pkcs8(algorithm).unwrap();
        Signer::from_pkcs8(algorithm, &pkcs8).unwrap()
    }

    #[test]
    fn test_sign_and_parse_each_algorithm() {
        for algorithm in [Algorithm::Es256, Algorithm::Es384, Algorithm::EdDsa] {
            let signer = signer(algorithm);
            let token = signer.sign(&json!({"example": "A"})).unwrap();

            let parsed = parse(token.as_bytes(), &[ParseOption::Key(signer.verifying_key())]).unwrap();
            assert_eq!(parsed.get("example"), Some(&json!("A")));
            assert_eq!(parsed.header().alg, algorithm.as_str());
            assert_eq!(parsed.header().typ.as_deref(), Some("JWT"));
        }
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let a = signer(Algorithm::Es256);
        let b = signer(Algorithm::Es256);
        let token = a.sign(&json!({"example": "A"})).unwrap();

        let err = parse(token.as_bytes(), &[ParseOption::Key(b.verifying_key())]).unwrap_err();
        assert!(matches!(err, TokenError::BadSignature));
    }

    #[test]
    fn test_any_matching_key_verifies() {
        let a = signer(Algorithm::Es256);
        let b = signer(Algorithm::EdDsa);
        let token = a.sign(&json!({"example": "A"})).unwrap();

        let options = [
            ParseOption::Key(b.verifying_key()),
            ParseOption::KeyProvider(Arc::new(vec![a.verifying_key()])),
        ];
        assert!(parse(token.as_bytes(), &options).is_ok());
    }

    #[test]
    fn test_no_key() {
        let a = signer(Algorithm::Es256);
        let b = signer(Algorithm::EdDsa);
        let token = a.sign(&json!({})).unwrap();

        assert!(matches!(parse(token.as_bytes(), &[]), Err(TokenError::NoKey)));
        assert!(matches!(
            parse(token.as_bytes(), &[ParseOption::Key(b.verifying_key())]),
            Err(TokenError::NoKey)
        ));
    }

    #[test]
    fn test_kid_selects_key() {
        let a = signer(Algorithm::Es256).with_kid("a");
        let token = a.sign(&json!({"k": 1})).unwrap();

        let other = a.verifying_key().with_kid("b");
        assert!(matches!(
            parse(token.as_bytes(), &[ParseOption::Key(other)]),
            Err(TokenError::NoKey)
        ));
        assert!(parse(token.as_bytes(), &[ParseOption::Key(a.verifying_key())]).is_ok());
    }

    #[test]
    fn test_tampered_payload() {
        let a = signer(Algorithm::Es256);
        let token = a.sign(&json!({"role": "user"})).unwrap();
        let forged = URL_SAFE_NO_PAD.encode(br#"{"role":"admin"}"#);

        let mut sections: Vec<&str> = token.split('.').collect();
        sections[1] = &forged;
        let tampered = sections.join(".");

        assert!(matches!(
            parse(tampered.as_bytes(), &[ParseOption::Key(a.verifying_key())]),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let options = [ParseOption::Validate(false)];
        assert!(matches!(parse(b"", &options), Err(TokenError::Malformed(_))));
        assert!(matches!(parse(b"a.b", &options), Err(TokenError::Malformed(_))));
        assert!(matches!(parse(b"a.b.c.d", &options), Err(TokenError::Malformed(_))));
        assert!(matches!(parse(b"!!.b.c", &options), Err(TokenError::Base64(_))));
        assert!(matches!(parse(&[0xff, b'.', b'.'], &options), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_unsupported_algorithm() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let claims = URL_SAFE_NO_PAD.encode(b"{}");
        let token = format!("{}.{}.", header, claims);

        assert!(matches!(
            parse(token.as_bytes(), &[]),
            Err(TokenError::UnsupportedAlgorithm(alg)) if alg == "none"
        ));
    }

    #[test]
    fn test_time_validation() {
        let now = 1_700_000_000;

        let expired = json!({"exp": now - 1}).as_object().cloned().unwrap();
        assert!(matches!(validate_times(&expired, now, 0), Err(TokenError::Expired)));
        assert!(validate_times(&expired, now, 5).is_ok());

        let future = json!({"nbf": now + 10}).as_object().cloned().unwrap();
        assert!(matches!(validate_times(&future, now, 0), Err(TokenError::NotYetValid)));
        assert!(validate_times(&future, now, 10).is_ok());

        let issued = json!({"iat": now + 10}).as_object().cloned().unwrap();
        assert!(matches!(validate_times(&issued, now, 0), Err(TokenError::IssuedInFuture)));

        let bad = json!({"exp": "tomorrow"}).as_object().cloned().unwrap();
        assert!(matches!(validate_times(&bad, now, 0), Err(TokenError::InvalidClaim(_))));

        let ok = json!({"exp": now + 60, "nbf": now, "iat": now}).as_object().cloned().unwrap();
        assert!(validate_times(&ok, now, 0).is_ok());
    }

    #[test]
    fn test_expired_token_can_skip_validation() {
        let a = signer(Algorithm::Es256);
        let token = a.sign(&json!({"exp": 1})).unwrap();
        let key = ParseOption::Key(a.verifying_key());

        assert!(matches!(parse(token.as_bytes(), &[key.clone()]), Err(TokenError::Expired)));
        let parsed = parse(token.as_bytes(), &[key, ParseOption::Validate(false)]).unwrap();
        assert_eq!(parsed.expiration(), DateTime::from_timestamp(1, 0));
    }

    #[test]
    fn test_huge_skew_only_loosens_validation() {
        let a = signer(Algorithm::Es256);
        let now = Utc::now().timestamp();
        let token = a
            .sign(&json!({"exp": now - 60, "nbf": now + 60, "iat": now + 60}))
            .unwrap();

        let options = [ParseOption::Key(a.verifying_key()), ParseOption::AcceptableSkew(Duration::MAX)];
        assert!(parse(token.as_bytes(), &options).is_ok());
    }

    #[test]
    fn test_payload_is_exact_bytes() {
        let a = signer(Algorithm::EdDsa);
        let raw = br#"{"b":2,  "a":1}"#;
        let token = a.sign_payload(raw).unwrap();

        assert_eq!(payload(token.as_bytes()).unwrap(), raw.to_vec());
    }

    #[test]
    fn test_verifying_key_base64_round_trip() {
        let key = signer(Algorithm::Es256).verifying_key();
        let decoded = VerifyingKey::from_base64url(Algorithm::Es256, &key.to_base64url()).unwrap();
        assert_eq!(decoded, key);
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!("ES256".parse::<Algorithm>().unwrap(), Algorithm::Es256);
        assert_eq!("EdDSA".parse::<Algorithm>().unwrap(), Algorithm::EdDsa);
        assert!("HS256".parse::<Algorithm>().is_err());
        assert_eq!(Algorithm::Es384.to_string(), "ES384");
    }
}
