//! dnstxtjwt - publish and fetch signed JWTs through DNS TXT records

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::io::Read;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dnstxtjwt::jws::{Algorithm, Signer, VerifyingKey};
use dnstxtjwt::{
    create_record, reassemble, CancellationToken, Config, FetchTimeout, Fetcher, ParseOption,
    RecordOptions,
};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "dnstxtjwt")]
#[command(version = VERSION)]
#[command(about = "Publish and fetch signed JWTs through chunked DNS TXT records", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "DNSTXTJWT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a token into TXT record frames
    Create {
        /// Longest frame, 1-254 bytes
        #[arg(long)]
        max_line_length: Option<usize>,

        /// Largest total record, 1-65270 bytes
        #[arg(long)]
        max_size: Option<usize>,

        /// Print zone file records for this owner name instead of bare frames
        #[arg(long, value_name = "NAME")]
        zone: Option<String>,

        /// Record TTL used with --zone
        #[arg(long, default_value_t = 300)]
        ttl: u32,

        /// Token, or "-" to read stdin
        #[arg(default_value = "-")]
        token: String,
    },

    /// Look up, reassemble and verify a token
    Fetch {
        /// Name carrying the TXT record
        #[arg(short, long, env = "DNSTXTJWT_FQDN")]
        fqdn: Option<String>,

        /// Give up after this long (e.g. "5s")
        #[arg(short, long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,

        /// Wait for the resolver indefinitely
        #[arg(long, conflicts_with = "timeout")]
        no_timeout: bool,

        /// Nameserver to query, may be repeated
        #[arg(short, long = "nameserver", value_name = "ADDR")]
        nameservers: Vec<SocketAddr>,

        /// Trusted key as ALG:BASE64URL, may be repeated
        #[arg(short, long = "key", value_name = "ALG:KEY", value_parser = parse_verifying_key)]
        keys: Vec<VerifyingKey>,

        /// Skip exp/nbf/iat checks
        #[arg(long)]
        no_verify_time: bool,

        /// Print the raw payload instead of the claims
        #[arg(long)]
        raw: bool,
    },

    /// Generate a signing key
    Keygen {
        /// Signature algorithm (ES256, ES384, EdDSA)
        #[arg(short, long, default_value = "ES256")]
        alg: Algorithm,

        /// Write the PKCS#8 private key to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sign claims into a compact token
    Sign {
        /// PKCS#8 private key file, or base64url PKCS#8
        #[arg(short, long)]
        key: String,

        /// Signature algorithm (ES256, ES384, EdDSA)
        #[arg(short, long, default_value = "ES256")]
        alg: Algorithm,

        /// Key id placed in the header
        #[arg(long)]
        kid: Option<String>,

        /// Claims as a JSON object, or "-" to read stdin
        #[arg(long, default_value = "-")]
        claims: String,

        /// Set iat to now and exp this far in the future
        #[arg(long, value_parser = humantime::parse_duration)]
        expires_in: Option<Duration>,
    },

    /// Reassemble TXT frames, one per line
    Reassemble {
        /// Input file, or "-" for stdin
        #[arg(default_value = "-")]
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            config.validate()?;
            debug!("loaded config from {}", path.display());
            config
        }
        None => Config::default(),
    };

    match cli.command {
        Commands::Create {
            max_line_length,
            max_size,
            zone,
            ttl,
            token,
        } => {
            let mut options = config.record.to_options();
            if let Some(length) = max_line_length {
                options = options.with_max_line_length(length);
            }
            if let Some(size) = max_size {
                options = options.with_max_size(size);
            }
            create(&read_input(&token)?, &options, zone.as_deref(), ttl)?;
        }
        Commands::Fetch {
            fqdn,
            timeout,
            no_timeout,
            nameservers,
            keys,
            no_verify_time,
            raw,
        } => {
            let mut fetch = config.fetch;
            if fqdn.is_some() {
                fetch.fqdn = fqdn;
            }
            if no_timeout {
                fetch.timeout = None;
                fetch.disable_timeout = true;
            } else if timeout.is_some() {
                fetch.timeout = timeout;
                fetch.disable_timeout = false;
            }
            if !nameservers.is_empty() {
                fetch.nameservers = nameservers;
            }
            if no_verify_time {
                fetch.validate = false;
            }

            let mut options = fetch.to_options()?;
            options.parse_options.extend(keys.into_iter().map(ParseOption::Key));
            if options.timeout == FetchTimeout::Disabled {
                warn!("fetch timeout disabled; waiting on the resolver indefinitely");
            }

            fetch_token(Fetcher::new(options)?, raw).await?;
        }
        Commands::Keygen { alg, output } => {
            keygen(alg, output.as_deref())?;
        }
        Commands::Sign {
            key,
            alg,
            kid,
            claims,
            expires_in,
        } => {
            sign(&key, alg, kid, &read_input(&claims)?, expires_in)?;
        }
        Commands::Reassemble { input } => {
            let text = read_input(&input)?;
            let token = reassemble(&frames_from_text(&text));
            if token.is_empty() {
                bail!("frames are incomplete or malformed");
            }
            println!("{}", token);
        }
    }

    Ok(())
}

fn create(
    token: &str,
    options: &RecordOptions,
    zone: Option<&str>,
    ttl: u32,
) -> Result<()> {
    let frames = create_record(token.trim(), options)?;
    info!(
        "{} frames, {} bytes",
        frames.len(),
        frames.iter().map(String::len).sum::<usize>()
    );

    match zone {
        // Resolvers join the strings of one RR, so each frame is its own RR.
        Some(name) => {
            for frame in frames {
                println!("{} {} IN TXT {}", name, ttl, quote_txt(&frame));
            }
        }
        None => {
            for frame in frames {
                println!("{}", frame);
            }
        }
    }
    Ok(())
}

async fn fetch_token(fetcher: Fetcher, raw: bool) -> Result<()> {
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    info!("fetching token from {}", fetcher.fqdn());
    let (token, payload) = fetcher.fetch_with(&cancel).await?;

    if raw {
        println!("{}", String::from_utf8_lossy(&payload));
    } else {
        if let Some(kid) = &token.header().kid {
            info!("signed with {} key {}", token.header().alg, kid);
        } else {
            info!("signed with {}", token.header().alg);
        }
        println!("{}", serde_json::to_string_pretty(token.claims())?);
    }
    Ok(())
}

fn keygen(alg: Algorithm, output: Option<&Path>) -> Result<()> {
    let pkcs8 = Signer::generate_pkcs8(alg)?;
    let signer = Signer::from_pkcs8(alg, &pkcs8)?;

    match output {
        Some(path) => {
            std::fs::write(path, &pkcs8)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote {} private key to {}", alg, path.display());
        }
        None => println!("private_key = \"{}\"", URL_SAFE_NO_PAD.encode(&pkcs8)),
    }

    println!();
    println!("[[fetch.keys]]");
    println!("alg = \"{}\"", alg);
    println!("public_key = \"{}\"", signer.verifying_key().to_base64url());
    Ok(())
}

fn sign(
    key: &str,
    alg: Algorithm,
    kid: Option<String>,
    claims: &str,
    expires_in: Option<Duration>,
) -> Result<()> {
    let pkcs8 = if Path::new(key).is_file() {
        std::fs::read(key).with_context(|| format!("failed to read {}", key))?
    } else {
        URL_SAFE_NO_PAD
            .decode(key.trim())
            .context("key is neither a file nor base64url PKCS#8")?
    };

    let mut signer = Signer::from_pkcs8(alg, &pkcs8)?;
    if let Some(kid) = kid {
        signer = signer.with_kid(kid);
    }

    let mut claims: Map<String, Value> =
        serde_json::from_str(claims).context("claims must be a JSON object")?;
    if let Some(ttl) = expires_in {
        let now = chrono::Utc::now().timestamp();
        let ttl = i64::try_from(ttl.as_secs()).context("--expires-in is too large")?;
        claims.insert("iat".into(), now.into());
        claims.insert("exp".into(), now.saturating_add(ttl).into());
    }

    println!("{}", signer.sign(&claims)?);
    Ok(())
}

fn parse_verifying_key(s: &str) -> std::result::Result<VerifyingKey, String> {
    let (alg, key) = s
        .split_once(':')
        .ok_or_else(|| format!("expected ALG:KEY, got {:?}", s))?;
    let alg: Algorithm = alg.parse().map_err(|e| format!("{}", e))?;
    VerifyingKey::from_base64url(alg, key).map_err(|e| format!("{}", e))
}

fn read_input(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    } else if Path::new(arg).is_file() {
        std::fs::read_to_string(arg).with_context(|| format!("failed to read {}", arg))
    } else {
        Ok(arg.to_string())
    }
}

/// One frame per line. Quoted lines (`dig +short` output) have their
/// strings joined, as a resolver does for one RR.
fn frames_from_text(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with('"') {
                line.split('"').skip(1).step_by(2).collect()
            } else {
                line.to_string()
            }
        })
        .collect()
}

fn quote_txt(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verifying_key() {
        let key = parse_verifying_key("EdDSA:11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo").unwrap();
        assert_eq!(key.algorithm(), Algorithm::EdDsa);
        assert_eq!(key.as_bytes().len(), 32);

        assert!(parse_verifying_key("no-separator").is_err());
        assert!(parse_verifying_key("HS256:AAAA").is_err());
    }

    #[test]
    fn test_quote_txt() {
        assert_eq!(quote_txt("00:abc"), "\"00:abc\"");
        assert_eq!(quote_txt("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn test_frames_from_text() {
        assert_eq!(frames_from_text("01:b\n00:a\n\n"), vec!["01:b", "00:a"]);
        assert_eq!(
            frames_from_text("\"00:a\" \"bc\"\n\"01:d\"\n"),
            vec!["00:abc", "01:d"]
        );
        assert_eq!(reassemble(&frames_from_text("\"01:b\"\n\"00:a\"")), "ab");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "dnstxtjwt",
            "fetch",
            "--fqdn",
            "fqdn.example.org",
            "--timeout",
            "250ms",
            "--nameserver",
            "127.0.0.1:5353",
        ])
        .unwrap();
        match cli.command {
            Commands::Fetch {
                fqdn,
                timeout,
                nameservers,
                ..
            } => {
                assert_eq!(fqdn.as_deref(), Some("fqdn.example.org"));
                assert_eq!(timeout, Some(Duration::from_millis(250)));
                assert_eq!(nameservers.len(), 1);
            }
            _ => panic!("expected fetch"),
        }

        assert!(Cli::try_parse_from(["dnstxtjwt", "fetch", "--timeout", "1s", "--no-timeout"]).is_err());
    }
}
