use std::io::{self, Read as _};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use itsdangerous::config::SignerConfig;
use itsdangerous::encoding::{base64_decode, compress_decode, rsplit_segment};
use itsdangerous::error::SignerError;
use itsdangerous::keys::{generate_secret_key, SecretKey, DEFAULT_SECRET_KEY_LEN};
use itsdangerous::sign::Signer;
use itsdangerous::timestamp::{decode_timestamp, TimestampSigner};
use itsdangerous::types::{DigestMethod, KeyDerivation, DEFAULT_SEPARATOR};

#[derive(Parser)]
#[command(name = "itsdangerous", about = "Sign and verify values with a shared secret")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign a value. Reads the value from --value or stdin.
    Sign {
        #[command(flatten)]
        signer: SignerArgs,

        /// Value to sign. If omitted, reads from stdin.
        #[arg(long)]
        value: Option<String>,

        /// Embed the current time so the signature can expire.
        #[arg(long, default_value_t = false)]
        timed: bool,

        /// Base64-encode (and compress when smaller) the value before signing.
        #[arg(long, default_value_t = false)]
        b64: bool,
    },

    /// Verify a signed value and print the original value.
    Unsign {
        #[command(flatten)]
        signer: SignerArgs,

        /// Signed value. If omitted, reads from stdin.
        #[arg(short, long)]
        token: Option<String>,

        /// Expect an embedded timestamp.
        #[arg(long, default_value_t = false)]
        timed: bool,

        /// Reject timed values older than this (e.g. "30m", "1h", "7d").
        /// Implies --timed.
        #[arg(long)]
        max_age: Option<String>,

        /// The value was signed with --b64.
        #[arg(long, default_value_t = false)]
        b64: bool,
    },

    /// Break a signed value into its segments without verifying it.
    Inspect {
        /// Signed value. If omitted, reads from stdin.
        #[arg(short, long)]
        token: Option<String>,

        #[arg(long, default_value = ".")]
        separator: String,

        /// Treat the segment before the signature as a timestamp.
        #[arg(long, default_value_t = false)]
        timed: bool,
    },

    /// Generate a random secret key, printed as hex.
    GenerateKey {
        /// Key length in bytes.
        #[arg(short, long, default_value_t = DEFAULT_SECRET_KEY_LEN)]
        length: usize,
    },
}

/// Options shared by every command that needs the secret.
#[derive(Args)]
struct SignerArgs {
    /// JSON signer config file. Other signer options are ignored when set.
    #[arg(short, long, conflicts_with = "key")]
    config: Option<PathBuf>,

    /// File holding the secret key as raw bytes (or hex with --hex-key).
    #[arg(short, long, required_unless_present = "config")]
    key: Option<PathBuf>,

    /// Interpret the key file as hex-encoded.
    #[arg(long, default_value_t = false)]
    hex_key: bool,

    #[arg(long)]
    salt: Option<String>,

    #[arg(long)]
    separator: Option<String>,

    /// concat, django-concat, hmac or none.
    #[arg(long, default_value_t = KeyDerivation::default())]
    key_derivation: KeyDerivation,

    /// sha1, sha224, sha256, sha384 or sha512.
    #[arg(long, default_value_t = DigestMethod::default())]
    digest_method: DigestMethod,
}

impl SignerArgs {
    fn build(&self) -> Result<Signer, Box<dyn std::error::Error>> {
        if let Some(path) = &self.config {
            let data = std::fs::read_to_string(path)?;
            let config: SignerConfig = serde_json::from_str(&data)?;
            return Ok(config.build()?);
        }

        let path = self.key.as_ref().ok_or("either --key or --config is required")?;
        let mut builder = Signer::builder(read_key_file(path, self.hex_key)?)
            .key_derivation(self.key_derivation)
            .digest_method(self.digest_method);
        if let Some(salt) = &self.salt {
            builder = builder.salt(salt.as_bytes());
        }
        if let Some(separator) = &self.separator {
            builder = builder.separator(separator.as_bytes());
        }
        Ok(builder.build()?)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Sign {
            signer,
            value,
            timed,
            b64,
        } => cmd_sign(&signer, value, timed, b64),
        Command::Unsign {
            signer,
            token,
            timed,
            max_age,
            b64,
        } => cmd_unsign(&signer, token, timed, max_age.as_deref(), b64),
        Command::Inspect {
            token,
            separator,
            timed,
        } => cmd_inspect(token, &separator, timed),
        Command::GenerateKey { length } => cmd_generate_key(length),
    };

    if let Err(e) = result {
        match e.downcast_ref::<SignerError>() {
            Some(err) => {
                tracing::info!(error = %err, "command failed");
                eprintln!("error: {}", err.public_message());
            }
            None => eprintln!("error: {e}"),
        }
        std::process::exit(1);
    }
}

fn cmd_sign(
    args: &SignerArgs,
    value: Option<String>,
    timed: bool,
    b64: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let signer = args.build()?;
    let value = read_value(value)?;

    let signed = match (timed, b64) {
        (false, false) => signer.sign(value.as_bytes())?,
        (false, true) => signer.sign_b64(value.as_bytes())?,
        (true, false) => TimestampSigner::from(signer).sign(value.as_bytes())?,
        (true, true) => TimestampSigner::from(signer).sign_b64(value.as_bytes())?,
    };

    println!("{}", String::from_utf8_lossy(&signed));
    Ok(())
}

fn cmd_unsign(
    args: &SignerArgs,
    token: Option<String>,
    timed: bool,
    max_age: Option<&str>,
    b64: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let signer = args.build()?;
    let token = read_token(token)?;
    let token = token.as_bytes();

    let max_age = max_age.map(parse_max_age).transpose()?;
    let value = match (timed || max_age.is_some(), b64) {
        (false, false) => signer.unsign(token)?.to_vec(),
        (false, true) => signer.unsign_b64(token)?,
        (true, false) => TimestampSigner::from(signer)
            .unsign(token, max_age.unwrap_or(0))?
            .to_vec(),
        (true, true) => TimestampSigner::from(signer).unsign_b64(token, max_age.unwrap_or(0))?,
    };

    println!("{}", String::from_utf8_lossy(&value));
    Ok(())
}

fn cmd_inspect(
    token: Option<String>,
    separator: &str,
    timed: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = read_token(token)?;
    let sep = if separator.is_empty() {
        DEFAULT_SEPARATOR
    } else {
        separator.as_bytes()
    };

    let (rest, sig) = rsplit_segment(token.as_bytes(), sep)
        .ok_or_else(|| SignerError::MissingSeparator(separator.to_string()))?;

    let (value, timestamp) = if timed {
        let (value, ts) = rsplit_segment(rest, sep).ok_or(SignerError::MissingTimestamp)?;
        (value, Some(decode_timestamp(ts)?))
    } else {
        (rest, None)
    };

    let signed_at = timestamp.map(|ts| {
        humantime::format_rfc3339_seconds(UNIX_EPOCH + Duration::from_secs(u64::from(ts)))
            .to_string()
    });
    let payload = compress_decode(value)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

    let output = serde_json::json!({
        "value": String::from_utf8_lossy(value),
        "compressed": value.first() == Some(&b'.'),
        "payload": payload,
        "timestamp": timestamp,
        "signed_at": signed_at,
        "signature": String::from_utf8_lossy(sig),
        "signature_hex": base64_decode(sig).ok().map(hex::encode),
        "verified": false,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn cmd_generate_key(length: usize) -> Result<(), Box<dyn std::error::Error>> {
    let key = generate_secret_key(length)?;
    println!("{}", hex::encode(key.as_bytes()));
    Ok(())
}

fn parse_max_age(s: &str) -> Result<u32, Box<dyn std::error::Error>> {
    let duration: Duration = s
        .parse::<humantime::Duration>()
        .map_err(|e| format!("invalid max age '{s}': {e}"))?
        .into();
    let secs = u32::try_from(duration.as_secs())
        .map_err(|_| format!("max age '{s}' exceeds {} seconds", u32::MAX))?;
    if secs == 0 {
        return Err(format!("max age '{s}' must be at least one second").into());
    }
    Ok(secs)
}

/// A value to sign, taken verbatim from the argument. From stdin only the
/// final line ending is dropped.
fn read_value(arg: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    match arg {
        Some(s) => Ok(s),
        None => Ok(strip_line_ending(read_stdin()?)),
    }
}

/// A signed token. Tokens never contain whitespace, so surrounding
/// whitespace is trimmed.
fn read_token(arg: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    let raw = match arg {
        Some(s) => s,
        None => read_stdin()?,
    };
    Ok(raw.trim().to_string())
}

fn read_stdin() -> io::Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn strip_line_ending(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    s
}

/// Read key bytes from a file, optionally hex-decoding.
fn read_key_file(path: &Path, hex_encoded: bool) -> Result<SecretKey, Box<dyn std::error::Error>> {
    let raw = std::fs::read(path)?;
    if hex_encoded {
        let hex_str = String::from_utf8(raw).map_err(|_| "hex key file is not valid UTF-8")?;
        Ok(SecretKey::new(hex::decode(hex_str.trim())?))
    } else {
        Ok(SecretKey::new(raw))
    }
}
