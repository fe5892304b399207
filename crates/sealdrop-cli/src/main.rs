//! sealdrop: envelope encryption + steganographic locator CLI
//!
//! Offline commands:
//!   seal     - encrypt a file for one or more recipients into an envelope
//!   unseal   - decrypt an envelope as a recipient
//!   embed    - hide bytes in a PNG carrier's LSB channel
//!   extract  - recover hidden bytes from a PNG carrier
//!   inspect  - show envelope metadata without decrypting anything

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use sealdrop_core::{Payload, RecipientIdentity, VaultConfig};
use sealdrop_crypto::SealedEnvelope;

#[derive(Parser, Debug)]
#[command(
    name = "sealdrop",
    version,
    about = "Seal payloads for identity-bound recipients and hide locators in images"
)]
struct Cli {
    /// Path to sealdrop.toml configuration file
    #[arg(long, short = 'c', env = "SEALDROP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file into an envelope for one or more recipients
    ///
    /// Secret material is read from SEALDROP_SECRET or prompted for.
    Seal {
        /// File to seal
        input: PathBuf,
        /// Recipient identity (repeatable)
        #[arg(long, short = 'r', required = true)]
        recipient: Vec<String>,
        /// Content type recorded in the payload (default: application/octet-stream)
        #[arg(long)]
        content_type: Option<String>,
        /// Free-form note stored alongside the payload
        #[arg(long)]
        note: Option<String>,
        /// Output envelope path
        #[arg(long, short = 'o')]
        out: PathBuf,
    },

    /// Decrypt an envelope as a recipient
    Unseal {
        /// Envelope file (JSON record)
        envelope: PathBuf,
        /// Recipient identity to unseal as
        #[arg(long, short = 'i')]
        identity: String,
        /// Output path (default: the payload's recorded name)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Hide a file's bytes in a PNG carrier
    Embed {
        /// Carrier PNG
        carrier: PathBuf,
        /// File whose bytes get embedded (e.g. a locator)
        data: PathBuf,
        /// Output PNG path
        #[arg(long, short = 'o')]
        out: PathBuf,
    },

    /// Recover hidden bytes from a PNG carrier
    Extract {
        /// Carrier PNG
        carrier: PathBuf,
        /// Output path (default: print as UTF-8 to stdout)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Show envelope metadata without decrypting anything
    Inspect {
        /// Envelope file (JSON record)
        envelope: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Seal {
            input,
            recipient,
            content_type,
            note,
            out,
        } => cmd_seal(&config, &input, &recipient, content_type, note, &out),
        Commands::Unseal {
            envelope,
            identity,
            out,
        } => cmd_unseal(&envelope, &identity, out.as_deref()),
        Commands::Embed { carrier, data, out } => cmd_embed(&carrier, &data, &out),
        Commands::Extract { carrier, out } => cmd_extract(&carrier, out.as_deref()),
        Commands::Inspect { envelope } => cmd_inspect(&envelope),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<VaultConfig> {
    match path {
        Some(path) => {
            VaultConfig::load(path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(VaultConfig::default()),
    }
}

fn read_secret() -> Result<SecretString> {
    if let Ok(value) = std::env::var("SEALDROP_SECRET") {
        if !value.is_empty() {
            return Ok(SecretString::from(value));
        }
    }
    let value = rpassword::prompt_password("Secret material: ")
        .context("reading secret material from terminal")?;
    Ok(SecretString::from(value))
}

fn cmd_seal(
    config: &VaultConfig,
    input: &std::path::Path,
    recipients: &[String],
    content_type: Option<String>,
    note: Option<String>,
    out: &std::path::Path,
) -> Result<()> {
    let data =
        std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "payload".into());

    let recipients: Vec<RecipientIdentity> = recipients
        .iter()
        .map(|raw| RecipientIdentity::new(raw).map_err(anyhow::Error::from))
        .collect::<Result<_>>()?;

    let mut payload = Payload::new(
        name,
        content_type.unwrap_or_else(|| "application/octet-stream".into()),
        data,
    );
    if let Some(note) = note {
        payload = payload.with_note(note);
    }

    let secret = read_secret()?;
    let envelope_bytes = sealdrop_crypto::seal(&payload, &recipients, &secret, &config.crypto)?;
    std::fs::write(out, &envelope_bytes)
        .with_context(|| format!("writing {}", out.display()))?;

    println!(
        "sealed {} bytes for {} recipient(s) -> {}",
        payload.data.len(),
        recipients.len(),
        out.display()
    );
    Ok(())
}

fn cmd_unseal(
    envelope_path: &std::path::Path,
    identity: &str,
    out: Option<&std::path::Path>,
) -> Result<()> {
    let bytes = std::fs::read(envelope_path)
        .with_context(|| format!("reading {}", envelope_path.display()))?;
    let identity = RecipientIdentity::new(identity)?;

    let payload = sealdrop_crypto::unseal(&bytes, &identity)?;

    let out = out
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&payload.name));
    std::fs::write(&out, &payload.data)
        .with_context(|| format!("writing {}", out.display()))?;

    println!(
        "unsealed {} ({}, {} bytes) -> {}",
        payload.name,
        payload.content_type,
        payload.data.len(),
        out.display()
    );
    if !payload.note.is_empty() {
        println!("note: {}", payload.note);
    }
    Ok(())
}

fn cmd_embed(
    carrier_path: &std::path::Path,
    data_path: &std::path::Path,
    out: &std::path::Path,
) -> Result<()> {
    let carrier_bytes = std::fs::read(carrier_path)
        .with_context(|| format!("reading {}", carrier_path.display()))?;
    let data = std::fs::read(data_path)
        .with_context(|| format!("reading {}", data_path.display()))?;

    let mut carrier = sealdrop_stego::load_carrier(&carrier_bytes)?;
    sealdrop_stego::embed(&mut carrier, &data)?;
    let png = sealdrop_stego::save_carrier(&carrier)?;

    std::fs::write(out, &png).with_context(|| format!("writing {}", out.display()))?;
    println!("embedded {} bytes -> {}", data.len(), out.display());
    Ok(())
}

fn cmd_extract(carrier_path: &std::path::Path, out: Option<&std::path::Path>) -> Result<()> {
    let carrier_bytes = std::fs::read(carrier_path)
        .with_context(|| format!("reading {}", carrier_path.display()))?;
    let carrier = sealdrop_stego::load_carrier(&carrier_bytes)?;
    let data = sealdrop_stego::extract(&carrier)?;

    match out {
        Some(out) => {
            std::fs::write(out, &data).with_context(|| format!("writing {}", out.display()))?;
            println!("extracted {} bytes -> {}", data.len(), out.display());
        }
        None => println!("{}", String::from_utf8_lossy(&data)),
    }
    Ok(())
}

fn cmd_inspect(envelope_path: &std::path::Path) -> Result<()> {
    let bytes = std::fs::read(envelope_path)
        .with_context(|| format!("reading {}", envelope_path.display()))?;
    let envelope = SealedEnvelope::parse(&bytes)?;

    println!("algorithm:       {:?}", envelope.algorithm);
    println!(
        "payload KDF:     {} iterations, {}-byte output",
        envelope.payload_kdf.cost_factor, envelope.payload_kdf.output_length
    );
    println!(
        "wrap KDF:        {} iterations, {}-byte output",
        envelope.wrap_kdf.cost_factor, envelope.wrap_kdf.output_length
    );
    println!("shell layer:     {}", envelope.shell.is_some());
    println!("ciphertext:      {} bytes", envelope.ciphertext.len());
    println!("recipients:      {}", envelope.recipients.len());
    for identity in envelope.recipients.keys() {
        println!("  - {identity}");
    }
    Ok(())
}
