//! mixcred: credential engine CLI
//!
//! Commands:
//!   salt <identifier>                      - print the identifier-derived salt
//!   hash --identifier <id> [--salt <s>]    - produce an encoded credential
//!   verify --credential <enc> [--identifier <id>]
//!                                          - check a secret (exit 1 if unmatched)
//!   inspect <enc> [--json]                 - decode a credential's fields
//!   config show                            - display the effective configuration
//!
//! Secrets come from MIXCRED_SECRET or an interactive prompt, never argv.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mixcred_auth::HashWorker;
use mixcred_core::config::MixcredConfig;
use mixcred_core::MixcredError;
use mixcred_hash::{HashParams, OutputBits, Salt, Verification};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "mixcred",
    version,
    about = "Credential hashing and verification",
    long_about = "mixcred: produce, inspect, and verify mix4 encoded credentials"
)]
struct Cli {
    /// Path to mixcred.toml configuration file
    #[arg(long, short = 'c', env = "MIXCRED_CONFIG", default_value = "mixcred.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides [log] level
    #[arg(long, env = "MIXCRED_LOG")]
    log: Option<String>,

    /// Log format; overrides [log] format
    #[arg(long, env = "MIXCRED_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the salt derived from an identifier
    Salt {
        identifier: String,
    },

    /// Produce an encoded credential
    Hash {
        /// Account identifier (email); its derived salt is used
        #[arg(long, short = 'i', required_unless_present = "salt")]
        identifier: Option<String>,
        /// Explicit salt instead of the identifier-derived one
        #[arg(long, conflicts_with = "identifier")]
        salt: Option<String>,
        /// Absorption passes (overrides [hashing] work_factor)
        #[arg(long, short = 'w')]
        work_factor: Option<u32>,
        /// Digest size: 64, 128 or 256 (overrides [hashing] output_bits)
        #[arg(long, short = 'b')]
        output_bits: Option<u32>,
    },

    /// Check a secret against an encoded credential
    Verify {
        /// Stored credential string
        #[arg(long)]
        credential: String,
        /// Account identifier; without it only the embedded salt is tried
        #[arg(long, short = 'i')]
        identifier: Option<String>,
    },

    /// Decode a credential and print its fields
    Inspect {
        credential: String,
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match cli.log_format {
        Some(f) => f,
        None if config.log.format == "json" => LogFormat::Json,
        None => LogFormat::Text,
    };
    init_logging(&level, &format);

    if !cli.config.exists() {
        tracing::debug!("config file not found: {}  (using defaults)", cli.config.display());
    }

    match cli.command {
        Commands::Salt { identifier } => {
            println!("{}", Salt::derive(&identifier));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Hash { identifier, salt, work_factor, output_bits } => {
            cmd_hash(&config, identifier, salt, work_factor, output_bits).await
        }
        Commands::Verify { credential, identifier } => {
            cmd_verify(&config, credential, identifier).await
        }
        Commands::Inspect { credential, json } => cmd_inspect(&config, &credential, json),
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

fn load_config(path: &Path) -> Result<MixcredConfig> {
    if path.exists() {
        MixcredConfig::load(path).with_context(|| format!("loading config: {}", path.display()))
    } else {
        Ok(MixcredConfig::default())
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Read the secret from MIXCRED_SECRET, else prompt without echo.
fn read_secret(prompt: &str) -> Result<SecretString> {
    if let Ok(secret) = std::env::var("MIXCRED_SECRET") {
        return Ok(SecretString::from(secret));
    }
    let secret = rpassword::prompt_password(prompt).context("reading secret from terminal")?;
    Ok(SecretString::from(secret))
}

fn build_worker(config: &MixcredConfig, params: HashParams) -> Result<HashWorker> {
    let codec = config.hashing.codec().context("building credential codec")?;
    Ok(HashWorker::new(
        codec,
        params,
        config.worker.concurrency(),
        config.worker.timeout(),
    )
    .with_max_work_factor(config.hashing.max_work_factor))
}

// ── `mixcred hash` ────────────────────────────────────────────────────────────

async fn cmd_hash(
    config: &MixcredConfig,
    identifier: Option<String>,
    salt: Option<String>,
    work_factor: Option<u32>,
    output_bits: Option<u32>,
) -> Result<ExitCode> {
    let mut params = config.hashing.params().context("reading [hashing] config")?;
    if let Some(wf) = work_factor {
        params.work_factor = wf;
    }
    if let Some(bits) = output_bits {
        params.output_bits = OutputBits::try_from(bits)?;
    }

    let worker = build_worker(config, params)?;
    let secret = read_secret("Password: ")?;

    let encoded = match (salt, identifier) {
        (Some(salt), _) => worker
            .hash_with_salt(secret, Salt::supplied(salt))
            .await
            .map_err(MixcredError::from)?,
        (None, Some(identifier)) => worker
            .hash(secret, identifier)
            .await
            .map_err(MixcredError::from)?,
        (None, None) => anyhow::bail!("either --identifier or --salt is required"),
    };

    tracing::info!(
        work_factor = params.work_factor,
        output_bits = %params.output_bits,
        "credential produced"
    );
    println!("{encoded}");
    Ok(ExitCode::SUCCESS)
}

// ── `mixcred verify` ──────────────────────────────────────────────────────────

async fn cmd_verify(
    config: &MixcredConfig,
    credential: String,
    identifier: Option<String>,
) -> Result<ExitCode> {
    let worker = build_worker(config, config.hashing.params()?)?;
    if let Ok(cred) = worker.codec().decode(&credential) {
        if cred.work_factor > worker.max_work_factor() {
            anyhow::bail!(
                "work factor {} exceeds max_work_factor {}",
                cred.work_factor,
                worker.max_work_factor()
            );
        }
    }
    let secret = read_secret("Password: ")?;

    let outcome = worker
        .verify(secret, credential, identifier)
        .await
        .map_err(MixcredError::from)?;

    match outcome {
        Verification::Matched => {
            println!("matched");
            Ok(ExitCode::SUCCESS)
        }
        Verification::MatchedNeedsUpgrade => {
            println!("matched (upgrade required)");
            Ok(ExitCode::SUCCESS)
        }
        Verification::Unmatched => {
            println!("unmatched");
            Ok(ExitCode::FAILURE)
        }
    }
}

// ── `mixcred inspect` ─────────────────────────────────────────────────────────

fn cmd_inspect(config: &MixcredConfig, credential: &str, json: bool) -> Result<ExitCode> {
    let codec = config.hashing.codec()?;
    let cred = codec.decode(credential).map_err(MixcredError::from)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cred)?);
    } else {
        println!("scheme:       {}", cred.scheme);
        println!("work factor:  {}", cred.work_factor);
        println!("output bits:  {}", cred.output_bits);
        println!("salt:         {}", cred.salt);
        println!("hash:         {}", cred.hash);
        if cred.hash.len() != cred.output_bits.hex_len() {
            println!(
                "warning:      hash is {} hex chars, expected {}",
                cred.hash.len(),
                cred.output_bits.hex_len()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ── `mixcred config show` ─────────────────────────────────────────────────────

fn cmd_config_show(config: &MixcredConfig, path: &Path) -> Result<ExitCode> {
    println!("# config: {}", path.display());
    println!("{}", toml::to_string_pretty(config).context("serializing config")?);
    Ok(ExitCode::SUCCESS)
}
