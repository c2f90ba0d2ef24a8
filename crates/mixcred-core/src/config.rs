use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use mixcred_hash::{CredentialCodec, HashParams, OutputBits, DEFAULT_SCHEME, DEFAULT_WORK_FACTOR};

use crate::error::{MixcredError, MixcredResult};

/// Default ceiling for stored work factors.
pub const DEFAULT_MAX_WORK_FACTOR: u32 = 1_000_000;

/// Top-level configuration (loaded from mixcred.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MixcredConfig {
    pub hashing: HashingConfig,
    pub worker: WorkerConfig,
    pub log: LogConfig,
}

/// Parameters for newly produced credentials.
///
/// Verification always uses the parameters stored in the credential itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    /// Absorption passes (default: 1000)
    pub work_factor: u32,
    /// Digest size: 64, 128 or 256 (default: 128)
    pub output_bits: u32,
    /// Scheme tag written into credentials (default: "mix4")
    pub scheme: String,
    /// Largest work factor accepted from a stored credential (default: 1000000).
    /// Verification cost is linear in it, so a corrupted value could pin a
    /// worker for hours.
    pub max_work_factor: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Max concurrent hash jobs (0 = cpu_count)
    pub max_concurrent: usize,
    /// Per-job timeout in milliseconds (0 = no timeout)
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            work_factor: DEFAULT_WORK_FACTOR,
            output_bits: OutputBits::default().bits(),
            scheme: DEFAULT_SCHEME.into(),
            max_work_factor: DEFAULT_MAX_WORK_FACTOR,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl HashingConfig {
    /// Validated hash parameters.
    pub fn params(&self) -> MixcredResult<HashParams> {
        Ok(HashParams {
            work_factor: self.work_factor,
            output_bits: OutputBits::try_from(self.output_bits)?,
        })
    }

    pub fn codec(&self) -> MixcredResult<CredentialCodec> {
        Ok(CredentialCodec::new(self.scheme.clone())?)
    }
}

impl WorkerConfig {
    /// Effective concurrency limit.
    pub fn concurrency(&self) -> usize {
        if self.max_concurrent > 0 {
            self.max_concurrent
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl MixcredConfig {
    /// Load from a TOML file; a missing file yields defaults.
    pub fn load(path: &Path) -> MixcredResult<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| MixcredError::Config(format!("parsing {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later, at first hash.
    pub fn validate(&self) -> MixcredResult<()> {
        self.hashing
            .params()
            .map_err(|e| MixcredError::Config(format!("[hashing] {e}")))?;
        self.hashing
            .codec()
            .map_err(|e| MixcredError::Config(format!("[hashing] {e}")))?;
        if self.hashing.work_factor > self.hashing.max_work_factor {
            return Err(MixcredError::Config(format!(
                "[hashing] work_factor {} exceeds max_work_factor {}",
                self.hashing.work_factor, self.hashing.max_work_factor
            )));
        }
        match self.log.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(MixcredError::Config(format!(
                "[log] format must be \"json\" or \"text\", got {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[hashing]
work_factor = 2000
output_bits = 256
scheme = "campus"

[worker]
max_concurrent = 4
timeout_ms = 1500

[log]
level = "debug"
format = "json"
"#;
        let config: MixcredConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.hashing.work_factor, 2000);
        assert_eq!(config.hashing.output_bits, 256);
        assert_eq!(config.hashing.scheme, "campus");
        assert_eq!(config.worker.concurrency(), 4);
        assert_eq!(config.worker.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.log.level, "debug");
        assert!(config.validate().is_ok());

        let params = config.hashing.params().unwrap();
        assert_eq!(params.output_bits, OutputBits::B256);
    }

    #[test]
    fn test_parse_defaults() {
        let config: MixcredConfig = toml::from_str("").unwrap();

        assert_eq!(config.hashing.work_factor, 1000);
        assert_eq!(config.hashing.output_bits, 128);
        assert_eq!(config.hashing.scheme, "mix4");
        assert_eq!(config.hashing.max_work_factor, 1_000_000);
        assert_eq!(config.worker.timeout(), None);
        assert!(config.worker.concurrency() >= 1);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, "text");
        assert_eq!(config.hashing.params().unwrap(), HashParams::default());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[hashing]
work_factor = 10
"#;
        let config: MixcredConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.hashing.work_factor, 10);
        // Defaults
        assert_eq!(config.hashing.output_bits, 128);
        assert_eq!(config.worker.max_concurrent, 0);
    }

    #[test]
    fn test_invalid_output_bits() {
        let config: MixcredConfig = toml::from_str("[hashing]\noutput_bits = 100\n").unwrap();
        assert!(matches!(config.hashing.params(), Err(MixcredError::Hash(_))));
        assert!(matches!(config.validate(), Err(MixcredError::Config(_))));
    }

    #[test]
    fn test_work_factor_above_ceiling_rejected() {
        let toml_str = "[hashing]\nwork_factor = 5000\nmax_work_factor = 4000\n";
        let config: MixcredConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(config.validate(), Err(MixcredError::Config(_))));

        let config: MixcredConfig = toml::from_str("[hashing]\nmax_work_factor = 5000\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_scheme_and_format() {
        let config: MixcredConfig = toml::from_str("[hashing]\nscheme = \"a$b\"\n").unwrap();
        assert!(config.validate().is_err());

        let config: MixcredConfig = toml::from_str("[log]\nformat = \"xml\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[hashing]\nwork_factor = 42\n").unwrap();

        let config = MixcredConfig::load(file.path()).unwrap();
        assert_eq!(config.hashing.work_factor, 42);
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = MixcredConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.hashing.work_factor, 1000);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[hashing\nwork_factor = ").unwrap();
        assert!(matches!(
            MixcredConfig::load(file.path()),
            Err(MixcredError::Config(_))
        ));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = MixcredConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: MixcredConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.hashing.work_factor, parsed.hashing.work_factor);
        assert_eq!(config.hashing.scheme, parsed.hashing.scheme);
        assert_eq!(config.log.format, parsed.log.format);
    }
}
