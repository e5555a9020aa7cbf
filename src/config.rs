use crate::services::upload_service::DecodePolicy;
use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use std::env::{self, VarError};

/// Environment variable naming the destination bucket.
pub const BUCKET_ENV: &str = "UPLOAD_BUCKET_NAME";

/// Which storage collaborator receives the uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Amazon S3 via the default AWS credential chain.
    S3,
    /// Local directory tree, one sub-directory per bucket.
    Local,
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub serve: bool,
    pub backend: Backend,
    pub storage_dir: String,
    /// Missing bucket is not a startup error; each invocation reports it.
    pub bucket: Option<String>,
    pub decode_policy: DecodePolicy,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Upload function: stores request bodies as bucket objects")]
pub struct Args {
    /// Destination bucket (overrides UPLOAD_BUCKET_NAME)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Storage backend (overrides UPLOAD_STORAGE_BACKEND)
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Root directory for the local backend (overrides UPLOAD_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Body decoding policy (overrides UPLOAD_DECODE_POLICY)
    #[arg(long, value_enum)]
    pub decode_policy: Option<DecodePolicy>,

    /// Serve over HTTP instead of running under the Lambda runtime
    #[arg(long)]
    pub serve: bool,

    /// Host to bind to in serve mode (overrides UPLOAD_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to in serve mode (overrides UPLOAD_PORT)
    #[arg(long)]
    pub port: Option<u16>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_parts(Args::parse(), |name| env::var(name))
    }

    /// Merge parsed args over values from `lookup` (an environment reader).
    pub fn from_parts(
        args: Args,
        lookup: impl Fn(&str) -> Result<String, VarError>,
    ) -> Result<Self> {
        let read = |name: &str| -> Result<Option<String>> {
            match lookup(name) {
                Ok(value) => Ok(Some(value)),
                Err(VarError::NotPresent) => Ok(None),
                Err(err) => Err(err).with_context(|| format!("reading {}", name)),
            }
        };

        // --- Environment fallback ---
        let env_host = read("UPLOAD_HOST")?.unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match read("UPLOAD_PORT")? {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing UPLOAD_PORT value `{}`", value))?,
            None => 3000,
        };
        let env_backend = match read("UPLOAD_STORAGE_BACKEND")? {
            Some(value) => Backend::from_str(&value, true)
                .map_err(|err| anyhow!(err))
                .with_context(|| format!("parsing UPLOAD_STORAGE_BACKEND value `{}`", value))?,
            None => Backend::S3,
        };
        let env_storage = read("UPLOAD_STORAGE_DIR")?.unwrap_or_else(|| "./data/objects".into());
        let env_policy = match read("UPLOAD_DECODE_POLICY")? {
            Some(value) => DecodePolicy::from_str(&value, true)
                .map_err(|err| anyhow!(err))
                .with_context(|| format!("parsing UPLOAD_DECODE_POLICY value `{}`", value))?,
            None => DecodePolicy::default(),
        };
        let env_bucket = read(BUCKET_ENV)?;

        // --- Merge ---
        let bucket = args
            .bucket
            .or(env_bucket)
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            serve: args.serve,
            backend: args.backend.unwrap_or(env_backend),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            bucket,
            decode_policy: args.decode_policy.unwrap_or(env_policy),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
