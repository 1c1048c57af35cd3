use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Default type markers deciding which records are container-like during
/// traversal (collections and issue-bearing publications).
const DEFAULT_CONTAINER_MODELS: &str = "collection,newspaper,publication-issue";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Root directory of the primary backend (`origin://` locators).
    pub origin_dir: String,
    /// Root directory of the archive backend (`archive://` locators).
    pub archive_dir: String,
    /// Directory for staged copies in flight between the two.
    pub staging_dir: String,
    /// Externally resolvable base URL substituted for the archive scheme
    /// when rewriting owners. Stored without a trailing slash.
    pub archive_base_url: String,
    /// Type markers of container-like records.
    pub container_models: Vec<String>,
    /// Bound on concurrent migration units per batch.
    pub worker_count: usize,
}

/// What the process should do after configuration is parsed.
#[derive(Debug, Clone)]
pub enum RunMode {
    /// Apply database migrations and exit.
    Migrate,
    /// Archive the entire corpus and exit.
    ArchiveAll,
    /// Archive the closure of the given root containers and exit.
    ArchiveRoots(Vec<i64>),
    /// Recover one archived container and exit.
    Recover(i64),
    /// Serve the admin HTTP API.
    Serve,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Archival migration pipeline for hierarchical content records")]
pub struct Args {
    /// Host to bind to (overrides ASSET_ARCHIVE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides ASSET_ARCHIVE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides ASSET_ARCHIVE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Primary backend root directory (overrides ASSET_ARCHIVE_ORIGIN_DIR)
    #[arg(long)]
    pub origin_dir: Option<String>,

    /// Archive backend root directory (overrides ASSET_ARCHIVE_ARCHIVE_DIR)
    #[arg(long)]
    pub archive_dir: Option<String>,

    /// Staging directory (overrides ASSET_ARCHIVE_STAGING_DIR)
    #[arg(long)]
    pub staging_dir: Option<String>,

    /// External base URL of the archive (overrides ASSET_ARCHIVE_BASE_URL)
    #[arg(long)]
    pub archive_base_url: Option<String>,

    /// Container-like type marker; repeatable
    /// (overrides ASSET_ARCHIVE_CONTAINER_MODELS, comma-separated)
    #[arg(long = "container-model")]
    pub container_models: Vec<String>,

    /// Concurrent migration workers (overrides ASSET_ARCHIVE_WORKERS)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,

    /// Archive the entire corpus and exit
    #[arg(long)]
    pub archive_all: bool,

    /// Archive a root container's closure and exit; repeatable
    #[arg(long = "archive-root")]
    pub archive_roots: Vec<i64>,

    /// Recover an archived container and exit
    #[arg(long)]
    pub recover: Option<i64>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and run mode.
    pub fn from_env_and_args() -> Result<(Self, RunMode)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("ASSET_ARCHIVE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("ASSET_ARCHIVE_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing ASSET_ARCHIVE_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading ASSET_ARCHIVE_PORT"),
        };
        let env_db = env::var("ASSET_ARCHIVE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/asset_archive.db".into());
        let env_origin =
            env::var("ASSET_ARCHIVE_ORIGIN_DIR").unwrap_or_else(|_| "./data/origin".into());
        let env_archive =
            env::var("ASSET_ARCHIVE_ARCHIVE_DIR").unwrap_or_else(|_| "./data/archive".into());
        let env_staging =
            env::var("ASSET_ARCHIVE_STAGING_DIR").unwrap_or_else(|_| "./data/staging".into());
        let env_base_url = env::var("ASSET_ARCHIVE_BASE_URL")
            .unwrap_or_else(|_| "https://archive.example.org".into());
        let env_models = env::var("ASSET_ARCHIVE_CONTAINER_MODELS")
            .unwrap_or_else(|_| DEFAULT_CONTAINER_MODELS.into());
        let env_workers = match env::var("ASSET_ARCHIVE_WORKERS") {
            Ok(value) => value
                .parse::<usize>()
                .with_context(|| format!("parsing ASSET_ARCHIVE_WORKERS value `{}`", value))?,
            Err(env::VarError::NotPresent) => 4,
            Err(err) => return Err(err).context("reading ASSET_ARCHIVE_WORKERS"),
        };

        // --- Merge ---
        let container_models = if args.container_models.is_empty() {
            parse_models(&env_models)
        } else {
            args.container_models.clone()
        };
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            origin_dir: args.origin_dir.unwrap_or(env_origin),
            archive_dir: args.archive_dir.unwrap_or(env_archive),
            staging_dir: args.staging_dir.unwrap_or(env_staging),
            archive_base_url: normalize_base_url(
                &args.archive_base_url.unwrap_or(env_base_url),
            ),
            container_models,
            worker_count: args.workers.unwrap_or(env_workers).max(1),
        };

        let mode = if args.migrate {
            RunMode::Migrate
        } else if args.archive_all {
            RunMode::ArchiveAll
        } else if !args.archive_roots.is_empty() {
            RunMode::ArchiveRoots(args.archive_roots)
        } else if let Some(id) = args.recover {
            RunMode::Recover(id)
        } else {
            RunMode::Serve
        };

        Ok((cfg, mode))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Strip trailing path separators so link construction can always append
/// exactly one `/`.
fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn parse_models(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slashes() {
        assert_eq!(
            normalize_base_url("https://archive.example.org/"),
            "https://archive.example.org"
        );
        assert_eq!(
            normalize_base_url("https://archive.example.org"),
            "https://archive.example.org"
        );
    }

    #[test]
    fn model_list_splits_and_trims() {
        assert_eq!(
            parse_models("collection, newspaper ,publication-issue"),
            vec!["collection", "newspaper", "publication-issue"]
        );
    }
}
