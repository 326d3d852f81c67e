//! Configuration types and CLI options.
//!
//! `Config` is the library-facing configuration and can be built without clap.
//! `Opt` is the command-line surface of the binary and converts into `Config`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::*;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use keystone_harvest::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     uploader_ids: vec!["297125".to_string()],
///     dataset_dir: PathBuf::from("./dataset"),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Uploader user ids whose recent reports are discovered
    pub uploader_ids: Vec<String>,

    /// Only reports started within this many seconds before now are candidates
    pub lookback_seconds: i64,

    /// Maximum number of recent reports requested per uploader
    pub report_page_size: u32,

    /// Processed report code ledger (JSON array)
    pub ledger_path: PathBuf,

    /// Directory holding one staged JSON file per report code
    pub staging_dir: PathBuf,

    /// Root of the partitioned Parquet dataset
    pub dataset_dir: PathBuf,

    /// Append-only log of failed reports
    pub error_log_path: PathBuf,

    /// GraphQL endpoint
    pub api_url: String,

    /// OAuth token endpoint
    pub token_url: String,

    /// Bearer token; when absent it is resolved from the environment or the token endpoint
    pub access_token: Option<String>,

    /// OAuth client id for the client-credentials flow
    pub client_id: Option<String>,

    /// OAuth client secret for the client-credentials flow
    pub client_secret: Option<String>,

    /// `.env` file a freshly issued token is written back to
    pub env_file: PathBuf,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            uploader_ids: DEFAULT_UPLOADER_IDS.iter().map(|id| id.to_string()).collect(),
            lookback_seconds: DEFAULT_LOOKBACK_SECONDS,
            report_page_size: DEFAULT_REPORT_PAGE_SIZE,
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            staging_dir: PathBuf::from(DEFAULT_STAGING_DIR),
            dataset_dir: PathBuf::from(DEFAULT_DATASET_DIR),
            error_log_path: PathBuf::from(DEFAULT_ERROR_LOG_PATH),
            api_url: DEFAULT_API_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            access_token: None,
            client_id: None,
            client_secret: None,
            env_file: PathBuf::from(DEFAULT_ENV_FILE),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Harvest the default uploaders with a token from .env
/// keystone_harvest
///
/// # Two specific uploaders, a two-week window and a custom dataset location
/// keystone_harvest --uploader-id 297125 --uploader-id 291792 \
///     --lookback-seconds 1209600 --dataset-dir ./dataset
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "keystone_harvest",
    about = "Harvests recent Warcraft Logs dungeon reports into a partitioned Parquet dataset."
)]
pub struct Opt {
    /// Uploader user id (repeatable). Defaults to the built-in uploader list.
    #[arg(long = "uploader-id")]
    pub uploader_ids: Vec<String>,

    /// Discovery window in seconds
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_SECONDS)]
    pub lookback_seconds: i64,

    /// Recent reports requested per uploader
    #[arg(long, default_value_t = DEFAULT_REPORT_PAGE_SIZE)]
    pub report_page_size: u32,

    /// Processed report code ledger
    #[arg(long, value_parser, default_value = DEFAULT_LEDGER_PATH)]
    pub ledger_path: PathBuf,

    /// Staging directory for per-report JSON files
    #[arg(long, value_parser, default_value = DEFAULT_STAGING_DIR)]
    pub staging_dir: PathBuf,

    /// Parquet dataset directory
    #[arg(long, value_parser, default_value = DEFAULT_DATASET_DIR)]
    pub dataset_dir: PathBuf,

    /// Error log file
    #[arg(long, value_parser, default_value = DEFAULT_ERROR_LOG_PATH)]
    pub error_log_path: PathBuf,

    /// GraphQL endpoint
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// OAuth token endpoint
    #[arg(long, default_value = DEFAULT_TOKEN_URL)]
    pub token_url: String,

    /// API bearer token (falls back to the WARCRAFTLOGS_TOKEN environment variable)
    #[arg(long, env = TOKEN_ENV_VAR, hide_env_values = true)]
    pub access_token: Option<String>,

    /// OAuth client id (falls back to the CLIENT_ID environment variable)
    #[arg(long, env = CLIENT_ID_ENV_VAR)]
    pub client_id: Option<String>,

    /// OAuth client secret (falls back to the CLIENT_SECRET environment variable)
    #[arg(long, env = CLIENT_SECRET_ENV_VAR, hide_env_values = true)]
    pub client_secret: Option<String>,

    /// File a newly issued token is stored in
    #[arg(long, value_parser, default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl From<Opt> for Config {
    fn from(opt: Opt) -> Self {
        let uploader_ids = if opt.uploader_ids.is_empty() {
            DEFAULT_UPLOADER_IDS.iter().map(|id| id.to_string()).collect()
        } else {
            opt.uploader_ids
        };

        Self {
            uploader_ids,
            lookback_seconds: opt.lookback_seconds,
            report_page_size: opt.report_page_size,
            ledger_path: opt.ledger_path,
            staging_dir: opt.staging_dir,
            dataset_dir: opt.dataset_dir,
            error_log_path: opt.error_log_path,
            api_url: opt.api_url,
            token_url: opt.token_url,
            access_token: opt.access_token,
            client_id: opt.client_id,
            client_secret: opt.client_secret,
            env_file: opt.env_file,
            timeout_seconds: opt.timeout_seconds,
            user_agent: opt.user_agent,
            log_level: opt.log_level,
            log_format: opt.log_format,
        }
    }
}
