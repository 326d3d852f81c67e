//! Configuration constants.
//!
//! This module defines the defaults used throughout the harvester: API endpoints,
//! on-disk locations, discovery window and the domain filters applied to fights.

/// GraphQL endpoint for the Warcraft Logs v2 client API.
pub const DEFAULT_API_URL: &str = "https://www.warcraftlogs.com/api/v2/client";

/// OAuth token endpoint used for the client-credentials flow.
pub const DEFAULT_TOKEN_URL: &str = "https://www.warcraftlogs.com/oauth/token";

/// Uploaders whose reports are harvested when none are configured.
pub const DEFAULT_UPLOADER_IDS: &[&str] = &["297125", "291792"];

/// Trailing discovery window: one week.
pub const DEFAULT_LOOKBACK_SECONDS: i64 = 60 * 60 * 24 * 7;

/// Page size for an uploader's recent reports.
pub const DEFAULT_REPORT_PAGE_SIZE: u32 = 100;

/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_USER_AGENT: &str = concat!("keystone_harvest/", env!("CARGO_PKG_VERSION"));

// On-disk layout
pub const DEFAULT_LEDGER_PATH: &str = "processed_codes.json";
pub const DEFAULT_STAGING_DIR: &str = "weekly_raw_data";
pub const DEFAULT_DATASET_DIR: &str = "all_reports_parquet_dataset";
pub const DEFAULT_ERROR_LOG_PATH: &str = "error_log.txt";
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Partition column of the permanent dataset (hive-style `runDate=YYYY-MM-DD`).
pub const PARTITION_COLUMN: &str = "runDate";

/// Environment variable holding a previously issued bearer token.
pub const TOKEN_ENV_VAR: &str = "WARCRAFTLOGS_TOKEN";
pub const CLIENT_ID_ENV_VAR: &str = "CLIENT_ID";
pub const CLIENT_SECRET_ENV_VAR: &str = "CLIENT_SECRET";

/// Number of friendly players in a dungeon run. Fights of any other size are raids
/// or unrelated content and are never assembled.
pub const DUNGEON_GROUP_SIZE: usize = 5;

/// Fight-list difficulty filter selecting keystone (Mythic+) dungeons.
pub const KEYSTONE_DIFFICULTY: u32 = 10;

/// Dungeon name used when the fight list has no zone for a fight.
pub const NO_DUNGEON_NAME: &str = "No name found";

/// Maximum length of an HTTP error body kept in an error message.
pub const MAX_ERROR_BODY_LENGTH: usize = 500;
