// Project-wide constants
//
// Centralised here so addresses, endpoints and other magic values have one
// source of truth. Import via `use crate::config::constants::*;`.

/// Default bind address for the HTTP API (localhost only).
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8000";

/// Local front-end dev servers allowed by CORS out of the box.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:5174",
];

/// Directory under `$HOME` holding the config file and database.
pub const DATA_DIR_NAME: &str = ".riffwise";

pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DATABASE_FILE_NAME: &str = "riffwise.db";

/// Default whole-request deadline for /ai/* endpoints.
///
/// Covers both providers with their retries, so it sits above
/// 2 x provider timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 150;

/// Per-call HTTP timeout for provider requests.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;

/// Request body limit for the HTTP API.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub const GROK_BASE_URL: &str = "https://api.x.ai";
pub const GROK_DEFAULT_MODEL: &str = "grok-2-latest";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TOP_P: f32 = 0.95;

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const MAX_RETRIES_LIMIT: u32 = 10;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 8000;
