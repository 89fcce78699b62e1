//! Application-wide constants

/// Application name (lowercase, used for files and env prefixes)
pub const APP_NAME_LOWER: &str = "threadtrace";

/// Config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "threadtrace.json";

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 8900;

/// Default SQLite database filename
pub const SQLITE_DB_FILENAME: &str = "threadtrace.db";

/// SQLite busy timeout (seconds)
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 5;

/// SQLite page cache size (negative = KiB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

/// SQLite pool size
pub const SQLITE_MAX_CONNECTIONS: u32 = 8;

/// Graceful shutdown timeout (seconds)
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Display name for synthesized placeholder spans
pub const PLACEHOLDER_SPAN_NAME: &str = "(pending parent)";

// Environment variable names
pub const ENV_LOG: &str = "THREADTRACE_LOG";
pub const ENV_HOST: &str = "THREADTRACE_HOST";
pub const ENV_PORT: &str = "THREADTRACE_PORT";
pub const ENV_CONFIG: &str = "THREADTRACE_CONFIG";
pub const ENV_DB_PATH: &str = "THREADTRACE_DB_PATH";
pub const ENV_API_KEY: &str = "THREADTRACE_API_KEY";
