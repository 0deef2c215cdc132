// =============================================================================
// Application Identity
// =============================================================================

/// Binary name (for display and paths)
pub const APP_NAME: &str = "filterc";

/// Library crate name, used as the default tracing target
pub const CRATE_TARGET: &str = "filter_engine";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".filterc";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name (profile folder and working directory)
pub const CONFIG_FILE_NAME: &str = "filterc.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "FILTERC_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for the log filter (falls back to RUST_LOG)
pub const ENV_LOG: &str = "FILTERC_LOG";

// =============================================================================
// Environment Variables - Compilation
// =============================================================================

/// Environment variable for the SQL dialect
pub const ENV_DIALECT: &str = "FILTERC_DIALECT";

/// Environment variable for the entity the request filters
pub const ENV_ENTITY: &str = "FILTERC_ENTITY";

/// Environment variable for the request source (file path or `-`)
pub const ENV_REQUEST: &str = "FILTERC_REQUEST";

// =============================================================================
// Defaults
// =============================================================================

/// Request source used when none is given (standard input)
pub const DEFAULT_REQUEST_SOURCE: &str = "-";
