//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Name of the root group in a fresh collection
pub const DEFAULT_GROUP_NAME: &str = "Default";

/// Name of the request created with a fresh collection
pub const DEFAULT_REQUEST_NAME: &str = "Unnamed";

/// URL of a freshly created request
pub const DEFAULT_REQUEST_URL: &str = "";

/// Separator used when editing multiple header values as one line
pub const HEADER_VALUE_SEPARATOR: &str = "; ";

/// Separator between ancestor names in a path label
pub const PATH_SEPARATOR: &str = " > ";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Directory name under the user's config dir
pub const CONFIG_DIR_NAME: &str = "lull";

/// Persisted state file name
pub const STATE_FILE_NAME: &str = "state.json";

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "lull.log";

/// Default log filter when `LULL_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "error";

/// Default transport timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
