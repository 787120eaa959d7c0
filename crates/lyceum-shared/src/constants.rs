/// Application name
pub const APP_NAME: &str = "Lyceum";

/// Maximum message content length, in characters
pub const MAX_CONTENT_CHARS: usize = 500;

/// How long a success/error toast stays visible before it is dismissed
pub const TOAST_DISMISS_SECS: u64 = 3;

/// Default server base URL (local Spring Boot instance)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Display format for message and notification timestamps
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";
