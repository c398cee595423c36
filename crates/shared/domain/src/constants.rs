//! Well-known strings shared between the error handlers, the server and plugins.

/// Error code raised when a request carries a missing or stale CSRF token.
pub const CODE_BAD_CSRF_TOKEN: &str = "EBADCSRFTOKEN";
/// Error code raised when the client address is on the IP blacklist.
pub const CODE_BLACKLISTED_IP: &str = "blacklisted-ip";

/// Hook fired to let plugins extend or override the error-code handlers.
pub const HOOK_ERROR_HANDLE: &str = "filter:error.handle";

/// Legacy (page data) API prefix, relative to the forum root.
pub const API_PREFIX: &str = "/api";
/// Versioned write API prefix, relative to the forum root.
pub const API_V3_PREFIX: &str = "/api/v3";

/// Template rendered for malformed requests.
pub const TEMPLATE_BAD_REQUEST: &str = "400";
/// Template rendered for unhandled errors.
pub const TEMPLATE_SERVER_ERROR: &str = "500";

/// Response header carrying the redirect target for API clients.
pub const HEADER_X_REDIRECT: &str = "x-redirect";
