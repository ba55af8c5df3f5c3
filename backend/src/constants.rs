// =============================================================================
// L.I.F Backend Constants
// =============================================================================
// This file contains all constants used throughout the backend to enable
// easy tuning and configuration from a single location.

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP port when PORT is not set
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default base URL used to build links in outgoing emails
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";

/// Default directory for locally stored media
pub const DEFAULT_MEDIA_DIR: &str = "./media";

/// Maximum accepted multipart body (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Lifetime of issued access tokens
pub const DEFAULT_JWT_EXPIRY_HOURS: i64 = 1;

/// bcrypt work factor
pub const BCRYPT_COST: u32 = 10;

/// Password reset links stay valid for one hour
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum age to register
pub const MIN_USER_AGE: i32 = 18;

// =============================================================================
// PROFILES & DISCOVERY
// =============================================================================

/// Maximum number of gallery photos per profile
pub const MAX_PHOTOS: usize = 9;

/// Maximum bio length in characters
pub const MAX_BIO_LENGTH: usize = 500;

/// Number of candidates returned by discovery
pub const CANDIDATE_LIMIT: i64 = 10;

/// Filter preference defaults for new accounts
pub const DEFAULT_AGE_RANGE_MIN: i32 = 18;
pub const DEFAULT_AGE_RANGE_MAX: i32 = 100;
pub const DEFAULT_MAX_DISTANCE_MILES: f64 = 100.0;

/// Wildcard value for seeking gender / relationship type
pub const ANY_PREFERENCE: &str = "any";

/// Mean Earth radius used for great-circle distance
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Distance preferences are expressed in miles
pub const METERS_PER_MILE: f64 = 1609.34;

// =============================================================================
// CHAT
// =============================================================================

/// Default page size for message history
pub const DEFAULT_MESSAGE_PAGE_SIZE: i64 = 50;

/// Upper bound on requested page size
pub const MAX_MESSAGE_PAGE_SIZE: i64 = 200;

/// Maximum text message length in characters
pub const MAX_MESSAGE_LENGTH: usize = 5000;

/// Unread messages older than this are swept
pub const UNREAD_MESSAGE_RETENTION_DAYS: i64 = 5;

/// A message without a reply for this long counts as ghosted
pub const GHOSTING_THRESHOLD_HOURS: i64 = 24;

// =============================================================================
// CALLS
// =============================================================================

/// Ended calls older than this are swept
pub const ENDED_CALL_RETENTION_DAYS: i64 = 7;

/// Calls left pending longer than this are expired
pub const DEFAULT_PENDING_CALL_TIMEOUT_SECS: u64 = 60;

/// How often the server checks for stale pending calls
pub const PENDING_CALL_SWEEP_INTERVAL_SECS: u64 = 15;

// =============================================================================
// CONFESSIONS & NOTIFICATIONS
// =============================================================================

/// Maximum confession length in characters
pub const MAX_CONFESSION_LENGTH: usize = 1000;

/// Maximum notifications returned per listing
pub const NOTIFICATION_LIST_LIMIT: i64 = 50;

// =============================================================================
// MAINTENANCE
// =============================================================================

/// Interval between daily retention sweeps
pub const SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;
