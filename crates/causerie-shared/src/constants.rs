/// Application name
pub const APP_NAME: &str = "Causerie";

/// Default chat API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://dummy-chat-server.tribechat.com/api";

/// Participant uuid reserved for the local session's own identity
pub const LOCAL_PARTICIPANT_UUID: &str = "you";

/// Incremental poll cadence in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

/// Per-request HTTP timeout in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Distance from the top of the loaded range (in scroll units) that
/// triggers an older-page fetch
pub const DEFAULT_PAGE_TRIGGER_THRESHOLD: f64 = 100.0;

/// Placeholder avatars a participant may be assigned
pub const FALLBACK_AVATARS: [&str; 6] = [
    "user1.webp",
    "user2.jpg",
    "user3.jpg",
    "user4.webp",
    "user5.webp",
    "user6.webp",
];
