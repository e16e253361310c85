//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// AUTHENTICATION DEFAULTS
// =============================================================================

/// Default access token expiry in minutes
pub const DEFAULT_ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 15;

/// Default refresh token expiry in days
pub const DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;

/// Default password hashing cost (Argon2 iterations)
pub const DEFAULT_PASSWORD_HASH_COST: u32 = 12;

/// Consecutive failed logins before the account is locked
pub const MAX_LOGIN_ATTEMPTS: i32 = 5;

/// Lockout window after too many failed logins
pub const ACCOUNT_LOCK_HOURS: i64 = 2;

/// Lifetime of a password reset token
pub const PASSWORD_RESET_EXPIRY_MINUTES: i64 = 60;

/// Length of generated verification / reset tokens
pub const ACCOUNT_TOKEN_LENGTH: usize = 32;

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: u64 = 128;

/// Username minimum length
pub const MIN_USERNAME_LENGTH: u64 = 3;

/// Username maximum length
pub const MAX_USERNAME_LENGTH: u64 = 30;

// =============================================================================
// SCORING & PROGRESSION
// =============================================================================

/// Scoring pipeline constants. These are fixed product rules, not settings.
pub mod scoring {
    /// Minimum score for a submission to count as a success
    pub const SUCCESS_THRESHOLD: i32 = 70;

    /// Maximum submission score
    pub const MAX_SCORE: i32 = 100;

    /// Multiplier when execution finishes under `FAST_RATIO` of the time limit
    pub const FAST_MULTIPLIER: f64 = 1.10;

    /// Multiplier when execution takes more than `SLOW_RATIO` of the time limit
    pub const SLOW_MULTIPLIER: f64 = 0.90;

    pub const FAST_RATIO: f64 = 0.5;
    pub const SLOW_RATIO: f64 = 0.9;

    /// XP awarded per score tier, highest tier first: (minimum score, xp)
    pub const XP_TIERS: &[(i32, i64)] = &[(90, 100), (80, 75), (70, 50), (60, 25)];

    /// XP for any score below the lowest tier
    pub const XP_FLOOR: i64 = 10;

    /// XP needed per level
    pub const XP_PER_LEVEL: i64 = 1000;
}

// =============================================================================
// ACHIEVEMENTS
// =============================================================================

/// Achievement catalog conventions
pub mod achievements {
    pub const FIRST_STEPS: &str = "First Steps";
    pub const PERFECT_SCORE: &str = "Perfect Score";
    pub const SPEED_DEMON: &str = "Speed Demon";

    /// Suffix of language mastery achievements ("Python Master")
    pub const LANGUAGE_MASTER_SUFFIX: &str = "Master";

    /// Completed-submission milestones
    pub const CHALLENGE_MILESTONES: &[i64] = &[10, 50, 100, 500, 1000];

    /// Daily streak milestones
    pub const STREAK_MILESTONES: &[i64] = &[7, 30, 100];

    /// Completed submissions in one language for mastery
    pub const LANGUAGE_MASTERY_COUNT: i64 = 10;

    /// Execution time (ms) under which a completed submission is "fast"
    pub const SPEED_DEMON_MS: i64 = 1000;

    /// Key inside `criteria_conditions` for level-threshold achievements
    pub const LEVEL_CONDITION_KEY: &str = "level";
}

/// Achievement criteria types
pub mod criteria_types {
    pub const CHALLENGE_COUNT: &str = "challenge_count";
    pub const STREAK: &str = "streak";
    pub const SCORE: &str = "score";
    pub const TIME: &str = "time";
    pub const SPECIAL: &str = "special";

    pub const ALL: &[&str] = &[CHALLENGE_COUNT, STREAK, SCORE, TIME, SPECIAL];
}

/// Achievement categories
pub mod achievement_categories {
    pub const ALL: &[&str] = &["milestone", "skill", "streak", "speed", "special"];
}

/// Achievement rarities
pub mod rarities {
    pub const ALL: &[&str] = &["common", "uncommon", "rare", "epic", "legendary"];
}

// =============================================================================
// SUPPORTED LANGUAGES
// =============================================================================

/// Language identifiers
pub mod languages {
    pub const JAVASCRIPT: &str = "javascript";
    pub const TYPESCRIPT: &str = "typescript";
    pub const PYTHON: &str = "python";
    pub const JAVA: &str = "java";
    pub const CPP: &str = "cpp";
    pub const C: &str = "c";
    pub const GO: &str = "go";
    pub const RUST: &str = "rust";

    /// All supported language identifiers
    pub const ALL: &[&str] = &[JAVASCRIPT, TYPESCRIPT, PYTHON, JAVA, CPP, C, GO, RUST];

    /// Human-readable language name, as used in achievement names
    pub fn display_name(language: &str) -> String {
        match language {
            JAVASCRIPT => "JavaScript".to_string(),
            TYPESCRIPT => "TypeScript".to_string(),
            PYTHON => "Python".to_string(),
            JAVA => "Java".to_string(),
            CPP => "C++".to_string(),
            C => "C".to_string(),
            GO => "Go".to_string(),
            RUST => "Rust".to_string(),
            other => {
                let mut chars = other.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

// =============================================================================
// CHALLENGES
// =============================================================================

/// Challenge types
pub mod challenge_types {
    pub const DSA: &str = "dsa";
    pub const BUG_FIX: &str = "bug-fix";
    pub const FEATURE: &str = "feature";

    pub const ALL: &[&str] = &[DSA, BUG_FIX, FEATURE];
}

/// Challenge difficulties
pub mod difficulties {
    pub const ALL: &[&str] = &["easy", "medium", "hard", "expert"];
}

/// Default challenge time limit in minutes
pub const DEFAULT_CHALLENGE_TIME_LIMIT_MINUTES: i32 = 30;

/// Maximum challenge title length
pub const MAX_CHALLENGE_TITLE_LENGTH: u64 = 200;

/// Maximum challenge description length
pub const MAX_CHALLENGE_DESCRIPTION_LENGTH: u64 = 65535;

/// Maximum source code size in bytes (1 MB)
pub const MAX_SOURCE_CODE_SIZE: u64 = 1024 * 1024;

/// Maximum request body size in bytes (room for code plus results)
pub const MAX_REQUEST_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Per-request timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// USER ROLES
// =============================================================================

/// User role identifiers
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const MODERATOR: &str = "moderator";
    pub const USER: &str = "user";

    /// All user roles
    pub const ALL: &[&str] = &[ADMIN, MODERATOR, USER];
}

// =============================================================================
// SUBMISSION STATUSES
// =============================================================================

/// Submission execution statuses
pub mod statuses {
    pub const PENDING: &str = "pending";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
    pub const TIMEOUT: &str = "timeout";
}

/// Default number of entries for the "recent submissions" view
pub const DEFAULT_RECENT_SUBMISSIONS: u32 = 10;

/// Maximum number of entries for the "recent submissions" view
pub const MAX_RECENT_SUBMISSIONS: u32 = 50;

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Notification types
pub mod notification_types {
    pub const ACHIEVEMENT: &str = "achievement";
    pub const CHALLENGE: &str = "challenge";
    pub const SOCIAL: &str = "social";
    pub const SYSTEM: &str = "system";

    pub const ALL: &[&str] = &[ACHIEVEMENT, CHALLENGE, SOCIAL, SYSTEM];
}

/// Notification priorities
pub mod priorities {
    pub const LOW: &str = "low";
    pub const NORMAL: &str = "normal";
    pub const HIGH: &str = "high";
    pub const URGENT: &str = "urgent";

    pub const ALL: &[&str] = &[LOW, NORMAL, HIGH, URGENT];
}

/// Notification delivery channels
pub mod channels {
    pub const EMAIL: &str = "email";
    pub const PUSH: &str = "push";

    pub const ALL: &[&str] = &[EMAIL, PUSH];
}

/// Default interval of the expired-notification sweep
pub const DEFAULT_NOTIFICATION_CLEANUP_INTERVAL_SECS: u64 = 3600;

// =============================================================================
// API VERSIONING
// =============================================================================

/// API base path
pub const API_BASE_PATH: &str = "/api/v1";

// =============================================================================
// RATE LIMITING
// =============================================================================

/// Rate limiting defaults
pub mod rate_limits {
    /// Auth endpoint - max requests
    pub const AUTH_MAX_REQUESTS: i64 = 5;
    /// Auth endpoint - window in seconds
    pub const AUTH_WINDOW_SECS: i64 = 60;

    /// General API - max requests
    pub const GENERAL_MAX_REQUESTS: i64 = 100;
    /// General API - window in seconds
    pub const GENERAL_WINDOW_SECS: i64 = 60;
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for paginated results
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum page size for paginated results
pub const MAX_PAGE_SIZE: u32 = 100;
