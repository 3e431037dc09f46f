/// Application name
pub const APP_NAME: &str = "Vitrine";

/// Quiet period after the last edit before the builder autosaves
pub const DEFAULT_AUTOSAVE_DEBOUNCE_MS: u64 = 800;

/// Attempts made by a surface before a failed fetch is surfaced as an error
pub const DEFAULT_FETCH_RETRIES: u32 = 3;

/// First retry delay; doubles on every further attempt
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;

/// Upper bound for a single retry delay
pub const MAX_RETRY_BACKOFF_MS: u64 = 4_000;

/// Number of symbols in a public access code (display adds one dash)
pub const ACCESS_CODE_LEN: usize = 8;

/// Access code alphabet: upper-case, without 0/O/1/I
pub const ACCESS_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Gradient angle used when a gradient token omits one
pub const DEFAULT_GRADIENT_ANGLE: f32 = 180.0;
