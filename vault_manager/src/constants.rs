//! Vault Manager's Constants

/// Basis points representing 100%
pub const MAX_BPS: u16 = 10_000;

/// Maximum target allocation of a single strategy (60%)
pub const CAP_PER_STRATEGY: u16 = 6_000;

/// Number of journal entries kept after a cleanup
pub const JOURNAL_CAPACITY: u64 = 300;

/// Interval between two journal cleanups, denominated in seconds
pub const JOURNAL_CLEANUP_INTERVAL: u64 = 86_400;

/// Maximum length of a journal note
pub const MAX_NOTE_LENGTH: usize = 512;
