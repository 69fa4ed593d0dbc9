//! Periodic journal maintenance.
//!
//! The journal lives in a stable map keyed by sequence number. Once a day the
//! oldest entries are dropped so that at most `JOURNAL_CAPACITY` remain.

use crate::{
    constants::JOURNAL_CAPACITY,
    journal::{JournalCollection, LogType},
    state::JOURNAL,
};

/// Trims the journal and records the cleanup.
pub fn daily_cleanup() {
    let removed = journal_cleanup();

    JournalCollection::open().append_note(
        Ok(()),
        LogType::Info,
        format!("Cleaned up the journal by removing {} excess entries.", removed),
    );
}

/// Removes the oldest entries until the journal holds at most `JOURNAL_CAPACITY`.
/// Returns the number of removed entries.
pub fn journal_cleanup() -> u64 {
    JOURNAL.with(|journal| {
        let mut binding = journal.borrow_mut();

        let len = binding.len();
        if len <= JOURNAL_CAPACITY {
            return 0;
        }
        let excess = len - JOURNAL_CAPACITY;

        let stale: Vec<u64> = binding
            .iter()
            .take(excess as usize)
            .map(|(key, _)| key)
            .collect();
        for key in stale {
            binding.remove(&key);
        }
        excess
    })
}
