//! Operation journal
//!
//! Every notification the vault emits (allocation changes, deposits, rebalances,
//! withdrawal requests and claims, pause toggles) is recorded as a [`JournalEntry`].
//! Entries of one operation are gathered in a [`JournalCollection`] and committed to
//! the stable journal when the collection goes out of scope, so failed operations
//! leave a trace too.

use std::borrow::Cow;

use candid::{CandidType, Decode, Encode};
use ic_stable_structures::{storable::Bound, Storable};
use serde::Deserialize;

use crate::{
    constants::MAX_NOTE_LENGTH,
    state::insert_journal_entry,
    types::{RequestId, StrategyId},
    utils::{common::time_nanos, error::VaultResult},
};

/// Category of a journal entry
#[derive(Clone, Copy, CandidType, Debug, Deserialize, PartialEq, Eq)]
pub enum LogType {
    Info,
    AllocationsUpdated,
    StrategyRegistered,
    StrategyReport,
    Deposit,
    Rebalanced,
    WithdrawalRequested,
    WithdrawalClaimed,
    Paused,
    Unpaused,
    RoleChanged,
}

/// Journal entry
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub timestamp: u64,
    pub entry: VaultResult<()>,
    pub log_type: LogType,
    pub strategy_id: Option<StrategyId>,
    pub request_id: Option<RequestId>,
    pub amount: Option<u128>,
    pub note: Option<String>,
}

/// Builder for journal entries
impl JournalEntry {
    /// Create a new instance of a journal entry
    /// Fills the `timestamp`, `entry` and `log_type` fields
    pub fn new(entry: VaultResult<()>, log_type: LogType) -> Self {
        Self {
            timestamp: time_nanos(),
            entry,
            log_type,
            strategy_id: None,
            request_id: None,
            amount: None,
            note: None,
        }
    }

    /// Fills the `strategy_id` field of the entry
    pub fn strategy(&mut self, id: StrategyId) -> &mut Self {
        self.strategy_id = Some(id);
        self
    }

    /// Fills the `request_id` field of the entry
    pub fn request(&mut self, id: RequestId) -> &mut Self {
        self.request_id = Some(id);
        self
    }

    /// Fills the `amount` field of the entry
    pub fn amount(&mut self, amount: u128) -> &mut Self {
        self.amount = Some(amount);
        self
    }

    /// Fills the `note` field of the entry, truncated to `MAX_NOTE_LENGTH` characters
    pub fn note<S: AsRef<str>>(&mut self, text: S) -> &mut Self {
        self.note = Some(text.as_ref().chars().take(MAX_NOTE_LENGTH).collect());
        self
    }

    /// Commits the entry to the stable journal
    pub fn commit(&mut self) {
        insert_journal_entry(self);
    }
}

impl Storable for JournalEntry {
    fn to_bytes(&self) -> Cow<[u8]> {
        Cow::Owned(Encode!(self).expect("journal entries are candid encodable"))
    }

    fn from_bytes(bytes: Cow<[u8]>) -> Self {
        Decode!(bytes.as_ref(), Self).expect("journal entries are written by `to_bytes`")
    }

    const BOUND: Bound = Bound::Unbounded;
}

/// Entries produced by a single vault operation
#[derive(Default)]
pub struct JournalCollection {
    entries: Vec<JournalEntry>,
}

impl JournalCollection {
    /// Opens an empty collection
    pub fn open() -> Self {
        Self::default()
    }

    /// Appends a new entry and returns it for further building
    pub fn append(&mut self, entry: VaultResult<()>, log_type: LogType) -> &mut JournalEntry {
        self.entries.push(JournalEntry::new(entry, log_type));
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Appends an entry carrying only a note
    pub fn append_note<S: AsRef<str>>(&mut self, entry: VaultResult<()>, log_type: LogType, note: S) {
        self.append(entry, log_type).note(note);
    }
}

impl Drop for JournalCollection {
    /// Commits all collected entries in order
    fn drop(&mut self) {
        for entry in self.entries.iter_mut() {
            entry.commit();
        }
    }
}
