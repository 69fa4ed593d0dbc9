use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use ic_stable_structures::{DefaultMemoryImpl, StableBTreeMap};

use crate::{
    journal::JournalEntry,
    strategy::book::BookStrategy,
    types::StrategyId,
    utils::error::{VaultError, VaultResult},
    vault::Vault,
};

thread_local! {
    /// The vault engine. `None` until the canister is initialized.
    pub static VAULT: RefCell<Option<Vault>> = RefCell::new(None);
    /// Concrete handles of the in-canister strategies, also registered in the vault
    pub static BOOK_STRATEGIES: RefCell<BTreeMap<StrategyId, Rc<BookStrategy>>> = RefCell::new(BTreeMap::new());
    /// Journal entries keyed by their sequence number
    pub static JOURNAL: RefCell<StableBTreeMap<u64, JournalEntry, DefaultMemoryImpl>> =
        RefCell::new(StableBTreeMap::init(DefaultMemoryImpl::default()));
}

/// Runs `f` against the vault.
pub fn with_vault<R>(f: impl FnOnce(&Vault) -> R) -> VaultResult<R> {
    VAULT.with(|vault| {
        let binding = vault.try_borrow().map_err(|_| VaultError::Locked)?;
        let vault = binding.as_ref().ok_or(VaultError::NonExistentValue)?;
        Ok(f(vault))
    })
}

/// Runs a mutating operation against the vault.
/// A second mutable access while one is in flight fails with `VaultError::Locked`.
pub fn with_vault_mut<R>(f: impl FnOnce(&mut Vault) -> VaultResult<R>) -> VaultResult<R> {
    VAULT.with(|vault| {
        let mut binding = vault.try_borrow_mut().map_err(|_| VaultError::Locked)?;
        let vault = binding.as_mut().ok_or(VaultError::NonExistentValue)?;
        f(vault)
    })
}

/// Returns the in-canister strategy registered under `id`
pub fn book_strategy(id: StrategyId) -> VaultResult<Rc<BookStrategy>> {
    BOOK_STRATEGIES.with(|strategies| {
        strategies
            .borrow()
            .get(&id)
            .cloned()
            .ok_or(VaultError::InvalidStrategyReference(id))
    })
}

/// Appends an entry to the journal
pub fn insert_journal_entry(entry: &JournalEntry) {
    JOURNAL.with(|journal| {
        let mut binding = journal.borrow_mut();
        let key = binding.last_key_value().map_or(0, |(key, _)| key + 1);
        binding.insert(key, entry.clone());
    });
}

/// Returns up to `depth` of the most recent journal entries, oldest first
pub fn journal_entries(depth: u64) -> Vec<JournalEntry> {
    JOURNAL.with(|journal| {
        let binding = journal.borrow();
        let skip = binding.len().saturating_sub(depth);
        binding
            .iter()
            .skip(skip as usize)
            .map(|(_, entry)| entry)
            .collect()
    })
}
