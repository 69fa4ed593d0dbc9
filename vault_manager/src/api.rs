//! Endpoint logic behind the canister interface.
//!
//! Keeps the canister methods thin: each one resolves the caller and forwards here
//! or straight to the vault through `state::with_vault_mut`.

use std::{collections::BTreeMap, rc::Rc};

use candid::Principal;

use crate::{
    access::AccessGate,
    journal::{JournalCollection, LogType},
    state::{book_strategy, with_vault, BOOK_STRATEGIES, VAULT},
    strategy::{book::BookStrategy, StrategyRef},
    types::{InitArgs, Role, StrategyId},
    utils::error::{VaultError, VaultResult},
    vault::Vault,
};

/// Builds the vault from the init arguments and installs it in the canister state.
///
/// Strategies are registered under their position in `args.strategies`, then the
/// initial allocations are validated and installed.
pub fn init_state(vault_id: Principal, args: InitArgs) -> VaultResult<()> {
    let mut journal = JournalCollection::open();

    let mut vault = Vault::new(vault_id, AccessGate::new(args.admins, args.managers));
    let mut books = BTreeMap::new();
    for (index, input) in args.strategies.iter().enumerate() {
        let strategy_id = StrategyId::try_from(index)
            .map_err(|_| VaultError::Custom("Too many strategies.".to_string()))?;
        let book = Rc::new(BookStrategy::new(input.has_lockup));
        let strategy: StrategyRef = book.clone();
        vault.insert_strategy(strategy_id, strategy)?;
        books.insert(strategy_id, book);
    }
    vault.install_allocations(&args.allocations)?;

    VAULT.with(|state| *state.borrow_mut() = Some(vault));
    BOOK_STRATEGIES.with(|state| *state.borrow_mut() = books);

    journal.append_note(
        Ok(()),
        LogType::Info,
        format!(
            "Initialized the vault with {} strategies and {} allocations.",
            args.strategies.len(),
            args.allocations.len()
        ),
    );
    Ok(())
}

fn ensure_manager(caller: &Principal) -> VaultResult<()> {
    if with_vault(|vault| vault.has_role(caller, Role::Manager))? {
        Ok(())
    } else {
        Err(VaultError::Unauthorized)
    }
}

/// Records the current value of an in-canister strategy, including yield or losses.
pub fn report_strategy_assets(caller: Principal, strategy_id: StrategyId, total_assets: u128) -> VaultResult<()> {
    ensure_manager(&caller)?;
    let strategy = book_strategy(strategy_id)?;
    strategy.report(total_assets);

    JournalCollection::open()
        .append(Ok(()), LogType::StrategyReport)
        .strategy(strategy_id)
        .amount(total_assets);
    Ok(())
}

/// Starts or ends the lockup period of an in-canister strategy.
pub fn set_strategy_lockup(caller: Principal, strategy_id: StrategyId, locked: bool) -> VaultResult<()> {
    ensure_manager(&caller)?;
    let strategy = book_strategy(strategy_id)?;
    strategy.set_lockup(locked);

    JournalCollection::open()
        .append(Ok(()), LogType::StrategyReport)
        .strategy(strategy_id)
        .note(format!("Lockup set to {}.", locked));
    Ok(())
}
