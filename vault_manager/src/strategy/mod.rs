//! Strategy capability
//!
//! A strategy is an external capital sink the vault delegates funds to. The vault only
//! holds a reference to it and observes it through the four operations of [`Strategy`].
//! The strategy owns and mutates its own state.

use std::rc::Rc;

use candid::Principal;

use crate::utils::error::VaultResult;

pub(crate) mod book;

/// Capability every allocated strategy must provide
#[cfg_attr(test, mockall::automock)]
pub trait Strategy {
    /// Accepts `amount` of principal from the vault
    fn deposit(&self, amount: u128) -> VaultResult<()>;

    /// Returns up to `amount` of principal to `to`. Best-effort: returns the amount
    /// actually withdrawn, which is 0 while the strategy is locked.
    fn withdraw(&self, amount: u128, to: Principal) -> VaultResult<u128>;

    /// Current value held for the vault
    fn total_assets(&self) -> u128;

    /// `true` while withdrawals are unavailable
    fn has_lockup(&self) -> bool;
}

/// Shared, non-owning handle to a strategy
pub type StrategyRef = Rc<dyn Strategy>;
