//! Vault engine
//!
//! Pools a single asset, issues proportional shares and spreads the capital across
//! registered strategies according to the allocation table. The engine is a plain
//! single-writer state machine: every mutating method takes `&mut self` and runs to
//! completion. Calls into strategies are external calls; engine state is always
//! updated before a strategy is called.
//!
//! ```plain
//! deposit ──► ShareLedger::mint ──► route_deposit ──► strategies
//!
//! request_withdraw ──► ShareLedger::burn ──► pull_liquid_funds ──► payout
//!                                       └──► WithdrawalQueue (remainder)
//!
//! claim_withdraw ──► mark claimed ──► pull_liquid_funds ──► payout
//! ```

use std::collections::BTreeMap;

use candid::Principal;

use crate::{
    access::{AccessGate, PauseStatus},
    journal::{JournalCollection, LogType},
    strategy::StrategyRef,
    types::{Role, StrategyId},
    utils::{
        error::{VaultError, VaultResult},
        math::Rounding,
    },
};

pub(crate) mod allocation;
pub(crate) mod deposit;
pub(crate) mod ledger;
pub(crate) mod liquidity;
pub(crate) mod rebalance;
pub(crate) mod withdrawal;

use allocation::AllocationTable;
use ledger::ShareLedger;
use withdrawal::WithdrawalQueue;

pub struct Vault {
    /// Principal the strategies return funds to
    id: Principal,
    /// Role assignments and pause flag
    gate: AccessGate,
    /// Strategies that allocations may reference
    strategies: BTreeMap<StrategyId, StrategyRef>,
    allocations: AllocationTable,
    ledger: ShareLedger,
    /// Principal held by the vault and not deployed to any strategy
    idle: u128,
    queue: WithdrawalQueue,
}

impl Vault {
    pub fn new(id: Principal, gate: AccessGate) -> Self {
        Self {
            id,
            gate,
            strategies: BTreeMap::new(),
            allocations: AllocationTable::default(),
            ledger: ShareLedger::default(),
            idle: 0,
            queue: WithdrawalQueue::default(),
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> Principal {
        self.id
    }

    /// Makes a strategy available to allocations. Manager only.
    pub fn register_strategy(
        &mut self,
        caller: Principal,
        strategy_id: StrategyId,
        strategy: StrategyRef,
    ) -> VaultResult<()> {
        self.gate.ensure_role(&caller, Role::Manager)?;
        self.gate.ensure_not_paused()?;
        self.insert_strategy(strategy_id, strategy)
    }

    pub(crate) fn insert_strategy(&mut self, strategy_id: StrategyId, strategy: StrategyRef) -> VaultResult<()> {
        if self.strategies.contains_key(&strategy_id) {
            return Err(VaultError::DuplicateStrategy(strategy_id));
        }
        let has_lockup = strategy.has_lockup();
        self.strategies.insert(strategy_id, strategy);
        JournalCollection::open()
            .append(Ok(()), LogType::StrategyRegistered)
            .strategy(strategy_id)
            .note(format!("Registered strategy, lockup: {}.", has_lockup));
        Ok(())
    }

    pub fn strategy_ids(&self) -> Vec<StrategyId> {
        self.strategies.keys().copied().collect()
    }

    pub fn balance_of(&self, owner: &Principal) -> u128 {
        self.ledger.balance_of(owner)
    }

    pub fn total_supply(&self) -> u128 {
        self.ledger.total_supply()
    }

    pub fn convert_to_shares(&self, assets: u128) -> VaultResult<u128> {
        self.ledger.to_shares(assets, self.total_assets()?, Rounding::Down)
    }

    pub fn convert_to_assets(&self, shares: u128) -> VaultResult<u128> {
        self.ledger.to_assets(shares, self.total_assets()?, Rounding::Down)
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    pub fn pause_status(&self) -> PauseStatus {
        self.gate.status().clone()
    }

    pub fn has_role(&self, account: &Principal, role: Role) -> bool {
        self.gate.has_role(account, role)
    }

    pub fn pause(&mut self, caller: Principal) -> VaultResult<()> {
        let mut journal = JournalCollection::open();
        let result = self.gate.pause(&caller);
        journal.append_note(result.clone(), LogType::Paused, format!("Pause requested by {}.", caller));
        result
    }

    pub fn unpause(&mut self, caller: Principal) -> VaultResult<()> {
        let mut journal = JournalCollection::open();
        let result = self.gate.unpause(&caller);
        journal.append_note(result.clone(), LogType::Unpaused, format!("Unpause requested by {}.", caller));
        result
    }

    pub fn grant_role(&mut self, caller: Principal, account: Principal, role: Role) -> VaultResult<bool> {
        let granted = self.gate.grant_role(&caller, account, role)?;
        JournalCollection::open().append_note(
            Ok(()),
            LogType::RoleChanged,
            format!("{:?} granted to {} by {}.", role, account, caller),
        );
        Ok(granted)
    }

    pub fn revoke_role(&mut self, caller: Principal, account: Principal, role: Role) -> VaultResult<bool> {
        let revoked = self.gate.revoke_role(&caller, account, role)?;
        JournalCollection::open().append_note(
            Ok(()),
            LogType::RoleChanged,
            format!("{:?} revoked from {} by {}.", role, account, caller),
        );
        Ok(revoked)
    }
}
