//! Allocation table
//!
//! Ordered list of `(strategy, target basis points)` pairs. The list order is the
//! iteration order of deposit routing, rebalancing and liquidity pulls. The table is
//! only ever replaced as a whole, after the candidate list is fully validated.

use std::collections::{BTreeMap, BTreeSet};

use candid::Principal;

use crate::{
    constants::{CAP_PER_STRATEGY, MAX_BPS},
    journal::{JournalCollection, LogType},
    strategy::StrategyRef,
    types::{AllocationInput, AllocationQuery, Role, StrategyId},
    utils::error::{VaultError, VaultResult},
};

use super::Vault;

/// A validated allocation entry
#[derive(Clone)]
pub struct Allocation {
    pub strategy_id: StrategyId,
    pub strategy: StrategyRef,
    pub target_bps: u16,
}

#[derive(Clone, Default)]
pub struct AllocationTable {
    entries: Vec<Allocation>,
}

impl AllocationTable {
    /// Resolves and validates a candidate list against the strategy registry.
    pub fn validate(
        inputs: &[AllocationInput],
        registry: &BTreeMap<StrategyId, StrategyRef>,
    ) -> VaultResult<Vec<Allocation>> {
        let mut seen = BTreeSet::new();
        let mut total_bps: u32 = 0;
        let mut entries = Vec::with_capacity(inputs.len());

        for input in inputs {
            let strategy = registry
                .get(&input.strategy_id)
                .ok_or(VaultError::InvalidStrategyReference(input.strategy_id))?;
            if !seen.insert(input.strategy_id) {
                return Err(VaultError::DuplicateStrategy(input.strategy_id));
            }
            if input.target_bps == 0 {
                return Err(VaultError::NonPositiveAllocation(input.strategy_id));
            }
            if input.target_bps > CAP_PER_STRATEGY {
                return Err(VaultError::AllocationExceedsPerStrategyCap {
                    strategy_id: input.strategy_id,
                    target_bps: input.target_bps,
                });
            }
            total_bps += u32::from(input.target_bps);
            entries.push(Allocation {
                strategy_id: input.strategy_id,
                strategy: strategy.clone(),
                target_bps: input.target_bps,
            });
        }

        if total_bps > u32::from(MAX_BPS) {
            return Err(VaultError::TotalAllocationExceedsMax(total_bps));
        }

        Ok(entries)
    }

    /// Discards the current entries and installs `entries`
    pub fn replace(&mut self, entries: Vec<Allocation>) {
        self.entries = entries;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Allocation> {
        self.entries.iter()
    }

    /// Clones the current entries, so strategies can be called while the vault is mutated
    pub fn snapshot(&self) -> Vec<Allocation> {
        self.entries.clone()
    }

    pub fn total_bps(&self) -> u32 {
        self.entries.iter().map(|entry| u32::from(entry.target_bps)).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Vault {
    /// Replaces the allocation list. Manager only, rejected while paused.
    pub fn set_allocations(&mut self, caller: Principal, inputs: Vec<AllocationInput>) -> VaultResult<()> {
        self.gate.ensure_role(&caller, Role::Manager)?;
        self.gate.ensure_not_paused()?;
        self.install_allocations(&inputs)
    }

    /// Validates and installs an allocation list without consulting the gate.
    /// Used when the vault is configured at initialization.
    pub(crate) fn install_allocations(&mut self, inputs: &[AllocationInput]) -> VaultResult<()> {
        let mut journal = JournalCollection::open();
        let entries = AllocationTable::validate(inputs, &self.strategies).map_err(|err| {
            journal.append_note(
                Err(err.clone()),
                LogType::AllocationsUpdated,
                "The allocation list was rejected. The previous list stays in place.",
            );
            err
        })?;

        self.allocations.replace(entries);
        journal.append_note(
            Ok(()),
            LogType::AllocationsUpdated,
            format!(
                "Installed {} allocations totalling {} bps.",
                self.allocations.len(),
                self.allocations.total_bps()
            ),
        );
        Ok(())
    }

    /// Current allocations with the live value and lock status of each strategy
    pub fn allocations(&self) -> Vec<AllocationQuery> {
        self.allocations
            .iter()
            .map(|allocation| AllocationQuery {
                strategy_id: allocation.strategy_id,
                target_bps: allocation.target_bps,
                total_assets: allocation.strategy.total_assets(),
                has_lockup: allocation.strategy.has_lockup(),
            })
            .collect()
    }
}
