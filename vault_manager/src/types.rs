use candid::{CandidType, Principal};
use serde::Deserialize;

/// Key of a strategy in the vault's registry
pub type StrategyId = u32;

/// Identifier of a withdrawal request. Assigned from 0 upwards and never reused.
pub type RequestId = u64;

/// Permission roles recognised by the access gate
#[derive(Clone, Copy, CandidType, Debug, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    /// May pause, unpause and change role assignments
    Admin,
    /// May configure allocations, rebalance and manage strategies
    Manager,
}

/// Target allocation for a single strategy, as supplied by a manager
#[derive(Clone, Copy, CandidType, Debug, Deserialize, PartialEq, Eq)]
pub struct AllocationInput {
    pub strategy_id: StrategyId,
    pub target_bps: u16,
}

/// Strategy definition used at initialization
#[derive(Clone, CandidType, Debug, Deserialize)]
pub struct StrategyInput {
    /// Whether the strategy starts in its lockup period
    pub has_lockup: bool,
}

#[derive(Clone, CandidType, Debug, Deserialize)]
pub struct InitArgs {
    pub admins: Vec<Principal>,
    pub managers: Vec<Principal>,
    /// Strategies are keyed by their position in this list
    pub strategies: Vec<StrategyInput>,
    pub allocations: Vec<AllocationInput>,
}

/// Outcome of a redemption
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq, Eq)]
pub struct Redemption {
    /// Value of the burned shares at the redemption-time price
    pub assets: u128,
    /// Amount paid out instantly
    pub paid: u128,
    /// Queued request for the unpaid remainder, `None` when fully settled
    pub request_id: Option<RequestId>,
}

/// Allocation as returned by the query endpoints
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq, Eq)]
pub struct AllocationQuery {
    pub strategy_id: StrategyId,
    pub target_bps: u16,
    pub total_assets: u128,
    pub has_lockup: bool,
}
