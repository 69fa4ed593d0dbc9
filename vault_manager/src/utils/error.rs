use candid::CandidType;
use serde::Deserialize;

use crate::types::{RequestId, StrategyId};

/// Vault Manager Result
pub type VaultResult<T> = Result<T, VaultError>;

/// Vault Manager Errors
///
/// Allocation validation failures are reported through the `InvalidStrategyReference`,
/// `DuplicateStrategy`, `NonPositiveAllocation`, `AllocationExceedsPerStrategyCap` and
/// `TotalAllocationExceedsMax` variants.
#[derive(Clone, CandidType, Debug, Deserialize, PartialEq, Eq)]
pub enum VaultError {
    /// The caller lacks the required role
    Unauthorized,
    /// The caller does not own the withdrawal request
    NotRequestOwner(RequestId),
    /// A requested value does not exist
    NonExistentValue,
    /// The allocation references a strategy that is not registered
    InvalidStrategyReference(StrategyId),
    /// The strategy appears more than once, or is already registered
    DuplicateStrategy(StrategyId),
    /// Target allocation of zero basis points
    NonPositiveAllocation(StrategyId),
    /// Target allocation above the per-strategy cap
    AllocationExceedsPerStrategyCap { strategy_id: StrategyId, target_bps: u16 },
    /// Sum of the target allocations above 100%
    TotalAllocationExceedsMax(u32),
    /// Zero shares were requested
    SharesMustBePositive,
    /// Zero assets were supplied
    AssetsMustBePositive,
    /// The deposit would mint zero shares
    DepositTooSmall,
    /// The redemption would pay out zero assets
    RedemptionTooSmall,
    /// The owner holds fewer shares than requested
    InsufficientShares { requested: u128, available: u128 },
    /// Mutating entry points are paused
    EnginePaused,
    /// Unlocked strategies could not cover the requested amount
    InsufficientLiquidity { shortfall: u128 },
    /// The withdrawal request has already been claimed
    AlreadyClaimed(RequestId),
    /// The vault is currently executing another operation
    Locked,
    /// A strategy rejected a deposit or withdrawal
    StrategyFailure(String),
    /// Arithmetic error
    Arithmetic(String),
    /// Unknown/Custom error
    Custom(String),
}

pub fn arithmetic_err<S: AsRef<str>>(s: S) -> VaultError {
    VaultError::Arithmetic(s.as_ref().to_string())
}
