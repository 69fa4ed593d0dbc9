mod access;
mod api;
mod canister;
mod cleanup;
mod constants;
mod journal;
mod state;
mod strategy;
mod timers;
mod types;
mod utils;
mod vault;

pub use canister::VaultManager;
