//! Common utility and helper functions that are used across the project

/// Returns the current time in nanoseconds since the unix epoch.
///
/// Inside a canister this is the IC system time. Native builds (tests, tooling)
/// fall back to the host clock.
#[cfg(target_arch = "wasm32")]
pub fn time_nanos() -> u64 {
    ic_exports::ic_cdk::api::time()
}

/// Returns the current time in nanoseconds since the unix epoch.
///
/// Inside a canister this is the IC system time. Native builds (tests, tooling)
/// fall back to the host clock.
#[cfg(not(target_arch = "wasm32"))]
pub fn time_nanos() -> u64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .and_then(|nanos| u64::try_from(nanos).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_is_monotonic_enough() {
        let first = time_nanos();
        let second = time_nanos();
        assert!(first > 0);
        assert!(second >= first);
    }
}
