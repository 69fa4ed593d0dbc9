use std::time::Duration;

use ic_exports::ic_cdk_timers::set_timer_interval;

use crate::{cleanup::daily_cleanup, constants::JOURNAL_CLEANUP_INTERVAL};

pub fn start_timers() {
    // JOURNAL CLEANUP | EVERY 24 HOURS
    set_timer_interval(Duration::from_secs(JOURNAL_CLEANUP_INTERVAL), daily_cleanup);
}
