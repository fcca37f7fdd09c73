use std::thread;
use std::time::Duration;

use esp_idf_svc::sntp::{EspSntp, SyncStatus};

use psychro_common::clock::{Clock, SystemClock};
use psychro_model::format_timestamp;

/// Block until SNTP has set the system clock, so readings carry wall time.
pub fn wait_for_sync(sntp: &EspSntp) {
    log::info!("Starting NTP time sync...");

    while sntp.get_sync_status() != SyncStatus::Completed {
        log::info!("Waiting for NTP time sync...");
        thread::sleep(Duration::from_millis(500));
    }

    log::info!("NTP time sync completed: {}", format_timestamp(SystemClock.now()));
}
