//! Run the device's acquisition loop on the host with simulated probes,
//! posting into the local readings table through the ingestion handler.
//! Readings are stamped at the nominal interval even when the loop runs
//! without pausing.
//!
//! Usage: `simulate [ATTEMPTS] [INTERVAL_SECS]` (defaults: 120 attempts, no pause).

use std::time::Duration;

use psychro_cloud::loopback::{LoopbackStation, LoopbackTransport, SteppedClock};
use psychro_cloud::store::JsonLinesStore;
use psychro_common::clock::{Clock, SystemClock, ThreadSleeper};
use psychro_common::config::{self, WifiCredentials};
use psychro_common::network::{self, WaitPolicy};
use psychro_common::sensor::{SampledProbe, SensorReader, SimulatedDriver};
use psychro_common::{Acquisition, AcquisitionConfig};

fn arg<T: std::str::FromStr>(index: usize) -> anyhow::Result<Option<T>> {
    std::env::args()
        .nth(index)
        .map(|value| {
            value
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid argument {index}: {value}"))
        })
        .transpose()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let defaults = AcquisitionConfig::default();
    let acquisition_config = AcquisitionConfig {
        max_attempts: arg(1)?.unwrap_or(defaults.max_attempts),
        interval: Duration::from_secs(arg(2)?.unwrap_or(0)),
    };

    let credentials = WifiCredentials::load(config::WIFI_CONFIG_FILE);
    let url = config::endpoint_url(&config::load(config::ENDPOINT_CONFIG_FILE));

    let store = JsonLinesStore::open(psychro_cloud::data_dir(), &psychro_cloud::table_name())?;
    log::info!("Writing to {}", store.path().display());

    let handle = network::connect(LoopbackStation::default(), &credentials, WaitPolicy::default())?;

    let sensors = SensorReader::new(
        SampledProbe::new("inlet", SimulatedDriver::inlet()),
        SampledProbe::new("outlet", SimulatedDriver::outlet()),
    );

    let report = Acquisition::new(
        sensors,
        LoopbackTransport::new(store),
        SteppedClock::new(SystemClock.now(), defaults.interval),
        ThreadSleeper,
        url,
        acquisition_config,
    )
    .run(handle);

    println!("{} attempts, stopped: {:?}", report.attempts, report.stop);
    Ok(())
}
