mod dht11;
mod http;
mod storage;
mod time;
mod wifi;

use std::thread;
use std::time::Duration;

use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::sntp::EspSntp;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs::EspDefaultNvsPartition};
use log::{info, warn};

use psychro_common::clock::{Clock, SystemClock, ThreadSleeper};
use psychro_common::config::{self, WifiCredentials};
use psychro_common::network::{self, WaitPolicy};
use psychro_common::sensor::{SampledProbe, SensorReader};
use psychro_common::transmit::{HttpResponse, Outcome, Transport, CONTENT_TYPE_JSON};
use psychro_common::{Acquisition, AcquisitionConfig};
use psychro_model::{format_timestamp, SingleProbeRecord};

use crate::dht11::Dht11;
use crate::http::EspTransport;
use crate::wifi::EspStation;

type Sensors = SensorReader<SampledProbe<Dht11>, SampledProbe<Dht11>>;

/// Print both probes once a second, forever.
fn sensor_bench(mut sensors: Sensors) -> anyhow::Result<()> {
    loop {
        match sensors.read() {
            Ok(reading) => info!("{}", reading),
            Err(e) => warn!("Error reading sensors: {}", e),
        }
        thread::sleep(Duration::from_secs(1));
    }
}

/// Post a single fixed reading and log whatever the endpoint answers.
fn smoke_test(transport: &mut EspTransport, url: &str) -> anyhow::Result<Outcome> {
    let record = SingleProbeRecord {
        timestamp: format_timestamp(SystemClock.now()),
        temperature: 25.0,
        humidity: 50.0,
    };
    let body = serde_json::to_vec(&record)?;

    let mut response = transport.post(url, &[CONTENT_TYPE_JSON], &body)?;
    let status = response.status();
    info!("Smoke test response ({}): {}", status, response.body_text());

    Ok(Outcome::from_status(status))
}

/// Clock sync and HTTP client, both needed once the link is up.
fn start_services() -> anyhow::Result<(EspSntp<'static>, EspTransport)> {
    let sntp = EspSntp::new_default()?;
    time::wait_for_sync(&sntp);

    Ok((sntp, EspTransport::new()?))
}

fn main() -> anyhow::Result<()> {
    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    EspLogger::initialize_default();

    storage::mount()?;
    let credentials = WifiCredentials::load(storage::path(config::WIFI_CONFIG_FILE));
    let url = config::endpoint_url(&config::load(storage::path(config::ENDPOINT_CONFIG_FILE)));

    let peripherals = Peripherals::take()?;

    let sensors: Sensors = SensorReader::new(
        SampledProbe::new("inlet", Dht11::new(peripherals.pins.gpio16)),
        SampledProbe::new("outlet", Dht11::new(peripherals.pins.gpio17)),
    );

    if cfg!(feature = "sensor-bench") {
        return sensor_bench(sensors);
    }

    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?,
        sysloop,
    )?;

    let network = network::connect(EspStation::new(wifi), &credentials, WaitPolicy::default())?;

    let (_sntp, mut transport) = match start_services() {
        Ok(services) => services,
        Err(e) => {
            network.disconnect();
            return Err(e);
        }
    };

    if cfg!(feature = "smoke-test") {
        let outcome = smoke_test(&mut transport, &url);
        network.disconnect();
        info!("Smoke test: {:?}", outcome?);
        return Ok(());
    }

    let report = Acquisition::new(
        sensors,
        transport,
        SystemClock,
        ThreadSleeper,
        url,
        AcquisitionConfig::default(),
    )
    .run(network);

    info!(
        "Acquisition finished after {} attempts: {:?}",
        report.attempts, report.stop
    );

    Ok(())
}
