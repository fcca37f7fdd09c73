//! The acquisition loop: read both probes, post the reading, and decide
//! whether to go on.
//!
//! The loop is `Running` until either the attempt counter reaches
//! [`AcquisitionConfig::max_attempts`] or a transmission fails; then it is
//! `Stopped` and the network is torn down. It sleeps between iterations only
//! when it is going to continue.

use std::time::Duration;

use psychro_model::TelemetryRecord;

use crate::clock::{Clock, Sleeper};
use crate::network::{NetworkHandle, StationInterface};
use crate::sensor::{Probe, SensorReader};
use crate::transmit::{self, Outcome, Transport};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AcquisitionConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 120,
            interval: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// All attempts were used, the last one delivered.
    Ceiling,
    /// The last transmission was not accepted.
    TransmissionFailed,
    /// The probes could not be read, nothing was sent for that attempt.
    SensorFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Report {
    pub attempts: u32,
    pub stop: StopReason,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Running,
    Stopped(StopReason),
}

/// Transition after an attempt. A failed last attempt reports the failure,
/// not the ceiling.
fn next_state(attempts: u32, max_attempts: u32, outcome: Outcome) -> State {
    match outcome {
        Outcome::Failure => State::Stopped(StopReason::TransmissionFailed),
        Outcome::Success if attempts >= max_attempts => State::Stopped(StopReason::Ceiling),
        Outcome::Success => State::Running,
    }
}

pub struct Acquisition<I, O, T, C, S> {
    sensors: SensorReader<I, O>,
    transport: T,
    clock: C,
    sleeper: S,
    url: String,
    config: AcquisitionConfig,
}

impl<I, O, T, C, S> Acquisition<I, O, T, C, S>
where
    I: Probe,
    O: Probe,
    T: Transport,
    C: Clock,
    S: Sleeper,
{
    pub fn new(
        sensors: SensorReader<I, O>,
        transport: T,
        clock: C,
        sleeper: S,
        url: impl Into<String>,
        config: AcquisitionConfig,
    ) -> Self {
        Self {
            sensors,
            transport,
            clock,
            sleeper,
            url: url.into(),
            config,
        }
    }

    /// Run to completion, then disconnect `network`.
    pub fn run<W: StationInterface>(mut self, network: NetworkHandle<W>) -> Report {
        let report = self.run_loop();
        log::info!(
            "Acquisition stopped after {} attempts: {:?}",
            report.attempts,
            report.stop
        );

        network.disconnect();
        report
    }

    fn run_loop(&mut self) -> Report {
        let mut attempts = 0;
        if self.config.max_attempts == 0 {
            return Report {
                attempts,
                stop: StopReason::Ceiling,
            };
        }

        loop {
            log::info!("Measurement {}", attempts);

            let reading = match self.sensors.read() {
                Ok(reading) => reading,
                Err(e) => {
                    log::error!("Unable to read sensors: {}", e);
                    return Report {
                        attempts: attempts + 1,
                        stop: StopReason::SensorFailed,
                    };
                }
            };
            log::info!("{}", reading);
            if !reading.is_plausible() {
                log::warn!("Reading outside plausible range: {}", reading);
            }

            let record = TelemetryRecord::new(self.clock.now(), reading);
            let outcome = transmit::send(&mut self.transport, &self.url, &record);
            attempts += 1;

            match next_state(attempts, self.config.max_attempts, outcome) {
                State::Running => self.sleeper.sleep(self.config.interval),
                State::Stopped(stop) => return Report { attempts, stop },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WifiCredentials;
    use crate::network::tests::FakeStation;
    use crate::network::{self, NetworkError, WaitPolicy};
    use crate::sensor::{ProbeDriver, ProbeError, Sample, SampledProbe, SimulatedDriver};
    use crate::transmit::tests::FakeTransport;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::cell::Cell;
    use std::rc::Rc;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 5, 17)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap()
        }
    }

    #[derive(Default)]
    struct RecordingSleeper(Vec<Duration>);

    impl Sleeper for RecordingSleeper {
        fn sleep(&mut self, duration: Duration) {
            self.0.push(duration);
        }
    }

    struct BrokenDriver;

    impl ProbeDriver for BrokenDriver {
        fn sample(&mut self) -> Result<Sample, ProbeError> {
            Err(ProbeError::Timeout)
        }
    }

    fn sensors() -> SensorReader<SampledProbe<SimulatedDriver>, SampledProbe<SimulatedDriver>> {
        SensorReader::new(
            SampledProbe::new("inlet", SimulatedDriver::inlet()),
            SampledProbe::new("outlet", SimulatedDriver::outlet()),
        )
    }

    fn connected() -> NetworkHandle<FakeStation> {
        let credentials = WifiCredentials {
            ssid: "MyNet".into(),
            password: "secret".into(),
        };
        let policy = WaitPolicy {
            timeout: None,
            poll_interval: Duration::ZERO,
        };
        network::connect(FakeStation::up_after(3), &credentials, policy).unwrap()
    }

    fn run(transport: &mut FakeTransport, sleeper: &mut RecordingSleeper) -> Report {
        Acquisition::new(
            sensors(),
            transport,
            FixedClock,
            sleeper,
            "http://ingest/prod",
            AcquisitionConfig::default(),
        )
        .run(connected())
    }

    #[test]
    fn stops_at_the_ceiling_when_every_send_succeeds() {
        let mut transport = FakeTransport::default();
        let mut sleeper = RecordingSleeper::default();

        let report = run(&mut transport, &mut sleeper);

        assert_eq!(
            report,
            Report {
                attempts: 120,
                stop: StopReason::Ceiling
            }
        );
        assert_eq!(transport.requests.len(), 120);
        assert_eq!(transport.released.get(), 120);
        assert_eq!(sleeper.0.len(), 119);
        assert!(sleeper.0.iter().all(|d| *d == Duration::from_secs(30)));
    }

    #[test]
    fn failure_on_the_last_attempt_is_not_the_ceiling() {
        let statuses = std::iter::repeat(Some(200)).take(119).chain([Some(500)]);
        let mut transport = FakeTransport::with_statuses(statuses);
        let mut sleeper = RecordingSleeper::default();

        let report = run(&mut transport, &mut sleeper);

        assert_eq!(
            report,
            Report {
                attempts: 120,
                stop: StopReason::TransmissionFailed
            }
        );
        assert_eq!(transport.requests.len(), 120);
        assert_eq!(sleeper.0.len(), 119);
    }

    #[test]
    fn first_failure_stops_immediately() {
        let mut transport = FakeTransport::with_statuses([Some(200), Some(200), Some(400)]);
        let mut sleeper = RecordingSleeper::default();

        let report = run(&mut transport, &mut sleeper);

        assert_eq!(report.attempts, 3);
        assert_eq!(report.stop, StopReason::TransmissionFailed);
        assert_eq!(transport.requests.len(), 3);
        assert_eq!(transport.released.get(), 3);
        // No sleep after the failing attempt.
        assert_eq!(sleeper.0.len(), 2);
    }

    #[test]
    fn transport_error_stops_the_loop() {
        let mut transport = FakeTransport::with_statuses([None]);
        let mut sleeper = RecordingSleeper::default();

        let report = run(&mut transport, &mut sleeper);

        assert_eq!(report.attempts, 1);
        assert_eq!(report.stop, StopReason::TransmissionFailed);
        assert!(sleeper.0.is_empty());
    }

    #[test]
    fn posts_stamped_four_field_records() {
        let mut transport = FakeTransport::with_statuses([Some(500)]);
        let mut sleeper = RecordingSleeper::default();
        run(&mut transport, &mut sleeper);

        let (url, _, body) = &transport.requests[0];
        assert_eq!(url, "http://ingest/prod");
        assert_eq!(body["timestamp"], "2024-05-17 09:30:00");
        for field in ["inlet_temp", "inlet_hum", "outlet_temp", "outlet_hum"] {
            assert!(body[field].is_f64(), "{field}");
        }
    }

    #[test]
    fn sensor_failure_stops_without_sending() {
        let mut transport = FakeTransport::default();
        let mut sleeper = RecordingSleeper::default();
        let sensors = SensorReader::new(
            SampledProbe::new("inlet", SimulatedDriver::inlet()),
            SampledProbe::new("outlet", BrokenDriver),
        );

        let report = Acquisition::new(
            sensors,
            &mut transport,
            FixedClock,
            &mut sleeper,
            "http://ingest/prod",
            AcquisitionConfig::default(),
        )
        .run(connected());

        assert_eq!(report.stop, StopReason::SensorFailed);
        assert_eq!(report.attempts, 1);
        assert!(transport.requests.is_empty());
    }

    #[test]
    fn attempts_never_exceed_the_ceiling() {
        for max_attempts in [0, 1, 2, 7] {
            let mut transport = FakeTransport::default();
            let mut sleeper = RecordingSleeper::default();
            let config = AcquisitionConfig {
                max_attempts,
                interval: Duration::ZERO,
            };

            let report = Acquisition::new(
                sensors(),
                &mut transport,
                FixedClock,
                &mut sleeper,
                "http://ingest/prod",
                config,
            )
            .run(connected());

            assert_eq!(report.attempts, max_attempts);
            assert_eq!(report.stop, StopReason::Ceiling);
            assert_eq!(transport.requests.len() as u32, max_attempts);
        }
    }

    #[test]
    fn transition_table() {
        assert_eq!(next_state(1, 120, Outcome::Success), State::Running);
        assert_eq!(next_state(119, 120, Outcome::Success), State::Running);
        assert_eq!(
            next_state(120, 120, Outcome::Success),
            State::Stopped(StopReason::Ceiling)
        );
        assert_eq!(
            next_state(5, 120, Outcome::Failure),
            State::Stopped(StopReason::TransmissionFailed)
        );
        assert_eq!(
            next_state(120, 120, Outcome::Failure),
            State::Stopped(StopReason::TransmissionFailed)
        );
    }

    /// Calls to `disconnect` and `deactivate`, shared with the test after
    /// the station has been moved into the loop.
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Teardown {
        disconnects: u32,
        deactivations: u32,
    }

    struct TrackedStation {
        teardown: Rc<Cell<Teardown>>,
    }

    impl StationInterface for TrackedStation {
        fn activate(&mut self) -> Result<(), NetworkError> {
            Ok(())
        }

        fn begin_connect(&mut self, _ssid: &str, _password: &str) -> Result<(), NetworkError> {
            Ok(())
        }

        fn is_connected(&self) -> Result<bool, NetworkError> {
            Ok(true)
        }

        fn ip_info(&self) -> Result<String, NetworkError> {
            Ok("ip: 10.0.0.2".into())
        }

        fn disconnect(&mut self) -> Result<(), NetworkError> {
            let mut teardown = self.teardown.get();
            teardown.disconnects += 1;
            self.teardown.set(teardown);
            Ok(())
        }

        fn deactivate(&mut self) -> Result<(), NetworkError> {
            let mut teardown = self.teardown.get();
            teardown.deactivations += 1;
            self.teardown.set(teardown);
            Ok(())
        }
    }

    fn tracked() -> (NetworkHandle<TrackedStation>, Rc<Cell<Teardown>>) {
        let teardown = Rc::new(Cell::new(Teardown::default()));
        let station = TrackedStation {
            teardown: Rc::clone(&teardown),
        };
        let credentials = WifiCredentials {
            ssid: "MyNet".into(),
            password: "secret".into(),
        };
        let handle = network::connect(station, &credentials, WaitPolicy::default()).unwrap();
        (handle, teardown)
    }

    #[test]
    fn every_stop_tears_the_network_down_once() {
        let broken = || {
            SensorReader::new(
                SampledProbe::new("inlet", SimulatedDriver::inlet()),
                SampledProbe::new("outlet", BrokenDriver),
            )
        };

        let cases: Vec<(u32, Vec<Option<u16>>, bool, StopReason)> = vec![
            (3, vec![], false, StopReason::Ceiling),
            (0, vec![], false, StopReason::Ceiling),
            (120, vec![Some(200), Some(503)], false, StopReason::TransmissionFailed),
            (120, vec![], true, StopReason::SensorFailed),
        ];

        for (max_attempts, statuses, sensor_broken, expected) in cases {
            let mut transport = FakeTransport::with_statuses(statuses);
            let mut sleeper = RecordingSleeper::default();
            let config = AcquisitionConfig {
                max_attempts,
                interval: Duration::ZERO,
            };
            let (handle, teardown) = tracked();
            assert_eq!(teardown.get(), Teardown::default());

            let report = if sensor_broken {
                Acquisition::new(
                    broken(),
                    &mut transport,
                    FixedClock,
                    &mut sleeper,
                    "http://ingest/prod",
                    config,
                )
                .run(handle)
            } else {
                Acquisition::new(
                    sensors(),
                    &mut transport,
                    FixedClock,
                    &mut sleeper,
                    "http://ingest/prod",
                    config,
                )
                .run(handle)
            };

            assert_eq!(report.stop, expected);
            assert_eq!(
                teardown.get(),
                Teardown {
                    disconnects: 1,
                    deactivations: 1
                },
                "{expected:?} with max_attempts {max_attempts}"
            );
        }
    }
}
