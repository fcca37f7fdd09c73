//! Temperature/humidity probes and the two-probe sensor reader.
//!
//! A [`Probe`] follows a measure-then-read protocol: [`Probe::measure`] runs
//! one sampling cycle, after which [`Probe::temperature`] and
//! [`Probe::humidity`] return that sample until the next measurement.

pub mod dht11;
mod simulated;

use std::fmt;

use psychro_model::Reading;

pub use simulated::SimulatedDriver;

/// One sample from a single probe.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    pub temperature_celsius: f32,
    pub humidity_percent: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeError {
    /// An accessor was called before any successful measurement.
    NoReading,
    Timeout,
    ChecksumMismatch,
    Pin(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoReading => write!(f, "no reading yet"),
            Self::Timeout => write!(f, "probe did not answer in time"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
            Self::Pin(err) => write!(f, "pin error: {err}"),
        }
    }
}

impl std::error::Error for ProbeError {}

pub trait Probe {
    /// Trigger a sampling cycle and keep its result.
    fn measure(&mut self) -> Result<(), ProbeError>;

    /// Temperature of the latest sample in °C.
    fn temperature(&self) -> Result<f32, ProbeError>;

    /// Relative humidity of the latest sample in %.
    fn humidity(&self) -> Result<f32, ProbeError>;
}

/// Raw access to a probe's hardware: one call is one sampling cycle.
pub trait ProbeDriver {
    fn sample(&mut self) -> Result<Sample, ProbeError>;
}

/// A [`Probe`] on top of a [`ProbeDriver`], holding the latest sample.
pub struct SampledProbe<D> {
    name: &'static str,
    driver: D,
    last: Option<Sample>,
}

impl<D: ProbeDriver> SampledProbe<D> {
    pub fn new(name: &'static str, driver: D) -> Self {
        Self {
            name,
            driver,
            last: None,
        }
    }

    fn last(&self) -> Result<Sample, ProbeError> {
        self.last.ok_or(ProbeError::NoReading)
    }
}

impl<D: ProbeDriver> Probe for SampledProbe<D> {
    fn measure(&mut self) -> Result<(), ProbeError> {
        // A failed cycle must not leave the previous sample readable.
        self.last = None;

        let sample = self.driver.sample().inspect_err(|e| {
            log::error!("Error reading {} probe: {}", self.name, e);
        })?;
        log::debug!(
            "{}: {:.1}°C, {:.1}%",
            self.name,
            sample.temperature_celsius,
            sample.humidity_percent
        );

        self.last = Some(sample);
        Ok(())
    }

    fn temperature(&self) -> Result<f32, ProbeError> {
        self.last().map(|s| s.temperature_celsius)
    }

    fn humidity(&self) -> Result<f32, ProbeError> {
        self.last().map(|s| s.humidity_percent)
    }
}

/// The inlet and outlet probes read together.
pub struct SensorReader<I, O> {
    inlet: I,
    outlet: O,
}

impl<I: Probe, O: Probe> SensorReader<I, O> {
    pub fn new(inlet: I, outlet: O) -> Self {
        Self { inlet, outlet }
    }

    /// Measure both probes, then read all four values.
    pub fn read(&mut self) -> Result<Reading, ProbeError> {
        self.inlet.measure()?;
        self.outlet.measure()?;

        Ok(Reading {
            inlet_temp: self.inlet.temperature()?,
            inlet_hum: self.inlet.humidity()?,
            outlet_temp: self.outlet.temperature()?,
            outlet_hum: self.outlet.humidity()?,
        })
    }
}
