//! Platform-independent parts of the telemetry device: configuration, probes,
//! network association, transmission and the acquisition loop.
//!
//! Hardware sits behind the [`sensor::ProbeDriver`], [`network::StationInterface`]
//! and [`transmit::Transport`] traits, implemented by the firmware for the
//! ESP32 and by fakes on the host.

pub mod acquisition;
pub mod clock;
pub mod config;
pub mod network;
pub mod sensor;
pub mod transmit;

pub use acquisition::{Acquisition, AcquisitionConfig, Report, StopReason};
pub use transmit::Outcome;
