//! In-process stand-ins for the device's network, so the acquisition loop can
//! run on the host against the real ingestion handler.

use std::cell::Cell;

use chrono::NaiveDateTime;
use psychro_common::clock::Clock;
use psychro_common::network::{NetworkError, StationInterface};
use psychro_common::transmit::{HttpResponse, Transport, TransportError};

use crate::ingest::{self, IngestEvent};
use crate::store::TableStore;

/// A station that is up as soon as it is asked to connect.
#[derive(Debug, Default)]
pub struct LoopbackStation {
    active: bool,
    ssid: Option<String>,
}

impl StationInterface for LoopbackStation {
    fn activate(&mut self) -> Result<(), NetworkError> {
        self.active = true;
        Ok(())
    }

    fn begin_connect(&mut self, ssid: &str, _password: &str) -> Result<(), NetworkError> {
        if !self.active {
            return Err(NetworkError::interface("interface is not active"));
        }
        self.ssid = Some(ssid.to_string());
        Ok(())
    }

    fn is_connected(&self) -> Result<bool, NetworkError> {
        Ok(self.active && self.ssid.is_some())
    }

    fn ip_info(&self) -> Result<String, NetworkError> {
        Ok(format!(
            "loopback ip: 127.0.0.1, ssid: {}",
            self.ssid.as_deref().unwrap_or_default()
        ))
    }

    fn disconnect(&mut self) -> Result<(), NetworkError> {
        self.ssid = None;
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), NetworkError> {
        self.active = false;
        Ok(())
    }
}

pub struct LoopbackResponse {
    status: u16,
    body: String,
}

impl HttpResponse for LoopbackResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn body_text(&mut self) -> String {
        std::mem::take(&mut self.body)
    }
}

/// Delivers every POST body straight to [`ingest::handle`].
pub struct LoopbackTransport<S> {
    store: S,
}

impl<S: TableStore> LoopbackTransport<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: TableStore> Transport for LoopbackTransport<S> {
    type Response<'a> = LoopbackResponse
    where
        Self: 'a;

    fn post<'a>(
        &'a mut self,
        _url: &str,
        _headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Self::Response<'a>, TransportError> {
        let body = std::str::from_utf8(body).map_err(|e| TransportError::Request(e.to_string()))?;
        let response = ingest::handle(
            &mut self.store,
            &IngestEvent {
                body: body.to_string(),
            },
        );

        Ok(LoopbackResponse {
            status: response.status_code,
            body: response.body,
        })
    }
}

/// Simulated time: each reading is stamped one step after the previous one,
/// however fast the loop actually runs.
pub struct SteppedClock {
    next: Cell<NaiveDateTime>,
    step: chrono::Duration,
}

impl SteppedClock {
    pub fn new(start: NaiveDateTime, step: std::time::Duration) -> Self {
        Self {
            next: Cell::new(start),
            step: chrono::Duration::from_std(step).unwrap_or_else(|_| chrono::Duration::seconds(30)),
        }
    }
}

impl Clock for SteppedClock {
    fn now(&self) -> NaiveDateTime {
        let now = self.next.get();
        self.next.set(now + self.step);
        now
    }
}
