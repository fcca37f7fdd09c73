//! Telemetry transmission: one blocking JSON POST per record.

use std::fmt;

use serde::Serialize;

pub const CONTENT_TYPE_JSON: (&str, &str) = ("Content-Type", "application/json");

/// Classification of one transmission attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Only `200 OK` counts as delivered.
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Self::Success,
            _ => Self::Failure,
        }
    }

    pub fn is_error(self) -> bool {
        self == Self::Failure
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The request could not be built or sent.
    Request(String),
    /// The connection failed while waiting for the response.
    Response(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(err) => write!(f, "request failed: {err}"),
            Self::Response(err) => write!(f, "no response: {err}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// A received HTTP response. The underlying connection resources are
/// released when the value is dropped.
pub trait HttpResponse {
    fn status(&self) -> u16;

    /// The response body, lossily decoded. Used for diagnostics only.
    fn body_text(&mut self) -> String;
}

/// Blocking HTTP client.
pub trait Transport {
    type Response<'a>: HttpResponse
    where
        Self: 'a;

    fn post<'a>(
        &'a mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Self::Response<'a>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Response<'a> = T::Response<'a>
    where
        Self: 'a;

    fn post<'a>(
        &'a mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Self::Response<'a>, TransportError> {
        (**self).post(url, headers, body)
    }
}

/// Serialize `payload`, POST it to `url` and classify the result. Never
/// retries; the response is released before returning on every path.
pub fn send<T, P>(transport: &mut T, url: &str, payload: &P) -> Outcome
where
    T: Transport,
    P: Serialize + ?Sized,
{
    let body = match serde_json::to_vec(payload) {
        Ok(body) => body,
        Err(e) => {
            log::error!("Unable to serialize payload: {}", e);
            return Outcome::Failure;
        }
    };

    let mut response = match transport.post(url, &[CONTENT_TYPE_JSON], &body) {
        Ok(response) => response,
        Err(e) => {
            log::error!("Error sending data: {}", e);
            return Outcome::Failure;
        }
    };

    let status = response.status();
    let outcome = Outcome::from_status(status);
    match outcome {
        Outcome::Success => log::info!("Data sent successfully"),
        Outcome::Failure => log::error!("Error sending data ({}): {}", status, response.body_text()),
    }

    drop(response);
    outcome
}

/// Read and throw away what is left of a response body, so the connection
/// can carry the next request. Stops at the end of the body or on the first
/// read error; returns the number of bytes discarded.
pub fn discard_body<E>(mut read: impl FnMut(&mut [u8]) -> Result<usize, E>) -> usize {
    let mut buf = [0u8; 64];
    let mut discarded = 0;
    while let Ok(n) = read(&mut buf) {
        if n == 0 {
            break;
        }
        discarded += n;
    }
    discarded
}
