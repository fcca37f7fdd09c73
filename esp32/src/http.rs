use embedded_svc::http::Method;
use embedded_svc::io::Write;
use embedded_svc::utils::io;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

use psychro_common::transmit::{self, HttpResponse, Transport, TransportError};

/// Bytes of a failed response body kept for the log.
const BODY_PREVIEW_LEN: usize = 256;

/// Blocking HTTP(S) over a single ESP-IDF connection. The connection is
/// reused for every request; a response borrows it until dropped.
pub struct EspTransport {
    connection: EspHttpConnection,
}

impl EspTransport {
    pub fn new() -> anyhow::Result<Self> {
        let connection = EspHttpConnection::new(&Configuration {
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })?;

        Ok(Self { connection })
    }
}

pub struct EspResponse<'a> {
    connection: &'a mut EspHttpConnection,
}

impl HttpResponse for EspResponse<'_> {
    fn status(&self) -> u16 {
        self.connection.status()
    }

    fn body_text(&mut self) -> String {
        let mut buf = [0u8; BODY_PREVIEW_LEN];
        match io::try_read_full(&mut *self.connection, &mut buf).map_err(|e| e.0) {
            Ok(bytes_read) => String::from_utf8_lossy(&buf[..bytes_read]).into_owned(),
            Err(e) => format!("<unreadable body: {:?}>", e),
        }
    }
}

impl Drop for EspResponse<'_> {
    fn drop(&mut self) {
        let discarded = transmit::discard_body(|buf| self.connection.read(buf));
        if discarded > 0 {
            log::debug!("Discarded {} unread response bytes", discarded);
        }
    }
}

impl Transport for EspTransport {
    type Response<'a> = EspResponse<'a>
    where
        Self: 'a;

    fn post<'a>(
        &'a mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Self::Response<'a>, TransportError> {
        let content_length = body.len().to_string();
        let mut all_headers = headers.to_vec();
        all_headers.push(("content-length", &content_length));

        self.connection
            .initiate_request(Method::Post, url, &all_headers)
            .map_err(|e| TransportError::Request(e.to_string()))?;
        self.connection
            .write_all(body)
            .map_err(|e| TransportError::Request(e.to_string()))?;
        self.connection
            .flush()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        log::info!("-> POST {}", url);
        self.connection
            .initiate_response()
            .map_err(|e| TransportError::Response(e.to_string()))?;
        log::info!("<- {}", self.connection.status());

        Ok(EspResponse {
            connection: &mut self.connection,
        })
    }
}
