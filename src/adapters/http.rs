//! Minimal request/response HTTP transport shared by the remote clients.
//!
//! The cloud store, classifier and notification clients speak JSON over
//! HTTPS.  They are written against [`HttpTransport`] so their protocol
//! logic runs on the host against a scripted transport; on the device
//! [`EspHttpTransport`] performs the exchange with the ESP-IDF client and
//! the certificate bundle.

use crate::error::CommsError;

/// Largest response body any client accepts.
pub const MAX_RESPONSE_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}

/// One blocking request/response exchange.
pub trait HttpTransport {
    /// `body` is sent as `application/json` when non-empty.
    fn exchange(&mut self, method: HttpMethod, url: &str, body: &[u8])
    -> Result<HttpReply, CommsError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &mut T {
    fn exchange(
        &mut self,
        method: HttpMethod,
        url: &str,
        body: &[u8],
    ) -> Result<HttpReply, CommsError> {
        (**self).exchange(method, url, body)
    }
}

/// Percent-encode a query parameter value (RFC 3986 unreserved set kept).
pub fn encode_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(b));
            }
            _ => {
                out.push('%');
                out.push(char::from(HEX[usize::from(b >> 4)]));
                out.push(char::from(HEX[usize::from(b & 0x0F)]));
            }
        }
    }
    out
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

// ───────────────────────────────────────────────────────────────
// ESP-IDF transport
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::EspHttpTransport;

#[cfg(target_os = "espidf")]
mod esp {
    use core::time::Duration;

    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
    use log::warn;

    use super::{HttpMethod, HttpReply, HttpTransport, MAX_RESPONSE_BYTES};
    use crate::error::CommsError;

    /// A fresh connection per exchange; the remote calls are infrequent
    /// and a stale keep-alive socket after a link drop costs more than a
    /// new TLS handshake.
    pub struct EspHttpTransport {
        timeout: Duration,
    }

    impl EspHttpTransport {
        pub fn new(timeout: Duration) -> Self {
            Self { timeout }
        }
    }

    impl HttpTransport for EspHttpTransport {
        fn exchange(
            &mut self,
            method: HttpMethod,
            url: &str,
            body: &[u8],
        ) -> Result<HttpReply, CommsError> {
            let conf = Configuration {
                timeout: Some(self.timeout),
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            };
            let mut conn = EspHttpConnection::new(&conf).map_err(|e| {
                warn!("HTTP: connection setup failed ({:?})", e);
                CommsError::Timeout
            })?;

            let method = match method {
                HttpMethod::Get => Method::Get,
                HttpMethod::Put => Method::Put,
                HttpMethod::Post => Method::Post,
            };
            let len = body.len().to_string();
            let json_headers = [
                ("Content-Type", "application/json"),
                ("Content-Length", len.as_str()),
            ];
            let headers: &[(&str, &str)] = if body.is_empty() { &[] } else { &json_headers };

            conn.initiate_request(method, url, headers)
                .map_err(|_| CommsError::Timeout)?;
            let mut sent = 0;
            while sent < body.len() {
                sent += conn.write(&body[sent..]).map_err(|_| CommsError::Timeout)?;
            }
            conn.initiate_response().map_err(|_| CommsError::Timeout)?;

            let status = conn.status();
            let mut out = Vec::new();
            let mut chunk = [0u8; 512];
            loop {
                let n = conn.read(&mut chunk).map_err(|_| CommsError::Timeout)?;
                if n == 0 {
                    break;
                }
                if out.len() + n > MAX_RESPONSE_BYTES {
                    return Err(CommsError::BadResponse);
                }
                out.extend_from_slice(&chunk[..n]);
            }
            Ok(HttpReply { status, body: out })
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Scripted transport (tests)
// ───────────────────────────────────────────────────────────────
