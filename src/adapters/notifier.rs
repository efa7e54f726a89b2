//! SMS and voice notification gateway client.
//!
//! Both channels go through one gateway endpoint that relays to the
//! carrier or the text-to-speech service:
//!
//! ```text
//!  POST {url}/sms    {"to": "+15551234567", "text": "..."}
//!  POST {url}/voice  {"to": "+15551234567", "text": "..."}
//! ```
//!
//! Fire-and-forget: a 2xx reply is the only confirmation; delivery is not
//! tracked.

use log::{info, warn};
use serde::Serialize;

use super::http::{HttpMethod, HttpTransport};
use crate::app::ports::NotifierPort;
use crate::error::CommsError;

#[derive(Serialize)]
struct Message<'a> {
    to: &'a str,
    text: &'a str,
}

pub struct NotifierClient<T: HttpTransport> {
    transport: T,
    base_url: String,
    recipient: String,
    sent: u32,
}

impl<T: HttpTransport> NotifierClient<T> {
    pub fn new(transport: T, base_url: &str, recipient: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            recipient: recipient.to_string(),
            sent: 0,
        }
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }

    fn post(&mut self, channel: &str, text: &str) -> Result<(), CommsError> {
        let body = serde_json::to_vec(&Message {
            to: &self.recipient,
            text,
        })
        .map_err(|_| CommsError::BadResponse)?;
        let url = format!("{}/{}", self.base_url, channel);
        let reply = self.transport.exchange(HttpMethod::Post, &url, &body)?;
        if !reply.is_success() {
            warn!("Notify: {} gateway returned HTTP {}", channel, reply.status);
            return Err(CommsError::NotificationRejected);
        }
        self.sent = self.sent.wrapping_add(1);
        info!("Notify: {} dispatched", channel);
        Ok(())
    }
}

impl<T: HttpTransport> NotifierPort for NotifierClient<T> {
    fn send_sms(&mut self, text: &str) -> Result<(), CommsError> {
        self.post("sms", text)
    }

    fn speak(&mut self, text: &str) -> Result<(), CommsError> {
        self.post("voice", text)
    }
}
