//! Remote classifier client.
//!
//! ```text
//!  POST {url}  {"features": [[temp_c, humidity, gas, flame], ...]}
//!          →   {"verdict": "SAFE" | "DANGER", ...}
//! ```
//!
//! Rows are oldest first; flame is encoded as 0/1.  Any reply that does
//! not carry a recognisable verdict counts as the classifier being
//! unavailable, which the bridge treats as "no corroboration".

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::http::{HttpMethod, HttpTransport};
use crate::acquisition::SensorReading;
use crate::alert::AlertLevel;
use crate::app::ports::ClassifierPort;
use crate::error::CommsError;

#[derive(Serialize)]
struct ClassifyRequest {
    features: Vec<[f32; 4]>,
}

#[derive(Deserialize)]
struct ClassifyReply {
    verdict: String,
}

/// Serialize a feature window as the request body.
pub fn encode_features(features: &[SensorReading]) -> Result<Vec<u8>, CommsError> {
    let rows = features
        .iter()
        .map(|r| {
            [
                r.temperature_c(),
                r.humidity_pct(),
                r.gas_level() as f32,
                if r.flame_detected() { 1.0 } else { 0.0 },
            ]
        })
        .collect();
    serde_json::to_vec(&ClassifyRequest { features: rows }).map_err(|_| CommsError::BadResponse)
}

/// Extract the verdict from a reply body.
pub fn parse_verdict(body: &[u8]) -> Result<AlertLevel, CommsError> {
    let reply: ClassifyReply =
        serde_json::from_slice(body).map_err(|_| CommsError::ClassifierUnavailable)?;
    let verdict = reply.verdict.trim();
    if verdict.eq_ignore_ascii_case("safe") {
        Ok(AlertLevel::Safe)
    } else if verdict.eq_ignore_ascii_case("danger") {
        Ok(AlertLevel::Danger)
    } else {
        Err(CommsError::ClassifierUnavailable)
    }
}

pub struct ClassifierClient<T: HttpTransport> {
    transport: T,
    url: String,
}

impl<T: HttpTransport> ClassifierClient<T> {
    pub fn new(transport: T, url: &str) -> Self {
        Self {
            transport,
            url: url.to_string(),
        }
    }
}

impl<T: HttpTransport> ClassifierPort for ClassifierClient<T> {
    fn classify(&mut self, features: &[SensorReading]) -> Result<AlertLevel, CommsError> {
        let body = encode_features(features)?;
        let reply = self
            .transport
            .exchange(HttpMethod::Post, &self.url, &body)
            .map_err(|e| {
                warn!("Classify: request failed ({})", e);
                CommsError::ClassifierUnavailable
            })?;
        if !reply.is_success() {
            warn!("Classify: service returned HTTP {}", reply.status);
            return Err(CommsError::ClassifierUnavailable);
        }
        let level = parse_verdict(&reply.body)?;
        debug!("Classify: {} rows -> {}", features.len(), level);
        Ok(level)
    }
}
