//! Realtime-database style cloud store over its REST interface.
//!
//! One anonymous session, two clients:
//!
//! - [`CloudClient`] implements [`CloudPort`] for the control cycle.  It is
//!   owned by the connectivity manager, which calls `handshake()` once the
//!   network is up and `invalidate_session()` when the link drops.  It lends
//!   the token through a [`SharedToken`] while the session is open.  A write
//!   refused with 401/403 ends the session.
//! - [`HistoryReader`] implements [`RecentReadingsPort`] for the
//!   classification task on the other core.  It never signs in; with no lent
//!   token it skips the fetch, and a refused token is revoked so the
//!   manager signs in again.
//!
//! ```text
//!  POST {auth}/accounts:signUp?key=K        {"returnSecureToken":true}  → {"idToken": ...}
//!  PUT  {db}{path}.json?auth=T              <json value>
//!  GET  {db}{root}/history.json?orderBy="$key"&limitToLast=N&auth=T
//! ```
//!
//! Once a full set of fields (temperature, humidity, flame, gas) has been
//! written under the telemetry root, the client appends one snapshot to
//! `{root}/history` with a server-side timestamp.  Snapshots are keyed by
//! push id, which sorts chronologically, so the reader can window them.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::http::{HttpMethod, HttpTransport, encode_query};
use crate::acquisition::SensorReading;
use crate::app::ports::{CloudPort, RecentReadingsPort};
use crate::classification::{FeatureWindow, MAX_FEATURE_WINDOW};
use crate::error::CommsError;
use crate::handoff::SharedToken;
use crate::telemetry::{FIELD_FLAME, FIELD_GAS, FIELD_HUMIDITY, FIELD_TEMPERATURE, TelemetryValue};

pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Where the store lives and how to sign in to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudEndpoint {
    /// e.g. `https://hazardwatch-default-rtdb.firebaseio.com`
    pub database_url: String,
    pub api_key: String,
    pub auth_url: String,
}

impl CloudEndpoint {
    pub fn new(database_url: &str, api_key: &str) -> Self {
        Self {
            database_url: database_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
        }
    }

    fn sign_up_url(&self) -> String {
        format!("{}/accounts:signUp?key={}", self.auth_url, encode_query(&self.api_key))
    }
}

#[derive(Deserialize)]
struct SignUpReply {
    #[serde(rename = "idToken")]
    id_token: String,
}

fn sign_in<T: HttpTransport>(transport: &mut T, endpoint: &CloudEndpoint) -> Result<String, CommsError> {
    let reply = transport.exchange(
        HttpMethod::Post,
        &endpoint.sign_up_url(),
        br#"{"returnSecureToken":true}"#,
    )?;
    if !reply.is_success() {
        warn!("Cloud: sign-in rejected (HTTP {})", reply.status);
        return Err(CommsError::HandshakeRejected);
    }
    let parsed: SignUpReply =
        serde_json::from_slice(&reply.body).map_err(|_| CommsError::BadResponse)?;
    if parsed.id_token.is_empty() {
        return Err(CommsError::HandshakeRejected);
    }
    Ok(parsed.id_token)
}

// ───────────────────────────────────────────────────────────────
// Write side
// ───────────────────────────────────────────────────────────────

/// Server value placeholder resolved to epoch milliseconds by the store.
#[derive(Serialize)]
struct ServerTimestamp {
    #[serde(rename = ".sv")]
    sv: &'static str,
}

#[derive(Serialize)]
struct HistoryEntry {
    temperature: f32,
    humidity: f32,
    gas: i32,
    flame: bool,
    ts: ServerTimestamp,
}

/// Field values seen since the last appended snapshot.
#[derive(Debug, Default)]
struct Snapshot {
    temperature: Option<f32>,
    humidity: Option<f32>,
    gas: Option<i32>,
    flame: Option<bool>,
}

impl Snapshot {
    fn record(&mut self, field: &str, value: &TelemetryValue) {
        match (field, *value) {
            (FIELD_TEMPERATURE, TelemetryValue::Float(v)) => self.temperature = Some(v),
            (FIELD_HUMIDITY, TelemetryValue::Float(v)) => self.humidity = Some(v),
            (FIELD_GAS, TelemetryValue::Int(v)) => self.gas = Some(v),
            (FIELD_FLAME, TelemetryValue::Bool(v)) => self.flame = Some(v),
            _ => {}
        }
    }

    fn take_complete(&mut self) -> Option<HistoryEntry> {
        let (Some(temperature), Some(humidity), Some(gas), Some(flame)) =
            (self.temperature, self.humidity, self.gas, self.flame)
        else {
            return None;
        };
        *self = Self::default();
        Some(HistoryEntry {
            temperature,
            humidity,
            gas,
            flame,
            ts: ServerTimestamp { sv: "timestamp" },
        })
    }
}

pub struct CloudClient<'s, T: HttpTransport> {
    transport: T,
    endpoint: CloudEndpoint,
    root: String,
    token: Option<String>,
    lent: &'s SharedToken,
    snapshot: Snapshot,
    writes: u32,
}

impl<'s, T: HttpTransport> CloudClient<'s, T> {
    pub fn new(
        transport: T,
        endpoint: CloudEndpoint,
        telemetry_root: &str,
        lent: &'s SharedToken,
    ) -> Self {
        Self {
            transport,
            endpoint,
            root: telemetry_root.trim_end_matches('/').to_string(),
            token: None,
            lent,
            snapshot: Snapshot::default(),
            writes: 0,
        }
    }

    /// Append the accumulated snapshot.  Best effort: the field writes
    /// already landed, so a failure here is only logged.
    fn append_history(&mut self, token: &str) {
        let Some(entry) = self.snapshot.take_complete() else {
            return;
        };
        let Ok(body) = serde_json::to_vec(&entry) else {
            return;
        };
        let url = format!(
            "{}{}/history.json?auth={}",
            self.endpoint.database_url,
            self.root,
            encode_query(token)
        );
        match self.transport.exchange(HttpMethod::Post, &url, &body) {
            Ok(reply) if reply.is_success() => {}
            Ok(reply) if reply.is_auth_failure() => {
                warn!("Cloud: history append denied (HTTP {}), ending session", reply.status);
                self.invalidate_session();
            }
            Ok(reply) => warn!("Cloud: history append rejected (HTTP {})", reply.status),
            Err(e) => warn!("Cloud: history append failed ({})", e),
        }
    }

    pub fn writes(&self) -> u32 {
        self.writes
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: HttpTransport> CloudPort for CloudClient<'_, T> {
    fn handshake(&mut self) -> Result<(), CommsError> {
        let token = sign_in(&mut self.transport, &self.endpoint)?;
        self.lent.set(&token);
        self.token = Some(token);
        info!("Cloud: session established");
        Ok(())
    }

    fn invalidate_session(&mut self) {
        self.snapshot = Snapshot::default();
        self.lent.clear();
        if self.token.take().is_some() {
            info!("Cloud: session dropped");
        }
    }

    /// `false` once a write was refused or a reader revoked the lent token.
    fn has_session(&self) -> bool {
        self.token.is_some() && self.lent.is_set()
    }

    fn write(&mut self, path: &str, value: &TelemetryValue) -> Result<(), CommsError> {
        let token = self.token.clone().ok_or(CommsError::NoSession)?;
        let url = format!(
            "{}{}.json?auth={}",
            self.endpoint.database_url,
            path,
            encode_query(&token)
        );
        let body = serde_json::to_vec(value).map_err(|_| CommsError::BadResponse)?;
        let reply = self.transport.exchange(HttpMethod::Put, &url, &body)?;
        if reply.is_auth_failure() {
            warn!("Cloud: write to {} denied (HTTP {}), ending session", path, reply.status);
            self.invalidate_session();
            return Err(CommsError::NoSession);
        }
        if !reply.is_success() {
            return Err(CommsError::WriteRejected);
        }
        self.writes = self.writes.wrapping_add(1);

        if let Some(field) = path.strip_prefix(self.root.as_str()).and_then(|p| p.strip_prefix('/')) {
            self.snapshot.record(field, value);
            self.append_history(&token);
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Read side
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct HistoryRow {
    temperature: f32,
    humidity: f32,
    gas: i32,
    flame: bool,
    #[serde(default)]
    ts: u64,
}

/// Decode a `history` node into at most `window` readings, oldest first.
///
/// Rows that fail validation are dropped rather than failing the window.
pub fn parse_history(body: &[u8], window: usize) -> Result<FeatureWindow, CommsError> {
    let mut out = FeatureWindow::new();
    if body.trim_ascii() == b"null" {
        return Ok(out);
    }
    let rows: BTreeMap<String, HistoryRow> =
        serde_json::from_slice(body).map_err(|_| CommsError::BadResponse)?;
    let keep = window.min(MAX_FEATURE_WINDOW);
    let skip = rows.len().saturating_sub(keep);
    for row in rows.into_values().skip(skip) {
        match SensorReading::new(row.temperature, row.humidity, row.gas, row.flame, row.ts) {
            Ok(reading) => {
                // Bounded by `keep`.
                let _ = out.push(reading);
            }
            Err(failure) => debug!("Cloud: history row dropped ({})", failure),
        }
    }
    Ok(out)
}

pub struct HistoryReader<'s, T: HttpTransport> {
    transport: T,
    database_url: String,
    root: String,
    session: &'s SharedToken,
}

impl<'s, T: HttpTransport> HistoryReader<'s, T> {
    pub fn new(
        transport: T,
        endpoint: &CloudEndpoint,
        telemetry_root: &str,
        session: &'s SharedToken,
    ) -> Self {
        Self {
            transport,
            database_url: endpoint.database_url.clone(),
            root: telemetry_root.trim_end_matches('/').to_string(),
            session,
        }
    }

    fn history_url(&self, token: &str, window: usize) -> String {
        format!(
            "{}{}/history.json?orderBy={}&limitToLast={}&auth={}",
            self.database_url,
            self.root,
            encode_query("\"$key\""),
            window,
            encode_query(token)
        )
    }
}

impl<T: HttpTransport> RecentReadingsPort for HistoryReader<'_, T> {
    fn read_recent(&mut self, window: usize) -> Result<FeatureWindow, CommsError> {
        let Some(token) = self.session.get() else {
            return Err(CommsError::NoSession);
        };
        let url = self.history_url(&token, window);
        let reply = self.transport.exchange(HttpMethod::Get, &url, &[])?;
        if reply.is_auth_failure() {
            warn!("Cloud: history read denied (HTTP {}), revoking session", reply.status);
            self.session.revoke(&token);
            return Err(CommsError::NoSession);
        }
        if !reply.is_success() {
            return Err(CommsError::BadResponse);
        }
        parse_history(&reply.body, window)
    }
}
