//! WiFi station-mode adapter.
//!
//! Implements [`NetworkPort`], the hexagonal boundary for the network
//! link.  Association is started with `begin_association()` and observed
//! with the non-blocking `is_associated()`; the connectivity manager owns
//! the polling budget and the backoff between attempts.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi`.
//! - **all other targets**: an in-memory access point for host tests.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::NetworkPort;
use crate::error::CommsError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), CommsError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CommsError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), CommsError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(CommsError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    attempts: u32,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    #[cfg(target_os = "espidf")]
    configured: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_ap_in_range: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_associated: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            attempts: 0,
            wifi,
            configured: false,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            attempts: 0,
            sim_ap_in_range: true,
            sim_associated: false,
        }
    }

    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), CommsError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| CommsError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| CommsError::InvalidPassword)?;
        #[cfg(target_os = "espidf")]
        {
            self.configured = false;
        }
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Association requests issued so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_begin(&mut self) -> Result<(), CommsError> {
        if !self.configured {
            let auth_method = if self.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let conf = Configuration::Client(ClientConfiguration {
                ssid: self.ssid.as_str().try_into().map_err(|_| CommsError::InvalidSsid)?,
                password: self
                    .password
                    .as_str()
                    .try_into()
                    .map_err(|_| CommsError::InvalidPassword)?,
                auth_method,
                ..Default::default()
            });
            self.wifi.set_configuration(&conf).map_err(|e| {
                warn!("WiFi: set_configuration failed ({:?})", e);
                CommsError::NotAssociated
            })?;
            self.wifi.start().map_err(|e| {
                warn!("WiFi: start failed ({:?})", e);
                CommsError::NotAssociated
            })?;
            self.configured = true;
        }
        // Drop any half-open attempt before asking the driver again.
        let _ = self.wifi.disconnect();
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect request failed ({:?})", e);
            CommsError::NotAssociated
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin(&mut self) -> Result<(), CommsError> {
        self.sim_associated = self.sim_ap_in_range;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_associated(&mut self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_associated(&mut self) -> bool {
        self.sim_associated && self.sim_ap_in_range
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi: disconnect failed ({:?})", e);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        self.sim_associated = false;
    }

    /// Simulation: put the access point in or out of range.  Going out of
    /// range drops an existing association.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_ap_in_range(&mut self, in_range: bool) {
        self.sim_ap_in_range = in_range;
        if !in_range {
            self.sim_associated = false;
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkPort
// ───────────────────────────────────────────────────────────────

impl NetworkPort for WifiAdapter {
    fn begin_association(&mut self) -> Result<(), CommsError> {
        if self.ssid.is_empty() {
            return Err(CommsError::NoCredentials);
        }
        self.attempts = self.attempts.wrapping_add(1);
        info!("WiFi: associating with '{}' (attempt {})", self.ssid, self.attempts);
        self.platform_begin()
    }

    fn is_associated(&mut self) -> bool {
        self.platform_is_associated()
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        info!("WiFi: disconnected");
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
