//! Unified error types for the HazardWatch firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control cycle's error handling uniform.  All variants are `Copy` so they
//! can be passed through the cycle report and event sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned a corrupt frame.
    Sensor(SensorError),
    /// A network, cloud, classifier or notification call failed.
    Comms(CommsError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The DHT22 did not answer the start pulse.
    NoResponse,
    /// A bit edge did not arrive within its timing window.
    FrameTimeout,
    /// The DHT22 frame checksum did not match its payload.
    ChecksumMismatch,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => write!(f, "no response from sensor"),
            Self::FrameTimeout => write!(f, "frame timed out"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Communication errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// No WiFi credentials have been configured.
    NoCredentials,
    /// SSID is empty, too long or not printable ASCII.
    InvalidSsid,
    /// Password is neither empty (open network) nor 8–64 bytes.
    InvalidPassword,
    /// The station is not associated with an access point.
    NotAssociated,
    /// The cloud refused the session handshake.
    HandshakeRejected,
    /// No authenticated cloud session exists.
    NoSession,
    /// The cloud store rejected a write.
    WriteRejected,
    /// A remote call did not complete in time.
    Timeout,
    /// A response body could not be read or parsed.
    BadResponse,
    /// The classifier service is unreachable or returned no verdict.
    ClassifierUnavailable,
    /// The notification gateway did not accept the message.
    NotificationRejected,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::NotAssociated => write!(f, "not associated"),
            Self::HandshakeRejected => write!(f, "cloud handshake rejected"),
            Self::NoSession => write!(f, "no cloud session"),
            Self::WriteRejected => write!(f, "cloud write rejected"),
            Self::Timeout => write!(f, "request timed out"),
            Self::BadResponse => write!(f, "malformed response"),
            Self::ClassifierUnavailable => write!(f, "classifier unavailable"),
            Self::NotificationRejected => write!(f, "notification rejected"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

impl std::error::Error for Error {}
impl std::error::Error for SensorError {}
impl std::error::Error for CommsError {}

/// Convenience alias used throughout the firmware.
pub type Result<T> = core::result::Result<T, Error>;
