//! HazardWatch Firmware — Main Entry Point
//!
//! Hexagonal architecture with two cadences sharing single-slot handoffs.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink    SystemClock            │
//! │  (Sensor+Actuator+LCD)  (EventSink)     (Clock)                │
//! │  WifiAdapter   CloudClient   HistoryReader   ClassifierClient  │
//! │  (Network)     (Cloud)       (RecentReadings) (Classifier)     │
//! │  NotifierClient (Notifier)                                     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌──────────────────────────────┐  ┌────────────────────────┐  │
//! │  │ MonitorService (core 1)      │  │ ClassificationBridge   │  │
//! │  │ Acquire · Alert · Actuate ·  │◀▶│ (core 0, async task)   │  │
//! │  │ Link · Publish               │  │                        │  │
//! │  └──────────────────────────────┘  └────────────────────────┘  │
//! │          static HANDOFF (local / remote / session / stop)      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::time::Duration;

use anyhow::{Result, anyhow};
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use hazardwatch::adapters::classifier::ClassifierClient;
use hazardwatch::adapters::cloud::{CloudClient, CloudEndpoint, HistoryReader};
use hazardwatch::adapters::hardware::HardwareAdapter;
use hazardwatch::adapters::http::EspHttpTransport;
use hazardwatch::adapters::log_sink::LogEventSink;
use hazardwatch::adapters::notifier::NotifierClient;
use hazardwatch::adapters::time::SystemClock;
use hazardwatch::adapters::wifi::WifiAdapter;
use hazardwatch::app::service::MonitorService;
use hazardwatch::classification::{self, ClassificationBridge};
use hazardwatch::config::SystemConfig;
use hazardwatch::connectivity::{ConnectivityManager, ReconnectPolicy};
use hazardwatch::drivers::lcd::CharacterLcd;
use hazardwatch::drivers::{hw_init, watchdog::Watchdog};
use hazardwatch::handoff::Handoff;
use hazardwatch::pins;
use hazardwatch::sensors::{self, SensorHub};

// ── Build-time endpoints and credentials ──────────────────────

const fn env_or_empty(value: Option<&'static str>) -> &'static str {
    match value {
        Some(v) => v,
        None => "",
    }
}

const WIFI_SSID: &str = env_or_empty(option_env!("HAZARDWATCH_WIFI_SSID"));
const WIFI_PASSWORD: &str = env_or_empty(option_env!("HAZARDWATCH_WIFI_PASSWORD"));
const CLOUD_DB_URL: &str = env_or_empty(option_env!("HAZARDWATCH_CLOUD_DB_URL"));
const CLOUD_API_KEY: &str = env_or_empty(option_env!("HAZARDWATCH_CLOUD_API_KEY"));
const CLASSIFIER_URL: &str = env_or_empty(option_env!("HAZARDWATCH_CLASSIFIER_URL"));
const NOTIFY_URL: &str = env_or_empty(option_env!("HAZARDWATCH_NOTIFY_URL"));
const NOTIFY_TO: &str = env_or_empty(option_env!("HAZARDWATCH_NOTIFY_TO"));

/// Exchanges on the classification core never hold up the outputs.
const CLASSIFY_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared between the control loop and the classification task.
static HANDOFF: Handoff = Handoff::new();

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  HazardWatch v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    config.validate()?;

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals().map_err(|e| anyhow!("HAL init failed: {}", e))?;
    let mut watchdog = Watchdog::new(config.watchdog_timeout_ms());
    let cycle_http_timeout = Duration::from_millis(u64::from(config.http_timeout_ms));

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?;
    info!(
        "I2C: SDA=GPIO{} SCL=GPIO{} @ {}Hz",
        pins::I2C_SDA_GPIO,
        pins::I2C_SCL_GPIO,
        pins::I2C_FREQ_HZ
    );
    let mut lcd = CharacterLcd::new(i2c, pins::LCD_I2C_ADDR);
    if let Err(e) = lcd.init(&mut FreeRtos) {
        // The monitor keeps running without a display.
        warn!("Display init failed ({:?})", e);
    }

    let sensor_hub = SensorHub::new(
        sensors::climate::ClimateSensor::new(pins::DHT_GPIO),
        sensors::gas::GasSensor::new(pins::GAS_ADC_CHANNEL),
        sensors::flame::FlameSensor::new(pins::FLAME_GPIO),
    );
    let mut hw = HardwareAdapter::new(sensor_hub, lcd);

    // ── 3. Network link and cloud session ─────────────────────
    let mut wifi = WifiAdapter::new(EspWifi::new(peripherals.modem, sys_loop, Some(nvs))?);
    if let Err(e) = wifi.set_credentials(WIFI_SSID, WIFI_PASSWORD) {
        // Local safety decisions still run; the link never leaves Connecting.
        warn!("WiFi credentials rejected ({}), running offline", e);
    }

    let endpoint = CloudEndpoint::new(CLOUD_DB_URL, CLOUD_API_KEY);
    let cloud = CloudClient::new(
        EspHttpTransport::new(cycle_http_timeout),
        endpoint.clone(),
        &config.telemetry_root,
        &HANDOFF.session,
    );
    let link = ConnectivityManager::new(wifi, cloud, ReconnectPolicy::from_config(&config));

    // ── 4. Classification task (core 0) ───────────────────────
    let bridge = ClassificationBridge::new(
        HistoryReader::new(
            EspHttpTransport::new(CLASSIFY_HTTP_TIMEOUT),
            &endpoint,
            &config.telemetry_root,
            &HANDOFF.session,
        ),
        ClassifierClient::new(EspHttpTransport::new(CLASSIFY_HTTP_TIMEOUT), CLASSIFIER_URL),
        usize::from(config.classify_window),
    );
    let classify = classification::spawn(
        bridge,
        &HANDOFF,
        Duration::from_secs(u64::from(config.classify_interval_secs)),
    )?;

    // ── 5. Control loop ───────────────────────────────────────
    let notifier = NotifierClient::new(EspHttpTransport::new(cycle_http_timeout), NOTIFY_URL, NOTIFY_TO);
    let mut service = MonitorService::new(&config, link, notifier, FreeRtos, SystemClock::new());
    let mut sink = LogEventSink::new();

    service.start(&mut hw, &mut sink);
    info!("System ready. Entering control loop.");
    service.run(&mut hw, &HANDOFF, &mut sink, || watchdog.feed());

    // The loop only returns once a stop was requested.
    HANDOFF.shutdown.request();
    classify
        .join()
        .map_err(|_| anyhow!("classification task panicked"))?;
    info!("Shutdown complete after {} event(s)", sink.emitted());
    Ok(())
}
