//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements          | Connects to                   |
//! |--------------|---------------------|-------------------------------|
//! | `hardware`   | SensorPort          | DHT22, MQ-2 ADC, flame GPIO   |
//! |              | ActuatorPort        | LEDs, buzzer, fan relay GPIO  |
//! |              | DisplayPort         | HD44780 over I²C              |
//! | `wifi`       | NetworkPort         | ESP-IDF WiFi STA              |
//! | `cloud`      | CloudPort           | Realtime database REST        |
//! |              | RecentReadingsPort  |                               |
//! | `classifier` | ClassifierPort      | Classification endpoint       |
//! | `notifier`   | NotifierPort        | SMS / voice gateway           |
//! | `http`       | (HttpTransport)     | ESP-IDF HTTP client + TLS     |
//! | `log_sink`   | EventSink           | Serial log output             |
//! | `time`       | Clock               | ESP32 system timer            |

pub mod classifier;
pub mod cloud;
pub mod hardware;
pub mod http;
pub mod log_sink;
pub mod notifier;
pub mod time;
pub mod wifi;
