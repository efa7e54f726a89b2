//! Output drivers, hardware initialisation, and peripheral helpers.

pub mod buzzer;
pub mod fan_relay;
pub mod hw_init;
pub mod indicator;
pub mod lcd;
pub mod task_pin;
pub mod watchdog;
