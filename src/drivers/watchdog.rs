//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the device if the control loop stalls.  The timeout must cover
//! the longest legitimate cycle plus the idle wait after it; main sizes it
//! with `SystemConfig::watchdog_timeout_ms`.
//!
//! The control loop calls `feed()` once per cycle.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::{info, warn};

/// Default and minimum TWDT timeout.
pub const WATCHDOG_TIMEOUT_MS: u32 = 15_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
    feeds: u64,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(WATCHDOG_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Initialise and subscribe the current task to the TWDT.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: TWDT API calls from the task being subscribed.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    warn!("TWDT reconfigure returned {} (may already be configured)", ret);
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
                } else {
                    warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed, feeds: 0 }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("Watchdog(sim): no-op ({}ms)", timeout_ms);
            Self { feeds: 0 }
        }
    }

    /// Feed the watchdog.
    pub fn feed(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                // SAFETY: resets the TWDT for the calling (subscribed) task.
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
        self.feeds = self.feeds.wrapping_add(1);
    }

    pub fn feeds(&self) -> u64 {
        self.feeds
    }
}
