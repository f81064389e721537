// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Device configuration.

use std::time::Duration;

/// Environment variable read by [DeviceOptions::from_env_or_default].
///
/// When set to a positive number of milliseconds, the driver is ticked from a dedicated poll
/// thread at that interval instead of from the host's event loop.
pub const TICK_INTERVAL_ENV: &str = "GPU_BRIDGE_TICK_INTERVAL_MS";

/// How the driver's progress function gets called while work is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStrategy {
    /// The host calls [Device::tick](crate::Device::tick) once per event-loop turn.
    HostTurn,
    /// A poll thread ticks at `interval` while any keepalive token is live, and sleeps otherwise.
    Thread { interval: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOptions {
    pub tick: TickStrategy,
    pub label: Option<String>,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        DeviceOptions {
            tick: TickStrategy::HostTurn,
            label: None,
        }
    }
}

impl DeviceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_strategy(mut self, tick: TickStrategy) -> Self {
        self.tick = tick;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Default options, with the tick strategy overridden by [TICK_INTERVAL_ENV] if present.
    pub fn from_env_or_default() -> Self {
        Self::from_env_value(std::env::var(TICK_INTERVAL_ENV).ok().as_deref())
    }

    fn from_env_value(value: Option<&str>) -> Self {
        let mut options = Self::default();
        let Some(value) = value else {
            return options;
        };
        match value.trim().parse::<u64>() {
            Ok(0) => {}
            Ok(ms) => {
                options.tick = TickStrategy::Thread {
                    interval: Duration::from_millis(ms),
                }
            }
            Err(_) => {
                logwise::warn_sync!(
                    "ignoring unparseable tick interval {value}",
                    value = logwise::privacy::LogIt(value)
                );
            }
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_value() {
        assert_eq!(DeviceOptions::from_env_value(None), DeviceOptions::default());
        assert_eq!(
            DeviceOptions::from_env_value(Some(" 5 ")).tick,
            TickStrategy::Thread {
                interval: Duration::from_millis(5)
            }
        );
        assert_eq!(DeviceOptions::from_env_value(Some("0")).tick, TickStrategy::HostTurn);
        assert_eq!(DeviceOptions::from_env_value(Some("fast")).tick, TickStrategy::HostTurn);
    }

    #[test]
    fn builder() {
        let options = DeviceOptions::new().label("main").tick_strategy(TickStrategy::HostTurn);
        assert_eq!(options.label.as_deref(), Some("main"));
    }
}
