use std::sync::Arc;

use chrono::{Local, TimeZone};
use luna_types::keys;

use crate::clock::{hour_in, Clock, VirtualHourClock};
use crate::store::{SettingsError, SettingsStore};

/// Debug-menu overrides persisted in the settings store.
///
/// Overrides only take effect while debugging is enabled.
#[derive(Clone)]
pub struct DebugSettings {
    store: Arc<dyn SettingsStore>,
}

impl DebugSettings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn is_enabled(&self) -> Result<bool, SettingsError> {
        Ok(self.store.get(keys::DEBUG_ENABLED)?.as_deref() == Some("true"))
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), SettingsError> {
        self.store
            .set(keys::DEBUG_ENABLED, if enabled { "true" } else { "false" })
    }

    pub fn virtual_hour(&self) -> Result<Option<u32>, SettingsError> {
        self.get_number(keys::DEBUG_VIRTUAL_HOUR)
    }

    pub fn set_virtual_hour(&self, hour: Option<u32>) -> Result<(), SettingsError> {
        self.set_number(keys::DEBUG_VIRTUAL_HOUR, hour)
    }

    pub fn affinity_override(&self) -> Result<Option<u32>, SettingsError> {
        self.get_number(keys::DEBUG_AFFINITY_OVERRIDE)
    }

    pub fn set_affinity_override(&self, level: Option<u32>) -> Result<(), SettingsError> {
        self.set_number(keys::DEBUG_AFFINITY_OVERRIDE, level)
    }

    /// Virtual hour, but only when debugging is enabled
    pub fn active_virtual_hour(&self) -> Result<Option<u32>, SettingsError> {
        if self.is_enabled()? {
            self.virtual_hour()
        } else {
            Ok(None)
        }
    }

    /// Wrap `inner` so it reports the active virtual hour, if any.
    pub fn clock(&self, inner: Arc<dyn Clock>) -> Result<VirtualHourClock, SettingsError> {
        Ok(VirtualHourClock::new(inner, self.active_virtual_hour()?))
    }

    // Unparseable values read as unset.
    fn get_number(&self, key: &str) -> Result<Option<u32>, SettingsError> {
        Ok(self
            .store
            .get(key)?
            .and_then(|value| value.trim().parse().ok()))
    }

    fn set_number(&self, key: &str, value: Option<u32>) -> Result<(), SettingsError> {
        match value {
            Some(v) => self.store.set(key, &v.to_string()),
            None => self.store.remove(key),
        }
    }
}

/// Hour of day used for time-of-day behaviour: the virtual hour when
/// debugging overrides it, otherwise the clock's local wall-clock hour.
pub fn current_hour(clock: &dyn Clock, debug: &DebugSettings) -> Result<u32, SettingsError> {
    current_hour_in(clock, debug, &Local)
}

/// [`current_hour`] with the real hour read in `tz`
pub fn current_hour_in<Tz: TimeZone>(
    clock: &dyn Clock,
    debug: &DebugSettings,
    tz: &Tz,
) -> Result<u32, SettingsError> {
    match debug.active_virtual_hour()? {
        Some(hour) => Ok(hour),
        None => Ok(hour_in(clock.now(), tz)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;
    use chrono::{FixedOffset, Timelike, Utc};

    fn fixture() -> (DebugSettings, FixedClock) {
        let store: Arc<dyn SettingsStore> = Arc::new(MemoryStore::new());
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 17, 14, 5, 0).unwrap());
        (DebugSettings::new(store), clock)
    }

    #[test]
    fn test_virtual_hour_only_applies_when_enabled() {
        let (debug, clock) = fixture();
        debug.set_virtual_hour(Some(3)).unwrap();
        assert_eq!(current_hour_in(&clock, &debug, &Utc).unwrap(), 14);

        debug.set_enabled(true).unwrap();
        assert_eq!(current_hour_in(&clock, &debug, &Utc).unwrap(), 3);

        debug.set_virtual_hour(None).unwrap();
        assert_eq!(current_hour_in(&clock, &debug, &Utc).unwrap(), 14);
    }

    #[test]
    fn test_current_hour_reads_wall_clock() {
        let (debug, clock) = fixture();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        // 14:05 UTC is 23:05 in Tokyo
        assert_eq!(current_hour_in(&clock, &debug, &tokyo).unwrap(), 23);
        assert_eq!(
            current_hour(&clock, &debug).unwrap(),
            clock.now().with_timezone(&Local).hour()
        );
    }

    #[test]
    fn test_affinity_override_round_trip() {
        let (debug, _) = fixture();
        assert_eq!(debug.affinity_override().unwrap(), None);
        debug.set_affinity_override(Some(42)).unwrap();
        assert_eq!(debug.affinity_override().unwrap(), Some(42));
        debug.set_affinity_override(None).unwrap();
        assert_eq!(debug.affinity_override().unwrap(), None);
    }

    #[test]
    fn test_debug_clock_uses_virtual_hour() {
        let (debug, clock) = fixture();
        debug.set_enabled(true).unwrap();
        debug.set_virtual_hour(Some(22)).unwrap();

        let virtual_clock = debug.clock(Arc::new(clock)).unwrap();
        assert_eq!(virtual_clock.now().with_timezone(&Local).hour(), 22);
    }
}
