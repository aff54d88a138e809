use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, FixedOffset, Local, TimeZone, Timelike, Utc};

/// Source of the current time for anything time-sensitive
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and simulations
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clock that reports a debug "virtual hour" in place of the real one.
///
/// The hour is the wall-clock hour in the local timezone (or a fixed
/// offset, see [`VirtualHourClock::in_offset`]). Minutes, seconds and the
/// date come from the inner clock.
pub struct VirtualHourClock {
    inner: Arc<dyn Clock>,
    hour: Option<u32>,
    offset: Option<FixedOffset>,
}

impl VirtualHourClock {
    pub fn new(inner: Arc<dyn Clock>, hour: Option<u32>) -> Self {
        Self {
            inner,
            hour: hour.filter(|h| *h < 24),
            offset: None,
        }
    }

    /// Interpret the virtual hour at a fixed UTC offset instead of local time
    pub fn in_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn hour(&self) -> Option<u32> {
        self.hour
    }
}

impl Clock for VirtualHourClock {
    fn now(&self) -> DateTime<Utc> {
        let now = self.inner.now();
        let Some(hour) = self.hour else {
            return now;
        };
        let replaced = match self.offset {
            Some(offset) => with_wall_hour(now.with_timezone(&offset), hour),
            None => with_wall_hour(now.with_timezone(&Local), hour),
        };
        // Hours skipped by a DST change keep the real reading
        replaced.unwrap_or(now)
    }
}

fn with_wall_hour<Tz: TimeZone>(wall: DateTime<Tz>, hour: u32) -> Option<DateTime<Utc>> {
    wall.with_hour(hour).map(|d| d.with_timezone(&Utc))
}

/// Wall-clock hour of `now` in `tz`
pub fn hour_in<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> u32 {
    now.with_timezone(tz).hour()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, h, m, 0).unwrap()
    }

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::new(at(9, 0));
        clock.advance(Duration::minutes(90));
        assert_eq!(clock.now(), at(10, 30));
        clock.set(at(1, 0));
        assert_eq!(clock.now(), at(1, 0));
    }

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    #[test]
    fn test_virtual_hour_replaces_only_the_hour() {
        let inner = Arc::new(FixedClock::new(at(9, 45)));
        let clock = VirtualHourClock::new(inner.clone(), Some(23))
            .in_offset(FixedOffset::east_opt(0).unwrap());
        assert_eq!(clock.now(), at(23, 45));

        let passthrough = VirtualHourClock::new(inner, None);
        assert_eq!(passthrough.now(), at(9, 45));
    }

    #[test]
    fn test_virtual_hour_is_wall_clock_hour() {
        // 09:45 UTC is 18:45 in Tokyo; 23:45 Tokyo is 14:45 UTC
        let inner = Arc::new(FixedClock::new(at(9, 45)));
        let clock = VirtualHourClock::new(inner, Some(23)).in_offset(jst());
        assert_eq!(clock.now(), at(14, 45));
        assert_eq!(hour_in(clock.now(), &jst()), 23);
    }

    #[test]
    fn test_virtual_hour_defaults_to_local_time() {
        let inner = Arc::new(FixedClock::new(at(9, 45)));
        let clock = VirtualHourClock::new(inner, Some(6));
        assert_eq!(hour_in(clock.now(), &Local), 6);
    }

    #[test]
    fn test_hour_in_converts_from_utc() {
        assert_eq!(hour_in(at(14, 5), &jst()), 23);
        assert_eq!(hour_in(at(20, 0), &jst()), 5);
        assert_eq!(hour_in(at(20, 0), &Utc), 20);
    }

    #[test]
    fn test_virtual_hour_ignores_out_of_range() {
        let clock = VirtualHourClock::new(Arc::new(FixedClock::new(at(9, 0))), Some(24));
        assert_eq!(clock.hour(), None);
        assert_eq!(clock.now(), at(9, 0));
    }
}
