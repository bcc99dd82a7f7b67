use chrono::{Duration, Local, NaiveDateTime, Timelike};

/// Source of wall-clock time for the engine.
///
/// Production code uses [`SystemClock`]; tests pin the time with [`FixedClock`]
/// so day-segment and shift-boundary behaviour is deterministic.
pub trait Clock {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, NaiveDate};
/// use plant_sim::sim::clock::{Clock, FixedClock};
///
/// let start = NaiveDate::from_ymd_opt(2024, 3, 1)
///     .and_then(|d| d.and_hms_opt(13, 59, 59))
///     .expect("valid timestamp");
/// let mut clock = FixedClock::new(start);
/// clock.advance(Duration::seconds(1));
/// assert_eq!(plant_sim::sim::clock::TimeContext::at(clock.now()).hour, 14);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    now: NaiveDateTime,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Moves the clock to `now`.
    pub fn set(&mut self, now: NaiveDateTime) {
        self.now = now;
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }
}

/// Time-derived inputs for one tick, sampled once when the tick starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeContext {
    /// Timestamp of the tick.
    pub now: NaiveDateTime,
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Day-segment multiplier for this hour, see [`day_factor`].
    pub day_factor: f64,
    /// Shift the hour falls in, see [`shift_for_hour`].
    pub shift: u8,
}

impl TimeContext {
    /// Derives the tick context from a timestamp.
    pub fn at(now: NaiveDateTime) -> Self {
        let hour = now.hour();
        Self {
            now,
            hour,
            day_factor: day_factor(hour),
            shift: shift_for_hour(hour),
        }
    }
}

/// Day-segment multiplier: `1.0` for hours 7-18, `0.7` for 19-22 and `0.4`
/// through the night.
pub fn day_factor(hour: u32) -> f64 {
    match hour {
        7..=18 => 1.0,
        19..=22 => 0.7,
        _ => 0.4,
    }
}

/// Shift for an hour of day: 1 for [6,14), 2 for [14,22), 3 otherwise.
pub fn shift_for_hour(hour: u32) -> u8 {
    match hour {
        6..=13 => 1,
        14..=21 => 2,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at_hour(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .and_then(|d| d.and_hms_opt(hour, 30, 0))
            .expect("valid timestamp")
    }

    #[test]
    fn test_day_factor_segments() {
        assert_eq!(day_factor(6), 0.4);
        assert_eq!(day_factor(7), 1.0);
        assert_eq!(day_factor(18), 1.0);
        assert_eq!(day_factor(19), 0.7);
        assert_eq!(day_factor(22), 0.7);
        assert_eq!(day_factor(23), 0.4);
        assert_eq!(day_factor(0), 0.4);
    }

    #[test]
    fn test_shift_boundaries() {
        assert_eq!(shift_for_hour(5), 3);
        assert_eq!(shift_for_hour(6), 1);
        assert_eq!(shift_for_hour(13), 1);
        assert_eq!(shift_for_hour(14), 2);
        assert_eq!(shift_for_hour(21), 2);
        assert_eq!(shift_for_hour(22), 3);
        assert_eq!(shift_for_hour(0), 3);
    }

    #[test]
    fn test_shift_changes_only_at_three_hours() {
        let changes: Vec<u32> = (0..24)
            .filter(|&h| shift_for_hour(h) != shift_for_hour((h + 23) % 24))
            .collect();
        assert_eq!(changes, vec![6, 14, 22]);
    }

    #[test]
    fn test_time_context_from_timestamp() {
        let ctx = TimeContext::at(at_hour(10));
        assert_eq!(ctx.hour, 10);
        assert_eq!(ctx.day_factor, 1.0);
        assert_eq!(ctx.shift, 1);
    }

    #[test]
    fn test_fixed_clock_advance() {
        let mut clock = FixedClock::new(at_hour(21));
        clock.advance(Duration::hours(1));
        assert_eq!(clock.now(), at_hour(22));
        clock.set(at_hour(3));
        assert_eq!(TimeContext::at(clock.now()).shift, 3);
    }
}
