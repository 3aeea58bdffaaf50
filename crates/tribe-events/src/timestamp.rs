//! Game Time Types
//!
//! All AI cooldowns, TTLs and deadlines are measured in in-game hours, never
//! wall-clock time. A tick advances the clock by a configurable fraction of
//! an hour.
//!
//! # Example
//!
//! ```
//! use tribe_events::{GameTime, TickStamp};
//!
//! let t = GameTime::from_hours(30.5);
//! assert_eq!(t.day(), 2);
//! assert_eq!(t.to_string(), "day_2.06:30");
//!
//! let stamp = TickStamp::new(12, t);
//! assert_eq!(stamp.tick, 12);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Number of in-game hours in one day.
pub const HOURS_PER_DAY: f64 = 24.0;

/// Number of in-game days in one year, used for agent ages.
pub const DAYS_PER_YEAR: f64 = 12.0;

/// A point on the game clock, in hours since the start of the world.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameTime(f64);

impl GameTime {
    /// The start of the world.
    pub const ZERO: GameTime = GameTime(0.0);

    pub fn from_hours(hours: f64) -> Self {
        Self(hours.max(0.0))
    }

    pub fn from_days(days: f64) -> Self {
        Self::from_hours(days * HOURS_PER_DAY)
    }

    pub fn hours(self) -> f64 {
        self.0
    }

    /// Hours elapsed between `earlier` and `self`. Negative if `earlier` is later.
    pub fn hours_since(self, earlier: GameTime) -> f64 {
        self.0 - earlier.0
    }

    /// Returns true once at least `hours` have passed since `earlier`.
    pub fn has_elapsed(self, earlier: GameTime, hours: f64) -> bool {
        self.hours_since(earlier) >= hours
    }

    /// Moves the clock forward.
    pub fn advance(&mut self, hours: f64) {
        self.0 += hours.max(0.0);
    }

    /// One-based day number.
    pub fn day(self) -> u64 {
        (self.0 / HOURS_PER_DAY).floor() as u64 + 1
    }

    /// Hour within the current day, `0.0..24.0`.
    pub fn hour_of_day(self) -> f64 {
        self.0 % HOURS_PER_DAY
    }
}

impl Add<f64> for GameTime {
    type Output = GameTime;

    fn add(self, hours: f64) -> GameTime {
        GameTime::from_hours(self.0 + hours)
    }
}

impl Sub<f64> for GameTime {
    type Output = GameTime;

    fn sub(self, hours: f64) -> GameTime {
        GameTime::from_hours(self.0 - hours)
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hour = self.hour_of_day();
        let whole = hour.floor() as u32;
        let minutes = ((hour - hour.floor()) * 60.0).round() as u32;
        write!(f, "day_{}.{:02}:{:02}", self.day(), whole, minutes.min(59))
    }
}

/// Error type for parsing a [`GameTime`] from its display form.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseTimeError {
    InvalidFormat(String),
    InvalidDay(String),
    InvalidClock(String),
}

impl fmt::Display for ParseTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseTimeError::InvalidFormat(s) => {
                write!(f, "invalid time format: '{}', expected 'day_N.HH:MM'", s)
            }
            ParseTimeError::InvalidDay(s) => write!(f, "invalid day: '{}'", s),
            ParseTimeError::InvalidClock(s) => write!(f, "invalid clock: '{}'", s),
        }
    }
}

impl std::error::Error for ParseTimeError {}

impl FromStr for GameTime {
    type Err = ParseTimeError;

    /// Parses a time from a string like "day_3.14:30".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day_part, clock_part) = s
            .split_once('.')
            .ok_or_else(|| ParseTimeError::InvalidFormat(s.to_string()))?;

        let day = day_part
            .strip_prefix("day_")
            .ok_or_else(|| ParseTimeError::InvalidFormat(s.to_string()))?
            .parse::<u64>()
            .map_err(|_| ParseTimeError::InvalidDay(day_part.to_string()))?;
        if day == 0 {
            return Err(ParseTimeError::InvalidDay(day_part.to_string()));
        }

        let (hh, mm) = clock_part
            .split_once(':')
            .ok_or_else(|| ParseTimeError::InvalidClock(clock_part.to_string()))?;
        let hour = hh
            .parse::<u32>()
            .ok()
            .filter(|h| *h < 24)
            .ok_or_else(|| ParseTimeError::InvalidClock(clock_part.to_string()))?;
        let minute = mm
            .parse::<u32>()
            .ok()
            .filter(|m| *m < 60)
            .ok_or_else(|| ParseTimeError::InvalidClock(clock_part.to_string()))?;

        let hours = (day - 1) as f64 * HOURS_PER_DAY + hour as f64 + minute as f64 / 60.0;
        Ok(GameTime(hours))
    }
}

/// A point in simulation time.
///
/// Pairs the monotonic tick counter with the game clock reading at that tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickStamp {
    /// Monotonically increasing simulation tick.
    pub tick: u64,
    /// Game clock at this tick.
    pub time: GameTime,
}

impl TickStamp {
    pub fn new(tick: u64, time: GameTime) -> Self {
        Self { tick, time }
    }

    /// Creates a stamp for the start of the simulation.
    pub fn start() -> Self {
        Self {
            tick: 0,
            time: GameTime::ZERO,
        }
    }

    /// Increments the tick counter and advances the clock.
    pub fn advance_tick(&mut self, hours_per_tick: f64) {
        self.tick += 1;
        self.time.advance(hours_per_tick);
    }
}
