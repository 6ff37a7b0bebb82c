//! Absolute time values and signed durations.
//!
//! Both types store whole seconds plus a picosecond fraction that is kept
//! normalized to `0..PICOS_PER_SEC`, so the derived ordering is a strict
//! total order no matter which resolution a value was built from.
//! Arithmetic goes through a single `i128` picosecond count and saturates
//! at the representable range instead of wrapping.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Picoseconds in one second: the common tick rate for every time value.
pub const PICOS_PER_SEC: i128 = 1_000_000_000_000;

const PICOS_PER_MICRO: i128 = 1_000_000;
const PICOS_PER_MILLI: i128 = 1_000_000_000;
const PICOS_PER_NANO: i128 = 1_000;

/// Upper bound on how many times the tick rate is doubled while looking
/// for an exact representation of a fractional period.
const MAX_HZ_DOUBLINGS: u32 = 64;

fn split_picos(total: i128) -> (i64, u64) {
    let secs = total.div_euclid(PICOS_PER_SEC);
    let picos = total.rem_euclid(PICOS_PER_SEC);
    let secs = i64::try_from(secs).unwrap_or(if secs < 0 { i64::MIN } else { i64::MAX });
    // rem_euclid keeps this in 0..PICOS_PER_SEC
    (secs, u64::try_from(picos).unwrap_or_default())
}

fn join_picos(secs: i64, picos: u64) -> i128 {
    i128::from(secs) * PICOS_PER_SEC + i128::from(picos)
}

fn fmt_picos(total: i128, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if total < 0 { "-" } else { "" };
    let abs = total.unsigned_abs();
    let secs = abs / PICOS_PER_SEC.unsigned_abs();
    let frac = abs % PICOS_PER_SEC.unsigned_abs();
    if frac == 0 {
        write!(f, "{sign}{secs}")
    } else {
        let digits = format!("{frac:012}");
        write!(f, "{sign}{secs}.{}", digits.trim_end_matches('0'))
    }
}

/// A signed span of time with picosecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Duration {
    secs: i64,
    picos: u64,
}

impl Duration {
    /// The empty duration.
    pub const ZERO: Self = Self { secs: 0, picos: 0 };

    /// Build a duration from a total picosecond count, saturating on overflow.
    pub fn from_picos(total: i128) -> Self {
        let (secs, picos) = split_picos(total);
        Self { secs, picos }
    }

    /// Whole seconds.
    pub const fn from_secs(secs: i64) -> Self {
        Self { secs, picos: 0 }
    }

    /// Milliseconds.
    pub fn from_millis(millis: i64) -> Self {
        Self::from_picos(i128::from(millis) * PICOS_PER_MILLI)
    }

    /// Seconds, microseconds and picoseconds, each of which may be negative
    /// or exceed its natural range; carries are propagated.
    pub fn from_components(secs: i64, micros: i64, picos: i64) -> Self {
        Self::from_picos(
            i128::from(secs) * PICOS_PER_SEC
                + i128::from(micros) * PICOS_PER_MICRO
                + i128::from(picos),
        )
    }

    /// Fractional seconds, rounded to the nearest picosecond.
    ///
    /// Returns `None` for NaN, infinities and values outside the `i64`
    /// second range.
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() || secs.abs() >= 9.2e18 {
            return None;
        }
        let whole = secs.trunc();
        let frac = ((secs - whole) * 1e12).round();
        #[allow(clippy::cast_possible_truncation)]
        let total = (whole as i128) * PICOS_PER_SEC + frac as i128;
        Some(Self::from_picos(total))
    }

    /// Total picoseconds.
    pub fn as_picos(self) -> i128 {
        join_picos(self.secs, self.picos)
    }

    /// Approximate value in seconds.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs_f64(self) -> f64 {
        self.secs as f64 + self.picos as f64 / 1e12
    }

    /// Whole seconds, rounded toward negative infinity.
    pub const fn whole_secs(self) -> i64 {
        self.secs
    }

    /// Picoseconds past `whole_secs`.
    pub const fn subsec_picos(self) -> u64 {
        self.picos
    }

    /// True when the span points backward in time.
    pub const fn is_negative(self) -> bool {
        self.secs < 0
    }

    /// True for strictly positive spans.
    pub const fn is_positive(self) -> bool {
        self.secs > 0 || (self.secs == 0 && self.picos > 0)
    }

    /// Multiply by an integer count, saturating on overflow.
    pub fn saturating_mul(self, count: i128) -> Self {
        Self::from_picos(self.as_picos().saturating_mul(count))
    }

    /// How many whole `unit`s fit in this span (floor division).
    ///
    /// Returns 0 when `unit` is not positive.
    pub fn whole_multiples_of(self, unit: Self) -> i128 {
        if !unit.is_positive() {
            return 0;
        }
        self.as_picos().div_euclid(unit.as_picos())
    }

    /// Convert to a `std::time::Duration`; `None` if negative.
    pub fn to_std(self) -> Option<std::time::Duration> {
        let secs = u64::try_from(self.secs).ok()?;
        let nanos = u32::try_from(i128::from(self.picos) / PICOS_PER_NANO).ok()?;
        Some(std::time::Duration::new(secs, nanos))
    }
}

impl From<std::time::Duration> for Duration {
    fn from(d: std::time::Duration) -> Self {
        Self::from_picos(
            i128::from(d.as_secs()) * PICOS_PER_SEC + i128::from(d.subsec_nanos()) * PICOS_PER_NANO,
        )
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_picos(self.as_picos().saturating_add(rhs.as_picos()))
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_picos(self.as_picos().saturating_sub(rhs.as_picos()))
    }
}

impl Neg for Duration {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_picos(-self.as_picos())
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_picos(self.as_picos(), f)?;
        f.write_str("s")
    }
}

/// An absolute point in time, measured from the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TimeValue {
    secs: i64,
    picos: u64,
}

impl TimeValue {
    /// The Unix epoch.
    pub const EPOCH: Self = Self { secs: 0, picos: 0 };

    /// Whole seconds since the epoch.
    pub const fn from_secs(secs: i64) -> Self {
        Self { secs, picos: 0 }
    }

    /// Seconds plus a fraction `frac / hz` of a second.
    ///
    /// Fractions finer than a picosecond are truncated toward the past and
    /// fractions of a second or more carry into `secs`. Returns `None` when
    /// `hz` is zero.
    pub fn from_parts(secs: i64, frac: u64, hz: u64) -> Option<Self> {
        if hz == 0 {
            return None;
        }
        let scaled = u128::from(frac) * PICOS_PER_SEC.unsigned_abs() / u128::from(hz);
        let scaled = i128::try_from(scaled).ok()?;
        Some(Self::from_picos(i128::from(secs) * PICOS_PER_SEC + scaled))
    }

    /// Seconds plus microseconds since the epoch.
    pub fn from_micros(secs: i64, micros: u32) -> Self {
        Self::from_picos(i128::from(secs) * PICOS_PER_SEC + i128::from(micros) * PICOS_PER_MICRO)
    }

    /// Total picoseconds since the epoch, saturating on overflow.
    pub fn from_picos(total: i128) -> Self {
        let (secs, picos) = split_picos(total);
        Self { secs, picos }
    }

    /// Convert a `SystemTime`; times before the epoch come out negative.
    pub fn from_system_time(t: SystemTime) -> Self {
        match t.duration_since(UNIX_EPOCH) {
            Ok(after) => Self::EPOCH + Duration::from(after),
            Err(before) => Self::EPOCH + -Duration::from(before.duration()),
        }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert from a `time` date-time.
    pub fn from_offset_datetime(dt: time::OffsetDateTime) -> Self {
        Self::from_picos(dt.unix_timestamp_nanos() * PICOS_PER_NANO)
    }

    /// Convert into a UTC `time` date-time, dropping sub-nanosecond digits.
    /// `None` when outside the range `time` can represent.
    pub fn to_offset_datetime(self) -> Option<time::OffsetDateTime> {
        let nanos = self.as_picos().div_euclid(PICOS_PER_NANO);
        time::OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
    }

    /// Total picoseconds since the epoch.
    pub fn as_picos(self) -> i128 {
        join_picos(self.secs, self.picos)
    }

    /// Whole seconds since the epoch, rounded toward the past.
    pub const fn whole_secs(self) -> i64 {
        self.secs
    }

    /// Picoseconds past `whole_secs`.
    pub const fn subsec_picos(self) -> u64 {
        self.picos
    }

    /// Strict ordering; equal values are not less than each other.
    pub fn less_than(self, other: Self) -> bool {
        self < other
    }

    /// Smallest time strictly after `self` that is an exact multiple of
    /// `period` since the epoch. `None` when `period` is not positive or the
    /// result is out of range.
    pub fn next_integral_multiple(self, period: Duration) -> Option<Self> {
        if !period.is_positive() {
            return None;
        }
        let step = period.as_picos();
        let next = self.as_picos().div_euclid(step).checked_add(1)?.checked_mul(step)?;
        Some(Self::from_picos(next))
    }

    /// Like [`next_integral_multiple`](Self::next_integral_multiple), for a
    /// period given as floating-point seconds.
    ///
    /// The period is scaled by a tick rate that starts at one tick per
    /// picosecond and doubles until `secs * hz` is an integer, so that
    /// decimal periods such as `0.1` land exactly on their multiples. The
    /// result is rounded up to the next picosecond when the final tick rate
    /// is finer than that.
    pub fn next_integral_multiple_secs(self, secs: f64) -> Option<Self> {
        if !secs.is_finite() || secs <= 0.0 {
            return None;
        }
        let mut scale: i128 = 1;
        #[allow(clippy::cast_precision_loss)]
        let mut s_ticks = secs * (PICOS_PER_SEC as f64);
        let mut doublings = 0;
        while s_ticks.fract() != 0.0 && doublings < MAX_HZ_DOUBLINGS {
            scale *= 2;
            s_ticks *= 2.0;
            doublings += 1;
        }
        if s_ticks >= 1.0e37 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let step = s_ticks.round() as i128;
        if step <= 0 {
            return None;
        }
        let ticks = self.as_picos().checked_mul(scale)?;
        let next = ticks.div_euclid(step).checked_add(1)?.checked_mul(step)?;
        let picos = next.div_euclid(scale) + i128::from(next.rem_euclid(scale) != 0);
        Some(Self::from_picos(picos))
    }
}

impl Add<Duration> for TimeValue {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self::from_picos(self.as_picos().saturating_add(rhs.as_picos()))
    }
}

impl AddAssign<Duration> for TimeValue {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl Sub<Duration> for TimeValue {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self {
        Self::from_picos(self.as_picos().saturating_sub(rhs.as_picos()))
    }
}

impl Sub for TimeValue {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_picos(self.as_picos().saturating_sub(rhs.as_picos()))
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_picos(self.as_picos(), f)
    }
}
