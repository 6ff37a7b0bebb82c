//! Parsing and resolution of the "when" argument of scheduling calls.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::core::TimerError;
use crate::util::time::{Duration, TimeValue, PICOS_PER_SEC};

/// Units accepted in duration strings, in picoseconds.
const DURATION_WORDS: &[(&str, i128)] = &[
    ("microsec", 1_000_000),
    ("microsecond", 1_000_000),
    ("millisec", 1_000_000_000),
    ("millisecond", 1_000_000_000),
    ("sec", PICOS_PER_SEC),
    ("second", PICOS_PER_SEC),
    ("min", 60 * PICOS_PER_SEC),
    ("minute", 60 * PICOS_PER_SEC),
    ("hour", 3_600 * PICOS_PER_SEC),
    ("day", 86_400 * PICOS_PER_SEC),
    ("week", 604_800 * PICOS_PER_SEC),
    ("fortnight", 1_209_600 * PICOS_PER_SEC),
    ("month", 2_592_000 * PICOS_PER_SEC),
    ("year", 31_557_600 * PICOS_PER_SEC),
];

/// When a timer should first fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSpec {
    /// Immediately.
    Now,
    /// A span from now.
    Relative(Duration),
    /// A span from now given as separate components.
    Components {
        /// Seconds.
        secs: i64,
        /// Microseconds.
        micros: i64,
        /// Picoseconds.
        picos: i64,
    },
    /// An absolute wall-clock time.
    At(TimeValue),
    /// A time of day, today, in the host's UTC offset.
    ClockTime {
        /// Hour, 0-23.
        hour: u8,
        /// Minute, 0-59.
        minute: u8,
    },
    /// The next exact multiple of the repeat interval since the epoch.
    NextIntegralMultiple,
}

impl TimeSpec {
    /// A relative spec from fractional seconds.
    pub fn from_secs_f64(secs: f64) -> Result<Self, TimerError> {
        Duration::from_secs_f64(secs)
            .map(Self::Relative)
            .ok_or_else(|| {
                TimerError::InvalidTimeSpec(format!("{secs} is not a finite number of seconds"))
            })
    }

    /// Resolve to an absolute trigger time.
    ///
    /// `repeat` is only consulted by [`TimeSpec::NextIntegralMultiple`], which
    /// needs a positive interval.
    pub fn resolve(
        &self,
        now: TimeValue,
        offset: UtcOffset,
        repeat: Option<Duration>,
    ) -> Result<TimeValue, TimerError> {
        match *self {
            Self::Now => Ok(now),
            Self::Relative(delay) => Ok(now + delay),
            Self::Components { secs, micros, picos } => {
                Ok(now + Duration::from_components(secs, micros, picos))
            }
            Self::At(at) => Ok(at),
            Self::ClockTime { hour, minute } => resolve_clock_time(now, offset, hour, minute),
            Self::NextIntegralMultiple => repeat
                .filter(|interval| interval.is_positive())
                .and_then(|interval| now.next_integral_multiple(interval))
                .ok_or_else(|| {
                    TimerError::InvalidTimeSpec(
                        "next integral multiple requires a positive repeat interval".into(),
                    )
                }),
        }
    }

    /// Interpret as a delay measured from the start of an idle period.
    pub fn idle_delay(&self) -> Result<Duration, TimerError> {
        let delay = match *self {
            Self::Now => Duration::ZERO,
            Self::Relative(delay) => delay,
            Self::Components { secs, micros, picos } => {
                Duration::from_components(secs, micros, picos)
            }
            other => {
                return Err(TimerError::InvalidTimeSpec(format!(
                    "{other:?} cannot be used as an idle delay"
                )))
            }
        };
        if delay.is_negative() {
            return Err(TimerError::InvalidTimeSpec(format!("negative idle delay {delay}")));
        }
        Ok(delay)
    }
}

impl From<Duration> for TimeSpec {
    fn from(delay: Duration) -> Self {
        Self::Relative(delay)
    }
}

impl From<TimeValue> for TimeSpec {
    fn from(at: TimeValue) -> Self {
        Self::At(at)
    }
}

impl FromStr for TimeSpec {
    type Err = TimerError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim().to_ascii_lowercase();
        if text == "now" {
            return Ok(Self::Now);
        }
        if let Some((hour, minute)) = parse_clock_time(&text) {
            return Ok(Self::ClockTime { hour, minute });
        }
        if let Ok(secs) = text.parse::<f64>() {
            return Self::from_secs_f64(secs);
        }
        parse_duration(&text)
            .map(Self::Relative)
            .ok_or_else(|| TimerError::InvalidTimeSpec(format!("unrecognized time `{input}`")))
    }
}

fn resolve_clock_time(
    now: TimeValue,
    offset: UtcOffset,
    hour: u8,
    minute: u8,
) -> Result<TimeValue, TimerError> {
    let invalid = |e: &dyn std::fmt::Display| {
        TimerError::InvalidTimeSpec(format!("clock time {hour}:{minute:02}: {e}"))
    };
    let wall = time::Time::from_hms(hour, minute, 0).map_err(|e| invalid(&e))?;
    let today = now
        .to_offset_datetime()
        .ok_or_else(|| invalid(&"current time out of range"))?
        .to_offset(offset);
    Ok(TimeValue::from_offset_datetime(today.replace_time(wall)))
}

/// Parse `HH:MM`, `HH:MMam`, `HH:MMpm`, `HHam` or `HHpm`.
fn parse_clock_time(text: &str) -> Option<(u8, u8)> {
    let (body, meridiem) = if let Some(rest) = text.strip_suffix("am") {
        (rest.trim_end(), Some(false))
    } else if let Some(rest) = text.strip_suffix("pm") {
        (rest.trim_end(), Some(true))
    } else {
        (text, None)
    };
    let (hour, minute) = match body.split_once(':') {
        Some((h, m)) if m.len() == 2 => (h, m),
        Some(_) => return None,
        None if meridiem.is_some() => (body, "00"),
        None => return None,
    };
    if hour.is_empty() || hour.len() > 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !minute.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let mut hour: u8 = hour.parse().ok()?;
    let minute: u8 = minute.parse().ok()?;
    if minute > 59 {
        return None;
    }
    match meridiem {
        Some(pm) => {
            if hour == 0 || hour > 12 {
                return None;
            }
            hour %= 12;
            if pm {
                hour += 12;
            }
        }
        None if hour > 23 => return None,
        None => {}
    }
    Some((hour, minute))
}

/// Parse a duration such as `"90 sec"`, `"1 hour 30 mins"` or `"fortnight"`.
///
/// Each group is an optional decimal number (default 1) followed by a unit
/// word, optionally pluralised. Returns `None` unless the whole input parses.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let bytes = text.as_bytes();
    let mut pos = 0;
    let mut total = Duration::ZERO;
    let mut groups = 0;
    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos == bytes.len() {
            break;
        }
        let num_start = pos;
        while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
            pos += 1;
        }
        let count = if pos > num_start {
            text[num_start..pos].parse::<f64>().ok()?
        } else {
            1.0
        };
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let word_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        let unit = unit_picos(&text[word_start..pos].to_ascii_lowercase())?;
        #[allow(clippy::cast_precision_loss)]
        let secs = count * (unit as f64) / 1e12;
        total = total + Duration::from_secs_f64(secs)?;
        groups += 1;
    }
    (groups > 0).then_some(total)
}

fn unit_picos(word: &str) -> Option<i128> {
    let lookup = |w: &str| {
        DURATION_WORDS
            .iter()
            .find(|(name, _)| *name == w)
            .map(|(_, picos)| *picos)
    };
    if word.is_empty() {
        return None;
    }
    lookup(word).or_else(|| word.strip_suffix('s').and_then(lookup))
}
