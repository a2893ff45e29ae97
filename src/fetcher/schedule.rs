//! Recurring schedule for the timer trigger.
//!
//! Accepts `cron` expressions (6 or 7 fields, with seconds), classic 5-field
//! expressions (a `0` seconds field is prepended), the `@hourly`-style
//! aliases, and fixed intervals written as `@every 1h30m`.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{FetcherError, Result};

#[derive(Debug, Clone)]
enum Kind {
    Cron(Box<cron::Schedule>),
    Every(Duration),
}

/// A parsed schedule expression.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    kind: Kind,
}

impl CronSchedule {
    /// Parse a schedule expression.
    pub fn parse(expression: &str) -> Result<Self> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(FetcherError::schedule(expression, "expression is empty"));
        }

        if let Some(interval) = trimmed.strip_prefix("@every") {
            let every = parse_interval(interval.trim())
                .ok_or_else(|| FetcherError::schedule(expression, "invalid @every interval"))?;
            let schedule = Self { expression: trimmed.to_string(), kind: Kind::Every(every) };
            return schedule.ensure_upcoming(expression);
        }

        // cron expects 6 or 7 fields (with seconds)
        let normalized = if !trimmed.starts_with('@') && trimmed.split_whitespace().count() == 5 {
            format!("0 {}", trimmed)
        } else {
            trimmed.to_string()
        };

        let schedule = cron::Schedule::from_str(&normalized)
            .map_err(|e| FetcherError::schedule(expression, e.to_string()))?;

        Self { expression: trimmed.to_string(), kind: Kind::Cron(Box::new(schedule)) }
            .ensure_upcoming(expression)
    }

    /// A schedule that never fires again would leave the timer trigger dead.
    fn ensure_upcoming(self, expression: &str) -> Result<Self> {
        if self.next_after(Utc::now()).is_none() {
            return Err(FetcherError::schedule(expression, "schedule has no upcoming occurrence"));
        }
        Ok(self)
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Next occurrence strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match &self.kind {
            Kind::Cron(schedule) => schedule.after(&after).next(),
            Kind::Every(interval) => chrono::Duration::from_std(*interval)
                .ok()
                .and_then(|d| after.checked_add_signed(d)),
        }
    }

    /// How long to sleep from `now` until the next occurrence.
    pub fn until_next(&self, now: DateTime<Utc>) -> Option<Duration> {
        let next = self.next_after(now)?;
        Some((next - now).to_std().unwrap_or_default())
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl FromStr for CronSchedule {
    type Err = FetcherError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse `1h30m`, `45s`, `250ms` style intervals. Zero is rejected.
fn parse_interval(input: &str) -> Option<Duration> {
    if input.is_empty() {
        return None;
    }

    let mut total = Duration::ZERO;
    let mut digits = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let value: u64 = digits.parse().ok()?;
        digits.clear();

        let unit = match c {
            'h' => Duration::from_secs(value.checked_mul(3600)?),
            's' => Duration::from_secs(value),
            'm' if chars.peek() == Some(&'s') => {
                chars.next();
                Duration::from_millis(value)
            }
            'm' => Duration::from_secs(value.checked_mul(60)?),
            _ => return None,
        };
        total = total.checked_add(unit)?;
    }

    // trailing number without a unit
    if !digits.is_empty() || total.is_zero() {
        return None;
    }

    Some(total)
}
