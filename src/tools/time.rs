//! Date and time arithmetic

use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ObjectSchema, Param, TypedTool};
use crate::capabilities::Clock;
use crate::error::ExecutionError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    Now,
    Add,
    Diff,
    Convert,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl Unit {
    fn duration(self, amount: i64) -> Option<Duration> {
        match self {
            Unit::Seconds => Duration::try_seconds(amount),
            Unit::Minutes => Duration::try_minutes(amount),
            Unit::Hours => Duration::try_hours(amount),
            Unit::Days => Duration::try_days(amount),
            Unit::Weeks => Duration::try_weeks(amount),
        }
    }
}

/// Parse RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` (UTC) or unix seconds
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, ExecutionError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(secs) = value.parse::<i64>() {
        if let Some(dt) = Utc.timestamp_opt(secs, 0).single() {
            return Ok(dt);
        }
    }
    Err(ExecutionError::invalid_input(format!(
        "unrecognized date '{}': expected RFC 3339, YYYY-MM-DD or unix seconds",
        value
    )))
}

/// Parse `Z`, `UTC`, `+HH`, `+HHMM` or `+HH:MM`
pub fn parse_offset(value: &str) -> Result<FixedOffset, ExecutionError> {
    let invalid = || ExecutionError::invalid_input(format!("unrecognized UTC offset '{}'", value));
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match value.chars().next() {
        Some('+') => (1, &value[1..]),
        Some('-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().map_err(|_| invalid())?, 0),
        4 => (
            digits[..2].parse::<i32>().map_err(|_| invalid())?,
            digits[2..].parse::<i32>().map_err(|_| invalid())?,
        ),
        _ => return Err(invalid()),
    };
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Compact signed breakdown such as `-1d 2h 5s`
pub fn humanize(seconds: i64) -> String {
    if seconds == 0 {
        return "0s".to_string();
    }
    let sign = if seconds < 0 { "-" } else { "" };
    let mut rest = seconds.unsigned_abs();
    let mut parts = Vec::new();
    for (unit, size) in [("d", 86_400u64), ("h", 3_600), ("m", 60), ("s", 1)] {
        let n = rest / size;
        rest %= size;
        if n > 0 {
            parts.push(format!("{}{}", n, unit));
        }
    }
    format!("{}{}", sign, parts.join(" "))
}

/// Clock-driven time tool
pub struct TimeTool {
    clock: Arc<dyn Clock>,
}

impl TimeTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    fn instant_or_now(&self, value: Option<&str>) -> Result<DateTime<Utc>, ExecutionError> {
        match value {
            Some(v) => parse_instant(v),
            None => Ok(self.clock.now()),
        }
    }
}

fn required<'a>(value: &'a Option<String>, name: &str, op: &str) -> Result<&'a str, ExecutionError> {
    value
        .as_deref()
        .ok_or_else(|| ExecutionError::invalid_input(format!("'{}' requires '{}'", op, name)))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeInput {
    #[serde(default)]
    pub operation: Operation,
    pub date: Option<String>,
    pub other: Option<String>,
    pub amount: Option<i64>,
    #[serde(default)]
    pub unit: Unit,
    pub offset: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct TimeOutput {
    pub iso8601: String,
    pub unix: i64,
    pub unix_millis: i64,
    pub offset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human: Option<String>,
}

fn render(
    instant: DateTime<Utc>,
    offset: FixedOffset,
    format: Option<&str>,
) -> Result<TimeOutput, ExecutionError> {
    let local = instant.with_timezone(&offset);
    let formatted = match format {
        Some(fmt) => {
            if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
                return Err(ExecutionError::invalid_input(format!(
                    "invalid strftime format '{}'",
                    fmt
                )));
            }
            Some(local.format(fmt).to_string())
        }
        None => None,
    };
    Ok(TimeOutput {
        iso8601: local.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        unix: instant.timestamp(),
        unix_millis: instant.timestamp_millis(),
        offset: offset.to_string(),
        formatted,
        ..Default::default()
    })
}

impl TypedTool for TimeTool {
    type Input = TimeInput;
    type Output = TimeOutput;

    const NAME: &'static str = "time";
    const DESCRIPTION: &'static str =
        "Current time, date arithmetic (add), differences between dates (diff), and conversion to a UTC offset or strftime format.";

    fn params_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(
                Param::string("operation", "What to compute")
                    .one_of(&["now", "add", "diff", "convert"])
                    .default_value(json!("now")),
            )
            .param(
                Param::string("date", "Base date: RFC 3339, YYYY-MM-DD or unix seconds")
                    .length(1, 64),
            )
            .param(
                Param::string("other", "Second date for 'diff' (defaults to now)").length(1, 64),
            )
            .param(
                Param::integer("amount", "Amount to add for 'add' (negative subtracts)")
                    .range(-1_000_000_000.0, 1_000_000_000.0),
            )
            .param(
                Param::string("unit", "Unit of 'amount'")
                    .one_of(&["seconds", "minutes", "hours", "days", "weeks"])
                    .default_value(json!("seconds")),
            )
            .param(Param::string("offset", "UTC offset for the output, e.g. +05:30").length(1, 6))
            .param(Param::string("format", "strftime format for the output").length(1, 128))
    }

    fn result_schema(&self) -> ObjectSchema {
        ObjectSchema::new()
            .param(Param::string("iso8601", "RFC 3339 timestamp").required())
            .param(Param::integer("unix", "Unix seconds").required())
            .param(Param::integer("unix_millis", "Unix milliseconds").required())
            .param(Param::string("offset", "UTC offset of iso8601").required())
            .param(Param::string("formatted", "Output of 'format'"))
            .param(Param::integer("seconds", "Signed difference for 'diff'"))
            .param(Param::string("human", "Readable difference for 'diff'"))
    }

    fn run(&self, input: TimeInput) -> Result<TimeOutput, ExecutionError> {
        let offset = match input.offset.as_deref() {
            Some(o) => parse_offset(o)?,
            None => parse_offset("Z")?,
        };
        let format = input.format.as_deref();

        match input.operation {
            Operation::Now => render(self.clock.now(), offset, format),
            Operation::Add => {
                let base = self.instant_or_now(input.date.as_deref())?;
                let amount = input
                    .amount
                    .ok_or_else(|| ExecutionError::invalid_input("'add' requires 'amount'"))?;
                let shifted = input
                    .unit
                    .duration(amount)
                    .and_then(|d| base.checked_add_signed(d))
                    .ok_or_else(|| ExecutionError::invalid_input("result is out of range"))?;
                render(shifted, offset, format)
            }
            Operation::Diff => {
                let from = parse_instant(required(&input.date, "date", "diff")?)?;
                let to = self.instant_or_now(input.other.as_deref())?;
                let seconds = (to - from).num_seconds();
                let mut out = render(to, offset, format)?;
                out.seconds = Some(seconds);
                out.human = Some(humanize(seconds));
                Ok(out)
            }
            Operation::Convert => {
                let instant = parse_instant(required(&input.date, "date", "convert")?)?;
                render(instant, offset, format)
            }
        }
    }
}
