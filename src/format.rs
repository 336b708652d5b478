//! Display formatting for number and temporal cells.
//!
//! Numbers accept a small set of named formats plus printf-style patterns;
//! temporal values accept moment-style token patterns.

use std::fmt::Write as _;
use std::sync::OnceLock;

use chrono::{Datelike, FixedOffset, NaiveDateTime, Timelike};
use regex::{Captures, Regex};
use thiserror::Error;

use crate::data::format_plain_number;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported format `{format}`: {reason}")]
pub struct UnsupportedFormat {
    pub format: String,
    pub reason: String,
}

impl UnsupportedFormat {
    fn new(format: &str, reason: impl Into<String>) -> Self {
        Self {
            format: format.to_string(),
            reason: reason.into(),
        }
    }
}

fn printf_regex() -> &'static Regex {
    static PRINTF: OnceLock<Regex> = OnceLock::new();
    PRINTF.get_or_init(|| {
        Regex::new(r"%([,+\-0 ]*)(\d+)?(?:\.(\d+))?([diufeEs%])").expect("valid printf regex")
    })
}

fn moment_regex() -> &'static Regex {
    static MOMENT: OnceLock<Regex> = OnceLock::new();
    MOMENT.get_or_init(|| {
        Regex::new(r"\[[^\]]*\]|YYYY|YY|MMMM|MMM|MM|M|DD|D|dddd|ddd|HH|H|hh|h|mm|m|ss|s|SSS|A|a|ZZ|Z|X|x")
            .expect("valid moment regex")
    })
}

/// Formats `value` for display.
///
/// `fixed_decimals` pins the fraction digits when no format is given (and
/// for `localized`); it is derived from the column's `step`.
pub fn format_number(
    value: f64,
    format: Option<&str>,
    fixed_decimals: Option<usize>,
) -> Result<String, UnsupportedFormat> {
    let Some(format) = format.map(str::trim).filter(|f| !f.is_empty()) else {
        return Ok(match fixed_decimals {
            Some(decimals) => format!("{value:.decimals$}"),
            None => format_plain_number(value),
        });
    };

    let formatted = match format {
        "plain" => format_plain_number(value),
        "localized" => match fixed_decimals {
            Some(decimals) => group_fixed(value, decimals),
            None => trim_fraction(group_fixed(value, 3)),
        },
        "percent" => format!("{}%", group_fixed(value * 100.0, 2)),
        "dollar" => currency(value, "$", 2),
        "euro" => currency(value, "€", 2),
        "yen" => currency(value, "¥", 0),
        "accounting" => {
            let body = format!("${}", group_fixed(value.abs(), 2));
            if value < 0.0 { format!("({body})") } else { body }
        }
        "compact" => compact(value),
        "scientific" => exponential(value, 1),
        "engineering" => exponential(value, 3),
        pattern => printf(value, pattern)?,
    };
    Ok(formatted)
}

fn currency(value: f64, symbol: &str, decimals: usize) -> String {
    let body = group_fixed(value.abs(), decimals);
    if value < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{symbol}{body}")
    } else {
        format!("{symbol}{body}")
    }
}

/// Fixed decimals with `,` thousands grouping.
fn group_fixed(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.decimals$}", value.abs());
    let (int_part, fraction) = match rendered.split_once('.') {
        Some((int_part, fraction)) => (int_part, Some(fraction)),
        None => (rendered.as_str(), None),
    };
    let mut out = String::new();
    if value < 0.0 && rendered.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn trim_fraction(rendered: String) -> String {
    if !rendered.contains('.') {
        return rendered;
    }
    rendered.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn compact(value: f64) -> String {
    const SUFFIXES: &[(f64, &str)] = &[(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];
    let magnitude = value.abs();
    let (scaled, suffix) = SUFFIXES
        .iter()
        .find(|(threshold, _)| magnitude >= *threshold)
        .map(|(threshold, suffix)| (value / threshold, *suffix))
        .unwrap_or((value, ""));
    let decimals = if scaled.abs() >= 10.0 { 0 } else { 1 };
    format!("{}{suffix}", trim_fraction(format!("{scaled:.decimals$}")))
}

/// `1.235E3` style; `step` 3 gives engineering notation.
fn exponential(value: f64, step: i32) -> String {
    if value == 0.0 {
        return "0E0".to_string();
    }
    let mut exponent = value.abs().log10().floor() as i32;
    exponent -= exponent.rem_euclid(step);
    let mantissa = value / 10f64.powi(exponent);
    format!("{}E{exponent}", trim_fraction(format!("{mantissa:.3}")))
}

fn printf(value: f64, pattern: &str) -> Result<String, UnsupportedFormat> {
    let mut out = String::new();
    let mut last = 0;
    for caps in printf_regex().captures_iter(pattern) {
        let Some(whole) = caps.get(0) else { continue };
        let literal = &pattern[last..whole.start()];
        if literal.contains('%') {
            return Err(UnsupportedFormat::new(pattern, "unknown conversion"));
        }
        out.push_str(literal);
        out.push_str(&printf_token(value, &caps));
        last = whole.end();
    }
    let tail = &pattern[last..];
    if tail.contains('%') {
        return Err(UnsupportedFormat::new(pattern, "unknown conversion"));
    }
    out.push_str(tail);
    Ok(out)
}

fn printf_token(value: f64, caps: &Captures<'_>) -> String {
    let flags = caps.get(1).map_or("", |m| m.as_str());
    let width = caps.get(2).and_then(|m| m.as_str().parse::<usize>().ok());
    let precision = caps.get(3).and_then(|m| m.as_str().parse::<usize>().ok());
    let conversion = caps.get(4).map_or("s", |m| m.as_str());

    let grouped = flags.contains(',');
    let numeric = conversion != "s" && conversion != "%";
    let body = match conversion {
        "%" => return "%".to_string(),
        "d" | "i" => integer_body(value.trunc(), grouped),
        "u" => integer_body(value.trunc().abs(), grouped),
        "f" => match (precision, grouped) {
            (Some(p), true) => group_fixed(value, p),
            (Some(p), false) => format!("{value:.p$}"),
            (None, true) => trim_fraction(group_fixed(value, 6)),
            (None, false) => format_plain_number(value),
        },
        "e" | "E" => {
            let rendered = js_exponential(value, precision);
            if conversion == "E" {
                rendered.to_uppercase()
            } else {
                rendered
            }
        }
        _ => {
            let text = format_plain_number(value);
            match precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            }
        }
    };

    let body = if numeric && flags.contains('+') && value >= 0.0 {
        format!("+{body}")
    } else if numeric && flags.contains(' ') && value >= 0.0 {
        format!(" {body}")
    } else {
        body
    };

    let Some(width) = width else { return body };
    let len = body.chars().count();
    if len >= width {
        return body;
    }
    let padding = width - len;
    if flags.contains('-') {
        format!("{body}{}", " ".repeat(padding))
    } else if flags.contains('0') && numeric {
        let (sign, digits) = match body.chars().next() {
            Some(c @ ('-' | '+' | ' ')) => (c.to_string(), &body[1..]),
            _ => (String::new(), body.as_str()),
        };
        format!("{sign}{}{digits}", "0".repeat(padding))
    } else {
        format!("{}{body}", " ".repeat(padding))
    }
}

fn integer_body(value: f64, grouped: bool) -> String {
    let rendered = format!("{value:.0}");
    if !grouped {
        return rendered;
    }
    match rendered.strip_prefix('-') {
        Some(digits) => format!("-{}", group_digits(digits)),
        None => group_digits(&rendered),
    }
}

/// `1.5e+3` style exponent, matching what printf consumers expect.
fn js_exponential(value: f64, precision: Option<usize>) -> String {
    let rendered = match precision {
        Some(p) => format!("{value:.p$e}"),
        None => format!("{value:e}"),
    };
    match rendered.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => rendered,
    }
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Renders a local wall-clock time with moment-style tokens. Text in square
/// brackets is copied verbatim; `Z`/`ZZ` print `offset` (UTC when absent).
pub fn format_moment(local: NaiveDateTime, offset: Option<FixedOffset>, pattern: &str) -> String {
    let offset_secs = offset.map_or(0, |o| o.local_minus_utc());
    moment_regex()
        .replace_all(pattern, |caps: &Captures<'_>| {
            let token = caps.get(0).map_or("", |m| m.as_str());
            moment_token(local, offset_secs, token)
        })
        .into_owned()
}

fn moment_token(dt: NaiveDateTime, offset_secs: i32, token: &str) -> String {
    let hour12 = match dt.hour() % 12 {
        0 => 12,
        h => h,
    };
    let month = dt.month0() as usize;
    let weekday = dt.weekday().num_days_from_monday() as usize;
    match token {
        "YYYY" => format!("{:04}", dt.year()),
        "YY" => format!("{:02}", dt.year().rem_euclid(100)),
        "MMMM" => MONTHS[month].to_string(),
        "MMM" => MONTHS[month][..3].to_string(),
        "MM" => format!("{:02}", dt.month()),
        "M" => dt.month().to_string(),
        "DD" => format!("{:02}", dt.day()),
        "D" => dt.day().to_string(),
        "dddd" => WEEKDAYS[weekday].to_string(),
        "ddd" => WEEKDAYS[weekday][..3].to_string(),
        "HH" => format!("{:02}", dt.hour()),
        "H" => dt.hour().to_string(),
        "hh" => format!("{hour12:02}"),
        "h" => hour12.to_string(),
        "mm" => format!("{:02}", dt.minute()),
        "m" => dt.minute().to_string(),
        "ss" => format!("{:02}", dt.second()),
        "s" => dt.second().to_string(),
        "SSS" => format!("{:03}", dt.nanosecond() / 1_000_000 % 1000),
        "A" => if dt.hour() < 12 { "AM" } else { "PM" }.to_string(),
        "a" => if dt.hour() < 12 { "am" } else { "pm" }.to_string(),
        "Z" | "ZZ" => {
            let sign = if offset_secs < 0 { '-' } else { '+' };
            let abs = offset_secs.unsigned_abs();
            let mut out = String::new();
            let separator = if token == "Z" { ":" } else { "" };
            let _ = write!(out, "{sign}{:02}{separator}{:02}", abs / 3600, abs % 3600 / 60);
            out
        }
        "X" => (dt.and_utc().timestamp() - i64::from(offset_secs)).to_string(),
        "x" => (dt.and_utc().timestamp_millis() - i64::from(offset_secs) * 1000).to_string(),
        literal => literal
            .strip_prefix('[')
            .and_then(|l| l.strip_suffix(']'))
            .unwrap_or(literal)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn default_format_honors_fixed_decimals() {
        assert_eq!(format_number(1212.12, None, None).unwrap(), "1212.12");
        assert_eq!(format_number(3.0, None, Some(2)).unwrap(), "3.00");
        assert_eq!(format_number(3.0, Some(""), None).unwrap(), "3");
    }

    #[test]
    fn named_formats_render_like_a_spreadsheet() {
        assert_eq!(format_number(1234.567, Some("localized"), None).unwrap(), "1,234.567");
        assert_eq!(format_number(0.125, Some("percent"), None).unwrap(), "12.50%");
        assert_eq!(format_number(-1234.5, Some("dollar"), None).unwrap(), "-$1,234.50");
        assert_eq!(format_number(1234.5, Some("euro"), None).unwrap(), "€1,234.50");
        assert_eq!(format_number(1234.6, Some("yen"), None).unwrap(), "¥1,235");
        assert_eq!(format_number(-5.0, Some("accounting"), None).unwrap(), "($5.00)");
        assert_eq!(format_number(1234.0, Some("compact"), None).unwrap(), "1.2K");
        assert_eq!(format_number(25_000_000.0, Some("compact"), None).unwrap(), "25M");
        assert_eq!(format_number(1234.5678, Some("scientific"), None).unwrap(), "1.235E3");
        assert_eq!(format_number(12345.0, Some("engineering"), None).unwrap(), "12.345E3");
    }

    #[test]
    fn printf_patterns_cover_common_conversions() {
        assert_eq!(format_number(3.14159, Some("%.2f"), None).unwrap(), "3.14");
        assert_eq!(format_number(42.9, Some("%d ⭐"), None).unwrap(), "42 ⭐");
        assert_eq!(format_number(1234567.0, Some("%,d"), None).unwrap(), "1,234,567");
        assert_eq!(format_number(5.0, Some("%05d"), None).unwrap(), "00005");
        assert_eq!(format_number(5.0, Some("%+d"), None).unwrap(), "+5");
        assert_eq!(format_number(1500.0, Some("%.1e"), None).unwrap(), "1.5e+3");
        assert_eq!(format_number(0.5, Some("%d%%"), None).unwrap(), "0%");
        assert_eq!(format_number(12.0, Some("$ %s"), None).unwrap(), "$ 12");
    }

    #[test]
    fn unknown_printf_conversions_are_rejected() {
        let err = format_number(1.0, Some("%q"), None).unwrap_err();
        assert_eq!(err.format, "%q");
    }

    #[test]
    fn moment_tokens_render_wall_clock_time() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_milli_opt(15, 4, 5, 7)
            .unwrap();
        assert_eq!(format_moment(dt, None, "YYYY-MM-DD HH:mm:ss"), "2024-03-09 15:04:05");
        assert_eq!(format_moment(dt, None, "MMM D, YYYY h:mm A"), "Mar 9, 2024 3:04 PM");
        assert_eq!(format_moment(dt, None, "dddd [at] HH:mm:ss.SSS"), "Saturday at 15:04:05.007");
        let offset = FixedOffset::east_opt(5 * 3600 + 1800);
        assert_eq!(format_moment(dt, offset, "HH:mm Z"), "15:04 +05:30");
        assert_eq!(format_moment(dt, offset, "ZZ"), "+0530");
    }
}
