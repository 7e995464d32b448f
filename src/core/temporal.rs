//! Purpose: Fixed-offset parsing and canonical rendering of date/time cell text.
//! Exports: `parse_date`, `parse_time`, `parse_datetime`, `parse_timestamp`, `formats`.
//! Role: Temporal half of the value decoder; also the text form used when values are displayed.
//! Invariants: Parsing reads fixed character offsets (`YYYY-MM-DD HH:MM:SS.ffffff`).
//! Invariants: Render formats are process-wide, initialized once on first use, never torn down.
//! Notes: A timestamp without a fractional part decodes with a zero sub-second component.

use std::sync::OnceLock;

use time::error::InvalidFormatDescription;
use time::format_description::{self, BorrowedFormatItem};
use time::{Date, Month, PrimitiveDateTime, Time};

use crate::core::error::{Error, ErrorKind, Result};

const FRACTION_OFFSET: usize = 20;
const MICRO_DIGITS: usize = 6;

pub struct TemporalFormats {
    pub date: Vec<BorrowedFormatItem<'static>>,
    pub time: Vec<BorrowedFormatItem<'static>>,
    pub datetime: Vec<BorrowedFormatItem<'static>>,
    pub timestamp: Vec<BorrowedFormatItem<'static>>,
}

impl TemporalFormats {
    fn parse() -> FormatsInit {
        Ok(Self {
            date: format_description::parse_borrowed::<2>("[year]-[month]-[day]")?,
            time: format_description::parse_borrowed::<2>("[hour]:[minute]:[second]")?,
            datetime: format_description::parse_borrowed::<2>(
                "[year]-[month]-[day] [hour]:[minute]:[second]",
            )?,
            timestamp: format_description::parse_borrowed::<2>(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]",
            )?,
        })
    }
}

type FormatsInit = std::result::Result<TemporalFormats, InvalidFormatDescription>;

static FORMATS: OnceLock<FormatsInit> = OnceLock::new();

pub fn formats() -> Result<&'static TemporalFormats> {
    FORMATS
        .get_or_init(TemporalFormats::parse)
        .as_ref()
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("invalid temporal format description")
                .with_source(err.clone())
        })
}

pub fn parse_date(text: &[u8]) -> Result<Date> {
    let year = field(text, 0, 4)?;
    let month = field(text, 5, 7)?;
    let day = field(text, 8, 10)?;
    date_from_parts(year, month, day)
}

pub fn parse_time(text: &[u8]) -> Result<Time> {
    let hour = field(text, 0, 2)?;
    let minute = field(text, 3, 5)?;
    let second = field(text, 6, 8)?;
    time_from_parts(hour, minute, second, 0)
}

pub fn parse_datetime(text: &[u8]) -> Result<PrimitiveDateTime> {
    datetime_with_fraction(text, 0)
}

pub fn parse_timestamp(text: &[u8]) -> Result<PrimitiveDateTime> {
    datetime_with_fraction(text, fraction_micros(text))
}

fn datetime_with_fraction(text: &[u8], micros: u32) -> Result<PrimitiveDateTime> {
    let date = parse_date(text)?;
    let hour = field(text, 11, 13)?;
    let minute = field(text, 14, 16)?;
    let second = field(text, 17, 19)?;
    let time = time_from_parts(hour, minute, second, micros)?;
    Ok(PrimitiveDateTime::new(date, time))
}

/// Reads leading digits from offset 20 as microseconds; absent digits yield zero.
fn fraction_micros(text: &[u8]) -> u32 {
    let Some(tail) = text.get(FRACTION_OFFSET..) else {
        return 0;
    };
    let digits = tail
        .iter()
        .copied()
        .take_while(u8::is_ascii_digit)
        .take(MICRO_DIGITS)
        .collect::<Vec<_>>();
    (0..MICRO_DIGITS).fold(0u32, |acc, idx| {
        acc * 10 + digits.get(idx).map_or(0, |digit| u32::from(digit - b'0'))
    })
}

fn field(text: &[u8], start: usize, end: usize) -> Result<u32> {
    let bytes = text.get(start..end).ok_or_else(|| {
        Error::new(ErrorKind::Decode).with_message(format!(
            "temporal text too short: expected at least {end} characters, got {}",
            text.len()
        ))
    })?;
    if !bytes.iter().all(u8::is_ascii_digit) {
        return Err(Error::new(ErrorKind::Decode).with_message(format!(
            "non-digit characters at offsets {start}..{end} of temporal text"
        )));
    }
    Ok(bytes
        .iter()
        .fold(0u32, |acc, byte| acc * 10 + u32::from(byte - b'0')))
}

fn date_from_parts(year: u32, month: u32, day: u32) -> Result<Date> {
    let month = u8::try_from(month)
        .ok()
        .and_then(|month| Month::try_from(month).ok())
        .ok_or_else(|| {
            Error::new(ErrorKind::Decode).with_message(format!("month {month} out of range"))
        })?;
    // Fields are at most four digits wide, so the narrowing casts below cannot truncate.
    Date::from_calendar_date(year as i32, month, day as u8).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message("date component out of range")
            .with_source(err)
    })
}

fn time_from_parts(hour: u32, minute: u32, second: u32, micros: u32) -> Result<Time> {
    Time::from_hms_micro(hour as u8, minute as u8, second as u8, micros).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message("time component out of range")
            .with_source(err)
    })
}
