// Typed cell values and the decoder from raw cell text to `Value`.
use std::fmt;

use bstr::{BString, ByteSlice};
use serde::{Serialize, Serializer};
use time::{Date, PrimitiveDateTime, Time};

use crate::core::column::ColumnType;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::temporal;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    /// Unsigned integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Date(Date),
    Time(Time),
    DateTime(PrimitiveDateTime),
    Str(BString),
}

/// What to do when a numeric cell does not parse.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DecodePolicy {
    #[default]
    Strict,
    /// Substitute `Value::Null` for unparseable integer and float cells.
    Lenient,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Str(value) => Some(value.as_slice()),
            _ => None,
        }
    }
}

/// Decodes one cell. `None` is SQL NULL and wins over the declared type.
pub fn decode(raw: Option<&[u8]>, column_type: ColumnType) -> Result<Value> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };
    match column_type {
        ColumnType::Integer => decode_integer(raw),
        ColumnType::Float => decode_float(raw),
        ColumnType::Date => temporal::parse_date(raw).map(Value::Date),
        ColumnType::Time => temporal::parse_time(raw).map(Value::Time),
        ColumnType::DateTime => temporal::parse_datetime(raw).map(Value::DateTime),
        ColumnType::Timestamp => temporal::parse_timestamp(raw).map(Value::DateTime),
        ColumnType::String => Ok(Value::Str(BString::from(raw))),
    }
}

fn decode_integer(raw: &[u8]) -> Result<Value> {
    let text = numeric_text(raw)?;
    if let Ok(value) = text.parse::<i64>() {
        return Ok(Value::Int(value));
    }
    text.parse::<u64>().map(Value::UInt).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message(format!("invalid integer {:?}", raw.as_bstr()))
            .with_source(err)
    })
}

fn decode_float(raw: &[u8]) -> Result<Value> {
    let text = numeric_text(raw)?;
    text.parse::<f64>().map(Value::Float).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message(format!("invalid decimal {:?}", raw.as_bstr()))
            .with_source(err)
    })
}

fn numeric_text(raw: &[u8]) -> Result<&str> {
    std::str::from_utf8(raw).map_err(|err| {
        Error::new(ErrorKind::Decode)
            .with_message("numeric cell is not valid text")
            .with_source(err)
    })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(value) => write!(f, "{value}"),
            Value::UInt(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Date(date) => {
                let formats = temporal::formats().map_err(|_| fmt::Error)?;
                write_rendered(f, date.format(&formats.date))
            }
            Value::Time(time) => {
                let formats = temporal::formats().map_err(|_| fmt::Error)?;
                write_rendered(f, time.format(&formats.time))
            }
            Value::DateTime(datetime) => {
                let formats = temporal::formats().map_err(|_| fmt::Error)?;
                if datetime.nanosecond() == 0 {
                    write_rendered(f, datetime.format(&formats.datetime))
                } else {
                    write_rendered(f, datetime.format(&formats.timestamp))
                }
            }
            Value::Str(value) => write!(f, "{value}"),
        }
    }
}

fn write_rendered(
    f: &mut fmt::Formatter<'_>,
    rendered: std::result::Result<String, time::error::Format>,
) -> fmt::Result {
    f.write_str(&rendered.map_err(|_| fmt::Error)?)
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int(value) => serializer.serialize_i64(*value),
            Value::UInt(value) => serializer.serialize_u64(*value),
            Value::Float(value) => serializer.serialize_f64(*value),
            Value::Date(_) | Value::Time(_) | Value::DateTime(_) => serializer.collect_str(self),
            Value::Str(value) => serializer.serialize_str(&value.to_str_lossy()),
        }
    }
}
