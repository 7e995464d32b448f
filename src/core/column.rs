//! Purpose: Column metadata and the mapping from backend-native types to decode categories.
//! Exports: `ColumnType`, `NativeType`, `FieldMeta`, `Column`, `mysql` type codes.
//! Role: The only place native type codes are inspected; everything downstream matches on `ColumnType`.
//! Invariants: `ColumnType` is closed; unrecognized native types fall back to `String`.
//! Invariants: Mapping is pure and decided once per result set at construction.

/// Decode category of a result column.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ColumnType {
    Integer,
    Float,
    Date,
    Time,
    DateTime,
    Timestamp,
    String,
}

/// MySQL protocol field type codes (`enum_field_types`).
pub mod mysql {
    pub const DECIMAL: u16 = 0;
    pub const TINY: u16 = 1;
    pub const SHORT: u16 = 2;
    pub const LONG: u16 = 3;
    pub const FLOAT: u16 = 4;
    pub const DOUBLE: u16 = 5;
    pub const NULL: u16 = 6;
    pub const TIMESTAMP: u16 = 7;
    pub const LONGLONG: u16 = 8;
    pub const INT24: u16 = 9;
    pub const DATE: u16 = 10;
    pub const TIME: u16 = 11;
    pub const DATETIME: u16 = 12;
    pub const YEAR: u16 = 13;
    pub const NEWDATE: u16 = 14;
    pub const VARCHAR: u16 = 15;
    pub const BIT: u16 = 16;
    pub const JSON: u16 = 245;
    pub const NEWDECIMAL: u16 = 246;
    pub const ENUM: u16 = 247;
    pub const SET: u16 = 248;
    pub const TINY_BLOB: u16 = 249;
    pub const MEDIUM_BLOB: u16 = 250;
    pub const LONG_BLOB: u16 = 251;
    pub const BLOB: u16 = 252;
    pub const VAR_STRING: u16 = 253;
    pub const STRING: u16 = 254;
    pub const GEOMETRY: u16 = 255;
}

/// Type information as a backend reports it for one field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NativeType {
    Mysql(u16),
    Declared(String),
    Unknown,
}

impl ColumnType {
    pub fn from_native(native: &NativeType) -> Self {
        match native {
            NativeType::Mysql(code) => Self::from_mysql(*code),
            NativeType::Declared(decl) => Self::from_declared(decl),
            NativeType::Unknown => ColumnType::String,
        }
    }

    pub fn from_mysql(code: u16) -> Self {
        match code {
            mysql::TINY | mysql::SHORT | mysql::LONG | mysql::INT24 | mysql::LONGLONG
            | mysql::YEAR => ColumnType::Integer,
            mysql::DECIMAL | mysql::NEWDECIMAL | mysql::FLOAT | mysql::DOUBLE => {
                ColumnType::Float
            }
            mysql::DATE | mysql::NEWDATE => ColumnType::Date,
            mysql::TIME => ColumnType::Time,
            mysql::DATETIME => ColumnType::DateTime,
            mysql::TIMESTAMP => ColumnType::Timestamp,
            _ => ColumnType::String,
        }
    }

    /// Maps SQL declared type text using affinity-style keyword rules.
    pub fn from_declared(decl: &str) -> Self {
        let decl = decl.to_ascii_uppercase();
        if decl.contains("INT") {
            return ColumnType::Integer;
        }
        if ["REAL", "FLOA", "DOUB", "DEC", "NUMERIC"]
            .iter()
            .any(|keyword| decl.contains(keyword))
        {
            return ColumnType::Float;
        }
        // Longer temporal keywords first: "DATETIME" contains both "DATE" and "TIME".
        if decl.contains("TIMESTAMP") {
            ColumnType::Timestamp
        } else if decl.contains("DATETIME") {
            ColumnType::DateTime
        } else if decl.contains("DATE") {
            ColumnType::Date
        } else if decl.contains("TIME") {
            ColumnType::Time
        } else {
            ColumnType::String
        }
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            ColumnType::Date | ColumnType::Time | ColumnType::DateTime | ColumnType::Timestamp
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::DateTime => "datetime",
            ColumnType::Timestamp => "timestamp",
            ColumnType::String => "string",
        }
    }
}

/// Field descriptor handed over by a row source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldMeta {
    pub name: String,
    pub native: NativeType,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, native: NativeType) -> Self {
        Self {
            name: name.into(),
            native,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl From<FieldMeta> for Column {
    fn from(meta: FieldMeta) -> Self {
        Self {
            column_type: ColumnType::from_native(&meta.native),
            name: meta.name,
        }
    }
}
