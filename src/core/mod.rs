// Core modules implementing the result cursor, value decoding, and error modeling.
pub mod column;
pub mod cursor;
pub mod error;
pub mod record;
pub mod source;
pub mod temporal;
pub mod value;
