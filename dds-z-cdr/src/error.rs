//! Error types for CDR serialization/deserialization.

use std::fmt::Display;

use serde::{de, ser};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Custom(String),

    #[error("cannot deserialize unknown type in CDR")]
    UnsupportedAny,

    #[error("sequence length required")]
    UnknownLength,

    #[error("unexpected end of input at offset {position}: need {needed} bytes, {available} available")]
    Eof {
        position: usize,
        needed: usize,
        available: usize,
    },

    #[error("encapsulation header needs 4 bytes, got {0}")]
    HeaderTooShort(usize),

    #[error("unrecognized encoding kind byte {0:#04x}")]
    BadEncapsulation(u8),

    #[error("invalid boolean value: {0}")]
    BadBoolean(u8),

    #[error("invalid char codepoint: {0:#x}")]
    BadChar(u32),

    #[error("invalid option discriminant: {0}")]
    BadOption(u32),

    #[error("{0}")]
    BadUtf8(#[from] std::str::Utf8Error),
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}
