//! Serial keys of the form `PREFIX-XXXX-XXXX-XXXX`.
//!
//! Keys are drawn uniformly from 36^12 possibilities and are not checked
//! against existing records before being stored.

use std::fmt;

use rand::Rng;
use thiserror::Error;

pub const SERIAL_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const DEFAULT_PREFIX: &str = "CM";

const SEGMENT_COUNT: usize = 3;
const SEGMENT_LEN: usize = 4;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SerialFormatError {
    #[error("expected prefix `{expected}`, found `{found}`")]
    WrongPrefix { expected: String, found: String },
    #[error("expected 3 segments after the prefix, found {0}")]
    SegmentCount(usize),
    #[error("segment {index} has {len} characters, expected 4")]
    SegmentLength { index: usize, len: usize },
    #[error("character `{0}` is not allowed in a serial key")]
    InvalidCharacter(char),
}

/// Generates a serial with the console prefix.
pub fn generate_serial() -> String {
    generate_serial_with(DEFAULT_PREFIX, &mut rand::thread_rng())
}

pub fn generate_serial_with<R: Rng>(prefix: &str, rng: &mut R) -> String {
    let mut segment = || -> String {
        (0..SEGMENT_LEN)
            .map(|_| SERIAL_ALPHABET[rng.gen_range(0..SERIAL_ALPHABET.len())] as char)
            .collect()
    };

    format!("{}-{}-{}-{}", prefix, segment(), segment(), segment())
}

/// A serial key whose format has been checked.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SerialKey(String);

impl SerialKey {
    pub fn parse(serial: &str, prefix: &str) -> Result<Self, SerialFormatError> {
        let body = serial
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
            .ok_or_else(|| SerialFormatError::WrongPrefix {
                expected: prefix.to_owned(),
                found: serial.split('-').next().unwrap_or_default().to_owned(),
            })?;

        let segments: Vec<&str> = body.split('-').collect();
        if segments.len() != SEGMENT_COUNT {
            return Err(SerialFormatError::SegmentCount(segments.len()));
        }

        for (index, segment) in segments.iter().enumerate() {
            if let Some(invalid) = segment
                .chars()
                .find(|c| !c.is_ascii() || !SERIAL_ALPHABET.contains(&(*c as u8)))
            {
                return Err(SerialFormatError::InvalidCharacter(invalid));
            }
            if segment.len() != SEGMENT_LEN {
                return Err(SerialFormatError::SegmentLength {
                    index,
                    len: segment.len(),
                });
            }
        }

        Ok(Self(serial.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SerialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
