//! Character encodings supported by the delimited output.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Byte encoding of every delimited file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// UTF-16, little endian, without a byte-order mark.
    #[default]
    Utf16Le,
    /// UTF-8 without a byte-order mark.
    Utf8,
}

impl TextEncoding {
    /// Canonical name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utf16Le => "utf-16le",
            Self::Utf8 => "utf-8",
        }
    }

    /// Append the encoded form of `text` to `out`.
    pub fn encode_into(self, text: &str, out: &mut Vec<u8>) {
        match self {
            Self::Utf8 => out.extend_from_slice(text.as_bytes()),
            Self::Utf16Le => {
                out.reserve(text.len() * 2);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_le_bytes());
                }
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unsupported encoding name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported encoding {found:?} (expected utf-16le or utf-8)")]
pub struct UnknownEncoding {
    /// The rejected name.
    pub found: String,
}

impl FromStr for TextEncoding {
    type Err = UnknownEncoding;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalised: String = raw
            .chars()
            .filter(|ch| !matches!(ch, '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalised.as_str() {
            "utf16le" => Ok(Self::Utf16Le),
            "utf8" => Ok(Self::Utf8),
            _ => Err(UnknownEncoding {
                found: raw.to_owned(),
            }),
        }
    }
}
