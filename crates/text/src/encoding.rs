use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Character encoding of an input byte stream.
///
/// Only fixed-width-decodable encodings are supported: with one-byte
/// symbols, every decoded code point must fit strictly below the
/// terminator ordinal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    /// Seven-bit ASCII.
    Ascii,
    /// ISO 8859-1, one byte per character.
    Latin1,
    /// UTF-8; code points must fit the symbol width.
    #[default]
    Utf8,
}

impl Encoding {
    /// Canonical name of the encoding, iconv-style.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ascii => "ASCII",
            Self::Latin1 => "ISO-8859-1",
            Self::Utf8 => "UTF-8",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASCII" | "US-ASCII" => Ok(Self::Ascii),
            "LATIN-1" | "LATIN1" | "ISO-8859-1" | "ISO8859-1" => Ok(Self::Latin1),
            "UTF-8" | "UTF8" => Ok(Self::Utf8),
            _ => Err(anyhow::anyhow!("unsupported encoding `{s}`")),
        }
    }
}

/// Validates an internal text encoding name against the symbol width.
///
/// The engine stores one-byte symbols, so the internal encoding must be a
/// single-byte one; the default is ASCII, matching the width.
pub fn validate_internal_encoding(name: &str) -> anyhow::Result<Encoding> {
    let encoding = name.parse::<Encoding>()?;

    match encoding {
        Encoding::Ascii | Encoding::Latin1 => Ok(encoding),
        Encoding::Utf8 => anyhow::bail!(
            "the internal text encoding must be single-byte; `{name}` is variable-width"
        ),
    }
}
