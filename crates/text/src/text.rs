use core::ops::Index;

use crate::Encoding;

/// A single text symbol.
pub type Sym = u8;

/// The terminating symbol (`$`), strictly greater than every legal input
/// symbol.
pub const TERMINATOR: Sym = Sym::MAX;

/// Extra symbols allocated around the input: the blank sentinel, the
/// terminator, and the trailing null.
pub const EXTRA_SYMBOLS: usize = 3;

/// The largest supported number of input characters.
///
/// Node identities, depths and head positions are 32-bit; a leaf id is
/// the negated suffix start, so starts up to `N + 1` must fit.
pub const MAX_TEXT_LENGTH: usize = (i32::MAX - 2) as usize;

/// An immutable text in the indexed layout consumed by the construction
/// engine.
///
/// The layout holds `N + 3` symbols: a blank sentinel at index 0, the
/// input at `1..=N`, [`TERMINATOR`] at `N + 1`, and a null at `N + 2`.
/// All tree indices refer into this 1-based layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    symbols: Vec<Sym>,
}

impl Text {
    /// Decodes an input byte stream into the indexed layout.
    pub fn from_bytes(bytes: &[u8], encoding: Encoding) -> anyhow::Result<Self> {
        let mut symbols = Vec::with_capacity(bytes.len() + EXTRA_SYMBOLS);

        symbols.push(b' ');

        match encoding {
            Encoding::Ascii => {
                for (i, &b) in bytes.iter().enumerate() {
                    if !b.is_ascii() {
                        anyhow::bail!("byte {b:#04x} at offset {i} is not ASCII");
                    }

                    symbols.push(b);
                }
            }

            Encoding::Latin1 => {
                for (i, &b) in bytes.iter().enumerate() {
                    if b >= TERMINATOR {
                        anyhow::bail!(
                            "byte {b:#04x} at offset {i} collides with the terminator symbol"
                        );
                    }

                    symbols.push(b);
                }
            }

            Encoding::Utf8 => {
                let s = core::str::from_utf8(bytes)
                    .map_err(|e| anyhow::anyhow!("invalid UTF-8 input: {e}"))?;

                for c in s.chars() {
                    let cp = c as u32;

                    if cp >= TERMINATOR as u32 {
                        anyhow::bail!(
                            "character U+{cp:04X} does not fit the one-byte symbol width"
                        );
                    }

                    symbols.push(cp as Sym);
                }
            }
        }

        let n = symbols.len() - 1;

        if n > MAX_TEXT_LENGTH {
            anyhow::bail!("text of {n} characters exceeds the supported maximum");
        }

        symbols.push(TERMINATOR);
        symbols.push(0);

        tracing::debug!(
            characters = n,
            encoding = encoding.name(),
            "text decoded into the indexed layout"
        );

        Ok(Self { symbols })
    }

    /// Number of input characters `N`, excluding the terminator.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.symbols.len() - EXTRA_SYMBOLS
    }

    /// Index of the terminator, `N + 1`.
    ///
    /// This is the scan frontier of a finished text: the last position a
    /// descent is allowed to compare.
    pub fn frontier(&self) -> usize {
        self.len() + 1
    }

    /// The raw symbol array, including the sentinel positions.
    pub fn symbols(&self) -> &[Sym] {
        &self.symbols
    }
}

impl Index<usize> for Text {
    type Output = Sym;

    fn index(&self, index: usize) -> &Self::Output {
        &self.symbols[index]
    }
}

impl From<&str> for Text {
    /// Builds a text directly from string content, panicking on symbols
    /// that do not fit the width. Intended for tests and examples.
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes(), Encoding::Utf8).expect("text fits the symbol width")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_has_sentinels() {
        let t = Text::from("abc");

        assert_eq!(t.len(), 3);
        assert_eq!(t.frontier(), 4);
        assert_eq!(t[0], b' ');
        assert_eq!(&t.symbols()[1..=3], b"abc");
        assert_eq!(t[4], TERMINATOR);
        assert_eq!(t[5], 0);
    }

    #[test]
    fn empty_text_is_just_sentinels() {
        let t = Text::from_bytes(b"", Encoding::Ascii).unwrap();

        assert_eq!(t.len(), 0);
        assert_eq!(t.frontier(), 1);
        assert_eq!(t[1], TERMINATOR);
    }

    #[test]
    fn ascii_rejects_high_bytes() {
        assert!(Text::from_bytes(&[0x61, 0xff], Encoding::Ascii).is_err());
    }

    #[test]
    fn latin1_rejects_terminator_collision() {
        assert!(Text::from_bytes(&[0xff], Encoding::Latin1).is_err());
        assert!(Text::from_bytes(&[0xfe], Encoding::Latin1).is_ok());
    }

    #[test]
    fn utf8_code_points_must_fit() {
        let t = Text::from_bytes("naïve".as_bytes(), Encoding::Utf8).unwrap();

        assert_eq!(t.len(), 5);
        assert_eq!(t[3], 0xef);

        assert!(Text::from_bytes("木".as_bytes(), Encoding::Utf8).is_err());
    }
}
