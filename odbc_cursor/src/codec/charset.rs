//! Character-at-a-time decoding of cell bytes in the declared character set.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    #[default]
    Utf8,
    Latin1,
}

/// One decoded logical character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decoded {
    pub ch: char,
    /// Source bytes consumed.
    pub len: usize,
    /// False when the bytes were invalid and `ch` is the `?` substitute.
    pub valid: bool,
}

const REPLACEMENT: char = '?';

impl Charset {
    pub fn is_multibyte(self) -> bool {
        matches!(self, Charset::Utf8)
    }

    /// Decodes the character starting at `bytes[0]`. Returns `None` on empty input.
    pub fn decode_char(self, bytes: &[u8]) -> Option<Decoded> {
        let lead = *bytes.first()?;
        match self {
            Charset::Latin1 => Some(Decoded {
                ch: char::from(lead),
                len: 1,
                valid: true,
            }),
            Charset::Utf8 => {
                let width = utf8_width(lead);
                if width == 0 || bytes.len() < width {
                    return Some(invalid());
                }
                match std::str::from_utf8(&bytes[..width]) {
                    Ok(s) => s.chars().next().map(|ch| Decoded {
                        ch,
                        len: width,
                        valid: true,
                    }),
                    Err(_) => Some(invalid()),
                }
            }
        }
    }

    /// Length of the longest prefix of `bytes` that is at most `limit` bytes
    /// and does not end inside a character.
    pub fn boundary(self, bytes: &[u8], limit: usize) -> usize {
        if !self.is_multibyte() || limit >= bytes.len() {
            return limit.min(bytes.len());
        }
        let mut pos = 0;
        while let Some(d) = self.decode_char(&bytes[pos..]) {
            if pos + d.len > limit {
                break;
            }
            pos += d.len;
        }
        pos
    }

    /// Number of UTF-16 code units `bytes` decodes to.
    pub fn utf16_len(self, bytes: &[u8]) -> usize {
        let mut pos = 0;
        let mut units = 0;
        while let Some(d) = self.decode_char(&bytes[pos..]) {
            units += d.ch.len_utf16();
            pos += d.len;
        }
        units
    }

    /// Encodes a string into this character set; unrepresentable characters
    /// become `?` and are counted.
    pub fn encode(self, text: &str) -> (Vec<u8>, usize) {
        match self {
            Charset::Utf8 => (text.as_bytes().to_vec(), 0),
            Charset::Latin1 => {
                let mut lossy = 0;
                let bytes = text
                    .chars()
                    .map(|ch| {
                        u8::try_from(u32::from(ch)).unwrap_or_else(|_| {
                            lossy += 1;
                            REPLACEMENT as u8
                        })
                    })
                    .collect();
                (bytes, lossy)
            }
        }
    }
}

fn invalid() -> Decoded {
    Decoded {
        ch: REPLACEMENT,
        len: 1,
        valid: false,
    }
}

fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}
