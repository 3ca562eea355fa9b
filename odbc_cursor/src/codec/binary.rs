//! Raw byte passthrough, binary-as-hex and bit-as-character delivery.

use crate::codec::Indicator;
use crate::engine::transfer::ChunkedTransfer;
use crate::error::Warning;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// A character code unit of a narrow or wide output buffer.
pub trait CodeUnit: Copy {
    const NUL: Self;
    fn from_ascii(byte: u8) -> Self;
}

impl CodeUnit for u8 {
    const NUL: Self = 0;
    fn from_ascii(byte: u8) -> Self {
        byte
    }
}

impl CodeUnit for u16 {
    const NUL: Self = 0;
    fn from_ascii(byte: u8) -> Self {
        u16::from(byte)
    }
}

/// Copies the next chunk of `src` verbatim; no terminator is written.
pub fn deliver_binary(
    src: &[u8],
    buf: &mut [u8],
    transfer: &mut ChunkedTransfer,
) -> (Indicator, Vec<Warning>) {
    let offset = transfer.offset().min(src.len());
    let rest = &src[offset..];
    let n = rest.len().min(buf.len());
    buf[..n].copy_from_slice(&rest[..n]);
    transfer.advance(n);

    let indicator = Indicator::Length(rest.len());
    if n == rest.len() {
        transfer.finish();
        (indicator, Vec::new())
    } else {
        (
            indicator,
            vec![Warning::truncated(format!(
                "Binary data, right truncated: {} of {} bytes delivered",
                n,
                rest.len()
            ))],
        )
    }
}

/// Renders the next chunk of `src` as uppercase hex, two digits per byte,
/// followed by a terminator. The transfer offset counts source bytes.
pub fn deliver_hex<U: CodeUnit>(
    src: &[u8],
    buf: &mut [U],
    transfer: &mut ChunkedTransfer,
) -> (Indicator, Vec<Warning>) {
    let offset = transfer.offset().min(src.len());
    let rest = &src[offset..];
    let unit_size = std::mem::size_of::<U>();
    let indicator = Indicator::Length(rest.len() * 2 * unit_size);

    if buf.is_empty() {
        return if rest.is_empty() {
            transfer.finish();
            (indicator, Vec::new())
        } else {
            (indicator, vec![hex_truncated(rest.len(), 0)])
        };
    }

    let n = ((buf.len() - 1) / 2).min(rest.len());
    for (i, byte) in rest[..n].iter().enumerate() {
        buf[2 * i] = U::from_ascii(HEX_DIGITS[usize::from(byte >> 4)]);
        buf[2 * i + 1] = U::from_ascii(HEX_DIGITS[usize::from(byte & 0x0F)]);
    }
    buf[2 * n] = U::NUL;
    transfer.advance(n);

    if n == rest.len() {
        transfer.finish();
        (indicator, Vec::new())
    } else {
        (indicator, vec![hex_truncated(rest.len(), n)])
    }
}

/// Writes `'0'` or `'1'` plus terminator. Returns `None` when the buffer
/// cannot hold both, in which case nothing is written.
pub fn deliver_bit_char<U: CodeUnit>(value: bool, buf: &mut [U]) -> Option<Indicator> {
    if buf.len() < 2 {
        return None;
    }
    buf[0] = U::from_ascii(if value { b'1' } else { b'0' });
    buf[1] = U::NUL;
    Some(Indicator::Length(std::mem::size_of::<U>()))
}

/// Parses a hex literal (optionally `X'..'` or `0x..` wrapped) into bytes.
pub fn parse_hex(text: &str) -> Option<Vec<u8>> {
    let t = text.trim();
    let t = t
        .strip_prefix("X'")
        .or_else(|| t.strip_prefix("x'"))
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| t.strip_prefix("0x"))
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    if t.len() % 2 != 0 {
        return None;
    }
    t.as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            u8::try_from(hi * 16 + lo).ok()
        })
        .collect()
}

pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX_DIGITS[usize::from(byte >> 4)] as char);
        out.push(HEX_DIGITS[usize::from(byte & 0x0F)] as char);
    }
    out
}

fn hex_truncated(total: usize, delivered: usize) -> Warning {
    Warning::truncated(format!(
        "Hex data, right truncated: {} of {} source bytes delivered",
        delivered, total
    ))
}
