//! Narrow and wide character delivery with chunked continuation.

use crate::codec::charset::Charset;
use crate::codec::Indicator;
use crate::engine::transfer::ChunkedTransfer;
use crate::error::Warning;

/// Copies the next chunk of `src` into a narrow character buffer.
///
/// One byte is always reserved for the terminator, and with a multi-byte
/// charset the chunk ends on a character boundary.
pub fn deliver_char(
    src: &[u8],
    buf: &mut [u8],
    transfer: &mut ChunkedTransfer,
    charset: Charset,
) -> (Indicator, Vec<Warning>) {
    let offset = transfer.offset().min(src.len());
    let rest = &src[offset..];
    let indicator = Indicator::Length(rest.len());

    if buf.is_empty() {
        if rest.is_empty() {
            transfer.finish();
            return (indicator, Vec::new());
        }
        return (indicator, vec![truncated(rest.len(), 0)]);
    }

    let n = charset.boundary(rest, buf.len() - 1);
    buf[..n].copy_from_slice(&rest[..n]);
    buf[n] = 0;
    transfer.advance(n);

    if n == rest.len() {
        transfer.finish();
        (indicator, Vec::new())
    } else {
        (indicator, vec![truncated(rest.len(), n)])
    }
}

/// Decodes the next chunk of `src` into UTF-16 code units.
///
/// A surrogate pair that straddles the end of the buffer is split: the
/// high half goes out now, the low half is held back for the next call.
pub fn deliver_wchar(
    src: &[u8],
    buf: &mut [u16],
    transfer: &mut ChunkedTransfer,
    charset: Charset,
) -> (Indicator, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut offset = transfer.offset().min(src.len());
    let pending = transfer.take_pending_unit();

    let total_units = usize::from(pending.is_some()) + charset.utf16_len(&src[offset..]);
    let indicator = Indicator::Length(total_units * 2);
    let capacity = buf.len().saturating_sub(1);

    let mut written = 0;
    if let Some(unit) = pending {
        if capacity == 0 {
            transfer.hold_pending_unit(unit);
        } else {
            buf[0] = unit;
            written = 1;
        }
    }

    let mut invalid = 0usize;
    let mut held_back = false;
    if !transfer.has_pending_unit() {
        while let Some(d) = charset.decode_char(&src[offset..]) {
            let mut units = [0u16; 2];
            let encoded = d.ch.encode_utf16(&mut units);
            if written + encoded.len() <= capacity {
                buf[written..written + encoded.len()].copy_from_slice(encoded);
                written += encoded.len();
            } else if encoded.len() == 2 && written + 1 == capacity {
                buf[written] = encoded[0];
                written += 1;
                transfer.hold_pending_unit(encoded[1]);
                held_back = true;
            } else {
                break;
            }
            if !d.valid {
                invalid += 1;
            }
            offset += d.len;
            transfer.advance(d.len);
            if held_back {
                break;
            }
        }
    }

    if !buf.is_empty() {
        buf[written] = 0;
    }
    if invalid > 0 {
        warnings.push(Warning::conversion(format!(
            "{} invalid {:?} sequence(s) replaced by '?'",
            invalid, charset
        )));
    }

    if offset >= src.len() && !transfer.has_pending_unit() {
        transfer.finish();
    } else {
        warnings.push(truncated(total_units * 2, written * 2));
    }
    (indicator, warnings)
}

fn truncated(total: usize, delivered: usize) -> Warning {
    Warning::truncated(format!(
        "String data, right truncated: {} of {} bytes delivered",
        delivered, total
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WarningKind;

    fn fresh() -> ChunkedTransfer {
        let mut t = ChunkedTransfer::new();
        t.begin_column(0, 0).unwrap();
        t
    }

    #[test]
    fn test_char_fits() {
        let mut t = fresh();
        let mut buf = [0xAAu8; 8];
        let (ind, warnings) = deliver_char(b"hello", &mut buf, &mut t, Charset::Utf8);
        assert_eq!(ind, Indicator::Length(5));
        assert!(warnings.is_empty());
        assert_eq!(&buf[..6], b"hello\0");
        assert!(!t.remaining());
    }

    #[test]
    fn test_char_chunked_reports_remaining_length() {
        let mut t = fresh();
        let mut buf = [0u8; 4];

        let (ind, w) = deliver_char(b"abcdefgh", &mut buf, &mut t, Charset::Utf8);
        assert_eq!(ind, Indicator::Length(8));
        assert_eq!(w[0].kind, WarningKind::Truncated);
        assert_eq!(&buf, b"abc\0");

        let (ind, w) = deliver_char(b"abcdefgh", &mut buf, &mut t, Charset::Utf8);
        assert_eq!(ind, Indicator::Length(5));
        assert_eq!(w.len(), 1);
        assert_eq!(&buf, b"def\0");

        let (ind, w) = deliver_char(b"abcdefgh", &mut buf, &mut t, Charset::Utf8);
        assert_eq!(ind, Indicator::Length(2));
        assert!(w.is_empty());
        assert_eq!(&buf[..3], b"gh\0");
        assert!(!t.remaining());
    }

    #[test]
    fn test_char_does_not_split_multibyte() {
        let src = "a€".as_bytes();
        let mut t = fresh();
        let mut buf = [0u8; 3];
        let (_, w) = deliver_char(src, &mut buf, &mut t, Charset::Utf8);
        assert_eq!(w.len(), 1);
        assert_eq!(&buf[..2], b"a\0");

        let mut buf = [0u8; 4];
        let (ind, w) = deliver_char(src, &mut buf, &mut t, Charset::Utf8);
        assert_eq!(ind, Indicator::Length(3));
        assert!(w.is_empty());
        assert_eq!(&buf, "€\0".as_bytes());
    }

    #[test]
    fn test_char_zero_length_buffer_only_reports_length() {
        let mut t = fresh();
        let mut buf: [u8; 0] = [];
        let (ind, w) = deliver_char(b"abc", &mut buf, &mut t, Charset::Utf8);
        assert_eq!(ind, Indicator::Length(3));
        assert_eq!(w.len(), 1);
        assert_eq!(t.offset(), 0);
    }

    #[test]
    fn test_wchar_basic() {
        let mut t = fresh();
        let mut buf = [0u16; 8];
        let (ind, w) = deliver_wchar("héllo".as_bytes(), &mut buf, &mut t, Charset::Utf8);
        assert_eq!(ind, Indicator::Length(10));
        assert!(w.is_empty());
        let expected: Vec<u16> = "héllo".encode_utf16().collect();
        assert_eq!(&buf[..5], expected.as_slice());
        assert_eq!(buf[5], 0);
    }

    #[test]
    fn test_wchar_surrogate_pair_straddles_boundary() {
        let src = "ab😀".as_bytes();
        let units: Vec<u16> = "😀".encode_utf16().collect();
        let mut t = fresh();

        // room for three units: 'a', 'b' and the high surrogate
        let mut buf = [0u16; 4];
        let (ind, w) = deliver_wchar(src, &mut buf, &mut t, Charset::Utf8);
        assert_eq!(ind, Indicator::Length(8));
        assert!(w.iter().any(|w| w.kind == WarningKind::Truncated));
        assert_eq!(&buf, &[b'a' as u16, b'b' as u16, units[0], 0]);
        assert!(t.has_pending_unit());

        let (ind, w) = deliver_wchar(src, &mut buf, &mut t, Charset::Utf8);
        assert_eq!(ind, Indicator::Length(2));
        assert!(w.is_empty());
        assert_eq!(&buf[..2], &[units[1], 0]);
        assert!(!t.remaining());
    }

    #[test]
    fn test_wchar_pending_unit_waits_for_room() {
        let src = "😀".as_bytes();
        let mut t = fresh();
        let mut one = [0u16; 2];
        deliver_wchar(src, &mut one, &mut t, Charset::Utf8);
        assert!(t.has_pending_unit());

        let mut none = [0u16; 1];
        let (ind, w) = deliver_wchar(src, &mut none, &mut t, Charset::Utf8);
        assert_eq!(ind, Indicator::Length(2));
        assert_eq!(w.len(), 1);
        assert!(t.has_pending_unit());
    }

    #[test]
    fn test_wchar_invalid_bytes_are_replaced() {
        let mut t = fresh();
        let mut buf = [0u16; 8];
        let (_, w) = deliver_wchar(&[b'a', 0xFF, b'b'], &mut buf, &mut t, Charset::Utf8);
        assert_eq!(w.len(), 1);
        assert_eq!(w[0].kind, WarningKind::ConversionError);
        assert_eq!(&buf[..4], &[b'a' as u16, b'?' as u16, b'b' as u16, 0]);
    }

    #[test]
    fn test_wchar_latin1_source() {
        let mut t = fresh();
        let mut buf = [0u16; 4];
        let (ind, _) = deliver_wchar(&[0xE9, 0x41], &mut buf, &mut t, Charset::Latin1);
        assert_eq!(ind, Indicator::Length(4));
        assert_eq!(&buf[..3], &[0xE9, 0x41, 0]);
    }
}
