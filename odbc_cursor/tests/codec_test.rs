use odbc_cursor::codec::decimal::{numeric_to_text, text_to_numeric};
use odbc_cursor::{
    Charset, DriverConfig, FetchOrientation, Indicator, Numeric, Severity, Statement, Status,
    Target, Timestamp,
};
use std::sync::Arc;

mod helpers;
use helpers::{RecordingDiagnostics, Script};

fn single_row(reply: &str, config: DriverConfig) -> (Statement, Arc<RecordingDiagnostics>) {
    let script = Script::new();
    script.reply(reply);
    let recorder = Arc::new(RecordingDiagnostics::default());
    let mut st = Statement::new(script.connection(config)).with_diagnostics(recorder.clone());
    st.execute("SELECT * FROM t").unwrap();
    st.fetch_scroll(FetchOrientation::First).unwrap();
    (st, recorder)
}

#[test]
fn test_decimal_round_trip() {
    let (n, warnings) = text_to_numeric("123.45", 10, 2).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(numeric_to_text(&n), "123.45");
}

#[test]
fn test_decimal_excess_scale_truncates_through_get_data() {
    let (mut st, recorder) = single_row("price\nDECIMAL(10,3)\n123.456\n", DriverConfig::default());
    let mut n = Numeric::default();
    let out = st
        .get_data(
            1,
            &mut Target::Numeric {
                out: &mut n,
                precision: 10,
                scale: 2,
            },
        )
        .unwrap();
    assert!(out.status.has_truncation());
    assert_eq!(numeric_to_text(&n), "123.45");
    assert_eq!(n.sign, 1);
    assert_eq!(recorder.states(), vec!["01S07".to_string()]);
}

#[test]
fn test_decimal_overflow_is_reported() {
    let (mut st, recorder) = single_row("v\nDECIMAL(10,0)\n123456\n", DriverConfig::default());
    let mut n = Numeric::default();
    let r = st.get_data(
        1,
        &mut Target::Numeric {
            out: &mut n,
            precision: 3,
            scale: 0,
        },
    );
    assert!(r.is_err());
    assert_eq!(recorder.states(), vec!["22003".to_string()]);
    assert_eq!(recorder.count(Severity::Error), 1);
}

#[test]
fn test_compact_timestamps() {
    let reply = "ts\nDATETIME\n20250213\n690101\n700101\n";
    let (mut st, _) = single_row(reply, DriverConfig::default());
    let mut years = Vec::new();
    loop {
        let mut ts = Timestamp::default();
        st.get_data(1, &mut Target::Timestamp(&mut ts)).unwrap();
        years.push(ts.year);
        if years.len() == 1 {
            assert_eq!((ts.month, ts.day), (2, 13));
            assert_eq!((ts.hour, ts.minute, ts.second), (0, 0, 0));
        }
        if st.fetch().unwrap() == Status::NoData {
            break;
        }
    }
    assert_eq!(years, vec![2025, 2069, 1970]);
}

#[test]
fn test_wide_surrogate_split_across_calls() {
    let (mut st, recorder) = single_row("s\nVARCHAR(10)\na\u{1F600}b\n", DriverConfig::default());
    let grin: Vec<u16> = "\u{1F600}".encode_utf16().collect();

    let mut first = [0u16; 3];
    let out = st.get_data(1, &mut Target::WChar(&mut first)).unwrap();
    assert_eq!(out.indicator, Some(Indicator::Length(8)));
    assert!(out.status.has_truncation());
    assert_eq!(first, [u16::from(b'a'), grin[0], 0]);

    let mut second = [0u16; 2];
    let out = st.get_data(1, &mut Target::WChar(&mut second)).unwrap();
    assert_eq!(out.indicator, Some(Indicator::Length(4)));
    assert_eq!(second, [grin[1], 0]);

    let mut third = [0u16; 2];
    let out = st.get_data(1, &mut Target::WChar(&mut third)).unwrap();
    assert_eq!(out.status, Status::Success);
    assert_eq!(third, [u16::from(b'b'), 0]);

    let mut fourth = [0u16; 2];
    let out = st.get_data(1, &mut Target::WChar(&mut fourth)).unwrap();
    assert!(out.status.is_no_data());
    assert_eq!(
        recorder.states(),
        vec!["01004".to_string(), "01004".to_string()]
    );
}

#[test]
fn test_narrow_chunks_reassemble() {
    let (mut st, _) = single_row("s\nVARCHAR(40)\nhello, chunked world\n", DriverConfig::default());
    let mut collected = Vec::new();
    loop {
        let mut buf = [0u8; 6];
        let out = st.get_data(1, &mut Target::Char(&mut buf)).unwrap();
        if out.status.is_no_data() {
            break;
        }
        let n = buf.iter().position(|&b| b == 0).unwrap();
        collected.extend_from_slice(&buf[..n]);
    }
    assert_eq!(collected, b"hello, chunked world");
}

#[test]
fn test_binary_column_as_hex() {
    let (mut st, _) = single_row("data\nVARBINARY(4)\nCAFE01\n", DriverConfig::default());
    let mut buf = [0u8; 16];
    let out = st.get_data(1, &mut Target::Char(&mut buf)).unwrap();
    assert_eq!(out.indicator, Some(Indicator::Length(6)));
    assert_eq!(&buf[..7], b"CAFE01\0");

    st.set_position(1).unwrap();
    let mut raw = [0u8; 3];
    st.get_data(1, &mut Target::Binary(&mut raw)).unwrap();
    assert_eq!(raw, [0xCA, 0xFE, 0x01]);
}

#[test]
fn test_latin1_text() {
    let config = DriverConfig {
        charset: Charset::Latin1,
        ..DriverConfig::default()
    };
    let (mut st, _) = single_row("s\nVARCHAR(4)\ncaf\u{e9}\n", config);
    let mut buf = [0u8; 8];
    let out = st.get_data(1, &mut Target::Char(&mut buf)).unwrap();
    assert_eq!(out.indicator, Some(Indicator::Length(4)));
    assert_eq!(&buf[..5], b"caf\xe9\0");
}
