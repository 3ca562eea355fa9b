use odbc_cursor::engine::CursorNavigator;
use odbc_cursor::{DriverConfig, FetchOrientation, RowStatus, Statement, Status, Target};
use proptest::prelude::*;

mod helpers;
use helpers::Script;

fn ten_rows() -> String {
    let mut reply = String::from("n\nINTEGER\n");
    for i in 0..10 {
        reply.push_str(&format!("{}\n", i));
    }
    reply
}

fn statement(rowset_size: usize) -> Statement {
    let script = Script::new();
    script.reply(&ten_rows());
    let config = DriverConfig {
        rowset_size,
        ..DriverConfig::default()
    };
    let mut st = Statement::new(script.connection(config));
    st.execute("SELECT n FROM numbers").unwrap();
    st
}

fn delivered_rows(st: &Statement) -> usize {
    st.row_statuses()
        .iter()
        .filter(|s| **s == RowStatus::Success)
        .count()
}

fn read_current(st: &mut Statement) -> i32 {
    let mut v = 0i32;
    st.get_data(1, &mut Target::SLong(&mut v)).unwrap();
    v
}

#[test]
fn test_forward_scroll_positions() {
    let mut st = statement(3);
    let mut positions = Vec::new();
    let mut delivered = Vec::new();

    st.fetch_scroll(FetchOrientation::First).unwrap();
    positions.push(st.position());
    delivered.push(delivered_rows(&st));
    for _ in 0..3 {
        st.fetch_scroll(FetchOrientation::Next).unwrap();
        positions.push(st.position());
        delivered.push(delivered_rows(&st));
    }

    assert_eq!(positions, vec![0, 3, 6, 9]);
    assert_eq!(delivered, vec![3, 3, 3, 1]);
    assert_eq!(read_current(&mut st), 9);
    assert_eq!(st.fetch().unwrap(), Status::NoData);
}

#[test]
fn test_last_is_final_rowset() {
    let mut st = statement(3);
    st.fetch_scroll(FetchOrientation::Last).unwrap();
    assert_eq!(st.position(), 7);
    st.set_position(3).unwrap();
    assert_eq!(read_current(&mut st), 9);
}

#[test]
fn test_absolute_negative() {
    let script = Script::new();
    script.reply("n\nINTEGER\n0\n1\n2\n3\n4\n");
    let mut st = Statement::new(script.connection(DriverConfig {
        rowset_size: 3,
        ..DriverConfig::default()
    }));
    st.execute("SELECT n FROM numbers").unwrap();

    st.fetch_scroll(FetchOrientation::Absolute(-1)).unwrap();
    assert_eq!(st.position(), 4);
    assert_eq!(read_current(&mut st), 4);

    st.fetch_scroll(FetchOrientation::Absolute(-10)).unwrap();
    assert_eq!(st.position(), 0);
}

#[test]
fn test_prior_before_first_then_next() {
    let mut st = statement(3);
    st.fetch_scroll(FetchOrientation::First).unwrap();
    assert_eq!(st.fetch_scroll(FetchOrientation::Prior).unwrap(), Status::NoData);
    assert_eq!(st.position(), -1);
    st.fetch().unwrap();
    assert_eq!(read_current(&mut st), 0);
}

#[test]
fn test_fetch_without_result_set() {
    let script = Script::new();
    let mut st = Statement::new(script.connection(DriverConfig::default()));
    st.execute("UPDATE t SET a = 1").unwrap();
    assert!(st.fetch().is_err());
}

proptest! {
    #[test]
    fn navigator_position_stays_in_bounds(
        rows in 0usize..50,
        k in 1usize..8,
        moves in prop::collection::vec((0u8..7, -60i64..60), 1..40),
    ) {
        let mut nav = CursorNavigator::new(k);
        for (kind, n) in moves {
            let orientation = match kind {
                0 => FetchOrientation::Next,
                1 => FetchOrientation::Prior,
                2 => FetchOrientation::First,
                3 => FetchOrientation::Last,
                4 => FetchOrientation::Absolute(n),
                5 => FetchOrientation::Relative(n),
                _ => FetchOrientation::Bookmark(n),
            };
            let out = nav.fetch(orientation, rows);
            prop_assert!(out.position >= -1 && out.position <= rows as i64);
            prop_assert!(out.delivered <= k);
            if out.position >= 0 {
                let expected = (rows as i64 - out.position).min(k as i64) as usize;
                prop_assert_eq!(out.delivered, expected);
            } else {
                prop_assert_eq!(out.delivered, 0);
            }
        }
    }

    #[test]
    fn last_is_rows_minus_rowset(rows in 0usize..100, k in 1usize..20) {
        let mut nav = CursorNavigator::new(k);
        let out = nav.fetch(FetchOrientation::Last, rows);
        prop_assert_eq!(out.position, rows.saturating_sub(k) as i64);
    }
}
